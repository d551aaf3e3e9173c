//! Configuration error types

use thiserror::Error;

/// Result type for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors that abort gateway startup
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File could not be read
    #[error("cannot read {path}: {source}")]
    Io {
        /// Offending path
        path: String,
        /// Underlying error
        source: std::io::Error,
    },

    /// A section value failed to parse as JSON
    #[error("config key '{key}': {source}")]
    Parse {
        /// Section key whose value is malformed
        key: String,
        /// Underlying JSON error
        source: serde_json::Error,
    },

    /// A required top-level key is absent
    #[error("missing config key '{key}'")]
    MissingKey {
        /// The absent key
        key: &'static str,
    },

    /// A top-level key holds an unusable value
    #[error("config key '{key}': {message}")]
    InvalidKey {
        /// Offending key
        key: String,
        /// What is wrong with it
        message: String,
    },

    /// A route definition is inconsistent
    #[error("route '{url}': {message}")]
    Route {
        /// Route URL pattern
        url: String,
        /// What is wrong with it
        message: String,
    },

    /// The configuration registry could not be queried
    #[error("config registry: {0}")]
    Registry(String),
}

impl ConfigError {
    /// Create an I/O error
    #[inline]
    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a parse error for a section key
    #[inline]
    pub fn parse(key: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Parse {
            key: key.into(),
            source,
        }
    }

    /// Create a missing-key error
    #[inline]
    pub fn missing_key(key: &'static str) -> Self {
        Self::MissingKey { key }
    }

    /// Create an invalid-key error
    #[inline]
    pub fn invalid_key(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidKey {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Create a route error
    #[inline]
    pub fn route(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Route {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Create a registry error
    #[inline]
    pub fn registry(message: impl Into<String>) -> Self {
        Self::Registry(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_error_names_url() {
        let err = ConfigError::route("/echo", "conv is 'ext' but errors is 'json'");
        let text = err.to_string();
        assert!(text.contains("/echo"));
        assert!(text.contains("ext"));
    }

    #[test]
    fn test_missing_key() {
        assert!(ConfigError::missing_key("ip").to_string().contains("ip"));
    }
}
