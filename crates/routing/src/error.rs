//! Routing error types

use thiserror::Error;

/// Result type for routing operations
pub type Result<T> = std::result::Result<T, RoutingError>;

/// Errors that can occur while compiling the route table
#[derive(Debug, Error)]
pub enum RoutingError {
    /// A route's URL pattern failed to compile
    #[error("route '{url}': bad pattern: {source}")]
    BadPattern {
        /// Offending route URL
        url: String,
        /// Regex compile error
        source: regex::Error,
    },

    /// Two routes share the same exact URL
    #[error("duplicate route for '{url}'")]
    DuplicateRoute {
        /// Duplicated URL
        url: String,
    },

    /// Route definition could not be compiled
    #[error("route '{url}': {message}")]
    InvalidRoute {
        /// Offending route URL
        url: String,
        /// What is wrong with it
        message: String,
    },
}

impl RoutingError {
    /// Create a bad-pattern error
    #[inline]
    pub fn bad_pattern(url: impl Into<String>, source: regex::Error) -> Self {
        Self::BadPattern {
            url: url.into(),
            source,
        }
    }

    /// Create a duplicate-route error
    #[inline]
    pub fn duplicate(url: impl Into<String>) -> Self {
        Self::DuplicateRoute { url: url.into() }
    }

    /// Create an invalid-route error
    #[inline]
    pub fn invalid(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidRoute {
            url: url.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_names_url() {
        let err = RoutingError::duplicate("/echo");
        assert!(err.to_string().contains("/echo"));
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn test_bad_pattern_keeps_source() {
        let source = regex::Regex::new("[").unwrap_err();
        let err = RoutingError::bad_pattern("/x", source);
        assert!(err.to_string().contains("/x"));
    }
}
