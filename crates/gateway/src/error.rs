//! Gateway startup errors

use thiserror::Error;

/// Errors that abort gateway startup
#[derive(Debug, Error)]
pub enum BootError {
    /// Configuration failed to parse or validate
    #[error(transparent)]
    Config(#[from] restin_config::ConfigError),

    /// Route table failed to compile
    #[error(transparent)]
    Routing(#[from] restin_routing::RoutingError),

    /// A worker context or the view registry failed to initialize
    #[error(transparent)]
    Runtime(#[from] restin_protocol::TpError),

    /// Listener could not be bound
    #[error("bind {address}: {source}")]
    Bind {
        /// Address that failed to bind
        address: String,
        /// Underlying error
        source: std::io::Error,
    },

    /// The serving loop failed
    #[error("server error: {0}")]
    Serve(#[from] std::io::Error),
}

impl BootError {
    /// Create a bind error
    #[inline]
    pub fn bind(address: impl Into<String>, source: std::io::Error) -> Self {
        Self::Bind {
            address: address.into(),
            source,
        }
    }
}
