//! Codec error types

use restin_protocol::TpError;
use thiserror::Error;

/// Result type for codec operations
pub type Result<T> = std::result::Result<T, CodecError>;

/// Errors that can occur converting payloads
#[derive(Debug, Error)]
pub enum CodecError {
    /// The request body cannot be decoded in the route's mode
    #[error("bad input: {0}")]
    BadInput(String),

    /// The reply buffer cannot be encoded in the route's mode
    #[error("cannot encode reply: {0}")]
    Encode(String),
}

impl CodecError {
    /// Create a bad-input error
    #[inline]
    pub fn bad_input(msg: impl Into<String>) -> Self {
        Self::BadInput(msg.into())
    }

    /// Create an encode error
    #[inline]
    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }

    /// Check whether this is a request-side (client-attributable) failure
    #[inline]
    pub fn is_bad_input(&self) -> bool {
        matches!(self, Self::BadInput(_))
    }

    /// The backend error this failure maps to
    ///
    /// Bad input uses the invalid-input code so the route's error map picks
    /// the status; encode failures surface as internal errors.
    pub fn as_tp_error(&self) -> TpError {
        match self {
            Self::BadInput(msg) => TpError::invalid(msg.clone()),
            Self::Encode(msg) => TpError::system(msg.clone()),
        }
    }
}

impl From<TpError> for CodecError {
    fn from(err: TpError) -> Self {
        // View parsing reports through TpError; anything client-caused is
        // already tagged with the invalid-input code.
        Self::BadInput(err.message)
    }
}
