//! Backend error codes
//!
//! The transactional runtime reports failures as numbered error codes.
//! `ErrorCode` names the well-known codes; `TpError` carries the raw number
//! so codes from newer runtimes still travel through the gateway unchanged.

use std::fmt;

use thiserror::Error;

/// Well-known backend error codes
///
/// The numeric values are part of the middleware wire contract and feed the
/// per-route error-code to HTTP-status mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum ErrorCode {
    /// Transaction aborted
    Abort = 1,
    /// Bad call descriptor
    BadDescriptor = 2,
    /// Operation would block
    Blocked = 3,
    /// Invalid arguments / malformed input
    InvalidArgument = 4,
    /// System limit reached
    Limit = 5,
    /// Service does not exist
    NoEntry = 6,
    /// Operating system error
    OsError = 7,
    /// Permission denied
    Permission = 8,
    /// Protocol error
    Protocol = 9,
    /// Service crashed or returned garbage
    ServiceError = 10,
    /// Service returned application-level failure
    ServiceFail = 11,
    /// Internal system error
    System = 12,
    /// Call timed out
    Timeout = 13,
    /// Transaction error
    Transaction = 14,
    /// Resource manager error
    ResourceManager = 15,
    /// Input buffer type not accepted by service
    InputType = 16,
    /// Output buffer type not accepted by caller
    OutputType = 17,
    /// Incompatible runtime release
    Release = 18,
    /// Transaction hazard
    Hazard = 19,
    /// Heuristic completion
    Heuristic = 20,
    /// Event broker error
    Event = 21,
    /// No match for event
    Match = 22,
    /// Diagnostic error
    Diagnostic = 23,
    /// Management interface error
    Mib = 24,
}

impl ErrorCode {
    /// Numeric wire value of this code
    #[inline]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Resolve a numeric code to a well-known variant
    pub fn from_i32(code: i32) -> Option<Self> {
        match code {
            1 => Some(Self::Abort),
            2 => Some(Self::BadDescriptor),
            3 => Some(Self::Blocked),
            4 => Some(Self::InvalidArgument),
            5 => Some(Self::Limit),
            6 => Some(Self::NoEntry),
            7 => Some(Self::OsError),
            8 => Some(Self::Permission),
            9 => Some(Self::Protocol),
            10 => Some(Self::ServiceError),
            11 => Some(Self::ServiceFail),
            12 => Some(Self::System),
            13 => Some(Self::Timeout),
            14 => Some(Self::Transaction),
            15 => Some(Self::ResourceManager),
            16 => Some(Self::InputType),
            17 => Some(Self::OutputType),
            18 => Some(Self::Release),
            19 => Some(Self::Hazard),
            20 => Some(Self::Heuristic),
            21 => Some(Self::Event),
            22 => Some(Self::Match),
            23 => Some(Self::Diagnostic),
            24 => Some(Self::Mib),
            _ => None,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_i32())
    }
}

/// A backend failure: numeric code plus human-readable message
#[derive(Debug, Clone, Error)]
#[error("backend error {code}: {message}")]
pub struct TpError {
    /// Numeric error code (1..)
    pub code: i32,
    /// Failure description from the runtime or service
    pub message: String,
}

impl TpError {
    /// Create an error from a well-known code
    #[inline]
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code: code.as_i32(),
            message: message.into(),
        }
    }

    /// Create an error from a raw numeric code
    #[inline]
    pub fn from_code(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Create a malformed-input error
    #[inline]
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidArgument, message)
    }

    /// Create an unknown-service error
    #[inline]
    pub fn no_entry(service: &str) -> Self {
        Self::new(ErrorCode::NoEntry, format!("service '{service}' not found"))
    }

    /// Create an internal system error
    #[inline]
    pub fn system(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::System, message)
    }

    /// Create a timeout error
    #[inline]
    pub fn timeout(service: &str) -> Self {
        Self::new(ErrorCode::Timeout, format!("call to '{service}' timed out"))
    }

    /// The well-known variant of this code, if any
    #[inline]
    pub fn known_code(&self) -> Option<ErrorCode> {
        ErrorCode::from_i32(self.code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_round_trip() {
        for code in 1..=24 {
            let known = ErrorCode::from_i32(code).unwrap();
            assert_eq!(known.as_i32(), code);
        }
        assert!(ErrorCode::from_i32(0).is_none());
        assert!(ErrorCode::from_i32(99).is_none());
    }

    #[test]
    fn test_display_contains_code_and_message() {
        let err = TpError::new(ErrorCode::Timeout, "no reply");
        assert!(err.to_string().contains("13"));
        assert!(err.to_string().contains("no reply"));
    }

    #[test]
    fn test_helper_constructors() {
        assert_eq!(TpError::invalid("x").code, 4);
        assert_eq!(TpError::no_entry("SVC").code, 6);
        assert_eq!(TpError::system("x").code, 12);
        assert_eq!(TpError::timeout("SVC").code, 13);
        assert!(TpError::no_entry("SVC").message.contains("SVC"));
    }
}
