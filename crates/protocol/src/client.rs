//! The backend client seam
//!
//! The gateway talks to the transactional runtime through `ClientContext`.
//! One context is created per worker-pool slot at startup; a context is not
//! thread-safe, so the pool's lease discipline is the mutual exclusion.

use std::time::Duration;

use async_trait::async_trait;

use crate::{TpError, TypedBuffer};

/// Options for a single backend call
#[derive(Debug, Clone, Copy, Default)]
pub struct CallOptions {
    /// Disable the call timeout entirely
    pub no_timeout: bool,
    /// Override the runtime's default timeout
    pub timeout: Option<Duration>,
}

impl CallOptions {
    /// Effective deadline for a call: None means wait forever
    pub fn effective_timeout(&self, default: Duration) -> Option<Duration> {
        if self.no_timeout {
            None
        } else {
            Some(self.timeout.unwrap_or(default))
        }
    }
}

/// A failed synchronous call
///
/// Service-level failures still carry the service's reply buffer; the
/// response shaper merges the error into it.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{error}")]
pub struct CallError {
    /// The backend error
    pub error: TpError,
    /// Reply buffer delivered alongside the failure, when the service
    /// produced one
    pub reply: Option<TypedBuffer>,
}

impl CallError {
    /// Failure without a reply buffer
    #[inline]
    pub fn bare(error: TpError) -> Self {
        Self { error, reply: None }
    }

    /// Failure that still delivered a reply buffer
    #[inline]
    pub fn with_reply(error: TpError, reply: TypedBuffer) -> Self {
        Self {
            error,
            reply: Some(reply),
        }
    }

    /// Numeric error code
    #[inline]
    pub fn code(&self) -> i32 {
        self.error.code
    }
}

/// One initialized client context of the transactional runtime
///
/// Contexts are owned by worker-pool slots and used by exactly one request
/// at a time.
#[async_trait]
pub trait ClientContext: Send {
    /// Synchronous call: send the request buffer, wait for the reply
    async fn call(
        &mut self,
        service: &str,
        request: TypedBuffer,
        options: CallOptions,
    ) -> Result<TypedBuffer, CallError>;

    /// Fire-and-forget call: submit and return immediately
    ///
    /// An `Ok` return means the submit was accepted; the eventual service
    /// outcome is not observed.
    async fn acall(
        &mut self,
        service: &str,
        request: TypedBuffer,
        options: CallOptions,
    ) -> Result<(), CallError>;

    /// Tear the context down; called once at shutdown
    async fn terminate(&mut self);
}

/// Boxed context as stored in pool slots
pub type BoxedContext = Box<dyn ClientContext>;

/// Builds one `ClientContext` per worker-pool slot at startup
pub trait ContextFactory: Send + Sync {
    /// Create a fresh, initialized context
    fn create(&self) -> Result<BoxedContext, TpError>;
}
