//! Restin Protocol - typed buffers and the backend client seam
//!
//! This crate provides the types that flow between the HTTP gateway and the
//! transactional middleware:
//! - `TypedBuffer` - the discriminated payload container passed to services
//! - `Record` - key-value multimap buffer with repeating occurrences
//! - `ViewBuffer` / `ViewRegistry` - named flat structures with typed fields
//! - `TpError` / `ErrorCode` - numbered backend error codes
//! - `ClientContext` / `ContextFactory` - the per-worker client seam
//! - `loopback` - an in-process runtime for tests and development
//!
//! # Design Principles
//!
//! - **One context per worker**: a `ClientContext` is not thread-safe; the
//!   gateway's pool lease discipline provides the mutual exclusion.
//! - **Buffers are values**: every buffer variant is `Clone`, so filter
//!   chains and echo paths can keep a copy without lifetime gymnastics.
//! - **The runtime is a seam**: production bindings implement
//!   `ClientContext` out of tree; in-tree only the loopback runtime exists.

mod buffer;
mod client;
mod error;
pub mod loopback;
mod record;
mod view;

pub use buffer::TypedBuffer;
pub use client::{BoxedContext, CallError, CallOptions, ClientContext, ContextFactory};
pub use error::{ErrorCode, TpError};
pub use record::{FieldValue, Record};
pub use view::{ViewBuffer, ViewField, ViewFieldType, ViewRegistry, ViewSchema, VIEW_NOTNULL};

// Re-export bytes for convenience
pub use bytes::Bytes;

/// Result type for protocol operations
pub type Result<T> = std::result::Result<T, TpError>;

/// Default timeout for synchronous backend calls
pub const DEFAULT_CALL_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(30);

// Test modules - only compiled during testing
#[cfg(test)]
mod loopback_test;
#[cfg(test)]
mod view_test;
