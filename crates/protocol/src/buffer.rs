//! The typed buffer container
//!
//! `TypedBuffer` is what crosses the client seam: one of five payload
//! families, mirroring the middleware's buffer types.

use bytes::Bytes;

use crate::{Record, ViewBuffer};

/// Discriminated payload container passed to and from backend services
#[derive(Debug, Clone)]
pub enum TypedBuffer {
    /// Key-value multimap with repeating occurrences
    Record(Record),
    /// Plain UTF-8 string
    Str(String),
    /// Opaque byte array
    Bytes(Bytes),
    /// Raw JSON document carried as bytes
    Json(Bytes),
    /// Typed view instance
    View(ViewBuffer),
}

impl TypedBuffer {
    /// Buffer family name for logging
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Record(_) => "record",
            Self::Str(_) => "string",
            Self::Bytes(_) => "bytes",
            Self::Json(_) => "json",
            Self::View(_) => "view",
        }
    }

    /// Record view of this buffer, if it is a record
    #[inline]
    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Self::Record(rec) => Some(rec),
            _ => None,
        }
    }

    /// Mutable record view of this buffer, if it is a record
    #[inline]
    pub fn as_record_mut(&mut self) -> Option<&mut Record> {
        match self {
            Self::Record(rec) => Some(rec),
            _ => None,
        }
    }

    /// View instance, if this buffer is a view
    #[inline]
    pub fn as_view(&self) -> Option<&ViewBuffer> {
        match self {
            Self::View(view) => Some(view),
            _ => None,
        }
    }
}

impl From<Record> for TypedBuffer {
    fn from(rec: Record) -> Self {
        Self::Record(rec)
    }
}

impl From<ViewBuffer> for TypedBuffer {
    fn from(view: ViewBuffer) -> Self {
        Self::View(view)
    }
}

impl From<String> for TypedBuffer {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}
