//! Key-value record buffer
//!
//! A `Record` is the multimap-style typed buffer: every field has a name and
//! one or more occurrences. Field order is stable (sorted by name), so
//! encoded output is deterministic.

use std::collections::BTreeMap;

use bytes::Bytes;

/// One occurrence of a record field
///
/// `Json` holds nested structures (e.g. serialized cookies or headers);
/// `Bytes` holds opaque payloads that never cross into JSON unencoded.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// UTF-8 string
    Str(String),
    /// Signed integer
    Long(i64),
    /// Floating point
    Double(f64),
    /// Boolean
    Bool(bool),
    /// Opaque byte payload
    Bytes(Bytes),
    /// Nested JSON value
    Json(serde_json::Value),
}

impl FieldValue {
    /// String view of this value, if it is a string
    #[inline]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Integer view of this value, if it is an integer
    #[inline]
    pub fn as_long(&self) -> Option<i64> {
        match self {
            Self::Long(n) => Some(*n),
            _ => None,
        }
    }

    /// Byte view of this value, if it holds bytes
    #[inline]
    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            Self::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// Nested JSON view of this value, if it holds JSON
    #[inline]
    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            Self::Json(v) => Some(v),
            _ => None,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<i64> for FieldValue {
    fn from(n: i64) -> Self {
        Self::Long(n)
    }
}

impl From<Bytes> for FieldValue {
    fn from(b: Bytes) -> Self {
        Self::Bytes(b)
    }
}

/// Key-value typed buffer with repeating occurrences
///
/// # Example
///
/// ```
/// use restin_protocol::{FieldValue, Record};
///
/// let mut rec = Record::new();
/// rec.set("name", "alice");
/// rec.add("tag", "a");
/// rec.add("tag", "b");
///
/// assert_eq!(rec.get("name").and_then(FieldValue::as_str), Some("alice"));
/// assert_eq!(rec.occurrences("tag").len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: BTreeMap<String, Vec<FieldValue>>,
}

impl Record {
    /// Create an empty record
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace all occurrences of a field with a single value
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) {
        self.fields.insert(name.into(), vec![value.into()]);
    }

    /// Append an occurrence to a field
    pub fn add(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) {
        self.fields.entry(name.into()).or_default().push(value.into());
    }

    /// First occurrence of a field
    #[inline]
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name).and_then(|occ| occ.first())
    }

    /// All occurrences of a field (empty slice when absent)
    #[inline]
    pub fn occurrences(&self, name: &str) -> &[FieldValue] {
        self.fields.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Remove a field, returning its occurrences
    pub fn remove(&mut self, name: &str) -> Option<Vec<FieldValue>> {
        self.fields.remove(name)
    }

    /// Check whether a field is present
    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Iterate fields in name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[FieldValue])> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Number of distinct field names
    #[inline]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Check whether the record has no fields
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
