//! The raw configuration section
//!
//! A section is an ordered list of `(key, value)` string pairs, exactly as
//! the middleware configuration registry delivers it. For development and
//! tests the same shape can be read from a JSON document whose object keys
//! become section keys.

use std::fs;
use std::path::Path;

use serde_json::Value;

use crate::error::{ConfigError, Result};

/// Ordered `(key, value)` pairs of one configuration section
#[derive(Debug, Clone, Default)]
pub struct Section {
    pairs: Vec<(String, String)>,
}

impl Section {
    /// Build a section from raw pairs (registry order preserved)
    #[must_use]
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        Self { pairs }
    }

    /// Parse a section from a JSON object document
    ///
    /// String values are taken verbatim; every other value (numbers, bools,
    /// the `defaults` / route objects) is re-serialized compactly, so both
    /// sources produce identical pair lists.
    pub fn from_json_str(s: &str) -> Result<Self> {
        let root: Value =
            serde_json::from_str(s).map_err(|e| ConfigError::parse("<document>", e))?;
        let Value::Object(map) = root else {
            return Err(ConfigError::invalid_key(
                "<document>",
                "configuration document must be a JSON object",
            ));
        };

        let pairs = map
            .into_iter()
            .map(|(key, value)| {
                let value = match value {
                    Value::String(s) => s,
                    other => other.to_string(),
                };
                (key, value)
            })
            .collect();

        Ok(Self { pairs })
    }

    /// Read a section from a JSON document on disk
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents =
            fs::read_to_string(path).map_err(|e| ConfigError::io(path.display().to_string(), e))?;
        Self::from_json_str(&contents)
    }

    /// First value for a key
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Iterate pairs in section order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of pairs
    #[inline]
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Check whether the section is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_document_normalizes_values() {
        let section = Section::from_json_str(
            r#"{"ip": "0.0.0.0", "port": 8080, "defaults": {"echo": true}}"#,
        )
        .unwrap();

        assert_eq!(section.get("ip"), Some("0.0.0.0"));
        assert_eq!(section.get("port"), Some("8080"));
        assert_eq!(section.get("defaults"), Some(r#"{"echo":true}"#));
        assert_eq!(section.get("missing"), None);
    }

    #[test]
    fn test_non_object_document_rejected() {
        assert!(Section::from_json_str("[1, 2]").is_err());
        assert!(Section::from_json_str("not json").is_err());
    }
}
