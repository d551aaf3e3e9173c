//! Backend error code → HTTP status mapping
//!
//! Every route carries an `ErrorMap`. Lookup order: the stringified code,
//! then the `*` catch-all, then 500. Code 0 is the success sentinel and maps
//! to 200 in the default table.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::{ConfigError, Result};

/// Pairs are separated by commas and/or whitespace
static PAIR_SPLIT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[\s,]+").expect("valid regex"));

/// Route-scoped mapping from backend error codes to HTTP statuses
#[derive(Debug, Clone)]
pub struct ErrorMap {
    map: HashMap<String, u16>,
}

impl ErrorMap {
    /// Parse a mapping string of `code:status` pairs
    ///
    /// `code` is a decimal number or `*`. Example:
    /// `"0:200, 11:500, 13:504, *:500"`.
    pub fn parse(s: &str) -> Result<Self> {
        let mut map = HashMap::new();

        for pair in PAIR_SPLIT.split(s.trim()) {
            if pair.is_empty() {
                continue;
            }
            let Some((code, status)) = pair.split_once(':') else {
                return Err(ConfigError::invalid_key(
                    "error_map",
                    format!("pair '{pair}' is not code:status"),
                ));
            };

            let code = code.trim();
            if code != "*" && code.parse::<i64>().is_err() {
                return Err(ConfigError::invalid_key(
                    "error_map",
                    format!("'{code}' is neither a number nor '*'"),
                ));
            }

            let status: u16 = status.trim().parse().map_err(|_| {
                ConfigError::invalid_key(
                    "error_map",
                    format!("'{}' is not an HTTP status", status.trim()),
                )
            })?;

            map.insert(code.to_string(), status);
        }

        Ok(Self { map })
    }

    /// HTTP status for a backend error code (0 = success sentinel)
    pub fn status_for(&self, code: i32) -> u16 {
        self.map
            .get(code.to_string().as_str())
            .or_else(|| self.map.get("*"))
            .copied()
            .unwrap_or(500)
    }

    /// Number of explicit entries (including `*`)
    #[inline]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Check whether no explicit entries exist
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl Default for ErrorMap {
    /// The built-in mapping, applied when a route configures none
    fn default() -> Self {
        let mut map = HashMap::new();

        // Success sentinel
        map.insert("0".to_string(), 200);

        // Client-attributable failures
        map.insert("2".to_string(), 400); // bad descriptor
        map.insert("4".to_string(), 400); // invalid input
        map.insert("9".to_string(), 400); // protocol error
        map.insert("5".to_string(), 413); // limit reached
        map.insert("6".to_string(), 404); // no such service
        map.insert("8".to_string(), 401); // permission denied

        // Gateway-visible infrastructure failures
        map.insert("10".to_string(), 502); // service error
        map.insert("13".to_string(), 504); // timeout

        // Everything else is a server error
        for code in [1, 3, 7, 11, 12, 14, 15, 16, 17, 18, 19, 20, 21, 22, 23, 24] {
            map.insert(code.to_string(), 500);
        }
        map.insert("*".to_string(), 500);

        Self { map }
    }
}
