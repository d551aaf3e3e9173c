//! Decoded HTTP request parts
//!
//! The gateway extracts these from the HTTP layer once; the codec never
//! touches framework types.

use bytes::Bytes;
use serde_json::{Map, Value};

/// The pieces of an HTTP request the codec needs
#[derive(Debug, Clone, Default)]
pub struct RequestParts {
    /// HTTP method, upper case
    pub method: String,
    /// Request path (no query string)
    pub path: String,
    /// Header `(name, value)` pairs in arrival order, names lower case
    pub headers: Vec<(String, String)>,
    /// Request body
    pub body: Bytes,
}

impl RequestParts {
    /// Headers as a JSON object; repeated names are comma-joined
    pub fn headers_json(&self) -> Value {
        let mut map: Map<String, Value> = Map::new();
        for (name, value) in &self.headers {
            match map.get_mut(name) {
                Some(Value::String(existing)) => {
                    existing.push_str(", ");
                    existing.push_str(value);
                }
                _ => {
                    map.insert(name.clone(), Value::String(value.clone()));
                }
            }
        }
        Value::Object(map)
    }

    /// Cookies parsed from `Cookie` headers as a JSON object
    pub fn cookies_json(&self) -> Value {
        let mut map: Map<String, Value> = Map::new();
        for (name, value) in &self.headers {
            if name != "cookie" {
                continue;
            }
            for pair in value.split(';') {
                let pair = pair.trim();
                if pair.is_empty() {
                    continue;
                }
                let (key, val) = pair.split_once('=').unwrap_or((pair, ""));
                // Quoted cookie values arrive as value="..."
                let val = val.trim();
                let val = val
                    .strip_prefix('"')
                    .and_then(|v| v.strip_suffix('"'))
                    .unwrap_or(val);
                map.insert(key.trim().to_string(), Value::String(val.to_string()));
            }
        }
        Value::Object(map)
    }

    /// Urlencoded form body as a JSON object
    ///
    /// Returns None when the body is not a valid urlencoded form.
    pub fn form_json(&self) -> Option<Value> {
        let pairs: Vec<(String, String)> = serde_urlencoded::from_bytes(&self.body).ok()?;
        let mut map: Map<String, Value> = Map::new();
        for (key, value) in pairs {
            map.insert(key, Value::String(value));
        }
        Some(Value::Object(map))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headers_json_joins_repeats() {
        let parts = RequestParts {
            headers: vec![
                ("accept".into(), "text/plain".into()),
                ("accept".into(), "application/json".into()),
                ("host".into(), "gw".into()),
            ],
            ..Default::default()
        };

        let json = parts.headers_json();
        assert_eq!(
            json.get("accept").and_then(Value::as_str),
            Some("text/plain, application/json")
        );
        assert_eq!(json.get("host").and_then(Value::as_str), Some("gw"));
    }

    #[test]
    fn test_cookie_parsing() {
        let parts = RequestParts {
            headers: vec![("cookie".into(), r#"sid=abc123; theme="dark"; flag"#.into())],
            ..Default::default()
        };

        let json = parts.cookies_json();
        assert_eq!(json.get("sid").and_then(Value::as_str), Some("abc123"));
        assert_eq!(json.get("theme").and_then(Value::as_str), Some("dark"));
        assert_eq!(json.get("flag").and_then(Value::as_str), Some(""));
    }

    #[test]
    fn test_form_parsing() {
        let parts = RequestParts {
            body: Bytes::from_static(b"name=alice&city=riga+lv"),
            ..Default::default()
        };

        let json = parts.form_json().unwrap();
        assert_eq!(json.get("name").and_then(Value::as_str), Some("alice"));
        assert_eq!(json.get("city").and_then(Value::as_str), Some("riga lv"));
    }
}
