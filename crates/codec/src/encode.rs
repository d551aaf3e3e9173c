//! Typed buffer → response body

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use bytes::Bytes;
use restin_config::ConvMode;
use restin_protocol::{FieldValue, Record, TypedBuffer};
use restin_routing::Route;
use serde_json::Value;

use crate::error::{CodecError, Result};
use crate::ext_fields;

/// Encoded reply: body plus content type
#[derive(Debug, Clone)]
pub struct EncodedReply {
    /// Response body
    pub body: Bytes,
    /// Value for the `Content-Type` header
    pub content_type: String,
}

impl EncodedReply {
    fn new(body: impl Into<Bytes>, content_type: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            content_type: content_type.into(),
        }
    }

    /// An empty body with no particular content type
    pub fn empty() -> Self {
        Self::new(Bytes::new(), "application/octet-stream")
    }
}

/// Encode a reply buffer in the route's conversion mode
pub fn encode(route: &Route, buffer: &TypedBuffer) -> Result<EncodedReply> {
    match route.conv {
        ConvMode::JsonRecord | ConvMode::Json | ConvMode::JsonView => {
            let value = encode_json_value(route, buffer)?;
            let body = serde_json::to_vec(&value).map_err(|e| CodecError::encode(e.to_string()))?;
            Ok(EncodedReply::new(body, "application/json"))
        }
        ConvMode::Text => match buffer {
            TypedBuffer::Str(s) => Ok(EncodedReply::new(s.clone().into_bytes(), "text/plain")),
            other => Err(kind_mismatch("string", other)),
        },
        ConvMode::Raw => match buffer {
            TypedBuffer::Bytes(b) => Ok(EncodedReply::new(b.clone(), "application/octet-stream")),
            other => Err(kind_mismatch("bytes", other)),
        },
        ConvMode::Ext => match buffer {
            TypedBuffer::Record(record) => Ok(encode_ext(record)),
            other => Err(kind_mismatch("record", other)),
        },
        ConvMode::Static => Err(CodecError::encode("static routes have no payload codec")),
    }
}

/// JSON value form of a reply buffer, for the json-family error shaping
pub fn encode_json_value(route: &Route, buffer: &TypedBuffer) -> Result<Value> {
    match buffer {
        TypedBuffer::Record(record) => Ok(record_to_json(record)),
        TypedBuffer::Json(bytes) => {
            serde_json::from_slice(bytes).map_err(|e| CodecError::encode(format!("reply is not JSON: {e}")))
        }
        TypedBuffer::View(view) => Ok(view.to_json(route.view_notnull, route.view_flags)),
        other => Err(kind_mismatch("json-family buffer", other)),
    }
}

/// Record → JSON object; single occurrences stay scalar, repeats become arrays
pub fn record_to_json(record: &Record) -> Value {
    let mut map = serde_json::Map::new();
    for (name, occurrences) in record.iter() {
        let mut values: Vec<Value> = occurrences.iter().map(field_to_json).collect();
        let value = if values.len() == 1 {
            values.remove(0)
        } else {
            Value::Array(values)
        };
        map.insert(name.to_string(), value);
    }
    Value::Object(map)
}

/// Ext reply: the record's carrier fields are emitted verbatim
fn encode_ext(record: &Record) -> EncodedReply {
    let body = match record.get(ext_fields::RS_BODY) {
        Some(FieldValue::Bytes(b)) => b.clone(),
        Some(FieldValue::Str(s)) => Bytes::from(s.clone().into_bytes()),
        _ => Bytes::new(),
    };
    let content_type = record
        .get(ext_fields::RS_CONTENT_TYPE)
        .and_then(FieldValue::as_str)
        .unwrap_or("application/octet-stream")
        .to_string();
    EncodedReply { body, content_type }
}

fn field_to_json(field: &FieldValue) -> Value {
    match field {
        FieldValue::Str(s) => Value::String(s.clone()),
        FieldValue::Long(n) => Value::Number((*n).into()),
        FieldValue::Double(d) => serde_json::Number::from_f64(*d)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        FieldValue::Bool(b) => Value::Bool(*b),
        FieldValue::Bytes(b) => Value::String(BASE64.encode(b)),
        FieldValue::Json(v) => v.clone(),
    }
}

fn kind_mismatch(expected: &str, got: &TypedBuffer) -> CodecError {
    CodecError::encode(format!("expected {expected} reply, got {}", got.kind()))
}
