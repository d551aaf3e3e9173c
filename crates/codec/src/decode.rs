//! Request body → typed buffer

use restin_config::ConvMode;
use restin_protocol::{FieldValue, Record, TypedBuffer, ViewBuffer, ViewRegistry};
use restin_routing::Route;
use serde_json::Value;

use crate::error::{CodecError, Result};
use crate::ext_fields;
use crate::request::RequestParts;

/// Decode the request payload into the buffer for the backend call
///
/// File-upload routes add their `rq_file_*` occurrences on top of the ext
/// record after multipart spooling; everything else happens here.
pub fn decode(route: &Route, views: &ViewRegistry, req: &RequestParts) -> Result<TypedBuffer> {
    match route.conv {
        ConvMode::JsonRecord => decode_json_record(route, req),
        ConvMode::Text => {
            let text = String::from_utf8(req.body.to_vec())
                .map_err(|_| CodecError::bad_input("body is not valid UTF-8"))?;
            Ok(TypedBuffer::Str(text))
        }
        ConvMode::Raw => Ok(TypedBuffer::Bytes(req.body.clone())),
        ConvMode::Json => decode_json(route, req),
        ConvMode::JsonView => {
            let root = parse_json(&req.body)?;
            let view = ViewBuffer::from_json(views, &root)?;
            Ok(TypedBuffer::View(view))
        }
        ConvMode::Ext => decode_ext(route, req),
        ConvMode::Static => Err(CodecError::encode("static routes have no payload codec")),
    }
}

fn parse_json(body: &[u8]) -> Result<Value> {
    serde_json::from_slice(body).map_err(|e| CodecError::bad_input(format!("invalid JSON: {e}")))
}

/// JSON object → record occurrences
///
/// Arrays become repeated occurrences; nested objects travel as JSON field
/// values. An empty body decodes to an empty record so URL-only requests
/// still work.
fn decode_json_record(route: &Route, req: &RequestParts) -> Result<TypedBuffer> {
    let mut record = Record::new();

    if !req.body.is_empty() {
        let root = parse_json(&req.body)?;
        let Value::Object(fields) = root else {
            return Err(CodecError::bad_input("request must be a JSON object"));
        };

        for (name, value) in fields {
            match value {
                Value::Array(items) => {
                    for item in items {
                        record.add(name.as_str(), json_to_field(item));
                    }
                }
                Value::Null => {}
                other => record.add(name.as_str(), json_to_field(other)),
            }
        }
    }

    apply_injections(route, req, |field, value| record.set(field, value));
    Ok(TypedBuffer::Record(record))
}

/// JSON passed through as bytes, with optional URL/cookie/header injection
fn decode_json(route: &Route, req: &RequestParts) -> Result<TypedBuffer> {
    if req.body.is_empty() {
        return Err(CodecError::bad_input("empty body"));
    }
    let root = parse_json(&req.body)?;

    let needs_injection = !route.url_field.is_empty()
        || (route.parse_cookies && !route.json_cookie_field.is_empty())
        || (route.parse_headers && !route.json_header_field.is_empty());
    if !needs_injection {
        return Ok(TypedBuffer::Json(req.body.clone()));
    }

    let Value::Object(mut fields) = root else {
        return Err(CodecError::bad_input("request must be a JSON object"));
    };
    apply_injections(route, req, |field, value| {
        fields.insert(field.to_string(), match value {
            FieldValue::Str(s) => Value::String(s),
            FieldValue::Json(v) => v,
            _ => Value::Null,
        });
    });

    let body = serde_json::to_vec(&Value::Object(fields))
        .map_err(|e| CodecError::encode(e.to_string()))?;
    Ok(TypedBuffer::Json(body.into()))
}

/// Opaque ext record carrying the request wholesale
fn decode_ext(route: &Route, req: &RequestParts) -> Result<TypedBuffer> {
    let mut record = Record::new();
    record.set(ext_fields::RQ_METHOD, req.method.as_str());
    record.set(ext_fields::RQ_URL, req.path.as_str());

    if route.parse_headers {
        record.set(ext_fields::RQ_HEADERS, FieldValue::Json(req.headers_json()));
        if route.parse_cookies {
            record.set(ext_fields::RQ_COOKIES, FieldValue::Json(req.cookies_json()));
        }
    }

    if route.parse_form {
        let form = req
            .form_json()
            .ok_or_else(|| CodecError::bad_input("body is not an urlencoded form"))?;
        record.set(ext_fields::RQ_FORM, FieldValue::Json(form));
    } else if !route.file_upload {
        record.set(ext_fields::RQ_BODY, req.body.clone());
    }
    // file_upload: the multipart spooler fills rq_file_* and form fields

    Ok(TypedBuffer::Record(record))
}

/// Route-configured URL/cookie/header fields for the json family
fn apply_injections<F>(route: &Route, req: &RequestParts, mut install: F)
where
    F: FnMut(&str, FieldValue),
{
    if !route.url_field.is_empty() {
        install(&route.url_field, FieldValue::Str(req.path.clone()));
    }
    if route.parse_cookies && !route.json_cookie_field.is_empty() {
        install(&route.json_cookie_field, FieldValue::Json(req.cookies_json()));
    }
    if route.parse_headers && !route.json_header_field.is_empty() {
        install(&route.json_header_field, FieldValue::Json(req.headers_json()));
    }
}

/// Scalar JSON value → field value
fn json_to_field(value: Value) -> FieldValue {
    match value {
        Value::String(s) => FieldValue::Str(s),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                FieldValue::Long(i)
            } else {
                FieldValue::Double(n.as_f64().unwrap_or(0.0))
            }
        }
        Value::Bool(b) => FieldValue::Bool(b),
        other => FieldValue::Json(other),
    }
}
