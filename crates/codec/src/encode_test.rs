//! Tests for reply encoding

use bytes::Bytes;
use restin_config::RouteConfig;
use restin_protocol::{FieldValue, Record, TypedBuffer, ViewBuffer, ViewRegistry};
use restin_routing::Route;
use serde_json::json;

use crate::encode::{encode, encode_json_value, record_to_json};
use crate::ext_fields;

fn route(overlay: &str) -> Route {
    let cfg = RouteConfig::default().overlay("/test", overlay).unwrap();
    Route::compile("/test", &cfg).unwrap()
}

#[test]
fn test_record_to_json_occurrences() {
    let mut record = Record::new();
    record.set("A", "x");
    record.set("B", 1i64);
    record.add("C", 1i64);
    record.add("C", 2i64);
    record.set("D", FieldValue::Double(1.5));
    record.set("E", FieldValue::Json(json!({"nested": true})));

    let value = record_to_json(&record);
    assert_eq!(value.get("A"), Some(&json!("x")));
    assert_eq!(value.get("B"), Some(&json!(1)));
    assert_eq!(value.get("C"), Some(&json!([1, 2])));
    assert_eq!(value.get("D"), Some(&json!(1.5)));
    assert_eq!(value.get("E"), Some(&json!({"nested": true})));
}

#[test]
fn test_bytes_fields_cross_into_json_as_base64() {
    let mut record = Record::new();
    record.set("blob", Bytes::from_static(b"\x00\x01"));

    let value = record_to_json(&record);
    assert_eq!(value.get("blob"), Some(&json!("AAE=")));
}

#[test]
fn test_json_record_reply() {
    let route = route(r#"{"service": "S"}"#);
    let mut record = Record::new();
    record.set("R", "ok");

    let reply = encode(&route, &TypedBuffer::Record(record)).unwrap();
    assert_eq!(reply.content_type, "application/json");
    assert_eq!(reply.body.as_ref(), br#"{"R":"ok"}"#);
}

#[test]
fn test_text_reply() {
    let route = route(r#"{"service": "S", "conv": "text", "errors": "text"}"#);
    let reply = encode(&route, &TypedBuffer::Str("done".into())).unwrap();
    assert_eq!(reply.content_type, "text/plain");
    assert_eq!(reply.body.as_ref(), b"done");

    // A record cannot be rendered as text
    assert!(encode(&route, &TypedBuffer::Record(Record::new())).is_err());
}

#[test]
fn test_raw_reply() {
    let route = route(r#"{"service": "S", "conv": "raw", "errors": "raw"}"#);
    let reply = encode(&route, &TypedBuffer::Bytes(Bytes::from_static(&[1, 2]))).unwrap();
    assert_eq!(reply.content_type, "application/octet-stream");
    assert_eq!(reply.body.as_ref(), &[1, 2]);
}

#[test]
fn test_json_reply_verbatim() {
    let route = route(r#"{"service": "S", "conv": "json"}"#);
    let reply = encode(&route, &TypedBuffer::Json(Bytes::from_static(br#"{"a":1}"#))).unwrap();
    assert_eq!(reply.body.as_ref(), br#"{"a":1}"#);
    assert_eq!(reply.content_type, "application/json");
}

#[test]
fn test_view_reply_respects_notnull() {
    let views =
        ViewRegistry::from_json_str(r#"{"V": {"a": "long", "b": "string"}}"#).unwrap();
    let schema = views.get("V").unwrap();
    let mut view = ViewBuffer::new(std::sync::Arc::clone(schema));
    view.set("a", json!(5)).unwrap();

    let notnull = route(
        r#"{"service": "S", "conv": "json-view", "errors": "json-view", "view_notnull": true}"#,
    );

    let reply = encode(&notnull, &TypedBuffer::View(view)).unwrap();
    let value: serde_json::Value = serde_json::from_slice(&reply.body).unwrap();
    assert_eq!(value, json!({"V": {"a": 5}}));
}

#[test]
fn test_ext_reply_carrier_fields() {
    let route = route(r#"{"service": "S", "conv": "ext", "errors": "ext"}"#);

    let mut record = Record::new();
    record.set(ext_fields::RS_BODY, Bytes::from_static(b"binary"));
    record.set(ext_fields::RS_CONTENT_TYPE, "image/png");

    let reply = encode(&route, &TypedBuffer::Record(record)).unwrap();
    assert_eq!(reply.body.as_ref(), b"binary");
    assert_eq!(reply.content_type, "image/png");

    // No carrier fields: empty octet-stream
    let reply = encode(&route, &TypedBuffer::Record(Record::new())).unwrap();
    assert!(reply.body.is_empty());
    assert_eq!(reply.content_type, "application/octet-stream");
}

#[test]
fn test_encode_json_value_parses_json_buffers() {
    let route = route(r#"{"service": "S", "conv": "json"}"#);
    let value =
        encode_json_value(&route, &TypedBuffer::Json(Bytes::from_static(br#"{"x":2}"#))).unwrap();
    assert_eq!(value, json!({"x": 2}));

    // Garbage from the backend is an encode failure, not bad input
    let err =
        encode_json_value(&route, &TypedBuffer::Json(Bytes::from_static(b"oops"))).unwrap_err();
    assert!(!err.is_bad_input());
}
