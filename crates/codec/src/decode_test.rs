//! Tests for request decoding

use bytes::Bytes;
use restin_config::RouteConfig;
use restin_protocol::{FieldValue, TypedBuffer, ViewRegistry};
use restin_routing::Route;
use serde_json::json;

use crate::decode::decode;
use crate::ext_fields;
use crate::request::RequestParts;

fn route(overlay: &str) -> Route {
    let cfg = RouteConfig::default().overlay("/test", overlay).unwrap();
    Route::compile("/test", &cfg).unwrap()
}

fn post(body: &str) -> RequestParts {
    RequestParts {
        method: "POST".into(),
        path: "/test".into(),
        headers: Vec::new(),
        body: Bytes::from(body.to_string()),
    }
}

fn views() -> ViewRegistry {
    ViewRegistry::from_json_str(r#"{"CUSTOMER": {"id": "long", "name": "string"}}"#).unwrap()
}

#[test]
fn test_json_record_scalars_and_arrays() {
    let route = route(r#"{"service": "S"}"#);
    let buf = decode(&route, &views(), &post(r#"{"A": "x", "B": 1, "C": [1, 2, 3]}"#)).unwrap();

    let record = buf.as_record().unwrap();
    assert_eq!(record.get("A").and_then(FieldValue::as_str), Some("x"));
    assert_eq!(record.get("B").and_then(FieldValue::as_long), Some(1));
    assert_eq!(record.occurrences("C").len(), 3);
}

#[test]
fn test_json_record_null_fields_skipped() {
    let route = route(r#"{"service": "S"}"#);
    let buf = decode(&route, &views(), &post(r#"{"A": null, "B": "kept"}"#)).unwrap();
    let record = buf.as_record().unwrap();
    assert!(!record.contains("A"));
    assert!(record.contains("B"));
}

#[test]
fn test_json_record_empty_body_is_empty_record() {
    let route = route(r#"{"service": "S"}"#);
    let buf = decode(&route, &views(), &post("")).unwrap();
    assert!(buf.as_record().unwrap().is_empty());
}

#[test]
fn test_json_record_url_and_header_injection() {
    let route = route(
        r#"{"service": "S", "url_field": "REQ_URL",
            "parse_headers": true, "parse_cookies": true,
            "json_header_field": "REQ_HDR", "json_cookie_field": "REQ_CK"}"#,
    );
    let mut req = post(r#"{"A": "x"}"#);
    req.headers = vec![
        ("host".into(), "gw".into()),
        ("cookie".into(), "sid=s1".into()),
    ];

    let buf = decode(&route, &views(), &req).unwrap();
    let record = buf.as_record().unwrap();
    assert_eq!(record.get("REQ_URL").and_then(FieldValue::as_str), Some("/test"));

    let headers = record.get("REQ_HDR").and_then(FieldValue::as_json).unwrap();
    assert_eq!(headers.get("host"), Some(&json!("gw")));
    let cookies = record.get("REQ_CK").and_then(FieldValue::as_json).unwrap();
    assert_eq!(cookies.get("sid"), Some(&json!("s1")));
}

#[test]
fn test_json_record_rejects_non_object() {
    let route = route(r#"{"service": "S"}"#);
    let err = decode(&route, &views(), &post("[1, 2]")).unwrap_err();
    assert!(err.is_bad_input());

    let err = decode(&route, &views(), &post("{not json")).unwrap_err();
    assert!(err.is_bad_input());
}

#[test]
fn test_text_mode() {
    let route = route(r#"{"service": "S", "conv": "text", "errors": "text"}"#);
    let buf = decode(&route, &views(), &post("hello there")).unwrap();
    match buf {
        TypedBuffer::Str(s) => assert_eq!(s, "hello there"),
        other => panic!("unexpected kind {}", other.kind()),
    }

    let mut bad = post("");
    bad.body = Bytes::from_static(&[0xff, 0xfe]);
    assert!(decode(&route, &views(), &bad).unwrap_err().is_bad_input());
}

#[test]
fn test_raw_mode_passes_bytes() {
    let route = route(r#"{"service": "S", "conv": "raw", "errors": "raw"}"#);
    let mut req = post("");
    req.body = Bytes::from_static(&[0x00, 0x01, 0xff]);

    let buf = decode(&route, &views(), &req).unwrap();
    match buf {
        TypedBuffer::Bytes(b) => assert_eq!(b.as_ref(), &[0x00, 0x01, 0xff]),
        other => panic!("unexpected kind {}", other.kind()),
    }
}

#[test]
fn test_json_mode_passthrough_and_injection() {
    let r = route(r#"{"service": "S", "conv": "json"}"#);
    let buf = decode(&r, &views(), &post(r#"{"q": 1}"#)).unwrap();
    match &buf {
        TypedBuffer::Json(b) => assert_eq!(b.as_ref(), br#"{"q": 1}"#),
        other => panic!("unexpected kind {}", other.kind()),
    }

    let inject = route(r#"{"service": "S", "conv": "json", "url_field": "REQ_URL"}"#);
    let buf = decode(&inject, &views(), &post(r#"{"q": 1}"#)).unwrap();
    let TypedBuffer::Json(b) = buf else { panic!("expected json") };
    let value: serde_json::Value = serde_json::from_slice(&b).unwrap();
    assert_eq!(value.get("REQ_URL"), Some(&json!("/test")));
    assert_eq!(value.get("q"), Some(&json!(1)));
}

#[test]
fn test_json_mode_rejects_empty_and_malformed() {
    let route = route(r#"{"service": "S", "conv": "json"}"#);
    assert!(decode(&route, &views(), &post("")).unwrap_err().is_bad_input());
    assert!(decode(&route, &views(), &post("{")).unwrap_err().is_bad_input());
}

#[test]
fn test_json_view_mode() {
    let route = route(r#"{"service": "S", "conv": "json-view", "errors": "json-view"}"#);
    let buf = decode(&route, &views(), &post(r#"{"CUSTOMER": {"id": 7, "name": "a"}}"#)).unwrap();
    let view = buf.as_view().unwrap();
    assert_eq!(view.name(), "CUSTOMER");
    assert_eq!(view.get("id"), Some(&json!(7)));

    // Unknown view and unknown field are bad input
    assert!(decode(&route, &views(), &post(r#"{"NOPE": {}}"#)).unwrap_err().is_bad_input());
    assert!(
        decode(&route, &views(), &post(r#"{"CUSTOMER": {"ghost": 1}}"#))
            .unwrap_err()
            .is_bad_input()
    );
}

#[test]
fn test_ext_mode_record_layout() {
    let route = route(
        r#"{"service": "S", "conv": "ext", "errors": "ext",
            "parse_headers": true, "parse_cookies": true}"#,
    );
    let mut req = post("payload");
    req.headers = vec![
        ("x-tag".into(), "v".into()),
        ("cookie".into(), "sid=z".into()),
    ];

    let buf = decode(&route, &views(), &req).unwrap();
    let record = buf.as_record().unwrap();
    assert_eq!(
        record.get(ext_fields::RQ_METHOD).and_then(FieldValue::as_str),
        Some("POST")
    );
    assert_eq!(
        record.get(ext_fields::RQ_URL).and_then(FieldValue::as_str),
        Some("/test")
    );
    assert_eq!(
        record
            .get(ext_fields::RQ_BODY)
            .and_then(FieldValue::as_bytes)
            .map(|b| b.as_ref()),
        Some(b"payload".as_ref())
    );
    assert!(record.contains(ext_fields::RQ_HEADERS));
    assert!(record.contains(ext_fields::RQ_COOKIES));
}

#[test]
fn test_ext_form_replaces_body() {
    let route = route(
        r#"{"service": "S", "conv": "ext", "errors": "ext", "parse_form": true}"#,
    );
    let buf = decode(&route, &views(), &post("a=1&b=two")).unwrap();
    let record = buf.as_record().unwrap();

    assert!(!record.contains(ext_fields::RQ_BODY));
    let form = record.get(ext_fields::RQ_FORM).and_then(FieldValue::as_json).unwrap();
    assert_eq!(form.get("a"), Some(&json!("1")));
    assert_eq!(form.get("b"), Some(&json!("two")));
}
