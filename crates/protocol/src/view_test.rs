//! Tests for view schemas, registry and JSON mapping

use serde_json::json;

use crate::view::{ViewBuffer, ViewRegistry, VIEW_NOTNULL};

fn registry() -> ViewRegistry {
    ViewRegistry::from_json_str(
        r#"{
            "CUSTOMER": {
                "id": "long",
                "name": "string",
                "balance": "double",
                "active": "bool"
            },
            "STATUS_RSP": {
                "rsp_code": "long",
                "rsp_message": "string"
            }
        }"#,
    )
    .unwrap()
}

#[test]
fn test_registry_parsing() {
    let reg = registry();
    assert_eq!(reg.len(), 2);
    assert!(reg.get("CUSTOMER").is_some());
    assert!(reg.get("UNKNOWN").is_none());

    let schema = reg.get("CUSTOMER").unwrap();
    assert!(schema.field("balance").is_some());
    assert!(schema.field("nope").is_none());
}

#[test]
fn test_registry_rejects_bad_type() {
    let err = ViewRegistry::from_json_str(r#"{"V": {"f": "decimal"}}"#).unwrap_err();
    assert!(err.message.contains("unknown type"));
}

#[test]
fn test_from_json_round_trip() {
    let reg = registry();
    let root = json!({"CUSTOMER": {"id": 7, "name": "alice", "active": true}});

    let view = ViewBuffer::from_json(&reg, &root).unwrap();
    assert_eq!(view.name(), "CUSTOMER");
    assert_eq!(view.get("id"), Some(&json!(7)));

    // Full emission fills absent fields with null
    let out = view.to_json(false, 0);
    let body = out.get("CUSTOMER").unwrap();
    assert_eq!(body.get("name"), Some(&json!("alice")));
    assert_eq!(body.get("balance"), Some(&json!(null)));
}

#[test]
fn test_notnull_omits_unset_fields() {
    let reg = registry();
    let root = json!({"CUSTOMER": {"id": 7, "balance": 0.0, "name": ""}});
    let view = ViewBuffer::from_json(&reg, &root).unwrap();

    let out = view.to_json(true, 0);
    let body = out.get("CUSTOMER").unwrap().as_object().unwrap();
    assert_eq!(body.len(), 1);
    assert!(body.contains_key("id"));

    // The flags word carries the same switch
    let out = view.to_json(false, VIEW_NOTNULL);
    assert_eq!(out.get("CUSTOMER").unwrap().as_object().unwrap().len(), 1);
}

#[test]
fn test_from_json_rejects_unknown_view() {
    let reg = registry();
    let err = ViewBuffer::from_json(&reg, &json!({"NOPE": {}})).unwrap_err();
    assert!(err.message.contains("unknown view"));
}

#[test]
fn test_from_json_rejects_multi_key_root() {
    let reg = registry();
    let root = json!({"CUSTOMER": {}, "STATUS_RSP": {}});
    assert!(ViewBuffer::from_json(&reg, &root).is_err());
}

#[test]
fn test_from_json_rejects_unknown_field_and_type_mismatch() {
    let reg = registry();
    assert!(ViewBuffer::from_json(&reg, &json!({"CUSTOMER": {"ghost": 1}})).is_err());
    assert!(ViewBuffer::from_json(&reg, &json!({"CUSTOMER": {"id": "text"}})).is_err());
}

#[test]
fn test_set_validates() {
    let reg = registry();
    let schema = reg.get("STATUS_RSP").unwrap();
    let mut view = ViewBuffer::new(std::sync::Arc::clone(schema));

    view.set("rsp_code", json!(13)).unwrap();
    view.set("rsp_message", json!("timeout")).unwrap();
    assert!(view.set("rsp_code", json!("not a number")).is_err());
    assert!(view.set("ghost", json!(1)).is_err());
}
