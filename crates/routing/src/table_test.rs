//! Tests for route compilation and table resolution

use restin_config::{ConvMode, ErrorsMode, RouteConfig};

use crate::route::Route;
use crate::table::RouteTableBuilder;

fn route(url: &str, overlay: &str) -> Route {
    let cfg = RouteConfig::default().overlay(url, overlay).unwrap();
    Route::compile(url, &cfg).unwrap()
}

#[test]
fn test_compile_resolves_modes_and_chains() {
    let compiled = route(
        "/gate",
        r#"{"service": "GATESVC", "conv": "ext", "errors": "ext",
            "finman": "V1,V2", "finerr": "E1", "notime": true}"#,
    );

    assert_eq!(compiled.conv, ConvMode::Ext);
    assert_eq!(compiled.errors, ErrorsMode::Ext);
    assert_eq!(compiled.finman, vec!["V1", "V2"]);
    assert_eq!(compiled.finerr, vec!["E1"]);
    assert!(compiled.notime);
    assert!(compiled.foutman.is_empty());
}

#[test]
fn test_compile_uses_default_error_map() {
    let compiled = route("/x", r#"{"service": "S"}"#);
    assert_eq!(compiled.status_for(0), 200);
    assert_eq!(compiled.status_for(13), 504);

    let custom = route("/y", r#"{"service": "S", "error_map": "13:599, *:500"}"#);
    assert_eq!(custom.status_for(13), 599);
    assert_eq!(custom.status_for(0), 500);
}

#[test]
fn test_temp_dir_defaults_to_os() {
    let compiled = route("/x", r#"{"service": "S"}"#);
    assert_eq!(compiled.temp_dir, std::env::temp_dir());

    let custom = route("/y", r#"{"service": "S", "temp_dir": "/var/spool/restin"}"#);
    assert_eq!(custom.temp_dir.to_str(), Some("/var/spool/restin"));
}

#[test]
fn test_exact_resolution() {
    let mut builder = RouteTableBuilder::new();
    builder.add(route("/echo", r#"{"service": "ECHOSVC"}"#)).unwrap();
    builder.add(route("/bank", r#"{"service": "BANKSVC"}"#)).unwrap();
    let table = builder.build();

    assert_eq!(table.len(), 2);
    assert_eq!(table.resolve("/echo").unwrap().service, "ECHOSVC");
    assert_eq!(table.resolve("/bank").unwrap().service, "BANKSVC");
    assert!(table.resolve("/missing").is_none());
    // Exact means exact - no prefix semantics
    assert!(table.resolve("/echo/sub").is_none());
}

#[test]
fn test_regex_resolution_in_order() {
    let mut builder = RouteTableBuilder::new();
    builder
        .add(route(
            "^/v1/users/[0-9]+$",
            r#"{"service": "USERSVC", "format": "regex"}"#,
        ))
        .unwrap();
    builder
        .add(route("^/v1/.*$", r#"{"service": "CATCHSVC", "format": "regex"}"#))
        .unwrap();
    let table = builder.build();

    // First matching pattern wins
    assert_eq!(table.resolve("/v1/users/42").unwrap().service, "USERSVC");
    assert_eq!(table.resolve("/v1/orders/9").unwrap().service, "CATCHSVC");
    assert!(table.resolve("/v1/users/abc").is_some()); // catch-all
    assert!(table.resolve("/v2/users/42").is_none());
}

#[test]
fn test_exact_wins_over_regex() {
    let mut builder = RouteTableBuilder::new();
    builder
        .add(route("^/echo.*$", r#"{"service": "REXSVC", "format": "regex"}"#))
        .unwrap();
    builder.add(route("/echo", r#"{"service": "EXACTSVC"}"#)).unwrap();
    let table = builder.build();

    assert_eq!(table.resolve("/echo").unwrap().service, "EXACTSVC");
    assert_eq!(table.resolve("/echo2").unwrap().service, "REXSVC");
}

#[test]
fn test_duplicate_exact_rejected() {
    let mut builder = RouteTableBuilder::new();
    builder.add(route("/echo", r#"{"service": "A"}"#)).unwrap();
    let err = builder.add(route("/echo", r#"{"service": "B"}"#)).unwrap_err();
    assert!(err.to_string().contains("duplicate"));
}

#[test]
fn test_bad_pattern_rejected() {
    let mut builder = RouteTableBuilder::new();
    let err = builder
        .add(route("/users/[0-9", r#"{"service": "S", "format": "regex"}"#))
        .unwrap_err();
    assert!(err.to_string().contains("bad pattern"));
}

#[test]
fn test_static_route_carries_directory() {
    let compiled = route("/s", r#"{"conv": "static", "static_dir": "/var/www"}"#);
    assert!(compiled.is_static());
    assert_eq!(compiled.static_dir.as_deref(), Some(std::path::Path::new("/var/www")));
}
