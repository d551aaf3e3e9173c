//! Per-route configuration
//!
//! `RouteConfig` is the JSON shape of one route (and of the `defaults`
//! prototype). A route value never stands alone: it is always an overlay of
//! the prototype, applied key by key on the serialized form.
//!
//! Legacy key spellings from earlier gateway generations are accepted as
//! serde aliases.

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

/// Default JSON error-message template (`%s` = message)
pub const ERRFMT_JSON_MSG_DEFAULT: &str = "\"error_message\":\"%s\"";
/// Default JSON error-code template (`%d` = code)
pub const ERRFMT_JSON_CODE_DEFAULT: &str = "\"error_code\":%d";
/// Default text error template
pub const ERRFMT_TEXT_DEFAULT: &str = "%d: %s";

/// One route definition as configured
///
/// Mode strings are kept verbatim here; `restin-routing` resolves them into
/// enums when the route is compiled.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RouteConfig {
    /// Backend service to invoke
    #[serde(alias = "svc")]
    pub service: String,

    /// Error-reporting mode
    pub errors: String,

    /// Disable the call timeout
    pub notime: bool,

    /// Text-mode error template (`%d` code, `%s` message)
    pub errfmt_text: String,
    /// JSON-mode message template (expects `%s`)
    pub errfmt_json_msg: String,
    /// JSON-mode code template (expects `%d`)
    pub errfmt_json_code: String,
    /// Emit the JSON error fields on success too
    pub errfmt_json_onsucc: bool,

    /// View field receiving the error message
    pub errfmt_view_msg: String,
    /// View field receiving the error code
    pub errfmt_view_code: String,
    /// Emit the view error fields on success too
    pub errfmt_view_onsucc: bool,
    /// Fallback response view when the reply lacks the error fields
    pub errfmt_view_rsp: String,
    /// Always wrap errors in the fallback response view
    pub errfmt_view_rsp_first: bool,

    /// Emit only non-null view fields in responses
    pub view_notnull: bool,
    /// Flags forwarded to the view serializer
    pub view_flags: i64,

    /// Use fire-and-forget submission
    #[serde(rename = "async")]
    pub async_call: bool,
    /// Echo the request payload back after an async submit
    #[serde(alias = "asyncecho")]
    pub async_echo: bool,

    /// Payload conversion mode
    pub conv: String,

    /// Request-logging service, invoked with the pre-call buffer
    pub reqlogsvc: String,

    /// Backend code → HTTP status pairs, e.g. `"0:200, 13:504, *:500"`
    #[serde(alias = "errors_fmt_http_map")]
    pub error_map: String,

    /// Strip uploaded-file fields from the reply buffer
    #[serde(alias = "noreqfilersp")]
    pub no_req_file_in_resp: bool,

    /// Return the decoded request as the reply (no backend call)
    pub echo: bool,

    /// URL match format: "exact" (default) or "regex"/"r"
    pub format: String,

    /// Record/JSON field receiving the request URL
    #[serde(alias = "urlfield")]
    pub url_field: String,

    /// Parse request headers into the buffer
    #[serde(alias = "parseheaders")]
    pub parse_headers: bool,
    /// Parse request cookies into the buffer (requires `parse_headers`)
    #[serde(alias = "parsecookies")]
    pub parse_cookies: bool,
    /// Parse an urlencoded form body into the buffer (ext only)
    #[serde(alias = "parseform")]
    pub parse_form: bool,
    /// Accept multipart file uploads (ext only)
    #[serde(alias = "fileupload")]
    pub file_upload: bool,
    /// Spool directory for uploads (defaults to the OS temp dir)
    #[serde(alias = "tempdir")]
    pub temp_dir: String,
    /// JSON field receiving the parsed cookies
    pub json_cookie_field: String,
    /// JSON field receiving the parsed headers
    pub json_header_field: String,

    /// Mandatory incoming filter services (comma separated)
    pub finman: String,
    /// Optional incoming filter services
    pub finopt: String,
    /// Incoming error-handler services
    pub finerr: String,
    /// Mandatory outgoing filter services
    pub foutman: String,
    /// Optional outgoing filter services
    pub foutopt: String,
    /// Outgoing error-handler services
    pub fouterr: String,

    /// Directory served by a static route
    #[serde(alias = "staticdir")]
    pub static_dir: String,

    /// Download pass-through: emit the success reply without error framing
    pub stream: bool,
}

impl Default for RouteConfig {
    fn default() -> Self {
        Self {
            service: String::new(),
            errors: "json".to_string(),
            notime: false,
            errfmt_text: ERRFMT_TEXT_DEFAULT.to_string(),
            errfmt_json_msg: ERRFMT_JSON_MSG_DEFAULT.to_string(),
            errfmt_json_code: ERRFMT_JSON_CODE_DEFAULT.to_string(),
            errfmt_json_onsucc: true,
            errfmt_view_msg: String::new(),
            errfmt_view_code: String::new(),
            errfmt_view_onsucc: true,
            errfmt_view_rsp: String::new(),
            errfmt_view_rsp_first: false,
            view_notnull: false,
            view_flags: 0,
            async_call: false,
            async_echo: false,
            conv: "json-record".to_string(),
            reqlogsvc: String::new(),
            error_map: String::new(),
            no_req_file_in_resp: false,
            echo: false,
            format: String::new(),
            url_field: String::new(),
            parse_headers: false,
            parse_cookies: false,
            parse_form: false,
            file_upload: false,
            temp_dir: String::new(),
            json_cookie_field: String::new(),
            json_header_field: String::new(),
            finman: String::new(),
            finopt: String::new(),
            finerr: String::new(),
            foutman: String::new(),
            foutopt: String::new(),
            fouterr: String::new(),
            static_dir: String::new(),
            stream: false,
        }
    }
}

impl RouteConfig {
    /// Overlay a JSON route value on this prototype
    ///
    /// Keys present in `json` replace the prototype's values; everything
    /// else is inherited unchanged.
    pub fn overlay(&self, key: &str, json: &str) -> Result<Self> {
        let mut base =
            serde_json::to_value(self).map_err(|e| ConfigError::parse(key.to_string(), e))?;
        let patch: serde_json::Value =
            serde_json::from_str(json).map_err(|e| ConfigError::parse(key.to_string(), e))?;

        let serde_json::Value::Object(patch) = patch else {
            return Err(ConfigError::invalid_key(key, "route value must be a JSON object"));
        };
        let serde_json::Value::Object(ref mut target) = base else {
            unreachable!("RouteConfig serializes to an object");
        };
        for (k, v) in patch {
            // Legacy spellings must land on the canonical key, or the merged
            // object would carry both and fail deserialization.
            target.insert(canonical_key(&k).to_string(), v);
        }

        serde_json::from_value(base).map_err(|e| ConfigError::parse(key.to_string(), e))
    }

    /// Split a comma-separated filter chain into service names
    pub fn chain(raw: &str) -> Vec<String> {
        split_chain(raw)
    }
}

/// Map legacy key spellings to the canonical field names
fn canonical_key(key: &str) -> &str {
    match key {
        "svc" => "service",
        "asyncecho" => "async_echo",
        "errors_fmt_http_map" => "error_map",
        "noreqfilersp" => "no_req_file_in_resp",
        "urlfield" => "url_field",
        "parseheaders" => "parse_headers",
        "parsecookies" => "parse_cookies",
        "parseform" => "parse_form",
        "fileupload" => "file_upload",
        "tempdir" => "temp_dir",
        "staticdir" => "static_dir",
        other => other,
    }
}

fn split_chain(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = RouteConfig::default();
        assert_eq!(cfg.conv, "json-record");
        assert_eq!(cfg.errors, "json");
        assert!(cfg.errfmt_json_onsucc);
        assert_eq!(cfg.errfmt_text, "%d: %s");
        assert!(!cfg.async_call);
    }

    #[test]
    fn test_overlay_preserves_unset_keys() {
        let base = RouteConfig::default()
            .overlay("defaults", r#"{"errors": "text", "notime": true}"#)
            .unwrap();
        let route = base
            .overlay("/svc", r#"{"service": "BANKSVC", "errors": "http"}"#)
            .unwrap();

        assert_eq!(route.service, "BANKSVC");
        assert_eq!(route.errors, "http");
        // Inherited from the prototype, not reset to defaults
        assert!(route.notime);
        assert_eq!(route.conv, "json-record");
    }

    #[test]
    fn test_legacy_aliases() {
        let route = RouteConfig::default()
            .overlay(
                "/legacy",
                r#"{"svc": "OLD", "asyncecho": true, "urlfield": "u",
                    "errors_fmt_http_map": "*:500", "staticdir": "/srv"}"#,
            )
            .unwrap();

        assert_eq!(route.service, "OLD");
        assert!(route.async_echo);
        assert_eq!(route.url_field, "u");
        assert_eq!(route.error_map, "*:500");
        assert_eq!(route.static_dir, "/srv");
    }

    #[test]
    fn test_async_key() {
        let route = RouteConfig::default()
            .overlay("/fire", r#"{"service": "Q", "async": true}"#)
            .unwrap();
        assert!(route.async_call);
    }

    #[test]
    fn test_chain_splitting() {
        assert_eq!(RouteConfig::chain("A, B ,C"), vec!["A", "B", "C"]);
        assert!(RouteConfig::chain("").is_empty());
        assert!(RouteConfig::chain(" , ").is_empty());
    }

    #[test]
    fn test_non_object_overlay_rejected() {
        assert!(RouteConfig::default().overlay("/x", "42").is_err());
        assert!(RouteConfig::default().overlay("/x", "not json").is_err());
    }
}
