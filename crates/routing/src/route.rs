//! Compiled route
//!
//! A `Route` is one validated, fully resolved route definition: mode strings
//! turned into enums, filter chains split, the error map parsed, paths made
//! concrete. Routes are immutable once compiled.

use std::path::PathBuf;
use std::str::FromStr;

use restin_config::{ConvMode, ErrorMap, ErrorsMode, RouteConfig, UrlFormat};

use crate::error::{Result, RoutingError};

/// One compiled route
#[derive(Debug, Clone)]
pub struct Route {
    /// Configured URL pattern
    pub url: String,
    /// Backend service name (may be empty for echo and static routes)
    pub service: String,
    /// Payload conversion mode
    pub conv: ConvMode,
    /// Error-reporting mode
    pub errors: ErrorsMode,
    /// Exact or regex matching
    pub format: UrlFormat,

    /// Disable the backend call timeout
    pub notime: bool,
    /// Fire-and-forget submission
    pub async_call: bool,
    /// Echo the request payload after an async submit
    pub async_echo: bool,
    /// Reply with the decoded request when no service is configured
    pub echo: bool,
    /// Download pass-through (no error framing on success)
    pub stream: bool,

    /// Request-logging service
    pub reqlogsvc: String,

    /// Backend code → HTTP status map
    pub error_map: ErrorMap,

    /// Text-mode error template
    pub errfmt_text: String,
    /// JSON-mode message template
    pub errfmt_json_msg: String,
    /// JSON-mode code template
    pub errfmt_json_code: String,
    /// Emit JSON error fields on success too
    pub errfmt_json_onsucc: bool,

    /// View field receiving the error message
    pub errfmt_view_msg: String,
    /// View field receiving the error code
    pub errfmt_view_code: String,
    /// Emit view error fields on success too
    pub errfmt_view_onsucc: bool,
    /// Fallback response view name
    pub errfmt_view_rsp: String,
    /// Always wrap errors in the fallback response view
    pub errfmt_view_rsp_first: bool,
    /// Emit only non-null view fields
    pub view_notnull: bool,
    /// Flags forwarded to the view serializer
    pub view_flags: i64,

    /// Field receiving the request URL
    pub url_field: String,
    /// Field receiving the parsed cookies
    pub json_cookie_field: String,
    /// Field receiving the parsed headers
    pub json_header_field: String,

    /// Parse request headers into the buffer
    pub parse_headers: bool,
    /// Parse request cookies into the buffer
    pub parse_cookies: bool,
    /// Parse an urlencoded form body (ext)
    pub parse_form: bool,
    /// Accept multipart uploads (ext)
    pub file_upload: bool,
    /// Strip uploaded-file fields from the reply
    pub no_req_file_in_resp: bool,
    /// Upload spool directory
    pub temp_dir: PathBuf,

    /// Served directory for static routes
    pub static_dir: Option<PathBuf>,

    /// Mandatory incoming filter services
    pub finman: Vec<String>,
    /// Optional incoming filter services
    pub finopt: Vec<String>,
    /// Incoming error-handler services
    pub finerr: Vec<String>,
    /// Mandatory outgoing filter services
    pub foutman: Vec<String>,
    /// Optional outgoing filter services
    pub foutopt: Vec<String>,
    /// Outgoing error-handler services
    pub fouterr: Vec<String>,
}

impl Route {
    /// Compile a validated route config
    pub fn compile(url: &str, cfg: &RouteConfig) -> Result<Self> {
        let conv = ConvMode::from_str(&cfg.conv)
            .map_err(|e| RoutingError::invalid(url, e.to_string()))?;
        let errors = ErrorsMode::from_str(&cfg.errors)
            .map_err(|e| RoutingError::invalid(url, e.to_string()))?;
        let format = UrlFormat::from_str(&cfg.format)
            .map_err(|e| RoutingError::invalid(url, e.to_string()))?;

        let error_map = if cfg.error_map.is_empty() {
            ErrorMap::default()
        } else {
            ErrorMap::parse(&cfg.error_map)
                .map_err(|e| RoutingError::invalid(url, e.to_string()))?
        };

        let temp_dir = if cfg.temp_dir.is_empty() {
            std::env::temp_dir()
        } else {
            PathBuf::from(&cfg.temp_dir)
        };

        let static_dir = (conv == ConvMode::Static).then(|| PathBuf::from(&cfg.static_dir));

        Ok(Self {
            url: url.to_string(),
            service: cfg.service.clone(),
            conv,
            errors,
            format,
            notime: cfg.notime,
            async_call: cfg.async_call,
            async_echo: cfg.async_echo,
            echo: cfg.echo,
            stream: cfg.stream,
            reqlogsvc: cfg.reqlogsvc.clone(),
            error_map,
            errfmt_text: cfg.errfmt_text.clone(),
            errfmt_json_msg: cfg.errfmt_json_msg.clone(),
            errfmt_json_code: cfg.errfmt_json_code.clone(),
            errfmt_json_onsucc: cfg.errfmt_json_onsucc,
            errfmt_view_msg: cfg.errfmt_view_msg.clone(),
            errfmt_view_code: cfg.errfmt_view_code.clone(),
            errfmt_view_onsucc: cfg.errfmt_view_onsucc,
            errfmt_view_rsp: cfg.errfmt_view_rsp.clone(),
            errfmt_view_rsp_first: cfg.errfmt_view_rsp_first,
            view_notnull: cfg.view_notnull,
            view_flags: cfg.view_flags,
            url_field: cfg.url_field.clone(),
            json_cookie_field: cfg.json_cookie_field.clone(),
            json_header_field: cfg.json_header_field.clone(),
            parse_headers: cfg.parse_headers,
            parse_cookies: cfg.parse_cookies,
            parse_form: cfg.parse_form,
            file_upload: cfg.file_upload,
            no_req_file_in_resp: cfg.no_req_file_in_resp,
            temp_dir,
            static_dir,
            finman: RouteConfig::chain(&cfg.finman),
            finopt: RouteConfig::chain(&cfg.finopt),
            finerr: RouteConfig::chain(&cfg.finerr),
            foutman: RouteConfig::chain(&cfg.foutman),
            foutopt: RouteConfig::chain(&cfg.foutopt),
            fouterr: RouteConfig::chain(&cfg.fouterr),
        })
    }

    /// Check whether this route delegates to the static file server
    #[inline]
    pub fn is_static(&self) -> bool {
        self.conv == ConvMode::Static
    }

    /// HTTP status for a backend error code on this route
    #[inline]
    pub fn status_for(&self, code: i32) -> u16 {
        self.error_map.status_for(code)
    }
}
