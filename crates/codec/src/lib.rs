//! Restin Codec
//!
//! Converts between the HTTP wire payload and the typed buffer a backend
//! service expects, per route conversion mode:
//!
//! | conv | request | reply |
//! |---|---|---|
//! | `json-record` | JSON object → record occurrences | record → JSON object |
//! | `text` | body → string buffer | string → `text/plain` |
//! | `raw` | body → byte buffer | bytes → `application/octet-stream` |
//! | `json` | JSON kept as bytes | JSON bytes verbatim |
//! | `json-view` | single-key object → typed view | view → single-key object |
//! | `ext` | opaque record (`rq_*` fields) | `rs_body` / `rs_content_type` |
//!
//! Static routes never reach the codec - the router delegates them straight
//! to the file server.
//!
//! Malformed request bodies map to the backend's invalid-input code so the
//! per-route error map decides the HTTP status.

mod decode;
mod encode;
mod error;
mod request;

pub use decode::decode;
pub use encode::{encode, encode_json_value, EncodedReply};
pub use error::{CodecError, Result};
pub use request::RequestParts;

/// Request field names of the opaque ext record
pub mod ext_fields {
    /// HTTP method
    pub const RQ_METHOD: &str = "rq_method";
    /// Request path
    pub const RQ_URL: &str = "rq_url";
    /// Raw request body
    pub const RQ_BODY: &str = "rq_body";
    /// Parsed urlencoded form (JSON object)
    pub const RQ_FORM: &str = "rq_form";
    /// Request headers (JSON object)
    pub const RQ_HEADERS: &str = "rq_headers";
    /// Request cookies (JSON object)
    pub const RQ_COOKIES: &str = "rq_cookies";
    /// Uploaded file spool path (one occurrence per file)
    pub const RQ_FILE_PATH: &str = "rq_file_path";
    /// Uploaded file original name (aligned with `RQ_FILE_PATH`)
    pub const RQ_FILE_NAME: &str = "rq_file_name";
    /// Form field the upload arrived under (aligned with `RQ_FILE_PATH`)
    pub const RQ_FILE_FORM: &str = "rq_file_form";

    /// Reply body
    pub const RS_BODY: &str = "rs_body";
    /// Reply content type
    pub const RS_CONTENT_TYPE: &str = "rs_content_type";

    /// Error code injected for error-handler chains
    pub const ERR_CODE: &str = "err_code";
    /// Error message injected for error-handler chains
    pub const ERR_MESSAGE: &str = "err_message";
    /// Error source marker: "F" filter, "S" service, "R" gateway
    pub const ERR_SOURCE: &str = "err_source";
}

#[cfg(test)]
#[path = "decode_test.rs"]
mod decode_test;
#[cfg(test)]
#[path = "encode_test.rs"]
mod encode_test;
