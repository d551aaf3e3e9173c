//! Response shaping
//!
//! Turns a dispatch outcome (success or backend failure, plus the final
//! buffer) into the HTTP reply. The status always comes from the route's
//! error map; the body depends on the route's error-reporting mode.

use axum::body::Body;
use axum::http::{header, Response, StatusCode};
use bytes::Bytes;
use restin_codec::{encode, encode_json_value, EncodedReply};
use restin_config::ErrorsMode;
use restin_protocol::{TpError, TypedBuffer, ViewBuffer, ViewRegistry};
use restin_routing::Route;
use serde_json::Value;

/// Result of one dispatched request, before shaping
#[derive(Debug)]
pub(crate) struct Outcome {
    /// Backend error code; 0 is success
    pub code: i32,
    /// Failure message (empty on success)
    pub message: String,
    /// The buffer to encode, when one exists
    pub buffer: Option<TypedBuffer>,
    /// Unrecoverable internal failure: plain 500, no mapping, no framing
    pub fatal: bool,
}

impl Outcome {
    /// Successful call with a reply buffer
    pub fn success(buffer: TypedBuffer) -> Self {
        Self {
            code: 0,
            message: String::new(),
            buffer: Some(buffer),
            fatal: false,
        }
    }

    /// Successful async submit; `echo` carries the request when configured
    pub fn ack(echo: Option<TypedBuffer>) -> Self {
        Self {
            code: 0,
            message: String::new(),
            buffer: echo,
            fatal: false,
        }
    }

    /// Backend or decode failure, optionally with a reply buffer
    pub fn failure(error: TpError, buffer: Option<TypedBuffer>) -> Self {
        Self {
            code: error.code,
            message: error.message,
            buffer,
            fatal: false,
        }
    }

    /// Unrecoverable internal failure
    pub fn fatal() -> Self {
        Self {
            code: 0,
            message: String::new(),
            buffer: None,
            fatal: true,
        }
    }

    #[inline]
    fn is_success(&self) -> bool {
        self.code == 0
    }
}

/// Shape an outcome into the HTTP response
pub(crate) fn shape(route: &Route, views: &ViewRegistry, outcome: Outcome) -> Response<Body> {
    if outcome.fatal {
        return internal_error();
    }

    let status = route.status_for(outcome.code);
    let success = outcome.is_success();

    // Download pass-through: a successful reply leaves untouched
    if route.stream && success {
        return match encode_optional(route, outcome.buffer.as_ref()) {
            Ok(reply) => respond(status, reply),
            Err(_) => internal_error(),
        };
    }

    let shaped = match route.errors {
        ErrorsMode::Http => {
            if success {
                encode_optional(route, outcome.buffer.as_ref())
            } else {
                Ok(EncodedReply::empty())
            }
        }
        ErrorsMode::Text | ErrorsMode::Raw => shape_text(route, &outcome, success),
        ErrorsMode::Json => shape_json(route, &outcome, success),
        ErrorsMode::JsonRecord => shape_record(route, outcome, success),
        ErrorsMode::JsonView => shape_view(route, views, outcome, success),
        // Ext buffers (often produced by an error chain) are emitted verbatim
        ErrorsMode::Ext => encode_optional(route, outcome.buffer.as_ref()),
    };

    match shaped {
        Ok(reply) => respond(status, reply),
        Err(err) => {
            tracing::error!(url = %route.url, error = %err, "reply encoding failed");
            internal_error()
        }
    }
}

/// Encode the buffer, or produce an empty reply when there is none
fn encode_optional(
    route: &Route,
    buffer: Option<&TypedBuffer>,
) -> Result<EncodedReply, restin_codec::CodecError> {
    match buffer {
        Some(buffer) => encode(route, buffer),
        None => Ok(EncodedReply::empty()),
    }
}

/// text / raw: the template frames failures, successes pass through
fn shape_text(
    route: &Route,
    outcome: &Outcome,
    success: bool,
) -> Result<EncodedReply, restin_codec::CodecError> {
    if success {
        return encode_optional(route, outcome.buffer.as_ref());
    }

    let body = route
        .errfmt_text
        .replace("%d", &outcome.code.to_string())
        .replace("%s", &outcome.message);
    let content_type = if route.errors == ErrorsMode::Raw {
        "application/octet-stream"
    } else {
        "text/plain"
    };
    Ok(EncodedReply {
        body: Bytes::from(body.into_bytes()),
        content_type: content_type.to_string(),
    })
}

/// json: merge the error fields into the top-level reply object
fn shape_json(
    route: &Route,
    outcome: &Outcome,
    success: bool,
) -> Result<EncodedReply, restin_codec::CodecError> {
    let mut value = match outcome.buffer.as_ref() {
        Some(buffer) => encode_json_value(route, buffer)?,
        None => Value::Object(serde_json::Map::new()),
    };

    // A non-object reply still has to carry the error fields somewhere
    if !value.is_object() {
        let mut wrapper = serde_json::Map::new();
        wrapper.insert("response".to_string(), value);
        value = Value::Object(wrapper);
    }

    if !success || route.errfmt_json_onsucc {
        let fragment = format!(
            "{{{},{}}}",
            apply_template(&route.errfmt_json_code, outcome.code, &outcome.message),
            apply_template(&route.errfmt_json_msg, outcome.code, &outcome.message),
        );
        let fields: Value = serde_json::from_str(&fragment).map_err(|e| {
            restin_codec::CodecError::encode(format!("bad error format templates: {e}"))
        })?;

        let Value::Object(fields) = fields else {
            return Err(restin_codec::CodecError::encode(
                "error format templates do not form an object",
            ));
        };
        if let Value::Object(target) = &mut value {
            for (key, field) in fields {
                target.insert(key, field);
            }
        }
    }

    let body =
        serde_json::to_vec(&value).map_err(|e| restin_codec::CodecError::encode(e.to_string()))?;
    Ok(EncodedReply {
        body: Bytes::from(body),
        content_type: "application/json".to_string(),
    })
}

/// json-record: install the error fields into the reply record
fn shape_record(
    route: &Route,
    outcome: Outcome,
    success: bool,
) -> Result<EncodedReply, restin_codec::CodecError> {
    let mut buffer = outcome
        .buffer
        .unwrap_or_else(|| TypedBuffer::Record(restin_protocol::Record::new()));

    if !success || route.errfmt_json_onsucc {
        let Some(record) = buffer.as_record_mut() else {
            return Err(restin_codec::CodecError::encode(format!(
                "json-record errors need a record reply, got {}",
                buffer.kind()
            )));
        };
        record.set("error_code", outcome.code as i64);
        record.set("error_message", outcome.message.as_str());
    }

    encode(route, &buffer)
}

/// json-view: install the error fields into the reply view, synthesizing
/// the configured response view when the reply cannot carry them
fn shape_view(
    route: &Route,
    views: &ViewRegistry,
    outcome: Outcome,
    success: bool,
) -> Result<EncodedReply, restin_codec::CodecError> {
    let emit = !success || route.errfmt_view_onsucc;
    let reply_view = outcome.buffer.as_ref().and_then(TypedBuffer::as_view);

    if !emit {
        return encode_optional(route, outcome.buffer.as_ref());
    }

    let can_carry = reply_view
        .map(|view| {
            !route.errfmt_view_msg.is_empty()
                && !route.errfmt_view_code.is_empty()
                && view.has_field(&route.errfmt_view_msg)
                && view.has_field(&route.errfmt_view_code)
        })
        .unwrap_or(false);

    if can_carry && !route.errfmt_view_rsp_first {
        let mut view = reply_view.cloned().expect("carrying view present");
        install_view_error(route, &mut view, &outcome);
        return encode(route, &TypedBuffer::View(view));
    }

    if route.errfmt_view_rsp.is_empty() {
        // Nowhere to put the error; emit the reply unannotated
        tracing::warn!(url = %route.url, "reply view cannot carry the error fields");
        return encode_optional(route, outcome.buffer.as_ref());
    }

    let schema = views.get(&route.errfmt_view_rsp).ok_or_else(|| {
        restin_codec::CodecError::encode(format!(
            "response view '{}' is not defined",
            route.errfmt_view_rsp
        ))
    })?;
    let mut view = ViewBuffer::new(std::sync::Arc::clone(schema));
    install_view_error(route, &mut view, &outcome);
    encode(route, &TypedBuffer::View(view))
}

fn install_view_error(route: &Route, view: &mut ViewBuffer, outcome: &Outcome) {
    if !route.errfmt_view_code.is_empty()
        && view
            .set(&route.errfmt_view_code, Value::Number(outcome.code.into()))
            .is_err()
    {
        tracing::warn!(field = %route.errfmt_view_code, "view error-code field rejected value");
    }
    if !route.errfmt_view_msg.is_empty()
        && view
            .set(&route.errfmt_view_msg, Value::String(outcome.message.clone()))
            .is_err()
    {
        tracing::warn!(field = %route.errfmt_view_msg, "view error-message field rejected value");
    }
}

/// Substitute `%d` with the code and `%s` with the JSON-escaped message
/// (the templates splice into a JSON object)
fn apply_template(template: &str, code: i32, message: &str) -> String {
    let escaped = serde_json::to_string(message).unwrap_or_default();
    let escaped = escaped.trim_matches('"');
    template
        .replace("%d", &code.to_string())
        .replace("%s", escaped)
}

fn respond(status: u16, reply: EncodedReply) -> Response<Body> {
    let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let mut builder = Response::builder().status(status);
    if !reply.body.is_empty() {
        builder = builder.header(header::CONTENT_TYPE, reply.content_type);
    }
    builder
        .body(Body::from(reply.body))
        .unwrap_or_else(|_| internal_error())
}

/// Minimal generic 500
fn internal_error() -> Response<Body> {
    Response::builder()
        .status(StatusCode::INTERNAL_SERVER_ERROR)
        .body(Body::from("internal error"))
        .expect("static response")
}
