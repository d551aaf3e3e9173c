//! Per-request dispatch
//!
//! Drives one request through its states: lease a worker context, decode
//! the payload, run the incoming filters, invoke the primary service
//! (blocking, fire-and-forget or echo), run the outgoing filters, then hand
//! the outcome to the response shaper. Exactly one HTTP reply is written
//! per request.

use std::sync::Arc;

use axum::body::Body;
use axum::extract::Request;
use axum::http::Response;
use axum::response::IntoResponse;
use restin_codec::{decode, ext_fields, RequestParts};
use restin_config::ConvMode;
use restin_protocol::{CallOptions, ErrorCode, Record, TpError, TypedBuffer};
use restin_routing::Route;

use crate::filter::{self, ErrSource};
use crate::pool::Lease;
use crate::shape::{shape, Outcome};
use crate::upload::{self, UploadBatch};
use crate::Gateway;

/// Largest request body the gateway accepts
pub(crate) const BODY_LIMIT: usize = 64 * 1024 * 1024;

/// Handle one non-static request end to end
pub(crate) async fn handle_route(
    gateway: &Gateway,
    route: &Arc<Route>,
    req: Request,
) -> Response<Body> {
    // Ingest the body (or spool the multipart upload) before taking a slot,
    // so slow clients do not hold a worker context
    let (parts, upload) = match ingest(route, req).await {
        Ok(prepared) => prepared,
        Err(error) => return shape(route, gateway.views(), Outcome::failure(error, None)),
    };

    let mut lease = match gateway.pool().acquire().await {
        Ok(lease) => lease,
        Err(error) => {
            tracing::error!(error = %error, "worker pool unavailable");
            return shape(route, gateway.views(), Outcome::fatal());
        }
    };

    tracing::debug!(url = %route.url, slot = lease.nr(), "request dispatched");
    let outcome = process(gateway, route, &mut lease, parts, upload.as_ref()).await;
    drop(lease);

    shape(route, gateway.views(), outcome)
}

/// Read the request into codec form
async fn ingest(
    route: &Route,
    req: Request,
) -> Result<(RequestParts, Option<UploadBatch>), TpError> {
    let method = req.method().as_str().to_string();
    let path = req.uri().path().to_string();
    let headers = req
        .headers()
        .iter()
        .map(|(name, value)| {
            (
                name.as_str().to_ascii_lowercase(),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            )
        })
        .collect();

    if route.file_upload {
        let batch = upload::spool(req, &route.temp_dir).await?;
        let parts = RequestParts {
            method,
            path,
            headers,
            body: bytes::Bytes::new(),
        };
        return Ok((parts, Some(batch)));
    }

    let body = axum::body::to_bytes(req.into_body(), BODY_LIMIT)
        .await
        .map_err(|_| TpError::new(ErrorCode::Limit, "request body too large"))?;

    Ok((
        RequestParts {
            method,
            path,
            headers,
            body,
        },
        None,
    ))
}

/// The state machine proper: decode → pre-filters → call → post-filters
async fn process(
    gateway: &Gateway,
    route: &Route,
    lease: &mut Lease,
    parts: RequestParts,
    upload: Option<&UploadBatch>,
) -> Outcome {
    let options = CallOptions {
        no_timeout: route.notime,
        timeout: None,
    };
    let ext = route.conv == ConvMode::Ext;

    // Decode
    let mut buffer = match decode(route, gateway.views(), &parts) {
        Ok(buffer) => buffer,
        Err(err) => {
            tracing::debug!(url = %route.url, error = %err, "request decode failed");
            let error = err.as_tp_error();
            if ext {
                // Incoming failure: the error chain still owns the response
                return error_chain_outcome(
                    lease,
                    &route.finerr,
                    TypedBuffer::Record(Record::new()),
                    error.code,
                    error.message,
                    ErrSource::Gateway,
                    options,
                )
                .await;
            }
            return Outcome::failure(error, None);
        }
    };
    if let Some(batch) = upload {
        upload::install(&mut buffer, batch);
    }

    // Request logging is fire-and-forget; a submit failure never fails the request
    if !route.reqlogsvc.is_empty() {
        if let Err(err) = lease
            .context()
            .acall(&route.reqlogsvc, buffer.clone(), options)
            .await
        {
            tracing::warn!(service = %route.reqlogsvc, error = %err, "request log submit failed");
        }
    }

    // Incoming filters
    if ext {
        match filter::run_mandatory(lease.context(), &route.finman, buffer, options).await {
            Ok(next) => buffer = next,
            Err(fail) => {
                return error_chain_outcome(
                    lease,
                    &route.finerr,
                    fail.buffer,
                    fail.code,
                    fail.message,
                    ErrSource::Filter,
                    options,
                )
                .await;
            }
        }
        buffer = filter::run_optional(lease.context(), &route.finopt, buffer, options).await;
    }

    // Primary call. A configured service wins over echo.
    if route.service.is_empty() {
        if route.echo {
            return Outcome::success(buffer);
        }
        // Validated ext routes may run on their filter chains alone
        return finish(route, lease, buffer, options).await;
    }

    if route.async_call {
        return match lease
            .context()
            .acall(&route.service, buffer.clone(), options)
            .await
        {
            Ok(()) => {
                tracing::debug!(service = %route.service, "async submit accepted");
                Outcome::ack(route.async_echo.then_some(buffer))
            }
            Err(err) => {
                if ext {
                    error_chain_outcome(
                        lease,
                        &route.fouterr,
                        err.reply.unwrap_or(buffer),
                        err.error.code,
                        err.error.message,
                        ErrSource::Service,
                        options,
                    )
                    .await
                } else {
                    Outcome::failure(err.error, err.reply)
                }
            }
        };
    }

    match lease
        .context()
        .call(&route.service, buffer.clone(), options)
        .await
    {
        Ok(reply) => finish(route, lease, reply, options).await,
        Err(err) => {
            tracing::debug!(service = %route.service, code = err.code(), "backend call failed");
            if ext {
                error_chain_outcome(
                    lease,
                    &route.fouterr,
                    err.reply.unwrap_or(buffer),
                    err.error.code,
                    err.error.message,
                    ErrSource::Service,
                    options,
                )
                .await
            } else {
                Outcome::failure(err.error, err.reply)
            }
        }
    }
}

/// Outgoing filters and reply cleanup
async fn finish(
    route: &Route,
    lease: &mut Lease,
    mut buffer: TypedBuffer,
    options: CallOptions,
) -> Outcome {
    if route.conv == ConvMode::Ext {
        match filter::run_mandatory(lease.context(), &route.foutman, buffer, options).await {
            Ok(next) => buffer = next,
            Err(fail) => {
                // The error path supersedes the primary call's success
                return error_chain_outcome(
                    lease,
                    &route.fouterr,
                    fail.buffer,
                    fail.code,
                    fail.message,
                    ErrSource::Filter,
                    options,
                )
                .await;
            }
        }
        buffer = filter::run_optional(lease.context(), &route.foutopt, buffer, options).await;
    }

    if route.no_req_file_in_resp {
        if let Some(record) = buffer.as_record_mut() {
            record.remove(ext_fields::RQ_FILE_PATH);
            record.remove(ext_fields::RQ_FILE_NAME);
            record.remove(ext_fields::RQ_FILE_FORM);
        }
    }

    Outcome::success(buffer)
}

/// Run an error chain; its output becomes the response with the original
/// failure's status. A failure inside the chain is fatal.
async fn error_chain_outcome(
    lease: &mut Lease,
    chain: &[String],
    buffer: TypedBuffer,
    code: i32,
    message: String,
    source: ErrSource,
    options: CallOptions,
) -> Outcome {
    match filter::run_error_chain(lease.context(), chain, buffer, code, &message, source, options)
        .await
    {
        Ok(buffer) => Outcome {
            code,
            message,
            buffer: Some(buffer),
            fatal: false,
        },
        Err(_) => Outcome::fatal(),
    }
}

/// 404 for unmatched paths; route errors never reach here
pub(crate) fn not_found() -> Response<Body> {
    axum::http::StatusCode::NOT_FOUND.into_response()
}
