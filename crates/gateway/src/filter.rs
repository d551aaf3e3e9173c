//! Filter-service chains
//!
//! Ext routes run ordered chains of backend filter services around the
//! primary call. The buffer threads through every stage: the output of
//! stage N is the input of stage N+1.
//!
//! - mandatory chains fail the pipeline on the first error
//! - optional chains log and skip a failing stage, keeping the buffer
//! - error chains receive the failing buffer with the error injected and
//!   produce the response; a failure inside one is fatal for the request

use restin_codec::ext_fields;
use restin_protocol::{CallOptions, ClientContext, TpError, TypedBuffer};

/// Where a failure originated, injected for error-handler chains
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrSource {
    /// A filter-chain service failed
    Filter,
    /// The primary service failed
    Service,
    /// The gateway itself failed
    Gateway,
}

impl ErrSource {
    /// One-letter wire marker
    pub fn marker(self) -> &'static str {
        match self {
            Self::Filter => "F",
            Self::Service => "S",
            Self::Gateway => "R",
        }
    }
}

/// A mandatory-chain failure: the code and the buffer at the failing stage
#[derive(Debug)]
pub struct ChainFailure {
    /// Backend error code of the failing stage
    pub code: i32,
    /// Failure message
    pub message: String,
    /// The failing service's reply buffer, or the stage's input when the
    /// failure carried none
    pub buffer: TypedBuffer,
}

/// Run a mandatory chain; the first failure aborts
pub async fn run_mandatory(
    ctx: &mut dyn ClientContext,
    chain: &[String],
    mut buffer: TypedBuffer,
    options: CallOptions,
) -> Result<TypedBuffer, ChainFailure> {
    for service in chain {
        match ctx.call(service, buffer.clone(), options).await {
            Ok(next) => buffer = next,
            Err(err) => {
                tracing::warn!(service = %service, code = err.code(), "mandatory filter failed");
                return Err(ChainFailure {
                    code: err.code(),
                    message: err.error.message.clone(),
                    buffer: err.reply.unwrap_or(buffer),
                });
            }
        }
    }
    Ok(buffer)
}

/// Run an optional chain; failing stages are skipped
pub async fn run_optional(
    ctx: &mut dyn ClientContext,
    chain: &[String],
    mut buffer: TypedBuffer,
    options: CallOptions,
) -> TypedBuffer {
    for service in chain {
        match ctx.call(service, buffer.clone(), options).await {
            Ok(next) => buffer = next,
            Err(err) => {
                tracing::warn!(
                    service = %service,
                    code = err.code(),
                    "optional filter failed, skipping"
                );
            }
        }
    }
    buffer
}

/// Run an error-handler chain over the failing buffer
///
/// The original failure's code, message and source are installed into the
/// buffer first. An empty chain passes the annotated buffer through; any
/// stage failure is fatal (the request surfaces as HTTP 500).
pub async fn run_error_chain(
    ctx: &mut dyn ClientContext,
    chain: &[String],
    buffer: TypedBuffer,
    code: i32,
    message: &str,
    source: ErrSource,
    options: CallOptions,
) -> Result<TypedBuffer, TpError> {
    let mut buffer = inject_error(buffer, code, message, source);

    for service in chain {
        buffer = ctx
            .call(service, buffer, options)
            .await
            .map_err(|err| {
                tracing::error!(service = %service, code = err.code(), "error-chain service failed");
                TpError::system(format!("error handler '{service}' failed: {}", err.error))
            })?;
    }
    Ok(buffer)
}

/// Install the error fields into a record buffer
fn inject_error(mut buffer: TypedBuffer, code: i32, message: &str, source: ErrSource) -> TypedBuffer {
    if let Some(record) = buffer.as_record_mut() {
        record.set(ext_fields::ERR_CODE, code as i64);
        record.set(ext_fields::ERR_MESSAGE, message);
        record.set(ext_fields::ERR_SOURCE, source.marker());
    }
    buffer
}
