//! HTTP server
//!
//! One fallback handler feeds every request through the route table; static
//! routes are delegated to pre-constructed file servers with the first path
//! segment stripped. Serving stops accepting on cancellation and the caller
//! then drains the worker pool.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::{Response, Uri};
use axum::response::IntoResponse;
use axum::Router;
use restin_config::{GatewayConfig, TlsConfig};
use restin_routing::Route;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::dispatch;
use crate::error::BootError;
use crate::Gateway;

/// Pre-built file servers for static routes, keyed by route URL
pub(crate) type StaticServers = HashMap<String, ServeDir>;

/// Shared per-request state
#[derive(Clone)]
struct AppState {
    gateway: Arc<Gateway>,
    statics: Arc<StaticServers>,
}

/// Build the axum router over a gateway
pub fn app(gateway: Arc<Gateway>) -> Router {
    let mut statics = StaticServers::new();
    for route in gateway.table().iter() {
        if let Some(dir) = &route.static_dir {
            statics.insert(route.url.clone(), ServeDir::new(dir));
        }
    }

    let state = AppState {
        gateway,
        statics: Arc::new(statics),
    };

    Router::new()
        .fallback(handle)
        .layer(TraceLayer::new_for_http())
        .layer(axum::extract::DefaultBodyLimit::max(dispatch::BODY_LIMIT))
        .with_state(state)
}

/// Route every request by path
async fn handle(State(state): State<AppState>, req: Request) -> Response<Body> {
    let path = req.uri().path().to_string();

    let Some(route) = state.gateway.table().resolve(&path) else {
        tracing::debug!(path = %path, "no route matched");
        return dispatch::not_found();
    };
    let route = Arc::clone(route);

    if route.is_static() {
        return serve_static(&state, &route, req).await;
    }

    dispatch::handle_route(&state.gateway, &route, req).await
}

/// Delegate to the route's file server with the first path segment stripped
async fn serve_static(state: &AppState, route: &Route, req: Request) -> Response<Body> {
    let Some(server) = state.statics.get(&route.url) else {
        tracing::error!(url = %route.url, "static route has no file server");
        return dispatch::not_found();
    };

    let stripped = strip_first_segment(req.uri().path());
    let uri = match rebuild_uri(stripped, req.uri().query()) {
        Some(uri) => uri,
        None => return dispatch::not_found(),
    };

    let (mut parts, body) = req.into_parts();
    parts.uri = uri;
    let req = Request::from_parts(parts, body);

    match server.clone().oneshot(req).await {
        Ok(response) => response.into_response(),
        Err(infallible) => match infallible {},
    }
}

/// `/prefix/rest/of/path` → `/rest/of/path`
fn strip_first_segment(path: &str) -> &str {
    let trimmed = path.strip_prefix('/').unwrap_or(path);
    match trimmed.find('/') {
        Some(idx) => &trimmed[idx..],
        None => "/",
    }
}

fn rebuild_uri(path: &str, query: Option<&str>) -> Option<Uri> {
    let full = match query {
        Some(query) => format!("{path}?{query}"),
        None => path.to_string(),
    };
    full.parse().ok()
}

/// Serve until cancelled
///
/// Plain HTTP uses axum's graceful shutdown; TLS terminates with rustls.
/// Accepting stops on cancellation, then in-flight requests finish.
pub async fn serve(
    gateway: Arc<Gateway>,
    config: &GatewayConfig,
    cancel: CancellationToken,
) -> Result<(), BootError> {
    let app = app(gateway);
    let address = config.bind_address();

    match &config.tls {
        None => {
            let listener = TcpListener::bind(&address)
                .await
                .map_err(|e| BootError::bind(&address, e))?;
            tracing::info!(address = %address, "listening");

            axum::serve(listener, app)
                .with_graceful_shutdown(cancel.cancelled_owned())
                .await?;
        }
        Some(tls) => {
            serve_tls(app, &address, tls, cancel).await?;
        }
    }

    Ok(())
}

async fn serve_tls(
    app: Router,
    address: &str,
    tls: &TlsConfig,
    cancel: CancellationToken,
) -> Result<(), BootError> {
    let addr: std::net::SocketAddr = address.parse().map_err(|_| {
        BootError::bind(
            address,
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "not a socket address"),
        )
    })?;

    let rustls = axum_server::tls_rustls::RustlsConfig::from_pem_file(&tls.cert_file, &tls.key_file)
        .await?;

    let handle = axum_server::Handle::new();
    let watcher = handle.clone();
    tokio::spawn(async move {
        cancel.cancelled().await;
        watcher.graceful_shutdown(Some(Duration::from_secs(10)));
    });

    tracing::info!(address = %address, "listening (tls)");
    axum_server::bind_rustls(addr, rustls)
        .handle(handle)
        .serve(app.into_make_service())
        .await?;

    Ok(())
}
