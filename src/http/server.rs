//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (request ID, tracing, CORS headers, panic recovery)
//! - Bind server to listener
//! - Resolve the embedded target and forward the request upstream
//! - Answer preflight and health requests locally
//! - Observability (metrics, correlation IDs)

use std::any::Any;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Body,
    extract::State,
    http::{HeaderValue, Request},
    response::{IntoResponse, Json, Response},
    routing::{get, MethodRouter},
    Router,
};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    catch_panic::CatchPanicLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};

use crate::config::ProxyConfig;
use crate::error::{timestamp_now, ProxyError};
use crate::http::request::{request_id, MakeRequestUuidV4};
use crate::http::response::{preflight_response, rebuild_response, CORS_HEADERS};
use crate::observability::metrics;
use crate::routing::{resolve_target, ProxyRoute, HEALTH_PATH};
use crate::transform::{transcode_body, translate_request_headers, HeaderPolicy};
use crate::upstream::{OutboundRequest, UpstreamClient};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub route: Arc<ProxyRoute>,
    pub upstream: UpstreamClient,
    pub header_policy: Arc<HeaderPolicy>,
    pub max_body_bytes: usize,
}

impl AppState {
    /// Build handler state from configuration.
    pub fn from_config(config: &ProxyConfig) -> Result<Self, reqwest::Error> {
        Ok(Self {
            route: Arc::new(ProxyRoute::new(&config.routing.prefix)),
            upstream: UpstreamClient::from_config(&config.upstream, &config.timeouts)?,
            header_policy: Arc::new(HeaderPolicy::with_user_agent(&config.upstream.user_agent)),
            max_body_bytes: config.limits.max_body_bytes,
        })
    }
}

/// HTTP server for the relay.
pub struct HttpServer {
    router: Router,
    config: ProxyConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: ProxyConfig) -> Result<Self, reqwest::Error> {
        let state = AppState::from_config(&config)?;
        let router = build_router(state);
        Ok(Self { router, config })
    }

    /// The fully layered router, for in-process testing.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }

    /// Run the server until `shutdown` fires, then drain in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            prefix = %self.config.routing.prefix,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Build the Axum router with all middleware layers.
pub fn build_router(state: AppState) -> Router {
    let proxy: MethodRouter<AppState> = get(proxy_handler)
        .post(proxy_handler)
        .put(proxy_handler)
        .delete(proxy_handler)
        .patch(proxy_handler)
        .head(proxy_handler)
        .options(preflight_handler);

    let mut router = Router::new();
    if state.route.shadows(HEALTH_PATH) {
        tracing::warn!(prefix = %state.route.prefix(), "Proxy prefix shadows the health endpoint, not mounting it");
    } else {
        router = router.route(HEALTH_PATH, get(health_handler));
    }
    for pattern in state.route.patterns() {
        router = router.route(&pattern, proxy.clone());
    }

    let mut router = router
        .with_state(state)
        .layer(CatchPanicLayer::custom(panic_response));
    for (name, value) in CORS_HEADERS {
        router = router.layer(SetResponseHeaderLayer::overriding(
            name,
            HeaderValue::from_static(value),
        ));
    }

    router
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                tracing::info_span!(
                    "request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = %request_id(request.headers())
                )
            }),
        )
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV4))
}

/// Main proxy handler.
/// Resolves the target, forwards the request and relays the answer.
async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start_time = Instant::now();
    let method = request.method().clone();

    let response = match forward(&state, request).await {
        Ok(response) => response,
        Err(e) => e.into_response(),
    };

    metrics::record_request(method.as_str(), response.status().as_u16(), start_time);
    response
}

async fn forward(state: &AppState, request: Request<Body>) -> Result<Response, ProxyError> {
    let (parts, body) = request.into_parts();
    let request_id = request_id(&parts.headers).to_string();

    let raw_target = state
        .route
        .target_segment(parts.uri.path())
        .unwrap_or_default();
    let target = resolve_target(raw_target, parts.uri.query())?;

    tracing::debug!(
        request_id = %request_id,
        method = %parts.method,
        target = %target,
        "Proxying request"
    );

    let headers = translate_request_headers(&parts.headers, &target, &state.header_policy);
    let payload = transcode_body(&parts.method, &parts.headers, body, state.max_body_bytes).await;

    let outbound = OutboundRequest {
        method: parts.method,
        target: target.clone(),
        headers,
        body: payload,
    };

    let upstream = state
        .upstream
        .invoke(outbound, state.upstream.deadline())
        .await
        .map_err(|e| {
            metrics::record_upstream_error(e.label());
            tracing::debug!(request_id = %request_id, error = %e, "Upstream call failed");
            ProxyError::from_invoke(e, target.as_str())
        })?;

    tracing::info!(
        request_id = %request_id,
        target = %target,
        status = upstream.status.as_u16(),
        bytes = upstream.body.len(),
        "Upstream responded"
    );

    Ok(rebuild_response(upstream))
}

/// Preflight handler; never contacts the upstream.
async fn preflight_handler(request: Request<Body>) -> Response {
    let start_time = Instant::now();
    let response = preflight_response();
    tracing::debug!(request_id = %request_id(request.headers()), "Answered preflight");
    metrics::record_request("OPTIONS", response.status().as_u16(), start_time);
    response
}

async fn health_handler() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": timestamp_now(),
    }))
}

/// Converts a handler panic into the internal error envelope.
fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let reason = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "handler panicked".to_string()
    };
    ProxyError::Internal {
        target: None,
        reason,
    }
    .into_response()
}
