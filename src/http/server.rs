//! HTTP server setup and the proxy handler.
//!
//! # Responsibilities
//! - Create Axum Router with the proxy and health handlers
//! - Wire up middleware (tracing, request ID)
//! - Check preconditions in order: base URL, path, credential
//! - Forward requests to the upstream and relay the response
//! - Observability (metrics, request IDs)
//!
//! # Design Decisions
//! - The inbound deadline is owned by the handler, not a tower layer, so
//!   an expired request still answers with the JSON error shape
//! - Body reading and the upstream call share one budget: a slow body
//!   leaves less time for upstream, never more than the inbound deadline

use axum::{
    body::Body,
    extract::State,
    http::{header::CONTENT_TYPE, Request},
    response::{IntoResponse, Response},
    routing::{any, get},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::Span;

use crate::config::ProxyConfig;
use crate::error::ProxyError;
use crate::http::client::{ForwardRequest, UpstreamClient};
use crate::http::request::{check_method, credential, read_body, request_id, MakeRequestUuidV4};
use crate::http::response::relay;
use crate::resilience::with_deadline;
use crate::observability::metrics::{self, OUTCOME_RELAYED};
use crate::routing::{build_target_url, resolver_from_config, PathExtractor, UpstreamResolver};

/// Liveness endpoint path.
pub const HEALTH_PATH: &str = "/healthz";

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub resolver: Arc<dyn UpstreamResolver>,
    pub paths: Arc<PathExtractor>,
    pub client: UpstreamClient,
    pub max_body_size: usize,
    /// Whole-request deadline, measured from when the handler starts.
    pub request_deadline: Duration,
}

/// HTTP server for the Canvas proxy.
pub struct HttpServer {
    router: Router,
    config: ProxyConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: ProxyConfig) -> Result<Self, reqwest::Error> {
        let state = AppState {
            resolver: resolver_from_config(&config.upstream),
            paths: Arc::new(PathExtractor::from_config(&config.routing)),
            client: UpstreamClient::new(&config.upstream)?,
            max_body_size: config.security.max_body_size,
            request_deadline: Duration::from_secs(config.timeouts.request_secs),
        };

        let router = Self::build_router(&config, state);
        Ok(Self { router, config })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &ProxyConfig, state: AppState) -> Router {
        let mount = state.paths.mount_path();
        let (root, wildcard) = if mount.is_empty() {
            ("/".to_string(), "/{*path}".to_string())
        } else {
            (mount.to_string(), format!("{mount}/{{*path}}"))
        };

        let mut router = Router::new();
        if config.observability.health_endpoint {
            router = router.route(HEALTH_PATH, get(health_handler));
        }

        router
            .route(&root, any(proxy_handler))
            .route(&wildcard, any(proxy_handler))
            .with_state(state)
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http().make_span_with(make_span))
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV4))
    }

    /// The fully layered router, e.g. for driving it without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
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
            mount_path = %self.config.routing.mount_path,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received, draining connections");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }
}

fn make_span(request: &Request<Body>) -> Span {
    tracing::info_span!(
        "request",
        request_id = %request_id(request.headers()),
        method = %request.method(),
        path = %request.uri().path()
    )
}

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub version: &'static str,
}

async fn health_handler() -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Main proxy handler.
/// Every proxy-originated failure ends here as a JSON error response.
async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start_time = Instant::now();
    let request_id = request_id(request.headers()).to_string();
    let method = request.method().clone();

    let deadline = start_time + state.request_deadline;

    match forward(&state, request, deadline).await {
        Ok(response) => {
            tracing::debug!(
                request_id = %request_id,
                status = %response.status(),
                "Relayed upstream response"
            );
            metrics::record_request(
                method.as_str(),
                response.status().as_u16(),
                OUTCOME_RELAYED,
                start_time,
            );
            response
        }
        Err(err) => {
            if err.is_server_fault() {
                tracing::error!(
                    request_id = %request_id,
                    method = %method,
                    code = err.code(),
                    error = %err,
                    "Proxy request failed"
                );
            } else {
                tracing::warn!(
                    request_id = %request_id,
                    method = %method,
                    code = err.code(),
                    error = %err,
                    "Rejected proxy request"
                );
            }
            metrics::record_request(method.as_str(), err.status().as_u16(), err.code(), start_time);
            err.into_response()
        }
    }
}

/// Validate, forward and relay one request, finishing by `deadline`.
async fn forward(
    state: &AppState,
    request: Request<Body>,
    deadline: Instant,
) -> Result<Response, ProxyError> {
    let (parts, body) = request.into_parts();
    check_method(&parts.method)?;

    // 1. Base URL, 2. path, 3. credential. Nothing goes upstream before all pass.
    let base = state.resolver.resolve(&parts.headers)?;
    let target_path = state
        .paths
        .extract(&parts.uri)
        .ok_or(ProxyError::MissingPath)?;
    let authorization = credential(&parts.headers)?;

    let body = with_deadline(
        deadline.saturating_duration_since(Instant::now()),
        read_body(&parts.method, &parts.headers, body, state.max_body_size),
    )
    .await
    .map_err(|_| ProxyError::RequestTimeout {
        limit: state.request_deadline,
    })??;
    let content_type = body
        .as_ref()
        .and_then(|_| parts.headers.get(CONTENT_TYPE).cloned());

    let target = build_target_url(&base, &target_path.path, target_path.query.as_deref());
    tracing::debug!(method = %parts.method, target = %target, "Forwarding request upstream");

    let upstream = state
        .client
        .send_within(
            ForwardRequest {
                method: parts.method,
                target,
                authorization,
                content_type,
                body,
            },
            deadline.saturating_duration_since(Instant::now()),
        )
        .await?;

    Ok(relay(upstream))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_health_endpoint() {
        let server = HttpServer::new(ProxyConfig::default()).unwrap();
        let response = server
            .router()
            .oneshot(Request::get(HEALTH_PATH).body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], "ok");
    }

    #[tokio::test]
    async fn test_health_endpoint_can_be_disabled() {
        let mut config = ProxyConfig::default();
        config.observability.health_endpoint = false;
        let server = HttpServer::new(config).unwrap();
        let response = server
            .router()
            .oneshot(Request::get(HEALTH_PATH).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_unconfigured_base_url_is_server_error() {
        let server = HttpServer::new(ProxyConfig::default()).unwrap();
        let response = server
            .router()
            .oneshot(
                Request::get("/api/proxy/api/v1/courses")
                    .header("authorization", "Bearer t")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.headers()["x-proxy-error"], "configuration");
    }

    #[tokio::test]
    async fn test_unsupported_method() {
        let mut config = ProxyConfig::default();
        config.upstream.base_url = Some("https://h.example.com".into());
        let server = HttpServer::new(config).unwrap();
        let response = server
            .router()
            .oneshot(
                Request::options("/api/proxy/api/v1/courses")
                    .header("authorization", "Bearer t")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_caller_request_id_is_echoed() {
        let server = HttpServer::new(ProxyConfig::default()).unwrap();
        let response = server
            .router()
            .oneshot(
                Request::get("/api/proxy")
                    .header("x-request-id", "req-123")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.headers()["x-request-id"], "req-123");
    }
}
