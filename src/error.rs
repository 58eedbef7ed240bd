//! Proxy error taxonomy and its HTTP mapping.
//!
//! Every variant is produced by the proxy itself. Upstream non-2xx
//! responses are not errors; they are relayed like any other response.

use std::time::Duration;

use axum::{
    http::{HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Response header marking a proxy-originated error.
pub const X_PROXY_ERROR: &str = "x-proxy-error";

/// Errors that terminate a proxy request before or instead of a relay.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// The server-side upstream base URL is required but not configured.
    #[error("upstream base URL is not configured")]
    Configuration,

    /// The caller did not name an upstream host.
    #[error("missing {header} header")]
    MissingHost { header: String },

    /// The caller-supplied upstream host is not a usable base URL.
    #[error("invalid {header} header: {reason}")]
    InvalidHost { header: String, reason: String },

    /// The caller-supplied upstream host is not on the allow-list.
    #[error("host '{host}' is not allowed")]
    HostNotAllowed { header: String, host: String },

    /// No upstream-relative path could be extracted.
    #[error("missing path")]
    MissingPath,

    /// No Authorization header on the inbound request.
    #[error("missing Authorization header")]
    Unauthenticated,

    /// Method outside GET/POST/PUT/PATCH/DELETE/HEAD.
    #[error("method {0} is not supported")]
    MethodNotAllowed(Method),

    /// Inbound body exceeds `security.max_body_size`.
    #[error("request body exceeds {limit} bytes")]
    PayloadTooLarge { limit: usize },

    /// Inbound body could not be read.
    #[error("failed to read request body: {0}")]
    InvalidBody(String),

    /// The caller did not finish sending the request within the inbound deadline.
    #[error("request not received within {limit:?}")]
    RequestTimeout { limit: Duration },

    /// Network-level failure talking to the upstream.
    #[error("upstream request to {target} failed: {source}")]
    Transport {
        target: String,
        #[source]
        source: reqwest::Error,
    },

    /// The upstream exchange did not finish within the deadline.
    #[error("upstream request to {target} timed out after {elapsed:?}")]
    Timeout { target: String, elapsed: Duration },
}

/// JSON body of every proxy-originated error.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ProxyError {
    /// HTTP status returned to the caller.
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::Configuration => StatusCode::INTERNAL_SERVER_ERROR,
            ProxyError::MissingHost { .. } => StatusCode::BAD_REQUEST,
            ProxyError::InvalidHost { .. } => StatusCode::BAD_REQUEST,
            ProxyError::HostNotAllowed { .. } => StatusCode::FORBIDDEN,
            ProxyError::MissingPath => StatusCode::BAD_REQUEST,
            ProxyError::Unauthenticated => StatusCode::UNAUTHORIZED,
            ProxyError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            ProxyError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            ProxyError::InvalidBody(_) => StatusCode::BAD_REQUEST,
            ProxyError::RequestTimeout { .. } => StatusCode::REQUEST_TIMEOUT,
            ProxyError::Transport { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            ProxyError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
        }
    }

    /// Short machine-readable code, used for the marker header and metrics.
    pub fn code(&self) -> &'static str {
        match self {
            ProxyError::Configuration => "configuration",
            ProxyError::MissingHost { .. } => "missing_host",
            ProxyError::InvalidHost { .. } => "invalid_host",
            ProxyError::HostNotAllowed { .. } => "host_not_allowed",
            ProxyError::MissingPath => "missing_path",
            ProxyError::Unauthenticated => "unauthenticated",
            ProxyError::MethodNotAllowed(_) => "method_not_allowed",
            ProxyError::PayloadTooLarge { .. } => "payload_too_large",
            ProxyError::InvalidBody(_) => "invalid_body",
            ProxyError::RequestTimeout { .. } => "request_timeout",
            ProxyError::Transport { .. } => "transport",
            ProxyError::Timeout { .. } => "timeout",
        }
    }

    /// True for failures the operator has to look at.
    pub fn is_server_fault(&self) -> bool {
        self.status().is_server_error()
    }

    /// Message safe to show the caller. Never includes the target URL or
    /// the underlying transport error.
    pub fn public_message(&self) -> String {
        match self {
            ProxyError::Configuration => {
                "Server configuration error: the upstream base URL is not configured.".to_string()
            }
            ProxyError::MissingHost { header } => {
                format!("Proxy error: Missing '{header}' header.")
            }
            ProxyError::InvalidHost { header, .. } => {
                format!("Proxy error: '{header}' must be an http(s) base URL.")
            }
            ProxyError::HostNotAllowed { header, .. } => {
                format!("Proxy error: the host named in '{header}' is not supported.")
            }
            ProxyError::MissingPath => "Proxy error: Missing 'path' in the request.".to_string(),
            ProxyError::Unauthenticated => {
                "Proxy error: Missing Authorization header.".to_string()
            }
            ProxyError::MethodNotAllowed(method) => {
                format!("Proxy error: Method {method} is not supported.")
            }
            ProxyError::PayloadTooLarge { limit } => {
                format!("Proxy error: Request body exceeds {limit} bytes.")
            }
            ProxyError::InvalidBody(_) => "Proxy error: Failed to read request body.".to_string(),
            ProxyError::RequestTimeout { .. } => {
                "Proxy error: Request was not received in time.".to_string()
            }
            ProxyError::Transport { .. } => {
                "Internal Server Error during proxy request.".to_string()
            }
            ProxyError::Timeout { .. } => "Upstream request timed out.".to_string(),
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let mut response = (
            self.status(),
            Json(ErrorBody {
                error: self.public_message(),
            }),
        )
            .into_response();
        response
            .headers_mut()
            .insert(X_PROXY_ERROR, HeaderValue::from_static(self.code()));
        response
    }
}
