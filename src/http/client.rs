//! Upstream HTTP client.
//!
//! # Responsibilities
//! - Hold one pooled client for the whole server
//! - Send exactly the credential, and the body with its content type
//! - Buffer the upstream response under a single deadline
//!
//! # Design Decisions
//! - Status-level upstream failures are data; only transport failures
//!   and timeouts become errors
//! - Compressed upstream bodies are decoded by the client, which also
//!   drops the matching `Content-Encoding`/`Content-Length`
//! - Environment proxy variables are ignored; credentials only ever travel
//!   to the resolved Canvas host

use std::fmt;
use std::time::Duration;

use axum::{
    body::Bytes,
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
};
use reqwest::redirect::Policy;

use crate::config::UpstreamConfig;
use crate::error::ProxyError;
use crate::http::response::UpstreamResponse;
use crate::resilience::with_deadline;

/// A request ready to go upstream.
pub struct ForwardRequest {
    pub method: Method,
    /// Absolute upstream URL.
    pub target: String,
    pub authorization: HeaderValue,
    pub content_type: Option<HeaderValue>,
    pub body: Option<Bytes>,
}

impl fmt::Debug for ForwardRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ForwardRequest")
            .field("method", &self.method)
            .field("target", &self.target)
            .field("authorization", &"[redacted]")
            .field("content_type", &self.content_type)
            .field("body_len", &self.body.as_ref().map(Bytes::len))
            .finish()
    }
}

/// Client for the upstream Canvas API.
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    inner: reqwest::Client,
    timeout: Duration,
}

impl UpstreamClient {
    pub fn new(config: &UpstreamConfig) -> Result<Self, reqwest::Error> {
        let redirect = if config.follow_redirects {
            Policy::default()
        } else {
            Policy::none()
        };

        let inner = reqwest::Client::builder()
            .user_agent(concat!("canvas-proxy/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_millis(config.connect_timeout_ms))
            .redirect(redirect)
            .no_proxy()
            .build()?;

        Ok(Self {
            inner,
            timeout: Duration::from_millis(config.request_timeout_ms),
        })
    }

    /// Deadline applied to each upstream exchange.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Send `request` and buffer the full response.
    pub async fn send(&self, request: ForwardRequest) -> Result<UpstreamResponse, ProxyError> {
        self.send_within(request, self.timeout).await
    }

    /// Like `send`, but under `limit` when that is tighter than the
    /// configured upstream deadline.
    pub async fn send_within(
        &self,
        request: ForwardRequest,
        limit: Duration,
    ) -> Result<UpstreamResponse, ProxyError> {
        let limit = limit.min(self.timeout);
        let ForwardRequest {
            method,
            target,
            authorization,
            content_type,
            body,
        } = request;

        let mut builder = self
            .inner
            .request(method, target.as_str())
            .header(AUTHORIZATION, authorization);
        if let Some(body) = body {
            if let Some(content_type) = content_type {
                builder = builder.header(CONTENT_TYPE, content_type);
            }
            builder = builder.body(body);
        }

        let exchange = async move {
            let response = builder.send().await?;
            let status = response.status();
            let headers = response.headers().clone();
            let body = response.bytes().await?;
            Ok::<_, reqwest::Error>(UpstreamResponse {
                status,
                headers,
                body,
            })
        };

        match with_deadline(limit, exchange).await {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(source)) if source.is_timeout() => Err(ProxyError::Timeout {
                target,
                elapsed: limit,
            }),
            Ok(Err(source)) => Err(ProxyError::Transport { target, source }),
            Err(elapsed) => Err(ProxyError::Timeout {
                target,
                elapsed: elapsed.elapsed,
            }),
        }
    }
}
