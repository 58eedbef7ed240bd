//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the Canvas proxy.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Where requests are forwarded to.
    pub upstream: UpstreamConfig,

    /// How the upstream-relative path is taken from the inbound request.
    pub routing: RoutingConfig,

    /// Timeout configuration for inbound requests.
    pub timeouts: TimeoutConfig,

    /// Request size limits.
    pub security: SecurityConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:3000").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3000".to_string(),
        }
    }
}

/// Where the upstream base URL comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum HostSource {
    /// Trusted server-side setting (`upstream.base_url` / `CANVAS_BASE_URL`).
    #[default]
    Config,
    /// Caller-supplied header (`upstream.host_header`).
    Header,
}

/// Upstream (Canvas instance) configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Base URL source strategy.
    pub host_source: HostSource,

    /// Upstream base URL, e.g. "https://school.instructure.com".
    /// Only consulted when `host_source = "config"`.
    pub base_url: Option<String>,

    /// Header carrying the base URL when `host_source = "header"`.
    pub host_header: String,

    /// Base URLs a caller may name in the host header. Empty allows any.
    pub allowed_hosts: Vec<String>,

    /// Deadline for the whole upstream exchange, in milliseconds.
    pub request_timeout_ms: u64,

    /// Connection establishment timeout, in milliseconds.
    pub connect_timeout_ms: u64,

    /// Follow upstream redirects instead of relaying them.
    pub follow_redirects: bool,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            host_source: HostSource::Config,
            base_url: None,
            host_header: "x-canvas-host".to_string(),
            allowed_hosts: Vec::new(),
            request_timeout_ms: 30_000,
            connect_timeout_ms: 5_000,
            follow_redirects: true,
        }
    }
}

/// Path extraction strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PathSource {
    /// Everything after `mount_path`, e.g. `/api/proxy/{*path}`.
    #[default]
    Wildcard,
    /// A query parameter (possibly repeated, joined with `/`).
    Query,
    /// The raw inbound path with `strip_prefix` removed.
    Raw,
}

/// Inbound routing configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RoutingConfig {
    /// Path the proxy route is mounted at.
    pub mount_path: String,

    /// How the upstream-relative path is extracted.
    pub path_source: PathSource,

    /// Query parameter name for `path_source = "query"`.
    pub query_param: String,

    /// Prefix removed from the inbound path for `path_source = "raw"`.
    pub strip_prefix: String,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            mount_path: "/api/proxy".to_string(),
            path_source: PathSource::Wildcard,
            query_param: "path".to_string(),
            strip_prefix: String::new(),
        }
    }
}

/// Timeout configuration for inbound requests.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 60 }
    }
}

/// Request size limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Maximum inbound body size in bytes.
    pub max_body_size: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_body_size: 2 * 1024 * 1024, // 2MB
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,

    /// Serve `GET /healthz`.
    pub health_endpoint: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
            health_endpoint: true,
        }
    }
}
