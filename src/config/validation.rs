//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, addresses parse)
//! - Check that the upstream timeout can fire before the inbound deadline
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::fmt;
use std::net::SocketAddr;

use axum::http::HeaderName;

use crate::config::schema::{PathSource, ProxyConfig};
use crate::routing::BaseUrl;

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// True when one path is a segment-wise prefix of the other.
fn overlaps(a: &str, b: &str) -> bool {
    let (a, b) = (a.trim_end_matches('/'), b.trim_end_matches('/'));
    let (short, long) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    match long.strip_prefix(short) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

/// Validate a fully assembled configuration.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }

    let upstream = &config.upstream;
    if let Some(base_url) = upstream.base_url.as_deref().filter(|u| !u.trim().is_empty()) {
        if let Err(e) = BaseUrl::parse(base_url) {
            errors.push(ValidationError::new("upstream.base_url", e.to_string()));
        }
    }
    if HeaderName::from_bytes(upstream.host_header.as_bytes()).is_err() {
        errors.push(ValidationError::new(
            "upstream.host_header",
            format!("'{}' is not a valid header name", upstream.host_header),
        ));
    }
    for host in &upstream.allowed_hosts {
        if let Err(e) = BaseUrl::parse(host) {
            errors.push(ValidationError::new("upstream.allowed_hosts", e.to_string()));
        }
    }
    if upstream.request_timeout_ms == 0 {
        errors.push(ValidationError::new(
            "upstream.request_timeout_ms",
            "must be greater than zero",
        ));
    }
    if upstream.connect_timeout_ms == 0 {
        errors.push(ValidationError::new(
            "upstream.connect_timeout_ms",
            "must be greater than zero",
        ));
    }

    let routing = &config.routing;
    if !routing.mount_path.starts_with('/') {
        errors.push(ValidationError::new(
            "routing.mount_path",
            "must start with '/'",
        ));
    }
    if routing.mount_path.contains(['{', '}', '*']) {
        errors.push(ValidationError::new(
            "routing.mount_path",
            "must not contain route syntax ('{', '}', '*')",
        ));
    }
    if routing.path_source == PathSource::Query && routing.query_param.is_empty() {
        errors.push(ValidationError::new(
            "routing.query_param",
            "required when path_source = \"query\"",
        ));
    }
    if !routing.strip_prefix.is_empty() && !routing.strip_prefix.starts_with('/') {
        errors.push(ValidationError::new(
            "routing.strip_prefix",
            "must be empty or start with '/'",
        ));
    } else if routing.path_source == PathSource::Raw
        && !overlaps(&routing.mount_path, &routing.strip_prefix)
    {
        // Only requests under mount_path reach the handler, and only those
        // under strip_prefix yield a path.
        errors.push(ValidationError::new(
            "routing.strip_prefix",
            format!(
                "'{}' is outside mount_path '{}'; no request could be forwarded",
                routing.strip_prefix, routing.mount_path
            ),
        ));
    }

    // An upstream timeout at or past the inbound deadline can never fire
    // on its own terms.
    if config.timeouts.request_secs.saturating_mul(1000) <= upstream.request_timeout_ms {
        errors.push(ValidationError::new(
            "timeouts.request_secs",
            format!(
                "must exceed upstream.request_timeout_ms ({} ms)",
                upstream.request_timeout_ms
            ),
        ));
    }

    if config.security.max_body_size == 0 {
        errors.push(ValidationError::new(
            "security.max_body_size",
            "must be greater than zero",
        ));
    }

    let observability = &config.observability;
    if observability.metrics_enabled
        && observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(config: &ProxyConfig) -> Vec<&'static str> {
        validate_config(config)
            .err()
            .unwrap_or_default()
            .into_iter()
            .map(|e| e.field)
            .collect()
    }

    #[test]
    fn test_defaults_are_valid() {
        assert!(validate_config(&ProxyConfig::default()).is_ok());
    }

    #[test]
    fn test_missing_base_url_is_not_a_startup_error() {
        let mut config = ProxyConfig::default();
        config.upstream.base_url = None;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_reports_every_error() {
        let mut config = ProxyConfig::default();
        config.listener.bind_address = "nowhere".into();
        config.upstream.base_url = Some("ftp://files.example.com".into());
        config.upstream.host_header = "bad header".into();
        config.security.max_body_size = 0;

        let fields = fields(&config);
        assert_eq!(fields.len(), 4, "{fields:?}");
        assert!(fields.contains(&"listener.bind_address"));
        assert!(fields.contains(&"upstream.base_url"));
        assert!(fields.contains(&"upstream.host_header"));
        assert!(fields.contains(&"security.max_body_size"));
    }

    #[test]
    fn test_mount_path_rules() {
        let mut config = ProxyConfig::default();
        config.routing.mount_path = "api/{*rest}".into();
        let fields = fields(&config);
        assert_eq!(
            fields,
            vec!["routing.mount_path", "routing.mount_path"],
        );
    }

    #[test]
    fn test_query_strategy_needs_param() {
        let mut config = ProxyConfig::default();
        config.routing.path_source = PathSource::Query;
        config.routing.query_param.clear();
        assert_eq!(fields(&config), vec!["routing.query_param"]);
    }

    #[test]
    fn test_raw_strip_prefix_must_be_reachable() {
        let mut config = ProxyConfig::default();
        config.routing.path_source = PathSource::Raw;
        config.routing.strip_prefix = "/canvas".into();
        assert_eq!(fields(&config), vec!["routing.strip_prefix"]);

        // Same-looking prefix, different segment.
        config.routing.strip_prefix = "/api/proxyx".into();
        assert_eq!(fields(&config), vec!["routing.strip_prefix"]);

        for (mount, strip) in [
            ("/api/proxy", "/api/proxy"),
            ("/api/proxy", "/api/proxy/canvas/"),
            ("/api", ""),
            ("/api/proxy", "/api"),
            ("/", "/canvas"),
        ] {
            config.routing.mount_path = mount.into();
            config.routing.strip_prefix = strip.into();
            assert!(validate_config(&config).is_ok(), "{mount} {strip}");
        }

        // Other sources ignore strip_prefix.
        config.routing.path_source = PathSource::Wildcard;
        config.routing.mount_path = "/api/proxy".into();
        config.routing.strip_prefix = "/canvas".into();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_inbound_deadline_must_exceed_upstream_timeout() {
        let mut config = ProxyConfig::default();
        config.timeouts.request_secs = 30;
        config.upstream.request_timeout_ms = 30_000;
        assert_eq!(fields(&config), vec!["timeouts.request_secs"]);
    }

    #[test]
    fn test_metrics_address_checked_only_when_enabled() {
        let mut config = ProxyConfig::default();
        config.observability.metrics_address = "metrics".into();
        assert!(validate_config(&config).is_ok());

        config.observability.metrics_enabled = true;
        assert_eq!(fields(&config), vec!["observability.metrics_address"]);
    }

    #[test]
    fn test_allowed_hosts_must_be_base_urls() {
        let mut config = ProxyConfig::default();
        config.upstream.allowed_hosts = vec![
            "https://northsouth.instructure.com".into(),
            "northsouth".into(),
        ];
        assert_eq!(fields(&config), vec!["upstream.allowed_hosts"]);
    }
}
