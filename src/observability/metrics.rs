//! Metrics collection and exposition.
//!
//! # Metrics
//! - `canvas_proxy_requests_total` (counter): requests by method, status, outcome
//! - `canvas_proxy_request_duration_seconds` (histogram): latency by method, outcome
//!
//! `outcome` is `relayed` for anything that reached the upstream and came
//! back, otherwise the proxy error code (`unauthenticated`, `transport`, ...).

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

pub const REQUESTS_TOTAL: &str = "canvas_proxy_requests_total";
pub const REQUEST_DURATION_SECONDS: &str = "canvas_proxy_request_duration_seconds";

/// Outcome label for a relayed upstream response, whatever its status.
pub const OUTCOME_RELAYED: &str = "relayed";

/// Install the Prometheus recorder and its scrape endpoint.
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

/// Record one finished proxy request.
pub fn record_request(method: &str, status: u16, outcome: &'static str, start: Instant) {
    let elapsed = start.elapsed().as_secs_f64();

    metrics::counter!(
        REQUESTS_TOTAL,
        "method" => method.to_string(),
        "status" => status.to_string(),
        "outcome" => outcome
    )
    .increment(1);

    metrics::histogram!(
        REQUEST_DURATION_SECONDS,
        "method" => method.to_string(),
        "outcome" => outcome
    )
    .record(elapsed);
}
