//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define proxy metrics (requests, latency, upstream failures, JSON repairs)
//! - Expose a Prometheus-compatible metrics endpoint when enabled
//!
//! # Metrics
//! - `proxy_requests_total` (counter): requests by method, status
//! - `proxy_request_duration_seconds` (histogram): latency by method
//! - `proxy_upstream_errors_total` (counter): failed upstream calls by kind
//! - `proxy_json_repairs_total` (counter): JSON bodies by repair strategy
//!
//! # Design Decisions
//! - Low-overhead metric updates through the `metrics` facade
//! - Without an installed exporter every call is a no-op

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Start the Prometheus exporter on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(error = %e, address = %addr, "Failed to start metrics exporter"),
    }
}

/// Count a finished request and record its latency.
pub fn record_request(method: &str, status: u16, start: Instant) {
    metrics::counter!(
        "proxy_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!("proxy_request_duration_seconds", "method" => method.to_string())
        .record(start.elapsed().as_secs_f64());
}

/// Count an upstream call that produced no response.
pub fn record_upstream_error(kind: &str) {
    metrics::counter!("proxy_upstream_errors_total", "kind" => kind.to_string()).increment(1);
}

/// Count a JSON body by the strategy that parsed it (`"failed"` if none did).
pub fn record_json_repair(strategy: &str) {
    metrics::counter!("proxy_json_repairs_total", "strategy" => strategy.to_string()).increment(1);
}
