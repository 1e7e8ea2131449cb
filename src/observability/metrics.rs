//! Metrics collection and exposition.
//!
//! # Metrics
//! - `stellar_rpc_requests_total` (counter): RPC calls by surface, method, outcome
//! - `stellar_rpc_request_duration_seconds` (histogram): RPC latency
//! - `stellar_retries_total` (counter): retries by operation
//! - `stellar_rate_limited_total` (counter): local budget rejections
//! - `stellar_rate_limit_remaining` (gauge): budget left after last admission
//! - `stellar_monitor_outcomes_total` (counter): terminal monitor states
//!
//! Without an installed recorder every call is a no-op.

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter with an HTTP scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_rpc_request(surface: &'static str, method: &str, outcome: &'static str, start: Instant) {
    metrics::counter!(
        "stellar_rpc_requests_total",
        "surface" => surface,
        "method" => method.to_string(),
        "outcome" => outcome
    )
    .increment(1);
    metrics::histogram!(
        "stellar_rpc_request_duration_seconds",
        "surface" => surface,
        "method" => method.to_string()
    )
    .record(start.elapsed().as_secs_f64());
}

pub fn record_retry(operation: &str) {
    metrics::counter!("stellar_retries_total", "operation" => operation.to_string()).increment(1);
}

pub fn record_rate_limited() {
    metrics::counter!("stellar_rate_limited_total").increment(1);
}

pub fn record_rate_limit_remaining(remaining: usize) {
    metrics::gauge!("stellar_rate_limit_remaining").set(remaining as f64);
}

pub fn record_monitor_outcome(status: &'static str) {
    metrics::counter!("stellar_monitor_outcomes_total", "status" => status).increment(1);
}
