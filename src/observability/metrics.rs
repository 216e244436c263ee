//! Metrics collection and exposition.
//!
//! # Metrics
//! - `pinfeed_requests_total` (counter): feed requests by method, status
//! - `pinfeed_request_duration_seconds` (histogram): latency distribution
//! - `pinfeed_failures_total` (counter): failed feed requests by kind
//! - `pinfeed_items_rewritten_total` (counter): item titles replaced

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Start the Prometheus scrape endpoint. Must run inside the Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(method: &str, status: u16, start: Instant) {
    let status = status.to_string();
    ::metrics::counter!(
        "pinfeed_requests_total",
        "method" => method.to_string(),
        "status" => status.clone()
    )
    .increment(1);
    ::metrics::histogram!(
        "pinfeed_request_duration_seconds",
        "method" => method.to_string(),
        "status" => status
    )
    .record(start.elapsed().as_secs_f64());
}

pub fn record_failure(kind: &'static str) {
    ::metrics::counter!("pinfeed_failures_total", "kind" => kind).increment(1);
}

pub fn record_items_rewritten(count: usize) {
    ::metrics::counter!("pinfeed_items_rewritten_total").increment(count as u64);
}
