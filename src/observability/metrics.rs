//! Metrics collection and exposition.
//!
//! # Metrics
//! - `proxy_requests_total` (counter): proxied requests by method, status, rewritten
//! - `proxy_request_duration_seconds` (histogram): latency distribution
//! - `proxy_rewrites_total` (counter): rewrites by interceptor
//! - `proxy_tunnels_total` (counter): CONNECT tunnels by outcome

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Start the Prometheus scrape endpoint.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

/// Record a completed proxied request.
pub fn record_request(method: &str, status: u16, rewritten: bool, start: Instant) {
    let method = method.to_string();
    let status = status.to_string();
    let rewritten = rewritten.to_string();

    counter!(
        "proxy_requests_total",
        "method" => method.clone(),
        "status" => status.clone(),
        "rewritten" => rewritten.clone()
    )
    .increment(1);
    histogram!(
        "proxy_request_duration_seconds",
        "method" => method,
        "status" => status,
        "rewritten" => rewritten
    )
    .record(start.elapsed().as_secs_f64());
}

/// Record a rewrite performed by an interceptor.
pub fn record_rewrite(interceptor: &str) {
    counter!("proxy_rewrites_total", "interceptor" => interceptor.to_string()).increment(1);
}

/// Record the end of a CONNECT tunnel.
pub fn record_tunnel(outcome: &'static str) {
    counter!("proxy_tunnels_total", "outcome" => outcome).increment(1);
}
