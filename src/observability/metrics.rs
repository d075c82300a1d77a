//! Metrics collection and exposition.
//!
//! # Metrics
//! - `mlc_serve_requests_total` (counter): requests by method, path, status
//! - `mlc_serve_request_duration_seconds` (histogram): latency distribution
//! - `mlc_serve_lifecycle_transitions_total` (counter): phase changes
//!
//! Recording is a no-op until [`init_metrics`] installs the Prometheus recorder.

use std::net::SocketAddr;
use std::time::Instant;

use axum::{extract::MatchedPath, extract::Request, middleware::Next, response::Response};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::lifecycle::Phase;

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record a completed request.
pub fn record_request(method: &str, path: &str, status: u16, start: Instant) {
    let labels = [
        ("method", method.to_string()),
        ("path", path.to_string()),
        ("status", status.to_string()),
    ];
    metrics::counter!("mlc_serve_requests_total", &labels).increment(1);
    metrics::histogram!("mlc_serve_request_duration_seconds", &labels)
        .record(start.elapsed().as_secs_f64());
}

/// Record a lifecycle phase change.
pub fn record_transition(phase: Phase) {
    metrics::counter!("mlc_serve_lifecycle_transitions_total", "phase" => phase.as_str())
        .increment(1);
}

/// Middleware recording per-request metrics.
///
/// Uses the matched route template as the path label to bound cardinality.
pub async fn track_metrics(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let path = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());

    let response = next.run(request).await;
    record_request(&method, &path, response.status().as_u16(), start);
    response
}
