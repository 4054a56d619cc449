//! Metrics collection and exposition.
//!
//! # Metrics
//! - `igs_http_requests_total` (counter): requests by method, route, status
//! - `igs_http_request_duration_seconds` (histogram): latency distribution
//! - `igs_auth_failures_total` (counter): rejected logins/tokens by reason
//! - `igs_rate_limited_total` (counter): requests refused by the limiter
//!
//! Updates go through the `metrics` facade and are no-ops until a recorder
//! is installed by `init_metrics`.

use std::net::SocketAddr;
use std::time::Instant;

use axum::{
    body::Body,
    extract::MatchedPath,
    http::Request,
    middleware::Next,
    response::Response,
};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(method: &str, route: &str, status: u16, start: Instant) {
    let labels = [
        ("method", method.to_string()),
        ("route", route.to_string()),
        ("status", status.to_string()),
    ];
    metrics::counter!("igs_http_requests_total", &labels).increment(1);
    metrics::histogram!("igs_http_request_duration_seconds", &labels)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_auth_failure(reason: &'static str) {
    metrics::counter!("igs_auth_failures_total", "reason" => reason).increment(1);
}

pub fn record_rate_limited() {
    metrics::counter!("igs_rate_limited_total").increment(1);
}

/// Middleware recording one counter and one latency sample per request.
///
/// Labels use the matched route template, never the raw path, so tract ids
/// do not explode label cardinality.
pub async fn track_metrics(request: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());

    let response = next.run(request).await;
    record_request(&method, &route, response.status().as_u16(), start);
    response
}
