//! Prometheus metrics for the API server.

use std::sync::OnceLock;
use std::time::Instant;

use axum::body::Body;
use axum::http::{Request, Response};
use axum::middleware::Next;
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use regex::Regex;

/// Install the Prometheus recorder and return its render handle.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}

pub mod names {
    pub const HTTP_REQUESTS_TOTAL: &str = "reel_http_requests_total";
    pub const HTTP_REQUEST_DURATION_SECONDS: &str = "reel_http_request_duration_seconds";
    pub const HTTP_REQUESTS_IN_FLIGHT: &str = "reel_http_requests_in_flight";
    pub const GENERATE_REQUESTS_TOTAL: &str = "reel_generate_requests_total";
    pub const UPLOAD_BYTES_TOTAL: &str = "reel_upload_bytes_total";
    pub const RATE_LIMIT_HITS_TOTAL: &str = "reel_rate_limit_hits_total";
}

pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    let labels = [
        ("method", method.to_string()),
        ("path", sanitize_path(path)),
        ("status", status.to_string()),
    ];

    counter!(names::HTTP_REQUESTS_TOTAL, &labels).increment(1);
    histogram!(names::HTTP_REQUEST_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record a finished generate request; `outcome` is `success` or an error code.
pub fn record_generate(outcome: &str, mode: &str) {
    let labels = [("outcome", outcome.to_string()), ("mode", mode.to_string())];
    counter!(names::GENERATE_REQUESTS_TOTAL, &labels).increment(1);
}

pub fn record_upload_bytes(bytes: usize) {
    counter!(names::UPLOAD_BYTES_TOTAL).increment(bytes as u64);
}

pub fn record_rate_limit_hit(path: &str) {
    let labels = [("path", sanitize_path(path))];
    counter!(names::RATE_LIMIT_HITS_TOTAL, &labels).increment(1);
}

/// Collapse per-artifact paths so label cardinality stays bounded.
fn sanitize_path(path: &str) -> String {
    static VIDEO_FILE: OnceLock<Option<Regex>> = OnceLock::new();
    let pattern = VIDEO_FILE.get_or_init(|| Regex::new(r"^/videos/[^/]+$").ok());

    match pattern {
        Some(re) if re.is_match(path) => "/videos/:file".to_string(),
        _ => path.to_string(),
    }
}

/// HTTP metrics middleware.
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response<Body> {
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let start = Instant::now();

    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).increment(1.0);
    let response = next.run(request).await;
    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).decrement(1.0);

    record_http_request(
        &method,
        &path,
        response.status().as_u16(),
        start.elapsed().as_secs_f64(),
    );

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_path() {
        assert_eq!(sanitize_path("/videos/abc123.mp4"), "/videos/:file");
        assert_eq!(sanitize_path("/generate-multi-scene"), "/generate-multi-scene");
        assert_eq!(sanitize_path("/videos/"), "/videos/");
    }
}
