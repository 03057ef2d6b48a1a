//! Prometheus metrics for the API server.

use axum::body::Body;
use axum::http::{Request, Response};
use axum::middleware::Next;
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;
use std::time::Instant;

/// Initialize the Prometheus metrics recorder.
pub fn init_metrics() -> PrometheusHandle {
    PrometheusBuilder::new()
        .install_recorder()
        .expect("Failed to install Prometheus recorder")
}

/// Metric names as constants for consistency.
pub mod names {
    // HTTP metrics
    pub const HTTP_REQUESTS_TOTAL: &str = "reelgen_http_requests_total";
    pub const HTTP_REQUEST_DURATION_SECONDS: &str = "reelgen_http_request_duration_seconds";
    pub const HTTP_REQUESTS_IN_FLIGHT: &str = "reelgen_http_requests_in_flight";

    // Job metrics
    pub const JOBS_CREATED_TOTAL: &str = "reelgen_jobs_created_total";
    pub const SEGMENTS_REGENERATED_TOTAL: &str = "reelgen_segments_regenerated_total";
    pub const WEBHOOKS_RECEIVED_TOTAL: &str = "reelgen_webhooks_received_total";
}

/// Record an HTTP request.
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    let labels = [
        ("method", method.to_string()),
        ("path", sanitize_path(path)),
        ("status", status.to_string()),
    ];

    counter!(names::HTTP_REQUESTS_TOTAL, &labels).increment(1);
    histogram!(names::HTTP_REQUEST_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record a created job.
pub fn record_job_created(segment_count: u32) {
    let labels = [("segments", segment_count.to_string())];
    counter!(names::JOBS_CREATED_TOTAL, &labels).increment(1);
}

/// Record a segment regeneration request.
pub fn record_segment_regenerated() {
    counter!(names::SEGMENTS_REGENERATED_TOTAL).increment(1);
}

/// Record a provider webhook delivery.
pub fn record_webhook_received(status: &str) {
    let labels = [("status", status.to_string())];
    counter!(names::WEBHOOKS_RECEIVED_TOTAL, &labels).increment(1);
}

static UUID_RE: OnceLock<regex_lite::Regex> = OnceLock::new();
static SEGMENT_RE: OnceLock<regex_lite::Regex> = OnceLock::new();
static WEBHOOK_RE: OnceLock<regex_lite::Regex> = OnceLock::new();

/// Sanitize path for metrics labels (collapse IDs).
fn sanitize_path(path: &str) -> String {
    let uuid = UUID_RE.get_or_init(|| {
        regex_lite::Regex::new(r"[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}")
            .unwrap()
    });
    let segment =
        SEGMENT_RE.get_or_init(|| regex_lite::Regex::new(r"/segments/[0-9]+").unwrap());
    let webhook =
        WEBHOOK_RE.get_or_init(|| regex_lite::Regex::new(r"/video/:id/[0-9]+").unwrap());

    let path = uuid.replace_all(path, ":id");
    let path = segment.replace_all(&path, "/segments/:index");
    let path = webhook.replace_all(&path, "/video/:id/:index");
    path.to_string()
}

/// Metrics middleware for HTTP requests.
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response<Body> {
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let start = Instant::now();

    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).increment(1.0);
    let response = next.run(request).await;
    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).decrement(1.0);

    let status = response.status().as_u16();
    record_http_request(&method, &path, status, start.elapsed().as_secs_f64());

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_path() {
        assert_eq!(
            sanitize_path("/api/jobs/550e8400-e29b-41d4-a716-446655440000/segments/3/regenerate"),
            "/api/jobs/:id/segments/:index/regenerate"
        );
        assert_eq!(
            sanitize_path("/api/webhooks/video/550e8400-e29b-41d4-a716-446655440000/7"),
            "/api/webhooks/video/:id/:index"
        );
    }
}
