//! Prometheus metrics for the API server.

use std::sync::LazyLock;
use std::time::Instant;

use axum::body::Body;
use axum::http::{Request, Response};
use axum::middleware::Next;
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use regex::Regex;

/// Install the Prometheus recorder.
/// Returns a handle that can be used to render metrics.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}

/// Metric names as constants for consistency.
pub mod names {
    // HTTP metrics
    pub const HTTP_REQUESTS_TOTAL: &str = "jobtrack_http_requests_total";
    pub const HTTP_REQUEST_DURATION_SECONDS: &str = "jobtrack_http_request_duration_seconds";
    pub const HTTP_REQUESTS_IN_FLIGHT: &str = "jobtrack_http_requests_in_flight";

    // Domain metrics
    pub const JOBS_CREATED_TOTAL: &str = "jobtrack_jobs_created_total";
    pub const JOBS_DELETED_TOTAL: &str = "jobtrack_jobs_deleted_total";
    pub const USERS_REGISTERED_TOTAL: &str = "jobtrack_users_registered_total";
    pub const LOGINS_TOTAL: &str = "jobtrack_logins_total";

    // Rate limiting metrics
    pub const RATE_LIMIT_HITS_TOTAL: &str = "jobtrack_rate_limit_hits_total";
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

pub fn record_job_created(status: &str) {
    let labels = [("status", status.to_string())];
    counter!(names::JOBS_CREATED_TOTAL, &labels).increment(1);
}

pub fn record_job_deleted() {
    counter!(names::JOBS_DELETED_TOTAL).increment(1);
}

pub fn record_user_registered() {
    counter!(names::USERS_REGISTERED_TOTAL).increment(1);
}

pub fn record_login(success: bool) {
    let outcome = if success { "success" } else { "failure" };
    counter!(names::LOGINS_TOTAL, "outcome" => outcome).increment(1);
}

/// Record rate limit hit.
pub fn record_rate_limit_hit(endpoint: &str) {
    let labels = [("endpoint", sanitize_path(endpoint))];
    counter!(names::RATE_LIMIT_HITS_TOTAL, &labels).increment(1);
}

static UUID_SEGMENT: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}").ok()
});

static JOB_ID_SEGMENT: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"/jobs/([^/]+)").ok());

/// Sanitize path for metrics labels (remove IDs).
fn sanitize_path(path: &str) -> String {
    let mut path = path.to_string();
    if let Some(re) = UUID_SEGMENT.as_ref() {
        path = re.replace_all(&path, ":id").into_owned();
    }
    if let Some(re) = JOB_ID_SEGMENT.as_ref() {
        path = re
            .replace_all(&path, |caps: &regex::Captures| match &caps[1] {
                "stats" | ":id" => caps[0].to_string(),
                _ => "/jobs/:id".to_string(),
            })
            .into_owned();
    }
    path
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
    let duration = start.elapsed().as_secs_f64();

    record_http_request(&method, &path, status, duration);

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_path() {
        assert_eq!(
            sanitize_path("/api/v1/jobs/550e8400-e29b-41d4-a716-446655440000"),
            "/api/v1/jobs/:id"
        );
        assert_eq!(sanitize_path("/api/v1/jobs/abc123"), "/api/v1/jobs/:id");
        assert_eq!(sanitize_path("/api/v1/jobs/stats"), "/api/v1/jobs/stats");
        assert_eq!(sanitize_path("/api/v1/auth/login"), "/api/v1/auth/login");
    }
}
