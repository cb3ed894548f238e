//! API routes.

use std::sync::Arc;

use axum::middleware;
use axum::routing::{get, patch, post};
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;

use crate::handlers::{
    create_job, delete_job, get_job, health, job_stats, list_jobs, login, ready, register, update_job,
    update_user,
};
use crate::metrics::metrics_middleware;
use crate::middleware::{
    cors_layer, rate_limit_middleware, request_id, request_logging, security_headers, RateLimiterCache,
};
use crate::state::AppState;

/// Versioned prefix for the JSON API.
pub const API_PREFIX: &str = "/api/v1";

/// Create the API router.
pub fn create_router(state: AppState, metrics_handle: Option<PrometheusHandle>) -> Router {
    // Registration and login get a stricter per-IP window
    let trust_proxy = state.config.trust_proxy_headers;
    let auth_limiter = Arc::new(
        RateLimiterCache::per_window(
            state.config.auth_rate_limit_max,
            state.config.auth_rate_limit_window,
        )
        .trust_proxy_headers(trust_proxy),
    );
    let api_limiter = Arc::new(
        RateLimiterCache::per_second(state.config.rate_limit_rps).trust_proxy_headers(trust_proxy),
    );

    let auth_routes = Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .layer(middleware::from_fn_with_state(auth_limiter, rate_limit_middleware));

    let job_routes = Router::new()
        .route("/jobs", get(list_jobs).post(create_job))
        .route("/jobs/stats", get(job_stats))
        .route("/jobs/:id", get(get_job).patch(update_job).delete(delete_job));

    let protected_routes = Router::new()
        .route("/auth/updateUser", patch(update_user))
        .merge(job_routes)
        .layer(middleware::from_fn_with_state(api_limiter, rate_limit_middleware));

    let api_routes = Router::new().merge(auth_routes).merge(protected_routes);

    let health_routes = Router::new()
        .route("/health", get(health))
        .route("/healthz", get(health))
        .route("/ready", get(ready));

    // Metrics endpoint (if enabled)
    let metrics_routes = if let Some(handle) = metrics_handle {
        Router::new().route("/metrics", get(move || async move { handle.render() }))
    } else {
        Router::new()
    };

    Router::new()
        .nest(API_PREFIX, api_routes)
        .merge(health_routes)
        .merge(metrics_routes)
        .layer(RequestBodyLimitLayer::new(state.config.max_body_size))
        .layer(TimeoutLayer::new(state.config.request_timeout))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(security_headers))
        .layer(middleware::from_fn(request_id))
        .layer(middleware::from_fn(request_logging))
        .layer(cors_layer(&state.config.cors_origins))
        .with_state(state)
}
