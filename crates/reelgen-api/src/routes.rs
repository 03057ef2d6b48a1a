//! API routes.

use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::limit::RequestBodyLimitLayer;

use crate::handlers::credits::get_balance;
use crate::handlers::jobs::{create_job, get_job, list_job_segments, regenerate_segment};
use crate::handlers::webhooks::video_webhook;
use crate::handlers::{health, ready};
use crate::metrics::metrics_middleware;
use crate::middleware::{cors_layer, request_id, request_logging, security_headers};
use crate::state::AppState;

/// Create the API router.
pub fn create_router(state: AppState, metrics_handle: Option<PrometheusHandle>) -> Router {
    let job_routes = Router::new()
        .route("/jobs", post(create_job))
        .route("/jobs/:job_id", get(get_job))
        .route("/jobs/:job_id/segments", get(list_job_segments))
        .route(
            "/jobs/:job_id/segments/:index/regenerate",
            post(regenerate_segment),
        );

    let credit_routes = Router::new().route("/credits", get(get_balance));

    // Provider callbacks; unauthenticated but unguessable (job id + index).
    let webhook_routes =
        Router::new().route("/webhooks/video/:job_id/:index", post(video_webhook));

    let api_routes = Router::new()
        .merge(job_routes)
        .merge(credit_routes)
        .merge(webhook_routes);

    let health_routes = Router::new()
        .route("/health", get(health))
        .route("/healthz", get(health))
        .route("/ready", get(ready));

    let metrics_routes = if let Some(handle) = metrics_handle {
        Router::new().route("/metrics", get(move || async move { handle.render() }))
    } else {
        Router::new()
    };

    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .merge(metrics_routes)
        .layer(RequestBodyLimitLayer::new(state.config.max_body_size))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(security_headers))
        .layer(middleware::from_fn(request_id))
        .layer(middleware::from_fn(request_logging))
        .layer(cors_layer(&state.config.cors_origins))
        .with_state(state)
}
