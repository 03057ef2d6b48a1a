//! Axum HTTP API server.
//!
//! Exposes job creation and polling, segment regeneration, the video
//! provider's webhook, credit balance, health probes, and Prometheus
//! metrics over the orchestrator.

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod state;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
