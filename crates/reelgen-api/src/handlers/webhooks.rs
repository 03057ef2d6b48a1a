//! Video provider webhook handler.

use axum::extract::{Path, State};
use axum::Json;
use serde_json::json;
use tracing::info;

use reelgen_models::JobId;
use reelgen_orchestrator::webhook::{handle_callback, VideoCallback};

use crate::error::ApiResult;
use crate::metrics;
use crate::state::AppState;

/// POST /api/webhooks/video/:job_id/:index
///
/// Terminal delivery for one segment's async video generation. The
/// provider retries until it sees a 2xx, so this must stay idempotent;
/// duplicates, out-of-order deliveries, and references to unknown jobs
/// or segments are all absorbed downstream and acknowledged with 200.
pub async fn video_webhook(
    State(state): State<AppState>,
    Path((job_id, index)): Path<(String, u32)>,
    Json(callback): Json<VideoCallback>,
) -> ApiResult<Json<serde_json::Value>> {
    info!(
        job_id = %job_id,
        index,
        status = %callback.status,
        "Video webhook received"
    );
    metrics::record_webhook_received(&callback.status);

    let id = JobId::from_string(job_id);
    handle_callback(state.orchestrator.context(), &id, index, &callback).await?;

    Ok(Json(json!({ "ok": true })))
}
