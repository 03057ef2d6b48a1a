//! Job creation, polling, and segment regeneration handlers.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use tracing::info;
use validator::Validate;

use reelgen_models::{CreateJobRequest, Job, JobId, JobStatusResponse, Segment, SegmentOverrides};
use reelgen_store::{JobStore, SegmentStore};

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::state::AppState;

/// POST /api/jobs
///
/// Reserve credits and start a generation job. Returns 202 with the job
/// already in Processing; clients poll `GET /api/jobs/:job_id`.
///
/// Errors:
/// - 400: invalid request body
/// - 401: not authenticated
/// - 402: insufficient credits
pub async fn create_job(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<CreateJobRequest>,
) -> ApiResult<(StatusCode, Json<JobStatusResponse>)> {
    request.validate()?;

    let job = state.orchestrator.create_job(&user.uid, &request).await?;
    state
        .orchestrator
        .spawn_pipeline(job.id.clone(), request.segment_count);

    metrics::record_job_created(request.segment_count);
    info!(job_id = %job.id, uid = %user.uid, "Job accepted");

    Ok((StatusCode::ACCEPTED, Json(JobStatusResponse::from(&job))))
}

/// GET /api/jobs/:job_id
pub async fn get_job(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
    user: AuthUser,
) -> ApiResult<Json<JobStatusResponse>> {
    let job = load_owned_job(&state, &job_id, &user).await?;
    Ok(Json(JobStatusResponse::from(&job)))
}

/// GET /api/jobs/:job_id/segments
pub async fn list_job_segments(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
    user: AuthUser,
) -> ApiResult<Json<Vec<Segment>>> {
    let job = load_owned_job(&state, &job_id, &user).await?;
    let segments = state
        .orchestrator
        .context()
        .segments
        .list_segments(&job.id)
        .await?;
    Ok(Json(segments))
}

/// POST /api/jobs/:job_id/segments/:index/regenerate
///
/// Re-prepare and re-dispatch one segment, optionally overriding its
/// script or prompts. Only accepted once the job has settled (409
/// otherwise), and never re-finalizes it.
pub async fn regenerate_segment(
    State(state): State<AppState>,
    Path((job_id, index)): Path<(String, u32)>,
    user: AuthUser,
    Json(overrides): Json<SegmentOverrides>,
) -> ApiResult<(StatusCode, Json<Segment>)> {
    let job = load_owned_job(&state, &job_id, &user).await?;

    let segment = state
        .orchestrator
        .regenerate_segment(&job.id, index, &overrides)
        .await?;

    metrics::record_segment_regenerated();
    info!(job_id = %job.id, index, uid = %user.uid, "Segment regeneration dispatched");

    Ok((StatusCode::ACCEPTED, Json(segment)))
}

/// Fetch a job, enforcing ownership.
async fn load_owned_job(state: &AppState, job_id: &str, user: &AuthUser) -> ApiResult<Job> {
    let id = JobId::from_string(job_id);
    let job = state
        .orchestrator
        .context()
        .jobs
        .get_job(&id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("job {job_id}")))?;

    if job.owner_id != user.uid {
        return Err(ApiError::forbidden("job belongs to another user"));
    }
    Ok(job)
}
