//! Video dispatch loop.
//!
//! Submits prepared segments to the async video provider one at a time,
//! in index order. Sequential dispatch keeps the account under the
//! provider's rate limit most of the time; when a submission is still
//! rejected, the retry layer honors the embedded reset hint. A segment
//! whose submission ultimately fails is marked Failed and the loop
//! moves on.

use tracing::{info, warn};

use reelgen_models::{Job, Segment};
use reelgen_providers::{default_classifier, submit_with_retry, VideoGenerator};
use reelgen_store::SegmentStore;

use crate::context::OrchestratorContext;
use crate::error::OrchestratorResult;

/// Dispatch every dispatchable segment of a job, in index order.
///
/// Returns how many segments were handed to the provider. The caller
/// decides whether zero submissions means the job is dead.
pub async fn dispatch_segments(
    ctx: &OrchestratorContext,
    job: &Job,
    segments: &[Segment],
) -> OrchestratorResult<usize> {
    let mut submitted = 0;
    for segment in segments {
        if !segment.is_dispatchable() {
            continue;
        }
        if dispatch_one(ctx, job, segment).await? {
            submitted += 1;
        }
    }
    Ok(submitted)
}

/// Dispatch a single segment. Returns whether the provider accepted it.
pub async fn dispatch_one(
    ctx: &OrchestratorContext,
    job: &Job,
    segment: &Segment,
) -> OrchestratorResult<bool> {
    // image_url is checked by is_dispatchable; regeneration callers go
    // through the same gate.
    let Some(image_url) = segment.image_url.as_deref() else {
        return Ok(false);
    };

    // Claim the segment before talking to the provider so a concurrent
    // dispatcher can never double-submit it.
    if !ctx
        .segments
        .try_mark_generating(&job.id, segment.index)
        .await?
    {
        return Ok(false);
    }

    let callback_url = ctx.config.callback_url(job.id.as_str(), segment.index);
    let motion = segment.motion_prompt.as_deref();

    let result = submit_with_retry(&ctx.config.retry, default_classifier, || {
        ctx.video.submit(image_url, motion, &callback_url)
    })
    .await;

    match result {
        Ok(prediction_id) => {
            // The webhook can already have landed for this prediction;
            // the conditional write tolerates that race.
            let recorded = ctx
                .segments
                .try_set_prediction(&job.id, segment.index, &prediction_id)
                .await?;
            if !recorded {
                info!(
                    job_id = %job.id,
                    index = segment.index,
                    "Segment settled before its prediction id could be recorded"
                );
            }
            info!(
                job_id = %job.id,
                index = segment.index,
                prediction_id = %prediction_id,
                "Segment submitted for video generation"
            );
            Ok(true)
        }
        Err(e) => {
            warn!(
                job_id = %job.id,
                index = segment.index,
                "Video submission failed: {}", e
            );
            ctx.segments
                .fail_segment(&job.id, segment.index, &format!("video submission failed: {e}"))
                .await?;
            Ok(false)
        }
    }
}
