//! Webhook completion handling.
//!
//! The video provider calls back at least once per prediction, possibly
//! with duplicates, out of order across segments, and occasionally
//! before the dispatcher has recorded the prediction id. Every path in
//! here must therefore be safe to replay. Finalization is triggered
//! from the callback that settles the last generating segment; the
//! atomic claim in the finalizer keeps that exactly-once even when two
//! callbacks observe the drained state together.

use serde::Deserialize;
use tracing::{info, warn};

use reelgen_models::{JobId, JobStatus};
use reelgen_storage::ObjectStore;
use reelgen_store::{JobStore, SegmentStore};

use crate::context::OrchestratorContext;
use crate::error::{OrchestratorError, OrchestratorResult};
use crate::finalize;

/// Callback payload from the async video provider.
#[derive(Debug, Clone, Deserialize)]
pub struct VideoCallback {
    /// Provider status: "succeeded", "failed", "canceled", or an
    /// intermediate status we ignore.
    pub status: String,

    /// Output video URL(s) on success.
    #[serde(default)]
    pub output: Option<CallbackOutput>,

    /// Provider error message on failure.
    #[serde(default)]
    pub error: Option<String>,
}

/// Providers deliver either a bare URL or a list of them.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum CallbackOutput {
    One(String),
    Many(Vec<String>),
}

impl CallbackOutput {
    /// The primary output URL.
    pub fn url(&self) -> Option<&str> {
        match self {
            CallbackOutput::One(url) => Some(url),
            CallbackOutput::Many(urls) => urls.first().map(String::as_str),
        }
    }
}

/// Process one provider callback for `(job_id, index)`.
///
/// Settles the segment, then finalizes the job if this was the last
/// generating segment. Idempotent under redelivery.
pub async fn handle_callback(
    ctx: &OrchestratorContext,
    job_id: &JobId,
    index: u32,
    callback: &VideoCallback,
) -> OrchestratorResult<()> {
    // Deliveries for unknown jobs or segments are anomalies on the
    // provider's side, not ours. Log and acknowledge so the provider
    // stops redelivering.
    let Some(job) = ctx.jobs.get_job(job_id).await? else {
        warn!(job_id = %job_id, index, "Dropping callback for unknown job");
        return Ok(());
    };
    if ctx.segments.get_segment(job_id, index).await?.is_none() {
        warn!(job_id = %job_id, index, "Dropping callback for unknown segment");
        return Ok(());
    }

    match callback.status.as_str() {
        "succeeded" => settle_success(ctx, job_id, index, callback, &job.owner_id).await?,
        "failed" | "canceled" => {
            let reason = callback
                .error
                .clone()
                .unwrap_or_else(|| format!("generation {}", callback.status));
            ctx.segments.fail_segment(job_id, index, &reason).await?;
            info!(job_id = %job_id, index, "Segment failed: {}", reason);
        }
        other => {
            // Intermediate statuses carry no settlement; acknowledge and
            // wait for the terminal delivery.
            info!(job_id = %job_id, index, "Ignoring non-terminal callback status {:?}", other);
            return Ok(());
        }
    }

    maybe_finalize(ctx, job_id).await
}

async fn settle_success(
    ctx: &OrchestratorContext,
    job_id: &JobId,
    index: u32,
    callback: &VideoCallback,
    owner_id: &str,
) -> OrchestratorResult<()> {
    let Some(provider_url) = callback.output.as_ref().and_then(CallbackOutput::url) else {
        ctx.segments
            .fail_segment(job_id, index, "provider reported success without an output")
            .await?;
        return Ok(());
    };

    // Provider URLs expire; re-host the asset before recording it.
    let rehosted = async {
        let bytes = ctx.storage.download(provider_url).await?;
        let folder = format!("{}/{}/video", owner_id, job_id);
        let url = ctx
            .storage
            .upload(bytes, "video/mp4", &folder, &format!("{index}.mp4"))
            .await?;
        Ok::<String, OrchestratorError>(url)
    }
    .await;

    match rehosted {
        Ok(url) => {
            ctx.segments.complete_segment(job_id, index, &url).await?;
            info!(job_id = %job_id, index, "Segment video re-hosted");
        }
        Err(e) => {
            warn!(job_id = %job_id, index, "Failed to re-host segment video: {}", e);
            ctx.segments
                .fail_segment(job_id, index, &format!("asset re-host failed: {e}"))
                .await?;
        }
    }
    Ok(())
}

/// Finalize if no segment is still generating and the job can still
/// accept a result. The finalizer's claim makes concurrent observers of
/// the drained state collapse to one finalization.
async fn maybe_finalize(ctx: &OrchestratorContext, job_id: &JobId) -> OrchestratorResult<()> {
    if ctx.segments.count_generating(job_id).await? > 0 {
        return Ok(());
    }
    let Some(job) = ctx.jobs.get_job(job_id).await? else {
        return Ok(());
    };
    if job.status != JobStatus::Processing {
        return Ok(());
    }
    finalize::finalize_job(ctx, job_id).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_callback_output_shapes() {
        let one: VideoCallback =
            serde_json::from_str(r#"{"status": "succeeded", "output": "https://p/x.mp4"}"#)
                .unwrap();
        assert_eq!(one.output.unwrap().url(), Some("https://p/x.mp4"));

        let many: VideoCallback = serde_json::from_str(
            r#"{"status": "succeeded", "output": ["https://p/a.mp4", "https://p/b.mp4"]}"#,
        )
        .unwrap();
        assert_eq!(many.output.unwrap().url(), Some("https://p/a.mp4"));

        let failed: VideoCallback =
            serde_json::from_str(r#"{"status": "failed", "error": "nsfw"}"#).unwrap();
        assert!(failed.output.is_none());
        assert_eq!(failed.error.as_deref(), Some("nsfw"));
    }
}
