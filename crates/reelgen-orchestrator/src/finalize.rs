//! Job finalization.
//!
//! Stitches the completed segment videos into the final output, uploads
//! it, settles the job row, and settles the credit reservation. Entry is
//! guarded by an atomic claim on the job row, so concurrent triggers
//! (duplicate webhooks, racing callbacks for different segments) collapse
//! to exactly one finalization. Scratch files are removed on every exit
//! path.

use std::path::{Path, PathBuf};

use tracing::{error, info, warn};

use reelgen_media::{MediaToolkit, StitchManifestEntry, StitchRequest};
use reelgen_models::{Job, JobId, Segment};
use reelgen_storage::ObjectStore;
use reelgen_store::{CreditStore, JobStore, SegmentStore};

use crate::context::OrchestratorContext;
use crate::error::{OrchestratorError, OrchestratorResult};
use crate::logging::JobLogger;

/// Finalize a job if this caller wins the claim.
///
/// Losing the claim is not an error; it means finalization already
/// happened or is in flight elsewhere.
pub async fn finalize_job(ctx: &OrchestratorContext, job_id: &JobId) -> OrchestratorResult<()> {
    if !ctx.jobs.try_claim_finalize(job_id).await? {
        return Ok(());
    }

    let Some(job) = ctx.jobs.get_job(job_id).await? else {
        return Ok(());
    };

    let logger = JobLogger::new(job_id, "finalize");
    logger.log_start("stitching segment videos");

    let scratch = ctx.scratch_dir(job_id.as_str());
    let outcome = do_finalize(ctx, &job, &scratch).await;

    // The scratch dir must not outlive the job, success or not.
    if let Err(e) = tokio::fs::remove_dir_all(&scratch).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!(job_id = %job_id, "Failed to clean finalize scratch: {}", e);
        }
    }

    match outcome {
        Ok(result_url) => {
            ctx.jobs.complete_job(job_id, &result_url).await?;
            settle_capture(ctx, &job).await;
            logger.log_completion(&format!("final video at {result_url}"));
            Ok(())
        }
        Err(e) => {
            logger.log_error(&e.to_string());
            ctx.jobs.fail_job(job_id, &e.to_string()).await?;
            settle_release(ctx, &job, &e.to_string()).await;
            Ok(())
        }
    }
}

/// Produce and upload the final video; returns its public URL.
async fn do_finalize(
    ctx: &OrchestratorContext,
    job: &Job,
    scratch: &Path,
) -> OrchestratorResult<String> {
    let segments = ctx.segments.list_segments(&job.id).await?;
    let stitchable: Vec<&Segment> = segments.iter().filter(|s| s.is_stitchable()).collect();

    if stitchable.is_empty() {
        return Err(OrchestratorError::NoUsableSegments);
    }

    tokio::fs::create_dir_all(scratch).await?;

    let mut entries = Vec::with_capacity(stitchable.len());
    for segment in &stitchable {
        entries.push(localize_segment(ctx, segment, scratch).await?);
    }

    let music = match &job.pipeline.music_url {
        Some(url) => Some(localize_music(ctx, url, scratch).await?),
        None => None,
    };

    let output = scratch.join("final.mp4");
    let request = StitchRequest {
        entries,
        music,
        aspect: job.pipeline.aspect,
        output: output.clone(),
    };
    ctx.media.stitch(&request).await?;

    let bytes = tokio::fs::read(&output).await?;
    let folder = format!("{}/{}", job.owner_id, job.id);
    let url = ctx
        .storage
        .upload(bytes, "video/mp4", &folder, "final.mp4")
        .await?;

    info!(
        job_id = %job.id,
        segments = stitchable.len(),
        "Final video uploaded"
    );
    Ok(url)
}

/// Download one segment's assets into the scratch dir.
///
/// A segment with no narration gets a silence track of its assigned
/// duration so the stitcher still has an audio stream to cut against.
async fn localize_segment(
    ctx: &OrchestratorContext,
    segment: &Segment,
    scratch: &Path,
) -> OrchestratorResult<StitchManifestEntry> {
    // is_stitchable guarantees the video URL.
    let video_url = segment
        .video_url
        .as_deref()
        .ok_or(OrchestratorError::NoUsableSegments)?;

    let video = scratch.join(format!("{}.mp4", segment.index));
    let bytes = ctx.storage.download(video_url).await?;
    tokio::fs::write(&video, bytes).await?;

    let audio = scratch.join(format!("{}.mp3", segment.index));
    match segment.audio_url.as_deref() {
        Some(url) => {
            let bytes = ctx.storage.download(url).await?;
            tokio::fs::write(&audio, bytes).await?;
        }
        None => {
            let duration = if segment.duration > 0.0 {
                segment.duration
            } else {
                ctx.config.min_segment_duration
            };
            ctx.media.synthesize_silence(duration, &audio).await?;
        }
    }

    Ok(StitchManifestEntry {
        video,
        audio,
        text: segment.script.clone(),
    })
}

async fn localize_music(
    ctx: &OrchestratorContext,
    music_url: &str,
    scratch: &Path,
) -> OrchestratorResult<PathBuf> {
    let path = scratch.join("music.mp3");
    let bytes = ctx.storage.download(music_url).await?;
    tokio::fs::write(&path, bytes).await?;
    Ok(path)
}

/// Commit the job's credit spend. Settlement problems are logged, not
/// propagated; the finished video has already shipped.
async fn settle_capture(ctx: &OrchestratorContext, job: &Job) {
    let Some(reservation_id) = &job.reservation_id else {
        return;
    };
    if let Err(e) = ctx.credits.capture(reservation_id).await {
        error!(
            job_id = %job.id,
            reservation_id = %reservation_id,
            "Failed to capture credit reservation: {}", e
        );
    }
}

/// Refund the job's credit spend. Safe to call more than once.
pub(crate) async fn settle_release(ctx: &OrchestratorContext, job: &Job, reason: &str) {
    let Some(reservation_id) = &job.reservation_id else {
        return;
    };
    if let Err(e) = ctx.credits.release(reservation_id, reason).await {
        error!(
            job_id = %job.id,
            reservation_id = %reservation_id,
            "Failed to release credit reservation: {}", e
        );
    }
}
