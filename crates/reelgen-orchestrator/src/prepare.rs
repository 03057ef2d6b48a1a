//! Preparation fan-out.
//!
//! Resolves each segment's narration audio and still image concurrently,
//! then assigns durations in a sequential pass against a running
//! timeline cursor. Asset resolution is failure-tolerant per segment: a
//! failed narration downgrades the segment to silent, a failed image
//! marks only that segment Failed. The job itself keeps going as long
//! as at least one segment survives.

use std::path::PathBuf;

use tracing::warn;

use reelgen_media::MediaToolkit;
use reelgen_models::{Job, Segment, SegmentStatus};
use reelgen_providers::{ImageGenerator, SpeechSynthesizer};
use reelgen_storage::ObjectStore;

use crate::context::OrchestratorContext;
use crate::error::OrchestratorResult;
use crate::timing::{narrated_duration, silent_duration};

/// Resolve audio and image assets for all segments concurrently.
///
/// Returns the narration audio length per segment, aligned by position
/// (`None` for silent or failed segments). Mutates segments in place:
/// URLs on success, `Failed` status on image failure.
pub async fn resolve_assets(
    ctx: &OrchestratorContext,
    job: &Job,
    segments: &mut [Segment],
) -> OrchestratorResult<Vec<Option<f64>>> {
    let scratch = prepare_scratch(ctx, job.id.as_str());
    tokio::fs::create_dir_all(&scratch).await?;

    let futures = segments
        .iter_mut()
        .map(|seg| resolve_one(ctx, job, seg, &scratch));
    let audio_lens = futures::future::join_all(futures).await;

    if let Err(e) = tokio::fs::remove_dir_all(&scratch).await {
        warn!(job_id = %job.id, "Failed to clean prepare scratch: {}", e);
    }

    Ok(audio_lens)
}

/// Resolve one segment's assets, audio and image concurrently.
/// Returns the narration length when audio was produced.
async fn resolve_one(
    ctx: &OrchestratorContext,
    job: &Job,
    segment: &mut Segment,
    scratch: &PathBuf,
) -> Option<f64> {
    let (audio, image) = tokio::join!(
        resolve_audio(ctx, job, segment.index, &segment.script, scratch),
        resolve_image(ctx, job, segment.index, &segment.visual_prompt),
    );

    let audio_len = match audio {
        Some((url, len)) => {
            segment.audio_url = Some(url);
            Some(len)
        }
        None => None,
    };

    match image {
        Ok(url) => segment.image_url = Some(url),
        Err(reason) => {
            segment.status = SegmentStatus::Failed;
            segment.error = Some(reason);
        }
    }

    audio_len
}

/// Synthesize, measure, and upload one segment's narration.
/// Any failure downgrades the segment to silent.
async fn resolve_audio(
    ctx: &OrchestratorContext,
    job: &Job,
    index: u32,
    script: &str,
    scratch: &PathBuf,
) -> Option<(String, f64)> {
    if script.trim().is_empty() {
        return None;
    }

    let voice = job.pipeline.voice.as_deref();
    let bytes = match ctx.speech.synthesize(script, voice).await {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(
                job_id = %job.id,
                index,
                "Narration synthesis failed, segment will be silent: {}", e
            );
            return None;
        }
    };

    // Probe needs a local file; keep it only for the measurement.
    let local = scratch.join(format!("{index}.mp3"));
    let duration = async {
        tokio::fs::write(&local, &bytes).await?;
        let d = ctx.media.probe_duration(&local).await?;
        Ok::<f64, crate::error::OrchestratorError>(d)
    }
    .await;

    let duration = match duration {
        Ok(d) => d,
        Err(e) => {
            warn!(
                job_id = %job.id,
                index,
                "Could not measure narration length, segment will be silent: {}", e
            );
            return None;
        }
    };

    let folder = asset_folder(job, "audio");
    let filename = format!("{index}.mp3");
    match ctx.storage.upload(bytes, "audio/mpeg", &folder, &filename).await {
        Ok(url) => Some((url, duration)),
        Err(e) => {
            warn!(
                job_id = %job.id,
                index,
                "Narration upload failed, segment will be silent: {}", e
            );
            None
        }
    }
}

/// Generate and upload one segment's still image. Failure here fails
/// the segment, carried back as the error string.
async fn resolve_image(
    ctx: &OrchestratorContext,
    job: &Job,
    index: u32,
    visual_prompt: &str,
) -> Result<String, String> {
    let aspect = job.pipeline.aspect.as_str();
    let bytes = ctx
        .image
        .generate_image(visual_prompt, aspect)
        .await
        .map_err(|e| format!("image generation failed: {e}"))?;

    let folder = asset_folder(job, "images");
    let filename = format!("{index}.png");
    ctx.storage
        .upload(bytes, "image/png", &folder, &filename)
        .await
        .map_err(|e| format!("image upload failed: {e}"))
}

/// Assign beat-snapped durations in index order.
///
/// Failed segments take no time on the output timeline. Returns the
/// final cursor so regeneration can resume from a mid-job offset.
pub fn assign_durations(
    beats: &[f64],
    min_duration: f64,
    start_cursor: f64,
    segments: &mut [Segment],
    audio_lens: &[Option<f64>],
) -> f64 {
    let mut cursor = start_cursor;
    for (segment, audio_len) in segments.iter_mut().zip(audio_lens) {
        if segment.status == SegmentStatus::Failed {
            segment.duration = 0.0;
            continue;
        }
        let duration = match audio_len {
            Some(len) => narrated_duration(beats, cursor, *len),
            None => silent_duration(beats, cursor, min_duration),
        };
        segment.duration = duration;
        cursor += duration;
    }
    cursor
}

/// Detect the music track's beat grid.
///
/// Any failure here degrades to an empty grid: timing falls back to raw
/// audio lengths, which is always a valid output.
pub async fn analyze_music(ctx: &OrchestratorContext, job: &Job, music_url: &str) -> Vec<f64> {
    let scratch = prepare_scratch(ctx, job.id.as_str());
    let local = scratch.join("music.mp3");

    let result = async {
        let bytes = ctx.storage.download(music_url).await?;
        tokio::fs::create_dir_all(&scratch).await?;
        tokio::fs::write(&local, bytes).await?;
        let beats = ctx.media.analyze_beats(&local).await?;
        Ok::<Vec<f64>, crate::error::OrchestratorError>(beats)
    }
    .await;

    let _ = tokio::fs::remove_file(&local).await;

    match result {
        Ok(beats) => beats,
        Err(e) => {
            warn!(job_id = %job.id, "Beat analysis failed, using raw durations: {}", e);
            Vec::new()
        }
    }
}

fn asset_folder(job: &Job, kind: &str) -> String {
    format!("{}/{}/{}", job.owner_id, job.id, kind)
}

fn prepare_scratch(ctx: &OrchestratorContext, job_id: &str) -> PathBuf {
    std::path::Path::new(&ctx.config.work_dir)
        .join(job_id)
        .join("prepare")
}

#[cfg(test)]
mod tests {
    use super::*;
    use reelgen_models::JobId;

    fn seg(index: u32) -> Segment {
        Segment::new(JobId::from_string("job-1"), index, "text", "prompt")
    }

    #[test]
    fn test_assign_durations_with_beats() {
        let beats = [0.0, 1.6, 3.2, 4.8, 6.4, 8.0, 9.6];
        let mut segments = vec![seg(0), seg(1)];
        // Narrated 4.2s snaps to 4.8; silent from 4.8 with min 3.0 snaps
        // forward to beat 8.0 for a 3.2s run.
        let lens = vec![Some(4.2), None];
        let cursor = assign_durations(&beats, 3.0, 0.0, &mut segments, &lens);

        assert!((segments[0].duration - 4.8).abs() < 1e-9);
        assert!((segments[1].duration - 3.2).abs() < 1e-9);
        assert!((cursor - 8.0).abs() < 1e-9);
    }

    #[test]
    fn test_assign_durations_without_beats() {
        let mut segments = vec![seg(0), seg(1)];
        let lens = vec![Some(4.2), None];
        let cursor = assign_durations(&[], 3.0, 0.0, &mut segments, &lens);

        assert!((segments[0].duration - 4.2).abs() < 1e-9);
        assert!((segments[1].duration - 3.0).abs() < 1e-9);
        assert!((cursor - 7.2).abs() < 1e-9);
    }

    #[test]
    fn test_failed_segments_take_no_timeline_space() {
        let mut segments = vec![seg(0), seg(1), seg(2)];
        segments[1].status = SegmentStatus::Failed;
        let lens = vec![Some(2.0), Some(5.0), Some(2.0)];
        let cursor = assign_durations(&[], 3.0, 0.0, &mut segments, &lens);

        assert_eq!(segments[1].duration, 0.0);
        assert!((cursor - 4.0).abs() < 1e-9);
    }
}
