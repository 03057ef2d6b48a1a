//! Segment definitions.
//!
//! A segment is one narrated, visually-illustrated unit of the output
//! video. Segments are keyed by `(job_id, index)` with a contiguous,
//! zero-based index assigned at creation.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::JobId;

/// Segment generation status.
///
/// Transitions are strictly forward: Pending -> Generating -> {Completed | Failed}.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum SegmentStatus {
    /// Prepared (audio/image resolved), not yet submitted
    #[default]
    Pending,
    /// Submitted to the async video provider, waiting for a callback
    Generating,
    /// Video asset produced and re-hosted
    Completed,
    /// Preparation or generation failed
    Failed,
}

impl SegmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SegmentStatus::Pending => "pending",
            SegmentStatus::Generating => "generating",
            SegmentStatus::Completed => "completed",
            SegmentStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, SegmentStatus::Completed | SegmentStatus::Failed)
    }
}

impl fmt::Display for SegmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One segment of a generation job.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Segment {
    /// Owning job
    pub job_id: JobId,

    /// Zero-based position within the job
    pub index: u32,

    /// Narration text
    pub script: String,

    /// Prompt for the still-image generation
    pub visual_prompt: String,

    /// Optional motion prompt for the video provider
    #[serde(skip_serializing_if = "Option::is_none")]
    pub motion_prompt: Option<String>,

    /// Narration audio URL (None if synthesis failed or was skipped)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_url: Option<String>,

    /// Still image URL (None if generation failed)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,

    /// Final video asset URL (set by the webhook handler)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,

    /// Generation status
    #[serde(default)]
    pub status: SegmentStatus,

    /// Correlation id from the async video provider.
    /// Set at most once, and only while status is Generating.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prediction_id: Option<String>,

    /// Playback duration in seconds (audio length or timing policy)
    pub duration: f64,

    /// Error message (if failed)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Segment {
    /// Create a new pending segment.
    pub fn new(job_id: JobId, index: u32, script: impl Into<String>, visual_prompt: impl Into<String>) -> Self {
        Self {
            job_id,
            index,
            script: script.into(),
            visual_prompt: visual_prompt.into(),
            motion_prompt: None,
            audio_url: None,
            image_url: None,
            video_url: None,
            status: SegmentStatus::Pending,
            prediction_id: None,
            duration: 0.0,
            error: None,
        }
    }

    /// Whether this segment can be submitted to the video provider.
    pub fn is_dispatchable(&self) -> bool {
        self.status == SegmentStatus::Pending && self.image_url.is_some()
    }

    /// Whether this segment contributes a video asset to the final stitch.
    pub fn is_stitchable(&self) -> bool {
        self.status == SegmentStatus::Completed && self.video_url.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatchable_requires_image() {
        let mut seg = Segment::new(JobId::new(), 0, "hello", "a sunrise");
        assert!(!seg.is_dispatchable());

        seg.image_url = Some("https://cdn.example/img.png".into());
        assert!(seg.is_dispatchable());

        seg.status = SegmentStatus::Generating;
        assert!(!seg.is_dispatchable());
    }

    #[test]
    fn test_stitchable_requires_completed_video() {
        let mut seg = Segment::new(JobId::new(), 0, "hello", "a sunrise");
        seg.status = SegmentStatus::Completed;
        assert!(!seg.is_stitchable());

        seg.video_url = Some("https://cdn.example/seg.mp4".into());
        assert!(seg.is_stitchable());
    }
}
