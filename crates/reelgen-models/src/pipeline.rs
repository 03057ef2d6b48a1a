//! Typed pipeline context carried on the job row.
//!
//! Stages used to stash intermediate state in an open metadata bag; the
//! fields different stages actually read and write are made explicit here.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::AspectRatio;

/// Intermediate pipeline state shared between stages of one job.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct PipelineContext {
    /// Target output aspect ratio
    #[serde(default)]
    pub aspect: AspectRatio,

    /// Narration voice identifier passed to the speech provider
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voice: Option<String>,

    /// Background music asset URL (if a track was selected)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub music_url: Option<String>,

    /// Detected beat timestamps of the music track, seconds, ascending.
    /// Empty when no track was selected or beat analysis failed.
    #[serde(default)]
    pub beats: Vec<f64>,
}

impl PipelineContext {
    /// Whether beat timestamps are available for duration snapping.
    pub fn has_beats(&self) -> bool {
        !self.beats.is_empty()
    }
}
