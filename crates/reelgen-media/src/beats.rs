//! Music beat analysis and beat snapping.
//!
//! The analyzer is an external executable that prints a JSON array of
//! ascending beat timestamps (seconds) on success, or `{"error": "..."}`
//! on failure.

use std::path::Path;
use std::process::Stdio;

use serde::Deserialize;
use tokio::process::Command;
use tracing::debug;

use crate::error::{MediaError, MediaResult};

/// Error object the analyzer emits instead of a timestamp array.
#[derive(Debug, Deserialize)]
struct AnalyzerError {
    error: String,
}

/// Wrapper around the external beat-analyzer executable.
#[derive(Debug, Clone)]
pub struct BeatAnalyzer {
    binary: String,
}

impl BeatAnalyzer {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// Binary name from `BEAT_ANALYZER_BIN`, default `analyze_beats`.
    pub fn from_env() -> Self {
        Self::new(std::env::var("BEAT_ANALYZER_BIN").unwrap_or_else(|_| "analyze_beats".to_string()))
    }

    /// Analyze a local audio file and return ascending beat timestamps.
    pub async fn analyze(&self, audio_path: impl AsRef<Path>) -> MediaResult<Vec<f64>> {
        let audio_path = audio_path.as_ref();

        if !audio_path.exists() {
            return Err(MediaError::FileNotFound(audio_path.to_path_buf()));
        }

        which::which(&self.binary)
            .map_err(|_| MediaError::ExecutableNotFound(self.binary.clone()))?;

        let output = Command::new(&self.binary)
            .arg(audio_path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await?;

        let stdout = String::from_utf8_lossy(&output.stdout);

        // The analyzer reports errors as JSON on stdout, not exit codes alone.
        if let Ok(err) = serde_json::from_str::<AnalyzerError>(&stdout) {
            return Err(MediaError::BeatAnalysisFailed(err.error));
        }
        if !output.status.success() {
            return Err(MediaError::BeatAnalysisFailed(
                String::from_utf8_lossy(&output.stderr).to_string(),
            ));
        }

        let beats: Vec<f64> = serde_json::from_str(&stdout)?;
        debug!("Detected {} beats in {}", beats.len(), audio_path.display());
        Ok(beats)
    }
}

/// Find the first beat at or after `time`.
///
/// `beats` must be ascending. Returns `None` when no beat remains, in
/// which case callers fall back to the unsnapped duration.
pub fn snap_forward(beats: &[f64], time: f64) -> Option<f64> {
    let idx = beats.partition_point(|&b| b < time);
    beats.get(idx).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snap_forward_picks_next_beat() {
        let beats = [1.0, 2.5, 4.8, 6.0];
        assert_eq!(snap_forward(&beats, 4.2), Some(4.8));
        assert_eq!(snap_forward(&beats, 0.0), Some(1.0));
        // Exact hit snaps to itself.
        assert_eq!(snap_forward(&beats, 2.5), Some(2.5));
    }

    #[test]
    fn test_snap_forward_past_last_beat() {
        let beats = [1.0, 2.5];
        assert_eq!(snap_forward(&beats, 3.0), None);
        assert_eq!(snap_forward(&[], 3.0), None);
    }
}
