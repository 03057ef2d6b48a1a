//! Silent-audio synthesis.
//!
//! Segments that lost their narration still need a matching audio track
//! for the stitcher's audio-first conforming, so we render silence of
//! the segment's duration.

use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

use crate::error::{MediaError, MediaResult};

/// Render `duration` seconds of silence as an mp3 at `output`.
pub async fn synthesize_silence(duration: f64, output: impl AsRef<Path>) -> MediaResult<()> {
    let output = output.as_ref();

    which::which("ffmpeg").map_err(|_| MediaError::FfmpegNotFound)?;

    debug!("Synthesizing {:.2}s of silence to {}", duration, output.display());

    let result = Command::new("ffmpeg")
        .args([
            "-y",
            "-v",
            "error",
            "-f",
            "lavfi",
            "-i",
            "anullsrc=r=44100:cl=stereo",
            "-t",
            &format!("{:.3}", duration),
            "-c:a",
            "libmp3lame",
        ])
        .arg(output)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await?;

    if !result.status.success() {
        return Err(MediaError::FfmpegFailed {
            message: format!("silence synthesis failed for {}", output.display()),
            stderr: Some(String::from_utf8_lossy(&result.stderr).to_string()),
        });
    }

    Ok(())
}
