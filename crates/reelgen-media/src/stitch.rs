//! External stitcher invocation.
//!
//! The stitcher is a black box: it takes a JSON manifest of ordered
//! `{video, audio, text}` triples, loops each video to its audio's
//! length, burns subtitles, concatenates, optionally mixes background
//! music, and writes one output file. Non-zero exit means failure with
//! diagnostics on stderr.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use serde::Serialize;
use tokio::process::Command;
use tracing::{debug, info};

use reelgen_models::AspectRatio;

use crate::error::{MediaError, MediaResult};

/// One manifest entry: a segment's local assets plus its subtitle text.
#[derive(Debug, Clone, Serialize)]
pub struct StitchManifestEntry {
    /// Local video file
    pub video: PathBuf,
    /// Local audio file (narration or synthesized silence)
    pub audio: PathBuf,
    /// Subtitle text burned onto the segment
    pub text: String,
}

/// A full stitch request.
#[derive(Debug, Clone)]
pub struct StitchRequest {
    /// Ordered segment entries
    pub entries: Vec<StitchManifestEntry>,
    /// Optional local background-music file
    pub music: Option<PathBuf>,
    /// Output aspect ratio
    pub aspect: AspectRatio,
    /// Output file path
    pub output: PathBuf,
}

/// Wrapper around the external stitcher executable.
#[derive(Debug, Clone)]
pub struct Stitcher {
    binary: String,
}

impl Stitcher {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// Binary name from `STITCHER_BIN`, default `stitch_clips`.
    pub fn from_env() -> Self {
        Self::new(std::env::var("STITCHER_BIN").unwrap_or_else(|_| "stitch_clips".to_string()))
    }

    /// Write the manifest next to the output file and run the stitcher,
    /// waiting synchronously for completion.
    pub async fn run(&self, request: &StitchRequest) -> MediaResult<()> {
        which::which(&self.binary)
            .map_err(|_| MediaError::ExecutableNotFound(self.binary.clone()))?;

        let manifest_path = request.output.with_extension("clips.json");
        self.write_manifest(&request.entries, &manifest_path).await?;

        let mut cmd = Command::new(&self.binary);
        cmd.arg("--clips")
            .arg(&manifest_path)
            .arg("--output")
            .arg(&request.output)
            .arg("--format")
            .arg(request.aspect.as_str());

        if let Some(music) = &request.music {
            cmd.arg("--audio").arg(music);
        }

        debug!(
            "Running stitcher: {} ({} segments, {})",
            self.binary,
            request.entries.len(),
            request.aspect
        );

        let output = cmd
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await?;

        if !output.status.success() {
            return Err(MediaError::StitchFailed {
                exit_code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            });
        }

        if !request.output.exists() {
            return Err(MediaError::StitchFailed {
                exit_code: output.status.code(),
                stderr: "stitcher exited 0 but produced no output file".to_string(),
            });
        }

        info!("Stitched {} segments to {}", request.entries.len(), request.output.display());
        Ok(())
    }

    async fn write_manifest(
        &self,
        entries: &[StitchManifestEntry],
        path: &Path,
    ) -> MediaResult<()> {
        let json = serde_json::to_vec_pretty(entries)?;
        tokio::fs::write(path, json).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manifest_entry_shape() {
        // The stitcher contract is positional JSON objects with exactly
        // these keys; serialization must not rename them.
        let entry = StitchManifestEntry {
            video: PathBuf::from("/tmp/0.mp4"),
            audio: PathBuf::from("/tmp/0.mp3"),
            text: "hello world".into(),
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["video"], "/tmp/0.mp4");
        assert_eq!(json["audio"], "/tmp/0.mp3");
        assert_eq!(json["text"], "hello world");
    }

    #[tokio::test]
    async fn test_missing_stitcher_binary() {
        let stitcher = Stitcher::new("definitely-not-a-real-binary");
        let request = StitchRequest {
            entries: vec![],
            music: None,
            aspect: AspectRatio::Portrait,
            output: PathBuf::from("/tmp/out.mp4"),
        };
        assert!(matches!(
            stitcher.run(&request).await,
            Err(MediaError::ExecutableNotFound(_))
        ));
    }
}
