//! Uniform interface over the external media executables.
//!
//! The orchestrator talks to local tooling through this trait so tests
//! can run without ffmpeg, the analyzer, or the stitcher installed.

use std::path::Path;

use async_trait::async_trait;

use crate::beats::BeatAnalyzer;
use crate::error::MediaResult;
use crate::stitch::{StitchRequest, Stitcher};

/// Local media operations the pipeline needs.
#[async_trait]
pub trait MediaToolkit: Send + Sync {
    /// Duration of a local media file in seconds.
    async fn probe_duration(&self, path: &Path) -> MediaResult<f64>;

    /// Render silence of the given duration to `output`.
    async fn synthesize_silence(&self, duration: f64, output: &Path) -> MediaResult<()>;

    /// Beat timestamps of a local audio file, seconds, ascending.
    async fn analyze_beats(&self, audio: &Path) -> MediaResult<Vec<f64>>;

    /// Run the external stitcher synchronously.
    async fn stitch(&self, request: &StitchRequest) -> MediaResult<()>;
}

/// Production toolkit backed by the real executables.
#[derive(Debug, Clone)]
pub struct ExternalToolkit {
    stitcher: Stitcher,
    analyzer: BeatAnalyzer,
}

impl ExternalToolkit {
    pub fn new(stitcher: Stitcher, analyzer: BeatAnalyzer) -> Self {
        Self { stitcher, analyzer }
    }

    pub fn from_env() -> Self {
        Self::new(Stitcher::from_env(), BeatAnalyzer::from_env())
    }
}

#[async_trait]
impl MediaToolkit for ExternalToolkit {
    async fn probe_duration(&self, path: &Path) -> MediaResult<f64> {
        crate::probe::probe_duration(path).await
    }

    async fn synthesize_silence(&self, duration: f64, output: &Path) -> MediaResult<()> {
        crate::silence::synthesize_silence(duration, output).await
    }

    async fn analyze_beats(&self, audio: &Path) -> MediaResult<Vec<f64>> {
        self.analyzer.analyze(audio).await
    }

    async fn stitch(&self, request: &StitchRequest) -> MediaResult<()> {
        self.stitcher.run(request).await
    }
}
