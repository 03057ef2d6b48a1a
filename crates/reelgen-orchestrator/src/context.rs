//! Shared dependency bundle for the pipeline stages.

use std::sync::Arc;

use reelgen_media::MediaToolkit;
use reelgen_providers::{ImageGenerator, SpeechSynthesizer, TextGenerator, VideoGenerator};
use reelgen_storage::ObjectStore;
use reelgen_store::{CreditStore, JobStore, SegmentStore};

use crate::config::OrchestratorConfig;

/// Everything a pipeline stage needs, behind trait objects so tests can
/// swap in fakes per seam.
#[derive(Clone)]
pub struct OrchestratorContext {
    pub config: OrchestratorConfig,
    pub jobs: Arc<dyn JobStore>,
    pub segments: Arc<dyn SegmentStore>,
    pub credits: Arc<dyn CreditStore>,
    pub storage: Arc<dyn ObjectStore>,
    pub text: Arc<dyn TextGenerator>,
    pub speech: Arc<dyn SpeechSynthesizer>,
    pub image: Arc<dyn ImageGenerator>,
    pub video: Arc<dyn VideoGenerator>,
    pub media: Arc<dyn MediaToolkit>,
}

impl OrchestratorContext {
    /// Scratch directory for one job's finalize pass.
    pub fn scratch_dir(&self, job_id: &str) -> std::path::PathBuf {
        std::path::Path::new(&self.config.work_dir)
            .join(job_id)
            .join("finalize")
    }
}
