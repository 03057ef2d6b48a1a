//! Fakes and a harness for exercising the full pipeline in-process.

use std::collections::HashSet;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use reelgen_media::{MediaError, MediaResult, MediaToolkit, StitchRequest};
use reelgen_providers::{
    ImageGenerator, ProviderError, ProviderResult, SpeechSynthesizer, TextGenerator,
    VideoGenerator,
};
use reelgen_storage::MemoryObjectStore;
use reelgen_store::MemoryStore;

use crate::config::OrchestratorConfig;
use crate::context::OrchestratorContext;
use crate::orchestrator::JobOrchestrator;

/// Text provider returning a canned response.
pub struct FakeText {
    pub response: Mutex<String>,
}

impl FakeText {
    /// A well-formed script with `n` segments, scripts "Segment i." and
    /// visual prompts "v{i}".
    pub fn with_segments(n: u32) -> Self {
        let drafts: Vec<serde_json::Value> = (0..n)
            .map(|i| {
                serde_json::json!({
                    "script": format!("Segment {i}."),
                    "visual_prompt": format!("v{i}"),
                    "motion_prompt": "slow pan"
                })
            })
            .collect();
        Self {
            response: Mutex::new(serde_json::to_string(&drafts).unwrap()),
        }
    }
}

#[async_trait]
impl TextGenerator for FakeText {
    async fn generate_text(&self, _prompt: &str) -> ProviderResult<String> {
        Ok(self.response.lock().await.clone())
    }
}

/// Speech provider returning fixed bytes, optionally failing.
#[derive(Default)]
pub struct FakeSpeech {
    pub fail: AtomicBool,
}

#[async_trait]
impl SpeechSynthesizer for FakeSpeech {
    async fn synthesize(&self, _text: &str, _voice: Option<&str>) -> ProviderResult<Vec<u8>> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(ProviderError::Status {
                status: 500,
                message: "tts down".into(),
            });
        }
        Ok(b"AUDIO".to_vec())
    }
}

/// Image provider failing for configured prompts.
#[derive(Default)]
pub struct FakeImage {
    pub fail_prompts: Mutex<HashSet<String>>,
    pub fail_all: AtomicBool,
}

#[async_trait]
impl ImageGenerator for FakeImage {
    async fn generate_image(&self, prompt: &str, _aspect: &str) -> ProviderResult<Vec<u8>> {
        if self.fail_all.load(Ordering::SeqCst) || self.fail_prompts.lock().await.contains(prompt)
        {
            return Err(ProviderError::ContentRejected(format!("rejected {prompt}")));
        }
        Ok(b"IMAGE".to_vec())
    }
}

/// Video provider recording submissions and minting prediction ids.
#[derive(Default)]
pub struct FakeVideo {
    pub submissions: Mutex<Vec<(String, String)>>,
    pub fail: AtomicBool,
    counter: AtomicU32,
}

#[async_trait]
impl VideoGenerator for FakeVideo {
    async fn submit(
        &self,
        image_url: &str,
        _motion_prompt: Option<&str>,
        callback_url: &str,
    ) -> ProviderResult<String> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(ProviderError::ContentRejected("rejected image".into()));
        }
        self.submissions
            .lock()
            .await
            .push((image_url.to_string(), callback_url.to_string()));
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        Ok(format!("pred-{n}"))
    }
}

/// Media toolkit with canned durations and beats; "stitching" writes a
/// marker file.
pub struct FakeToolkit {
    pub duration: f64,
    pub beats: Vec<f64>,
    pub fail_stitch: AtomicBool,
}

impl FakeToolkit {
    pub fn new(duration: f64, beats: Vec<f64>) -> Self {
        Self {
            duration,
            beats,
            fail_stitch: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl MediaToolkit for FakeToolkit {
    async fn probe_duration(&self, _path: &Path) -> MediaResult<f64> {
        Ok(self.duration)
    }

    async fn synthesize_silence(&self, _duration: f64, output: &Path) -> MediaResult<()> {
        tokio::fs::write(output, b"SILENCE").await?;
        Ok(())
    }

    async fn analyze_beats(&self, _audio: &Path) -> MediaResult<Vec<f64>> {
        Ok(self.beats.clone())
    }

    async fn stitch(&self, request: &StitchRequest) -> MediaResult<()> {
        if self.fail_stitch.load(Ordering::SeqCst) {
            return Err(MediaError::StitchFailed {
                exit_code: Some(1),
                stderr: "forced failure".into(),
            });
        }
        tokio::fs::write(&request.output, b"FINALVIDEO").await?;
        Ok(())
    }
}

/// Fully wired in-memory orchestrator plus handles to every fake.
pub struct Harness {
    pub orchestrator: JobOrchestrator,
    pub store: Arc<MemoryStore>,
    pub storage: Arc<MemoryObjectStore>,
    pub text: Arc<FakeText>,
    pub speech: Arc<FakeSpeech>,
    pub image: Arc<FakeImage>,
    pub video: Arc<FakeVideo>,
    pub toolkit: Arc<FakeToolkit>,
    _work_dir: tempfile::TempDir,
}

impl Harness {
    pub fn ctx(&self) -> &OrchestratorContext {
        self.orchestrator.context()
    }
}

/// Build a harness for `segment_count` scripted segments, narration
/// `duration` seconds each, with the given beat grid.
pub fn harness(segment_count: u32, duration: f64, beats: Vec<f64>) -> Harness {
    let work_dir = tempfile::tempdir().unwrap();
    let store = Arc::new(MemoryStore::new());
    let storage = Arc::new(MemoryObjectStore::new());
    let text = Arc::new(FakeText::with_segments(segment_count));
    let speech = Arc::new(FakeSpeech::default());
    let image = Arc::new(FakeImage::default());
    let video = Arc::new(FakeVideo::default());
    let toolkit = Arc::new(FakeToolkit::new(duration, beats));

    let config = OrchestratorConfig {
        work_dir: work_dir.path().to_string_lossy().into_owned(),
        public_base_url: "http://localhost:8080".into(),
        ..Default::default()
    };

    let ctx = OrchestratorContext {
        config,
        jobs: store.clone(),
        segments: store.clone(),
        credits: store.clone(),
        storage: storage.clone(),
        text: text.clone(),
        speech: speech.clone(),
        image: image.clone(),
        video: video.clone(),
        media: toolkit.clone(),
    };

    Harness {
        orchestrator: JobOrchestrator::new(ctx),
        store,
        storage,
        text,
        speech,
        image,
        video,
        toolkit,
        _work_dir: work_dir,
    }
}
