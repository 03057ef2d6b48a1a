//! Provider traits wrapping the external generation back-ends.
//!
//! The orchestrator is written against these seams so tests can swap in
//! fakes and the vendor coupling stays inside the REST implementations.

use async_trait::async_trait;

use crate::error::ProviderResult;

/// Text generation (script writing).
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate text for a prompt.
    async fn generate_text(&self, prompt: &str) -> ProviderResult<String>;
}

/// Narration synthesis.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesize speech audio for the given text.
    ///
    /// Returns the encoded audio bytes (mp3).
    async fn synthesize(&self, text: &str, voice: Option<&str>) -> ProviderResult<Vec<u8>>;
}

/// Still image generation.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    /// Generate an image for a prompt at the given aspect ratio ("9:16").
    ///
    /// Returns the encoded image bytes (png/jpeg).
    async fn generate_image(&self, prompt: &str, aspect: &str) -> ProviderResult<Vec<u8>>;
}

/// Asynchronous image-to-video generation.
///
/// Submission returns a correlation id; the provider later calls the
/// webhook at `callback_url` with the outcome.
#[async_trait]
pub trait VideoGenerator: Send + Sync {
    /// Submit an async video job and return the provider's prediction id.
    async fn submit(
        &self,
        image_url: &str,
        motion_prompt: Option<&str>,
        callback_url: &str,
    ) -> ProviderResult<String>;
}
