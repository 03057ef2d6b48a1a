//! REST implementations of the provider traits.
//!
//! Each client is a thin reqwest wrapper configured from environment
//! variables, with per-provider timeouts (short for text/speech/image,
//! submission-only for video — the heavy work completes via webhook).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{ProviderError, ProviderResult};
use crate::traits::{ImageGenerator, SpeechSynthesizer, TextGenerator, VideoGenerator};

const TEXT_TIMEOUT: Duration = Duration::from_secs(60);
const SPEECH_TIMEOUT: Duration = Duration::from_secs(90);
const IMAGE_TIMEOUT: Duration = Duration::from_secs(120);
const SUBMIT_TIMEOUT: Duration = Duration::from_secs(30);

async fn error_for_response(response: reqwest::Response) -> ProviderError {
    let status = response.status().as_u16();
    let message = response.text().await.unwrap_or_default();
    ProviderError::from_status(status, message)
}

// ============================================================================
// Text
// ============================================================================

/// Text generation client (Gemini-style generateContent endpoint).
pub struct RestTextClient {
    base_url: String,
    api_key: String,
    client: Client,
}

#[derive(Debug, Serialize)]
struct TextRequest {
    contents: Vec<TextContent>,
}

#[derive(Debug, Serialize)]
struct TextContent {
    parts: Vec<TextPart>,
}

#[derive(Debug, Serialize)]
struct TextPart {
    text: String,
}

#[derive(Debug, Deserialize)]
struct TextResponse {
    candidates: Vec<TextCandidate>,
}

#[derive(Debug, Deserialize)]
struct TextCandidate {
    content: TextResponseContent,
}

#[derive(Debug, Deserialize)]
struct TextResponseContent {
    parts: Vec<TextResponsePart>,
}

#[derive(Debug, Deserialize)]
struct TextResponsePart {
    text: String,
}

impl RestTextClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            client: Client::builder()
                .timeout(TEXT_TIMEOUT)
                .build()
                .expect("reqwest client"),
        }
    }

    pub fn from_env() -> ProviderResult<Self> {
        let base_url = std::env::var("TEXT_API_URL")
            .map_err(|_| ProviderError::config("TEXT_API_URL not set"))?;
        let api_key = std::env::var("TEXT_API_KEY")
            .map_err(|_| ProviderError::config("TEXT_API_KEY not set"))?;
        Ok(Self::new(base_url, api_key))
    }
}

#[async_trait]
impl TextGenerator for RestTextClient {
    async fn generate_text(&self, prompt: &str) -> ProviderResult<String> {
        debug!("Requesting text generation ({} chars prompt)", prompt.len());

        let request = TextRequest {
            contents: vec![TextContent {
                parts: vec![TextPart {
                    text: prompt.to_string(),
                }],
            }],
        };

        let response = self
            .client
            .post(format!("{}/generateContent", self.base_url))
            .query(&[("key", self.api_key.as_str())])
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_for_response(response).await);
        }

        let body: TextResponse = response.json().await?;
        let text = body
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .map(|p| p.text)
            .ok_or_else(|| ProviderError::invalid_response("no candidates in text response"))?;

        Ok(text)
    }
}

// ============================================================================
// Speech
// ============================================================================

/// Speech synthesis client.
pub struct RestSpeechClient {
    base_url: String,
    api_key: String,
    default_voice: String,
    client: Client,
}

#[derive(Debug, Serialize)]
struct SpeechRequest<'a> {
    text: &'a str,
    voice: &'a str,
    format: &'a str,
}

impl RestSpeechClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            default_voice: "narrator".to_string(),
            client: Client::builder()
                .timeout(SPEECH_TIMEOUT)
                .build()
                .expect("reqwest client"),
        }
    }

    pub fn from_env() -> ProviderResult<Self> {
        let base_url = std::env::var("SPEECH_API_URL")
            .map_err(|_| ProviderError::config("SPEECH_API_URL not set"))?;
        let api_key = std::env::var("SPEECH_API_KEY")
            .map_err(|_| ProviderError::config("SPEECH_API_KEY not set"))?;
        let mut client = Self::new(base_url, api_key);
        if let Ok(voice) = std::env::var("SPEECH_DEFAULT_VOICE") {
            client.default_voice = voice;
        }
        Ok(client)
    }
}

#[async_trait]
impl SpeechSynthesizer for RestSpeechClient {
    async fn synthesize(&self, text: &str, voice: Option<&str>) -> ProviderResult<Vec<u8>> {
        let voice = voice.unwrap_or(&self.default_voice);
        debug!(voice = %voice, "Requesting narration ({} chars)", text.len());

        let response = self
            .client
            .post(format!("{}/synthesize", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&SpeechRequest {
                text,
                voice,
                format: "mp3",
            })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_for_response(response).await);
        }

        Ok(response.bytes().await?.to_vec())
    }
}

// ============================================================================
// Image
// ============================================================================

/// Still-image generation client.
pub struct RestImageClient {
    base_url: String,
    api_key: String,
    client: Client,
}

#[derive(Debug, Serialize)]
struct ImageRequest<'a> {
    prompt: &'a str,
    aspect_ratio: &'a str,
}

impl RestImageClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            client: Client::builder()
                .timeout(IMAGE_TIMEOUT)
                .build()
                .expect("reqwest client"),
        }
    }

    pub fn from_env() -> ProviderResult<Self> {
        let base_url = std::env::var("IMAGE_API_URL")
            .map_err(|_| ProviderError::config("IMAGE_API_URL not set"))?;
        let api_key = std::env::var("IMAGE_API_KEY")
            .map_err(|_| ProviderError::config("IMAGE_API_KEY not set"))?;
        Ok(Self::new(base_url, api_key))
    }
}

#[async_trait]
impl ImageGenerator for RestImageClient {
    async fn generate_image(&self, prompt: &str, aspect: &str) -> ProviderResult<Vec<u8>> {
        debug!(aspect = %aspect, "Requesting image generation");

        let response = self
            .client
            .post(format!("{}/images", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&ImageRequest {
                prompt,
                aspect_ratio: aspect,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_for_response(response).await);
        }

        Ok(response.bytes().await?.to_vec())
    }
}

// ============================================================================
// Video (async, webhook-completing)
// ============================================================================

/// Async image-to-video client (prediction-style API).
pub struct RestVideoClient {
    base_url: String,
    api_key: String,
    client: Client,
}

#[derive(Debug, Serialize)]
struct PredictionRequest<'a> {
    input: PredictionInput<'a>,
    webhook: &'a str,
}

#[derive(Debug, Serialize)]
struct PredictionInput<'a> {
    image: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    prompt: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct PredictionResponse {
    id: String,
}

impl RestVideoClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            client: Client::builder()
                .timeout(SUBMIT_TIMEOUT)
                .build()
                .expect("reqwest client"),
        }
    }

    pub fn from_env() -> ProviderResult<Self> {
        let base_url = std::env::var("VIDEO_API_URL")
            .map_err(|_| ProviderError::config("VIDEO_API_URL not set"))?;
        let api_key = std::env::var("VIDEO_API_KEY")
            .map_err(|_| ProviderError::config("VIDEO_API_KEY not set"))?;
        Ok(Self::new(base_url, api_key))
    }
}

#[async_trait]
impl VideoGenerator for RestVideoClient {
    async fn submit(
        &self,
        image_url: &str,
        motion_prompt: Option<&str>,
        callback_url: &str,
    ) -> ProviderResult<String> {
        let response = self
            .client
            .post(format!("{}/predictions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&PredictionRequest {
                input: PredictionInput {
                    image: image_url,
                    prompt: motion_prompt,
                },
                webhook: callback_url,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_for_response(response).await);
        }

        let body: PredictionResponse = response.json().await?;
        info!(prediction_id = %body.id, "Submitted video generation");
        Ok(body.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_video_submit_returns_prediction_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/predictions"))
            .respond_with(
                ResponseTemplate::new(201).set_body_json(serde_json::json!({"id": "pred-7"})),
            )
            .mount(&server)
            .await;

        let client = RestVideoClient::new(server.uri(), "key");
        let id = client
            .submit(
                "https://cdn.example/img.png",
                Some("slow pan"),
                "https://api.example/webhooks/video/j/0",
            )
            .await
            .unwrap();
        assert_eq!(id, "pred-7");
    }

    #[tokio::test]
    async fn test_video_submit_maps_429_to_rate_limited() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/predictions"))
            .respond_with(
                ResponseTemplate::new(429).set_body_string("Rate limit exceeded, resets in ~8s"),
            )
            .mount(&server)
            .await;

        let client = RestVideoClient::new(server.uri(), "key");
        let err = client
            .submit("https://cdn.example/img.png", None, "https://cb.example")
            .await
            .unwrap_err();
        assert!(err.is_rate_limited());
    }

    #[tokio::test]
    async fn test_text_parses_first_candidate() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/generateContent"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "candidates": [{"content": {"parts": [{"text": "[]"}]}}]
            })))
            .mount(&server)
            .await;

        let client = RestTextClient::new(server.uri(), "key");
        assert_eq!(client.generate_text("write a script").await.unwrap(), "[]");
    }
}
