//! Application state.

use std::sync::Arc;

use anyhow::Result;

use reelgen_media::ExternalToolkit;
use reelgen_orchestrator::{JobOrchestrator, OrchestratorConfig, OrchestratorContext};
use reelgen_providers::{RestImageClient, RestSpeechClient, RestTextClient, RestVideoClient};
use reelgen_storage::R2Client;
use reelgen_store::MemoryStore;

use crate::config::ApiConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub orchestrator: JobOrchestrator,
}

impl AppState {
    /// Create state wired to the real providers and R2.
    pub async fn new(config: ApiConfig) -> Result<Self> {
        let store = Arc::new(MemoryStore::new());
        let storage = Arc::new(R2Client::from_env().await?);

        let ctx = OrchestratorContext {
            config: OrchestratorConfig::from_env(),
            jobs: store.clone(),
            segments: store.clone(),
            credits: store,
            storage,
            text: Arc::new(RestTextClient::from_env()?),
            speech: Arc::new(RestSpeechClient::from_env()?),
            image: Arc::new(RestImageClient::from_env()?),
            video: Arc::new(RestVideoClient::from_env()?),
            media: Arc::new(ExternalToolkit::from_env()),
        };

        Ok(Self {
            config,
            orchestrator: JobOrchestrator::new(ctx),
        })
    }

    /// Build state around an already-wired orchestrator (tests).
    pub fn with_orchestrator(config: ApiConfig, orchestrator: JobOrchestrator) -> Self {
        Self {
            config,
            orchestrator,
        }
    }
}
