//! Orchestrator error types.

use thiserror::Error;

pub type OrchestratorResult<T> = Result<T, OrchestratorError>;

#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// Fatal, non-retryable; raised before any work starts.
    #[error("Insufficient credits: {0}")]
    InsufficientCredits(String),

    #[error("Script generation failed: {0}")]
    ScriptFailed(String),

    #[error("No video segments generated")]
    NoUsableSegments,

    #[error("Job failed: {0}")]
    JobFailed(String),

    #[error("Provider error: {0}")]
    Provider(#[from] reelgen_providers::ProviderError),

    #[error("Storage error: {0}")]
    Storage(#[from] reelgen_storage::StorageError),

    #[error("Store error: {0}")]
    Store(reelgen_store::StoreError),

    #[error("Media error: {0}")]
    Media(#[from] reelgen_media::MediaError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl OrchestratorError {
    pub fn script_failed(msg: impl Into<String>) -> Self {
        Self::ScriptFailed(msg.into())
    }

    pub fn job_failed(msg: impl Into<String>) -> Self {
        Self::JobFailed(msg.into())
    }

    pub fn is_insufficient_credits(&self) -> bool {
        matches!(self, OrchestratorError::InsufficientCredits(_))
    }

    /// Whether no retry at any layer can cure this.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            OrchestratorError::InsufficientCredits(_)
                | OrchestratorError::ScriptFailed(_)
                | OrchestratorError::NoUsableSegments
        )
    }
}

impl From<reelgen_store::StoreError> for OrchestratorError {
    fn from(e: reelgen_store::StoreError) -> Self {
        if e.is_insufficient_credits() {
            OrchestratorError::InsufficientCredits(e.to_string())
        } else {
            OrchestratorError::Store(e)
        }
    }
}
