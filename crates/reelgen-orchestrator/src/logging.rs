//! Structured job logging utilities.
//!
//! Provides consistent, structured logging for pipeline stages with
//! tracing spans and contextual information.

use reelgen_models::JobId;
use tracing::{error, info, warn, Span};

/// Job logger for structured logging with consistent formatting.
///
/// Carries the job ID and pipeline stage so every log line emitted
/// during a pipeline run can be correlated.
#[derive(Debug, Clone)]
pub struct JobLogger {
    job_id: String,
    stage: String,
}

impl JobLogger {
    /// Create a new job logger for a specific job and pipeline stage.
    pub fn new(job_id: &JobId, stage: &str) -> Self {
        Self {
            job_id: job_id.to_string(),
            stage: stage.to_string(),
        }
    }

    /// Log the start of a pipeline stage.
    pub fn log_start(&self, message: &str) {
        info!(
            job_id = %self.job_id,
            stage = %self.stage,
            "Stage started: {}", message
        );
    }

    /// Log a progress update during the stage.
    pub fn log_progress(&self, message: &str) {
        info!(
            job_id = %self.job_id,
            stage = %self.stage,
            "Stage progress: {}", message
        );
    }

    /// Log a warning during the stage.
    pub fn log_warning(&self, message: &str) {
        warn!(
            job_id = %self.job_id,
            stage = %self.stage,
            "Stage warning: {}", message
        );
    }

    /// Log an error during the stage.
    pub fn log_error(&self, message: &str) {
        error!(
            job_id = %self.job_id,
            stage = %self.stage,
            "Stage error: {}", message
        );
    }

    /// Log the completion of the stage.
    pub fn log_completion(&self, message: &str) {
        info!(
            job_id = %self.job_id,
            stage = %self.stage,
            "Stage completed: {}", message
        );
    }

    /// Create a tracing span for this job stage.
    pub fn create_span(&self) -> Span {
        tracing::info_span!(
            "job",
            job_id = %self.job_id,
            stage = %self.stage
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_logger_carries_job_and_stage() {
        let job_id = JobId::new();
        let logger = JobLogger::new(&job_id, "prepare");

        let rendered = format!("{:?}", logger);
        assert!(rendered.contains(&job_id.to_string()));
        assert!(rendered.contains("prepare"));
    }
}
