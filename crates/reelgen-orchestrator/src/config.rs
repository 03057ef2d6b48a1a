//! Orchestrator configuration.

use reelgen_providers::SubmitRetryConfig;

/// Orchestrator configuration.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Work directory for scratch files
    pub work_dir: String,
    /// Public base URL of this deployment, used to build webhook
    /// callback addresses handed to the video provider
    pub public_base_url: String,
    /// Credits charged per segment
    pub credits_per_segment: i64,
    /// Allowed overdraft when reserving credits
    pub grace_credits: i64,
    /// Fixed duration for segments without narration (seconds)
    pub min_segment_duration: f64,
    /// Retry policy for video submission
    pub retry: SubmitRetryConfig,
    /// Seconds without progress before a job is flagged stale
    pub stale_threshold_secs: i64,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            work_dir: "/tmp/reelgen".to_string(),
            public_base_url: "http://localhost:8080".to_string(),
            credits_per_segment: 10,
            grace_credits: 0,
            min_segment_duration: 3.0,
            retry: SubmitRetryConfig::default(),
            stale_threshold_secs: 1800,
        }
    }
}

impl OrchestratorConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            work_dir: std::env::var("REELGEN_WORK_DIR").unwrap_or(defaults.work_dir),
            public_base_url: std::env::var("REELGEN_PUBLIC_BASE_URL")
                .map(|s| s.trim_end_matches('/').to_string())
                .unwrap_or(defaults.public_base_url),
            credits_per_segment: std::env::var("REELGEN_CREDITS_PER_SEGMENT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.credits_per_segment),
            grace_credits: std::env::var("REELGEN_GRACE_CREDITS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.grace_credits),
            min_segment_duration: std::env::var("REELGEN_MIN_SEGMENT_DURATION")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.min_segment_duration),
            retry: defaults.retry,
            stale_threshold_secs: std::env::var("REELGEN_STALE_THRESHOLD_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.stale_threshold_secs),
        }
    }

    /// Webhook address the video provider calls back for one segment.
    pub fn callback_url(&self, job_id: &str, index: u32) -> String {
        format!(
            "{}/api/webhooks/video/{}/{}",
            self.public_base_url, job_id, index
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_callback_url() {
        let config = OrchestratorConfig {
            public_base_url: "https://api.reelgen.example".into(),
            ..Default::default()
        };
        assert_eq!(
            config.callback_url("job-1", 3),
            "https://api.reelgen.example/api/webhooks/video/job-1/3"
        );
    }
}
