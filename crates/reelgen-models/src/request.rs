//! API request and response schemas.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{AspectRatio, Job, JobStatus};

/// Request body for creating a generation job.
#[derive(Debug, Clone, Deserialize, Validate, JsonSchema)]
pub struct CreateJobRequest {
    /// Topic to generate a narrated video about
    #[validate(length(min = 3, max = 500))]
    pub topic: String,

    /// Number of segments to produce
    #[validate(range(min = 1, max = 20))]
    #[serde(default = "default_segment_count")]
    pub segment_count: u32,

    /// Target aspect ratio
    #[serde(default)]
    pub aspect: AspectRatio,

    /// Narration voice identifier
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub voice: Option<String>,

    /// Background music asset URL
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub music_url: Option<String>,
}

fn default_segment_count() -> u32 {
    5
}

/// Per-field overrides for single-segment regeneration.
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct SegmentOverrides {
    /// Replacement narration text
    #[serde(default)]
    pub script: Option<String>,

    /// Replacement image prompt
    #[serde(default)]
    pub visual_prompt: Option<String>,

    /// Replacement motion prompt
    #[serde(default)]
    pub motion_prompt: Option<String>,
}

/// Job status response for polling clients.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct JobStatusResponse {
    /// Job ID
    pub job_id: String,
    /// Current status
    pub status: JobStatus,
    /// Progress percentage (0-100)
    pub progress: u8,
    /// URL of the final video (when completed)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_url: Option<String>,
    /// Error message (when failed)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Creation timestamp (RFC3339)
    pub created_at: String,
    /// Last update timestamp (RFC3339)
    pub updated_at: String,
}

impl From<&Job> for JobStatusResponse {
    fn from(job: &Job) -> Self {
        Self {
            job_id: job.id.to_string(),
            status: job.status,
            progress: job.progress,
            result_url: job.result_url.clone(),
            error: job.error.clone(),
            created_at: job.created_at.to_rfc3339(),
            updated_at: job.updated_at.to_rfc3339(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[test]
    fn test_create_request_validation() {
        let req = CreateJobRequest {
            topic: "ok".into(),
            segment_count: 5,
            aspect: AspectRatio::Portrait,
            voice: None,
            music_url: None,
        };
        assert!(req.validate().is_err());

        let req = CreateJobRequest {
            topic: "the fall of rome".into(),
            segment_count: 50,
            aspect: AspectRatio::Portrait,
            voice: None,
            music_url: None,
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_status_response_from_job() {
        let job = Job::new("user123", "volcanoes");
        let resp = JobStatusResponse::from(&job);
        assert_eq!(resp.status, JobStatus::Pending);
        assert_eq!(resp.job_id, job.id.to_string());
    }
}
