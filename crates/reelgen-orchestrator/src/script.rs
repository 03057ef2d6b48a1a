//! Script generation.
//!
//! Turns the job topic into an ordered list of segment drafts via the
//! text provider. The model is asked for strict JSON; fenced or padded
//! responses are tolerated, anything else is a fatal job error since no
//! downstream stage can run without a script.

use serde::Deserialize;
use tracing::debug;

use reelgen_models::{JobId, Segment};
use reelgen_providers::TextGenerator;

use crate::error::{OrchestratorError, OrchestratorResult};

/// One segment draft as returned by the text model.
#[derive(Debug, Deserialize)]
pub struct SegmentDraft {
    /// Narration text
    pub script: String,
    /// Image prompt
    pub visual_prompt: String,
    /// Optional motion prompt for the video provider
    #[serde(default)]
    pub motion_prompt: Option<String>,
}

/// Generate `segment_count` segment drafts for a topic.
pub async fn generate_script(
    text: &dyn TextGenerator,
    topic: &str,
    segment_count: u32,
) -> OrchestratorResult<Vec<SegmentDraft>> {
    let prompt = build_prompt(topic, segment_count);
    let raw = text.generate_text(&prompt).await?;
    let drafts = parse_script(&raw)?;

    if drafts.is_empty() {
        return Err(OrchestratorError::script_failed("model returned no segments"));
    }

    debug!(segments = drafts.len(), "Script generated");
    Ok(drafts)
}

/// Materialize drafts into pending segment rows for a job.
pub fn drafts_to_segments(job_id: &JobId, drafts: Vec<SegmentDraft>) -> Vec<Segment> {
    drafts
        .into_iter()
        .enumerate()
        .map(|(i, draft)| {
            let mut seg = Segment::new(job_id.clone(), i as u32, draft.script, draft.visual_prompt);
            seg.motion_prompt = draft.motion_prompt;
            seg
        })
        .collect()
}

fn build_prompt(topic: &str, segment_count: u32) -> String {
    format!(
        "Write a short-form narrated video script about: {topic}\n\
         Produce exactly {segment_count} segments.\n\
         Respond with ONLY a JSON array, no prose, where each element is an object with:\n\
         - \"script\": one or two spoken sentences of narration\n\
         - \"visual_prompt\": a detailed still-image prompt illustrating the narration\n\
         - \"motion_prompt\": a short camera/motion direction (optional)\n"
    )
}

/// Parse the model response, tolerating markdown code fences and
/// surrounding prose around the JSON array.
pub fn parse_script(raw: &str) -> OrchestratorResult<Vec<SegmentDraft>> {
    let trimmed = strip_fences(raw);

    // Fast path: the response is the bare array.
    if let Ok(drafts) = serde_json::from_str::<Vec<SegmentDraft>>(trimmed) {
        return Ok(drafts);
    }

    // Salvage path: extract the outermost array from padded output.
    if let (Some(start), Some(end)) = (trimmed.find('['), trimmed.rfind(']')) {
        if start < end {
            if let Ok(drafts) = serde_json::from_str::<Vec<SegmentDraft>>(&trimmed[start..=end]) {
                return Ok(drafts);
            }
        }
    }

    Err(OrchestratorError::script_failed(format!(
        "model response is not a JSON segment array: {}",
        truncate(trimmed, 200)
    )))
}

fn strip_fences(raw: &str) -> &str {
    let t = raw.trim();
    let t = t
        .strip_prefix("```json")
        .or_else(|| t.strip_prefix("```"))
        .unwrap_or(t);
    t.strip_suffix("```").unwrap_or(t).trim()
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bare_array() {
        let raw = r#"[{"script": "Rome rose.", "visual_prompt": "the forum at dawn"}]"#;
        let drafts = parse_script(raw).unwrap();
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].script, "Rome rose.");
        assert!(drafts[0].motion_prompt.is_none());
    }

    #[test]
    fn test_parse_fenced_array() {
        let raw = "```json\n[{\"script\": \"a\", \"visual_prompt\": \"b\", \"motion_prompt\": \"pan left\"}]\n```";
        let drafts = parse_script(raw).unwrap();
        assert_eq!(drafts[0].motion_prompt.as_deref(), Some("pan left"));
    }

    #[test]
    fn test_parse_array_embedded_in_prose() {
        let raw = "Here is your script:\n[{\"script\": \"a\", \"visual_prompt\": \"b\"}]\nEnjoy!";
        assert_eq!(parse_script(raw).unwrap().len(), 1);
    }

    #[test]
    fn test_malformed_response_is_fatal() {
        let err = parse_script("I can't produce that.").unwrap_err();
        assert!(matches!(err, OrchestratorError::ScriptFailed(_)));
    }

    #[test]
    fn test_drafts_to_segments_indexes_in_order() {
        let job_id = JobId::new();
        let drafts = vec![
            SegmentDraft {
                script: "one".into(),
                visual_prompt: "v1".into(),
                motion_prompt: None,
            },
            SegmentDraft {
                script: "two".into(),
                visual_prompt: "v2".into(),
                motion_prompt: Some("zoom".into()),
            },
        ];
        let segments = drafts_to_segments(&job_id, drafts);
        assert_eq!(segments[0].index, 0);
        assert_eq!(segments[1].index, 1);
        assert_eq!(segments[1].motion_prompt.as_deref(), Some("zoom"));
        assert!(segments.iter().all(|s| s.job_id == job_id));
    }
}
