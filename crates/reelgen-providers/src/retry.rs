//! Rate-limit-aware submission retry.
//!
//! The video provider rate-limits per account and embeds a reset hint in
//! its error text ("resets in ~12s"). That vendor coupling is isolated in
//! a pluggable classifier; the retry loop itself only knows
//! retry-with-wait versus fail-now.

use std::future::Future;
use std::sync::OnceLock;
use std::time::Duration;

use regex::Regex;
use tracing::{debug, warn};

use crate::error::{ProviderError, ProviderResult};

/// What to do with a failed submission attempt.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Disposition {
    /// Wait (the hint when the provider supplied one) and try again.
    Retry { wait_hint: Option<Duration> },
    /// Surface immediately; retrying will not help.
    Fatal,
}

/// Classifier from provider error to retry disposition.
pub type Classifier = fn(&ProviderError) -> Disposition;

/// Configuration for submission retries.
#[derive(Debug, Clone)]
pub struct SubmitRetryConfig {
    /// Maximum attempts including the first.
    pub max_attempts: u32,
    /// Wait used when a rate-limit error carries no parsable hint.
    pub fallback_wait: Duration,
    /// Safety margin added on top of the hinted wait.
    pub safety_buffer: Duration,
}

impl Default for SubmitRetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            fallback_wait: Duration::from_secs(12),
            safety_buffer: Duration::from_secs(2),
        }
    }
}

fn reset_hint_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"resets? in ~?(\d+(?:\.\d+)?)\s*s").unwrap())
}

/// Parse an embedded "resets in ~Ns" hint from provider error text.
pub fn parse_reset_hint(message: &str) -> Option<Duration> {
    let caps = reset_hint_regex().captures(message)?;
    let secs: f64 = caps.get(1)?.as_str().parse().ok()?;
    Some(Duration::from_secs_f64(secs))
}

/// Default classifier: rate-limit signals are retried with their hinted
/// wait; everything else is fatal at the submission layer.
pub fn default_classifier(error: &ProviderError) -> Disposition {
    match error {
        ProviderError::RateLimited(message) => Disposition::Retry {
            wait_hint: parse_reset_hint(message),
        },
        _ => Disposition::Fatal,
    }
}

/// Run `operation` until it succeeds, a fatal error occurs, or attempts
/// are exhausted. Between rate-limited attempts, sleeps the hinted wait
/// (or the fallback) plus the safety buffer.
pub async fn submit_with_retry<F, Fut, T>(
    config: &SubmitRetryConfig,
    classify: Classifier,
    operation: F,
) -> ProviderResult<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = ProviderResult<T>>,
{
    let mut attempt = 1u32;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(e) => match classify(&e) {
                Disposition::Fatal => return Err(e),
                Disposition::Retry { .. } if attempt >= config.max_attempts => {
                    warn!(attempts = attempt, "Submission still rate limited, giving up");
                    return Err(e);
                }
                Disposition::Retry { wait_hint } => {
                    let wait = wait_hint.unwrap_or(config.fallback_wait) + config.safety_buffer;
                    debug!(
                        attempt = attempt,
                        wait_secs = wait.as_secs_f64(),
                        "Rate limited, waiting before retry: {}", e
                    );
                    tokio::time::sleep(wait).await;
                    attempt += 1;
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::time::Instant;

    #[test]
    fn test_parse_reset_hint() {
        assert_eq!(
            parse_reset_hint("Rate limit exceeded, resets in ~12s"),
            Some(Duration::from_secs(12))
        );
        assert_eq!(
            parse_reset_hint("quota resets in 4.5s, please wait"),
            Some(Duration::from_secs_f64(4.5))
        );
        assert_eq!(parse_reset_hint("too many requests"), None);
    }

    #[test]
    fn test_default_classifier() {
        let rl = ProviderError::RateLimited("resets in ~30s".into());
        assert_eq!(
            default_classifier(&rl),
            Disposition::Retry {
                wait_hint: Some(Duration::from_secs(30))
            }
        );

        let fatal = ProviderError::ContentRejected("policy".into());
        assert_eq!(default_classifier(&fatal), Disposition::Fatal);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_sleeps_hinted_wait_then_succeeds() {
        let config = SubmitRetryConfig::default();
        let calls = AtomicU32::new(0);
        let start = Instant::now();

        let result = submit_with_retry(&config, default_classifier, || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(ProviderError::RateLimited("resets in ~10s".into()))
                } else {
                    Ok("pred-42".to_string())
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), "pred-42");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        // Two waits of hint (10s) + buffer (2s) each.
        assert_eq!(start.elapsed(), Duration::from_secs(24));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_uses_fallback_without_hint() {
        let config = SubmitRetryConfig::default();
        let calls = AtomicU32::new(0);
        let start = Instant::now();

        let result = submit_with_retry(&config, default_classifier, || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n == 0 {
                    Err(ProviderError::RateLimited("too many requests".into()))
                } else {
                    Ok(())
                }
            }
        })
        .await;

        assert!(result.is_ok());
        // fallback (12s) + buffer (2s)
        assert_eq!(start.elapsed(), Duration::from_secs(14));
    }

    #[tokio::test]
    async fn test_fatal_errors_are_not_retried() {
        let config = SubmitRetryConfig::default();
        let calls = AtomicU32::new(0);

        let result: ProviderResult<()> = submit_with_retry(&config, default_classifier, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(ProviderError::ContentRejected("nsfw".into())) }
        })
        .await;

        assert!(matches!(result, Err(ProviderError::ContentRejected(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_attempts_are_bounded() {
        let config = SubmitRetryConfig {
            max_attempts: 3,
            ..Default::default()
        };
        let calls = AtomicU32::new(0);

        let result: ProviderResult<()> = submit_with_retry(&config, default_classifier, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(ProviderError::RateLimited("resets in ~1s".into())) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
