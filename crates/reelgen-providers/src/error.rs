//! Provider error types.

use thiserror::Error;

/// Result type for provider operations.
pub type ProviderResult<T> = Result<T, ProviderError>;

/// Errors that can occur talking to generation providers.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// 429-equivalent signal. The message may embed a reset hint
    /// ("resets in ~12s") the retry classifier can parse.
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Non-success HTTP status other than rate limiting.
    #[error("Provider returned {status}: {message}")]
    Status { status: u16, message: String },

    /// The provider rejected the input permanently (bad prompt, policy).
    #[error("Content rejected: {0}")]
    ContentRejected(String),

    /// Response body did not match the expected shape.
    #[error("Invalid provider response: {0}")]
    InvalidResponse(String),

    #[error("Provider configuration error: {0}")]
    Config(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl ProviderError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }

    /// Whether this carries a 429-equivalent signal.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, ProviderError::RateLimited(_))
    }

    /// Map a non-success HTTP response to the right variant.
    pub fn from_status(status: u16, message: String) -> Self {
        match status {
            429 => ProviderError::RateLimited(message),
            400 | 422 => ProviderError::ContentRejected(message),
            _ => ProviderError::Status { status, message },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_status_classification() {
        assert!(ProviderError::from_status(429, "slow down".into()).is_rate_limited());
        assert!(matches!(
            ProviderError::from_status(422, "bad prompt".into()),
            ProviderError::ContentRejected(_)
        ));
        assert!(matches!(
            ProviderError::from_status(500, "boom".into()),
            ProviderError::Status { status: 500, .. }
        ));
    }
}
