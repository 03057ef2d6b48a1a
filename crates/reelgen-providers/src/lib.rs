//! Generation provider clients.
//!
//! External AI back-ends are opaque request/response services (text,
//! speech, image) or request/async-callback services (video). This crate
//! defines the traits the orchestrator consumes, REST implementations,
//! and the rate-limit-aware retry helper used at submission time.

pub mod error;
pub mod rest;
pub mod retry;
pub mod traits;

pub use error::{ProviderError, ProviderResult};
pub use rest::{RestImageClient, RestSpeechClient, RestTextClient, RestVideoClient};
pub use retry::{default_classifier, submit_with_retry, Classifier, Disposition, SubmitRetryConfig};
pub use traits::{ImageGenerator, SpeechSynthesizer, TextGenerator, VideoGenerator};
