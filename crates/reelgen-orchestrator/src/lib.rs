//! Job orchestration for Reelgen.
//!
//! Coordinates the full lifecycle of a generation job: credit
//! reservation, script production, per-segment preparation fan-out,
//! rate-limit-aware video dispatch, webhook-driven completion, and
//! idempotent finalization. The hard part is not any single generation
//! call but deciding, exactly once, when a job is done — while the only
//! completion signal is an at-least-once webhook per segment.

pub mod config;
pub mod context;
pub mod dispatch;
pub mod error;
pub mod finalize;
pub mod logging;
pub mod orchestrator;
pub mod prepare;
pub mod script;
pub mod stale;
pub mod timing;
pub mod webhook;

pub use config::OrchestratorConfig;
pub use context::OrchestratorContext;
pub use error::{OrchestratorError, OrchestratorResult};
pub use logging::JobLogger;
pub use orchestrator::JobOrchestrator;
pub use stale::StaleJobScanner;

#[cfg(test)]
pub(crate) mod testutil;
