//! Request handlers.

pub mod credits;
pub mod health;
pub mod jobs;
pub mod webhooks;

pub use health::{health, ready};
