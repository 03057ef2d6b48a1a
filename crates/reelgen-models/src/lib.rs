//! Shared data models for the Reelgen backend.
//!
//! This crate provides Serde-serializable types for:
//! - Jobs and their lifecycle states
//! - Video segments and their generation states
//! - Credit reservations
//! - Pipeline context (aspect ratio, voice, music, beats)
//! - API request/response schemas

pub mod aspect;
pub mod credit;
pub mod job;
pub mod pipeline;
pub mod request;
pub mod segment;

// Re-export common types
pub use aspect::AspectRatio;
pub use credit::{CreditReservation, ReservationId, ReservationStatus};
pub use job::{Job, JobId, JobStatus};
pub use pipeline::PipelineContext;
pub use request::{CreateJobRequest, JobStatusResponse, SegmentOverrides};
pub use segment::{Segment, SegmentStatus};
