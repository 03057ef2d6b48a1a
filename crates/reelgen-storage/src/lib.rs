//! Object storage for Reelgen assets.
//!
//! Intermediate assets (narration audio, still images) and final videos
//! are persisted to an S3-compatible bucket (Cloudflare R2). Provider
//! outputs are always re-hosted here so final assets never depend on a
//! third-party URL lifetime.

pub mod client;
pub mod error;
pub mod store;

pub use client::{R2Client, R2Config};
pub use error::{StorageError, StorageResult};
pub use store::{MemoryObjectStore, ObjectStore};
