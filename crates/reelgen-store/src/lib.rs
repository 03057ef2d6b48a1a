//! Persistence layer for the Reelgen orchestrator.
//!
//! The orchestrator only assumes two primitives from its database:
//! atomic single-row read-modify-write (conditional updates) and
//! transactional multi-row inserts. This crate expresses those as
//! repository traits and ships a linearizable in-memory backend used by
//! tests and local runs; a production deployment plugs a real database
//! behind the same traits.

pub mod error;
pub mod memory;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use traits::{CreditStore, JobStore, SegmentStore};
