//! Repository traits the orchestrator is written against.

use async_trait::async_trait;

use reelgen_models::{
    CreditReservation, Job, JobId, JobStatus, PipelineContext, ReservationId, Segment,
};

use crate::error::StoreResult;

/// Job row persistence.
///
/// All mutating methods bump `updated_at`. Conditional methods return
/// `false` instead of erroring when the precondition does not hold, so
/// callers can use them as linearization points.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Insert a new job row.
    async fn create_job(&self, job: &Job) -> StoreResult<()>;

    /// Fetch a job by id.
    async fn get_job(&self, id: &JobId) -> StoreResult<Option<Job>>;

    /// Atomically move the job from `from` to `to`.
    ///
    /// Returns `false` if the current status is not `from`. The store
    /// additionally rejects any backward transition.
    async fn try_transition(&self, id: &JobId, from: JobStatus, to: JobStatus)
        -> StoreResult<bool>;

    /// Update the best-effort progress percentage.
    async fn set_progress(&self, id: &JobId, progress: u8) -> StoreResult<()>;

    /// Replace the pipeline context.
    async fn set_pipeline(&self, id: &JobId, pipeline: &PipelineContext) -> StoreResult<()>;

    /// Attach the credit reservation backing this job.
    async fn set_reservation(&self, id: &JobId, reservation: &ReservationId) -> StoreResult<()>;

    /// Atomically claim the right to finalize this job.
    ///
    /// Succeeds exactly once per job, and only while the job is still
    /// Processing. This is the barrier that makes the webhook-side
    /// "no segment left generating" join linearizable.
    async fn try_claim_finalize(&self, id: &JobId) -> StoreResult<bool>;

    /// Terminal success: set Completed, result URL, progress 100.
    /// No-ops (returns `false`) if the job is already terminal.
    async fn complete_job(&self, id: &JobId, result_url: &str) -> StoreResult<bool>;

    /// Terminal failure: set Failed with the error message.
    /// No-ops (returns `false`) if the job is already terminal.
    async fn fail_job(&self, id: &JobId, error: &str) -> StoreResult<bool>;

    /// All jobs not yet in a terminal state (for the stale-job scan).
    async fn list_active_jobs(&self) -> StoreResult<Vec<Job>>;
}

/// Segment row persistence, keyed by `(job_id, index)`.
#[async_trait]
pub trait SegmentStore: Send + Sync {
    /// Insert all segments of a job in one transaction.
    async fn create_segments(&self, segments: &[Segment]) -> StoreResult<()>;

    /// Fetch one segment.
    async fn get_segment(&self, job_id: &JobId, index: u32) -> StoreResult<Option<Segment>>;

    /// All segments of a job, ordered by index.
    async fn list_segments(&self, job_id: &JobId) -> StoreResult<Vec<Segment>>;

    /// Replace one segment row (used by single-segment regeneration).
    async fn replace_segment(&self, segment: &Segment) -> StoreResult<()>;

    /// Atomically move a Pending segment to Generating.
    /// Returns `false` if the segment is not Pending.
    async fn try_mark_generating(&self, job_id: &JobId, index: u32) -> StoreResult<bool>;

    /// Record the provider correlation id, only while the segment is
    /// Generating and has no id yet; the prediction id is therefore set
    /// at most once per generation cycle.
    async fn try_set_prediction(
        &self,
        job_id: &JobId,
        index: u32,
        prediction_id: &str,
    ) -> StoreResult<bool>;

    /// Record the re-hosted video asset and set Completed.
    ///
    /// Applied unconditionally: provider callbacks are at-least-once and
    /// the row must reflect the delivered outcome even for duplicates.
    async fn complete_segment(&self, job_id: &JobId, index: u32, video_url: &str)
        -> StoreResult<()>;

    /// Record a provider failure and set Failed.
    async fn fail_segment(&self, job_id: &JobId, index: u32, error: &str) -> StoreResult<()>;

    /// Number of segments still in Generating for a job.
    async fn count_generating(&self, job_id: &JobId) -> StoreResult<usize>;
}

/// Credit balance and reservation persistence.
///
/// Balances are deducted at reserve time, so `release` must restore the
/// amount. Capture and release are mutually exclusive and idempotent.
#[async_trait]
pub trait CreditStore: Send + Sync {
    /// Current balance for a user (zero for unknown users).
    async fn get_balance(&self, user_id: &str) -> StoreResult<i64>;

    /// Add credits to a user's balance (top-up, test setup).
    async fn deposit(&self, user_id: &str, amount: i64) -> StoreResult<i64>;

    /// Atomically check `balance + grace >= amount`, deduct `amount`, and
    /// insert a Reserved row. Fails with `InsufficientCredits` without
    /// mutating anything when the check does not hold.
    async fn reserve(&self, user_id: &str, amount: i64, grace: i64)
        -> StoreResult<CreditReservation>;

    /// Fetch a reservation by id.
    async fn get_reservation(&self, id: &ReservationId) -> StoreResult<Option<CreditReservation>>;

    /// Commit the spend: Reserved -> Captured, no balance mutation.
    /// Idempotent for repeated captures; errors if already Released.
    async fn capture(&self, id: &ReservationId) -> StoreResult<()>;

    /// Refund the spend: Reserved -> Released, amount added back.
    /// Idempotent: a second release never double-credits.
    /// Errors if already Captured.
    async fn release(&self, id: &ReservationId, reason: &str) -> StoreResult<()>;
}
