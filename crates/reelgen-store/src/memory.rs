//! In-memory store backend.
//!
//! A single mutex over all tables makes every operation linearizable,
//! which is exactly the single-row conditional-write guarantee the
//! orchestrator assumes from a real database.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{debug, info};

use reelgen_models::{
    CreditReservation, Job, JobId, JobStatus, PipelineContext, ReservationId, ReservationStatus,
    Segment, SegmentStatus,
};

use crate::error::{StoreError, StoreResult};
use crate::traits::{CreditStore, JobStore, SegmentStore};

/// Job row plus storage-internal bookkeeping.
#[derive(Debug, Clone)]
struct JobRow {
    job: Job,
    /// One-shot finalize claim; never exposed on the model.
    finalize_claimed: bool,
}

#[derive(Debug, Default)]
struct Tables {
    jobs: HashMap<String, JobRow>,
    /// Segments per job id, kept sorted by index.
    segments: HashMap<String, Vec<Segment>>,
    balances: HashMap<String, i64>,
    reservations: HashMap<String, CreditReservation>,
}

/// In-memory implementation of all store traits.
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl JobStore for MemoryStore {
    async fn create_job(&self, job: &Job) -> StoreResult<()> {
        let mut t = self.tables.lock().await;
        if t.jobs.contains_key(job.id.as_str()) {
            return Err(StoreError::Conflict(format!("job {} already exists", job.id)));
        }
        t.jobs.insert(
            job.id.as_str().to_string(),
            JobRow {
                job: job.clone(),
                finalize_claimed: false,
            },
        );
        debug!(job_id = %job.id, "Created job row");
        Ok(())
    }

    async fn get_job(&self, id: &JobId) -> StoreResult<Option<Job>> {
        let t = self.tables.lock().await;
        Ok(t.jobs.get(id.as_str()).map(|r| r.job.clone()))
    }

    async fn try_transition(
        &self,
        id: &JobId,
        from: JobStatus,
        to: JobStatus,
    ) -> StoreResult<bool> {
        let mut t = self.tables.lock().await;
        let row = t
            .jobs
            .get_mut(id.as_str())
            .ok_or_else(|| StoreError::not_found(format!("job {}", id)))?;

        if row.job.status != from || !from.can_transition_to(to) {
            return Ok(false);
        }
        row.job.status = to;
        row.job.updated_at = Utc::now();
        if to.is_terminal() {
            row.job.completed_at = Some(row.job.updated_at);
        }
        Ok(true)
    }

    async fn set_progress(&self, id: &JobId, progress: u8) -> StoreResult<()> {
        let mut t = self.tables.lock().await;
        let row = t
            .jobs
            .get_mut(id.as_str())
            .ok_or_else(|| StoreError::not_found(format!("job {}", id)))?;
        row.job.progress = progress.min(100);
        row.job.updated_at = Utc::now();
        Ok(())
    }

    async fn set_pipeline(&self, id: &JobId, pipeline: &PipelineContext) -> StoreResult<()> {
        let mut t = self.tables.lock().await;
        let row = t
            .jobs
            .get_mut(id.as_str())
            .ok_or_else(|| StoreError::not_found(format!("job {}", id)))?;
        row.job.pipeline = pipeline.clone();
        row.job.updated_at = Utc::now();
        Ok(())
    }

    async fn set_reservation(&self, id: &JobId, reservation: &ReservationId) -> StoreResult<()> {
        let mut t = self.tables.lock().await;
        let row = t
            .jobs
            .get_mut(id.as_str())
            .ok_or_else(|| StoreError::not_found(format!("job {}", id)))?;
        row.job.reservation_id = Some(reservation.clone());
        row.job.updated_at = Utc::now();
        Ok(())
    }

    async fn try_claim_finalize(&self, id: &JobId) -> StoreResult<bool> {
        let mut t = self.tables.lock().await;
        let row = t
            .jobs
            .get_mut(id.as_str())
            .ok_or_else(|| StoreError::not_found(format!("job {}", id)))?;

        if row.job.status != JobStatus::Processing || row.finalize_claimed {
            return Ok(false);
        }
        row.finalize_claimed = true;
        row.job.updated_at = Utc::now();
        debug!(job_id = %id, "Finalize claim taken");
        Ok(true)
    }

    async fn complete_job(&self, id: &JobId, result_url: &str) -> StoreResult<bool> {
        let mut t = self.tables.lock().await;
        let row = t
            .jobs
            .get_mut(id.as_str())
            .ok_or_else(|| StoreError::not_found(format!("job {}", id)))?;

        if row.job.status.is_terminal() {
            return Ok(false);
        }
        let now = Utc::now();
        row.job.status = JobStatus::Completed;
        row.job.result_url = Some(result_url.to_string());
        row.job.progress = 100;
        row.job.error = None;
        row.job.updated_at = now;
        row.job.completed_at = Some(now);
        info!(job_id = %id, "Job completed");
        Ok(true)
    }

    async fn fail_job(&self, id: &JobId, error: &str) -> StoreResult<bool> {
        let mut t = self.tables.lock().await;
        let row = t
            .jobs
            .get_mut(id.as_str())
            .ok_or_else(|| StoreError::not_found(format!("job {}", id)))?;

        if row.job.status.is_terminal() {
            return Ok(false);
        }
        let now = Utc::now();
        row.job.status = JobStatus::Failed;
        row.job.error = Some(error.to_string());
        row.job.updated_at = now;
        row.job.completed_at = Some(now);
        info!(job_id = %id, error = %error, "Job failed");
        Ok(true)
    }

    async fn list_active_jobs(&self) -> StoreResult<Vec<Job>> {
        let t = self.tables.lock().await;
        Ok(t.jobs
            .values()
            .filter(|r| !r.job.is_terminal())
            .map(|r| r.job.clone())
            .collect())
    }
}

#[async_trait]
impl SegmentStore for MemoryStore {
    async fn create_segments(&self, segments: &[Segment]) -> StoreResult<()> {
        if segments.is_empty() {
            return Ok(());
        }
        let job_id = segments[0].job_id.clone();
        let mut t = self.tables.lock().await;
        let rows = t.segments.entry(job_id.as_str().to_string()).or_default();
        rows.extend_from_slice(segments);
        rows.sort_by_key(|s| s.index);
        debug!(job_id = %job_id, count = segments.len(), "Created segment rows");
        Ok(())
    }

    async fn get_segment(&self, job_id: &JobId, index: u32) -> StoreResult<Option<Segment>> {
        let t = self.tables.lock().await;
        Ok(t.segments
            .get(job_id.as_str())
            .and_then(|rows| rows.iter().find(|s| s.index == index).cloned()))
    }

    async fn list_segments(&self, job_id: &JobId) -> StoreResult<Vec<Segment>> {
        let t = self.tables.lock().await;
        Ok(t.segments.get(job_id.as_str()).cloned().unwrap_or_default())
    }

    async fn replace_segment(&self, segment: &Segment) -> StoreResult<()> {
        let mut t = self.tables.lock().await;
        let rows = t
            .segments
            .get_mut(segment.job_id.as_str())
            .ok_or_else(|| StoreError::not_found(format!("segments of job {}", segment.job_id)))?;
        let row = rows
            .iter_mut()
            .find(|s| s.index == segment.index)
            .ok_or_else(|| {
                StoreError::not_found(format!("segment {}/{}", segment.job_id, segment.index))
            })?;
        *row = segment.clone();
        Ok(())
    }

    async fn try_mark_generating(&self, job_id: &JobId, index: u32) -> StoreResult<bool> {
        let mut t = self.tables.lock().await;
        let row = t
            .segments
            .get_mut(job_id.as_str())
            .and_then(|rows| rows.iter_mut().find(|s| s.index == index))
            .ok_or_else(|| StoreError::not_found(format!("segment {}/{}", job_id, index)))?;

        if row.status != SegmentStatus::Pending {
            return Ok(false);
        }
        row.status = SegmentStatus::Generating;
        Ok(true)
    }

    async fn try_set_prediction(
        &self,
        job_id: &JobId,
        index: u32,
        prediction_id: &str,
    ) -> StoreResult<bool> {
        let mut t = self.tables.lock().await;
        let row = t
            .segments
            .get_mut(job_id.as_str())
            .and_then(|rows| rows.iter_mut().find(|s| s.index == index))
            .ok_or_else(|| StoreError::not_found(format!("segment {}/{}", job_id, index)))?;

        if row.status != SegmentStatus::Generating || row.prediction_id.is_some() {
            return Ok(false);
        }
        row.prediction_id = Some(prediction_id.to_string());
        Ok(true)
    }

    async fn complete_segment(
        &self,
        job_id: &JobId,
        index: u32,
        video_url: &str,
    ) -> StoreResult<()> {
        let mut t = self.tables.lock().await;
        let row = t
            .segments
            .get_mut(job_id.as_str())
            .and_then(|rows| rows.iter_mut().find(|s| s.index == index))
            .ok_or_else(|| StoreError::not_found(format!("segment {}/{}", job_id, index)))?;
        row.status = SegmentStatus::Completed;
        row.video_url = Some(video_url.to_string());
        row.error = None;
        Ok(())
    }

    async fn fail_segment(&self, job_id: &JobId, index: u32, error: &str) -> StoreResult<()> {
        let mut t = self.tables.lock().await;
        let row = t
            .segments
            .get_mut(job_id.as_str())
            .and_then(|rows| rows.iter_mut().find(|s| s.index == index))
            .ok_or_else(|| StoreError::not_found(format!("segment {}/{}", job_id, index)))?;
        row.status = SegmentStatus::Failed;
        row.error = Some(error.to_string());
        Ok(())
    }

    async fn count_generating(&self, job_id: &JobId) -> StoreResult<usize> {
        let t = self.tables.lock().await;
        Ok(t.segments
            .get(job_id.as_str())
            .map(|rows| {
                rows.iter()
                    .filter(|s| s.status == SegmentStatus::Generating)
                    .count()
            })
            .unwrap_or(0))
    }
}

#[async_trait]
impl CreditStore for MemoryStore {
    async fn get_balance(&self, user_id: &str) -> StoreResult<i64> {
        let t = self.tables.lock().await;
        Ok(t.balances.get(user_id).copied().unwrap_or(0))
    }

    async fn deposit(&self, user_id: &str, amount: i64) -> StoreResult<i64> {
        let mut t = self.tables.lock().await;
        let balance = t.balances.entry(user_id.to_string()).or_insert(0);
        *balance += amount;
        Ok(*balance)
    }

    async fn reserve(
        &self,
        user_id: &str,
        amount: i64,
        grace: i64,
    ) -> StoreResult<CreditReservation> {
        let mut t = self.tables.lock().await;
        let balance = t.balances.get(user_id).copied().unwrap_or(0);

        if balance + grace < amount {
            return Err(StoreError::InsufficientCredits {
                needed: amount,
                available: balance + grace,
            });
        }

        // Deduct on reserve: the visible balance always reflects spend.
        t.balances.insert(user_id.to_string(), balance - amount);

        let reservation = CreditReservation::new(user_id, amount);
        t.reservations
            .insert(reservation.id.as_str().to_string(), reservation.clone());
        info!(
            user_id = %user_id,
            reservation_id = %reservation.id,
            amount = amount,
            "Reserved credits"
        );
        Ok(reservation)
    }

    async fn get_reservation(&self, id: &ReservationId) -> StoreResult<Option<CreditReservation>> {
        let t = self.tables.lock().await;
        Ok(t.reservations.get(id.as_str()).cloned())
    }

    async fn capture(&self, id: &ReservationId) -> StoreResult<()> {
        let mut t = self.tables.lock().await;
        let res = t
            .reservations
            .get_mut(id.as_str())
            .ok_or_else(|| StoreError::not_found(format!("reservation {}", id)))?;

        match res.status {
            ReservationStatus::Reserved => {
                res.status = ReservationStatus::Captured;
                res.updated_at = Utc::now();
                info!(reservation_id = %id, "Captured reservation");
                Ok(())
            }
            ReservationStatus::Captured => Ok(()),
            ReservationStatus::Released => Err(StoreError::invalid_transition(format!(
                "reservation {} already released",
                id
            ))),
        }
    }

    async fn release(&self, id: &ReservationId, reason: &str) -> StoreResult<()> {
        let mut t = self.tables.lock().await;
        let res = t
            .reservations
            .get(id.as_str())
            .cloned()
            .ok_or_else(|| StoreError::not_found(format!("reservation {}", id)))?;

        match res.status {
            ReservationStatus::Reserved => {
                let balance = t.balances.entry(res.user_id.clone()).or_insert(0);
                *balance += res.amount;
                let stored = t.reservations.get_mut(id.as_str()).unwrap();
                stored.status = ReservationStatus::Released;
                stored.settled_reason = Some(reason.to_string());
                stored.updated_at = Utc::now();
                info!(reservation_id = %id, reason = %reason, "Released reservation");
                Ok(())
            }
            // Second release must not double-credit.
            ReservationStatus::Released => Ok(()),
            ReservationStatus::Captured => Err(StoreError::invalid_transition(format!(
                "reservation {} already captured",
                id
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job() -> Job {
        Job::new("user123", "the deep sea")
    }

    #[tokio::test]
    async fn test_job_transition_is_conditional() {
        let store = MemoryStore::new();
        let j = job();
        store.create_job(&j).await.unwrap();

        assert!(store
            .try_transition(&j.id, JobStatus::Pending, JobStatus::Processing)
            .await
            .unwrap());
        // Wrong precondition: already Processing.
        assert!(!store
            .try_transition(&j.id, JobStatus::Pending, JobStatus::Processing)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_status_never_regresses() {
        let store = MemoryStore::new();
        let j = job();
        store.create_job(&j).await.unwrap();
        store
            .try_transition(&j.id, JobStatus::Pending, JobStatus::Processing)
            .await
            .unwrap();
        store.complete_job(&j.id, "https://cdn.example/out.mp4").await.unwrap();

        // Terminal writes after terminal are rejected.
        assert!(!store.fail_job(&j.id, "late error").await.unwrap());
        let loaded = store.get_job(&j.id).await.unwrap().unwrap();
        assert_eq!(loaded.status, JobStatus::Completed);
        assert_eq!(loaded.result_url.as_deref(), Some("https://cdn.example/out.mp4"));
    }

    #[tokio::test]
    async fn test_finalize_claim_is_single_shot() {
        let store = MemoryStore::new();
        let j = job();
        store.create_job(&j).await.unwrap();
        store
            .try_transition(&j.id, JobStatus::Pending, JobStatus::Processing)
            .await
            .unwrap();

        assert!(store.try_claim_finalize(&j.id).await.unwrap());
        assert!(!store.try_claim_finalize(&j.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_finalize_claim_requires_processing() {
        let store = MemoryStore::new();
        let j = job();
        store.create_job(&j).await.unwrap();
        assert!(!store.try_claim_finalize(&j.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_prediction_id_set_at_most_once() {
        let store = MemoryStore::new();
        let j = job();
        store.create_job(&j).await.unwrap();
        let mut seg = Segment::new(j.id.clone(), 0, "text", "prompt");
        seg.image_url = Some("https://cdn.example/img.png".into());
        store.create_segments(&[seg]).await.unwrap();

        assert!(store.try_mark_generating(&j.id, 0).await.unwrap());
        assert!(!store.try_mark_generating(&j.id, 0).await.unwrap());

        // Prediction id only while Generating, and only once.
        assert!(store.try_set_prediction(&j.id, 0, "pred-1").await.unwrap());
        assert!(!store.try_set_prediction(&j.id, 0, "pred-2").await.unwrap());

        let seg = store.get_segment(&j.id, 0).await.unwrap().unwrap();
        assert_eq!(seg.prediction_id.as_deref(), Some("pred-1"));
        assert_eq!(seg.status, SegmentStatus::Generating);
    }

    #[tokio::test]
    async fn test_prediction_requires_generating() {
        let store = MemoryStore::new();
        let j = job();
        store.create_job(&j).await.unwrap();
        store
            .create_segments(&[Segment::new(j.id.clone(), 0, "text", "prompt")])
            .await
            .unwrap();

        // Still Pending: prediction id is rejected.
        assert!(!store.try_set_prediction(&j.id, 0, "pred-1").await.unwrap());
    }

    #[tokio::test]
    async fn test_reserve_deducts_and_respects_grace() {
        let store = MemoryStore::new();
        store.deposit("user123", 10).await.unwrap();

        // 10 + grace 5 covers 12
        let res = store.reserve("user123", 12, 5).await.unwrap();
        assert_eq!(store.get_balance("user123").await.unwrap(), -2);
        assert_eq!(res.amount, 12);

        // Balance -2 + grace 5 cannot cover 4
        let err = store.reserve("user123", 4, 5).await.unwrap_err();
        assert!(err.is_insufficient_credits());
        // Failed reserve mutates nothing.
        assert_eq!(store.get_balance("user123").await.unwrap(), -2);
    }

    #[tokio::test]
    async fn test_release_is_idempotent() {
        let store = MemoryStore::new();
        store.deposit("user123", 100).await.unwrap();
        let res = store.reserve("user123", 40, 0).await.unwrap();
        assert_eq!(store.get_balance("user123").await.unwrap(), 60);

        store.release(&res.id, "job failed").await.unwrap();
        assert_eq!(store.get_balance("user123").await.unwrap(), 100);

        // Double release leaves the balance unchanged.
        store.release(&res.id, "job failed").await.unwrap();
        assert_eq!(store.get_balance("user123").await.unwrap(), 100);
    }

    #[tokio::test]
    async fn test_capture_and_release_are_mutually_exclusive() {
        let store = MemoryStore::new();
        store.deposit("user123", 100).await.unwrap();

        let res = store.reserve("user123", 40, 0).await.unwrap();
        store.capture(&res.id).await.unwrap();
        // Capture flips status only; the deduction already happened.
        assert_eq!(store.get_balance("user123").await.unwrap(), 60);
        // Repeat capture is a no-op.
        store.capture(&res.id).await.unwrap();
        // Release after capture is rejected.
        assert!(store.release(&res.id, "oops").await.is_err());

        let res2 = store.reserve("user123", 10, 0).await.unwrap();
        store.release(&res2.id, "aborted").await.unwrap();
        assert!(store.capture(&res2.id).await.is_err());
    }

    #[tokio::test]
    async fn test_concurrent_reserves_never_overspend() {
        let store = MemoryStore::new();
        store.deposit("user123", 50).await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..10 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.reserve("user123", 10, 0).await.is_ok()
            }));
        }

        let mut granted = 0;
        for h in handles {
            if h.await.unwrap() {
                granted += 1;
            }
        }
        assert_eq!(granted, 5);
        assert_eq!(store.get_balance("user123").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_count_generating() {
        let store = MemoryStore::new();
        let j = job();
        store.create_job(&j).await.unwrap();
        let segs: Vec<Segment> = (0..3)
            .map(|i| Segment::new(j.id.clone(), i, "s", "v"))
            .collect();
        store.create_segments(&segs).await.unwrap();

        store.try_mark_generating(&j.id, 0).await.unwrap();
        store.try_mark_generating(&j.id, 2).await.unwrap();
        assert_eq!(store.count_generating(&j.id).await.unwrap(), 2);

        store
            .complete_segment(&j.id, 0, "https://cdn.example/0.mp4")
            .await
            .unwrap();
        assert_eq!(store.count_generating(&j.id).await.unwrap(), 1);
    }
}
