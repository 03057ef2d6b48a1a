//! Advisory stale-job scanning.
//!
//! A job whose webhook never arrives sits in Processing forever. The
//! scanner flags such jobs for operators; it deliberately never
//! transitions them, since a late callback must still be able to land.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use reelgen_models::JobId;
use reelgen_store::JobStore;

/// Periodic scanner flagging jobs with no progress past a threshold.
#[derive(Clone)]
pub struct StaleJobScanner {
    jobs: Arc<dyn JobStore>,
    threshold_secs: i64,
    interval: Duration,
}

impl StaleJobScanner {
    pub fn new(jobs: Arc<dyn JobStore>, threshold_secs: i64, interval: Duration) -> Self {
        Self {
            jobs,
            threshold_secs,
            interval,
        }
    }

    /// Run the scan loop until the task is dropped.
    pub async fn run(self) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            match self.scan_once().await {
                Ok(stale) if !stale.is_empty() => {
                    info!(count = stale.len(), "Stale job scan flagged jobs");
                }
                Ok(_) => {}
                Err(e) => warn!("Stale job scan failed: {}", e),
            }
        }
    }

    /// One scan pass; returns the flagged job ids.
    pub async fn scan_once(&self) -> Result<Vec<JobId>, reelgen_store::StoreError> {
        let active = self.jobs.list_active_jobs().await?;
        let mut stale = Vec::new();
        for job in active {
            if job.is_stale(self.threshold_secs) {
                warn!(
                    job_id = %job.id,
                    status = %job.status,
                    updated_at = %job.updated_at,
                    "Job has made no progress past the stale threshold"
                );
                stale.push(job.id);
            }
        }
        Ok(stale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use reelgen_models::Job;
    use reelgen_store::MemoryStore;

    #[tokio::test]
    async fn test_scan_flags_only_quiet_active_jobs() {
        let store = Arc::new(MemoryStore::new());

        let fresh = Job::new("user1", "fresh topic");
        store.create_job(&fresh).await.unwrap();

        let mut quiet = Job::new("user1", "stuck topic");
        quiet.updated_at = Utc::now() - chrono::Duration::hours(1);
        store.create_job(&quiet).await.unwrap();

        let mut done = Job::new("user1", "finished topic");
        done.updated_at = Utc::now() - chrono::Duration::hours(1);
        store.create_job(&done).await.unwrap();
        store
            .try_transition(&done.id, reelgen_models::JobStatus::Pending, reelgen_models::JobStatus::Processing)
            .await
            .unwrap();
        store.complete_job(&done.id, "memory://final.mp4").await.unwrap();

        let scanner = StaleJobScanner::new(store, 600, Duration::from_secs(60));
        let stale = scanner.scan_once().await.unwrap();

        assert_eq!(stale, vec![quiet.id]);
    }
}
