//! Top-level job orchestration.
//!
//! Owns the job lifecycle end to end: credit reservation on intake, the
//! pipeline task (beats, script, preparation fan-out, dispatch), and
//! single-segment regeneration. Completion itself is webhook-driven;
//! the pipeline's job ends once every surviving segment has been handed
//! to the video provider.

use tracing::{info, Instrument};

use reelgen_models::{
    CreateJobRequest, Job, JobId, JobStatus, PipelineContext, Segment, SegmentOverrides,
    SegmentStatus,
};
use reelgen_store::{CreditStore, JobStore, SegmentStore, StoreError};

use crate::context::OrchestratorContext;
use crate::dispatch;
use crate::error::{OrchestratorError, OrchestratorResult};
use crate::finalize;
use crate::logging::JobLogger;
use crate::prepare;
use crate::script;

/// The orchestrator facade the API layer talks to.
#[derive(Clone)]
pub struct JobOrchestrator {
    ctx: OrchestratorContext,
}

impl JobOrchestrator {
    pub fn new(ctx: OrchestratorContext) -> Self {
        Self { ctx }
    }

    pub fn context(&self) -> &OrchestratorContext {
        &self.ctx
    }

    /// Intake: reserve credits and persist the job, already Processing.
    ///
    /// Credits are deducted here, before any generation work, so an
    /// underfunded request is rejected without side effects. The
    /// pipeline itself is not started; callers follow up with
    /// [`spawn_pipeline`](Self::spawn_pipeline).
    pub async fn create_job(
        &self,
        owner_id: &str,
        request: &CreateJobRequest,
    ) -> OrchestratorResult<Job> {
        let cost = i64::from(request.segment_count) * self.ctx.config.credits_per_segment;
        let reservation = self
            .ctx
            .credits
            .reserve(owner_id, cost, self.ctx.config.grace_credits)
            .await?;

        let mut job = Job::new(owner_id, &request.topic);
        job.pipeline = PipelineContext {
            aspect: request.aspect,
            voice: request.voice.clone(),
            music_url: request.music_url.clone(),
            beats: Vec::new(),
        };
        job.reservation_id = Some(reservation.id.clone());

        // If persisting fails the deduction must not stick.
        let persisted = async {
            self.ctx.jobs.create_job(&job).await?;
            self.ctx.jobs.set_reservation(&job.id, &reservation.id).await?;
            self.ctx
                .jobs
                .try_transition(&job.id, JobStatus::Pending, JobStatus::Processing)
                .await?;
            Ok::<(), OrchestratorError>(())
        }
        .await;

        if let Err(e) = persisted {
            finalize::settle_release(&self.ctx, &job, "job creation failed").await;
            return Err(e);
        }

        job.status = JobStatus::Processing;
        info!(
            job_id = %job.id,
            owner_id = %owner_id,
            segments = request.segment_count,
            cost = cost,
            "Job created"
        );
        Ok(job)
    }

    /// Run the pipeline on a background task.
    pub fn spawn_pipeline(&self, job_id: JobId, segment_count: u32) {
        let this = self.clone();
        tokio::spawn(async move {
            this.run_pipeline(&job_id, segment_count).await;
        });
    }

    /// Run the pipeline to the dispatch boundary.
    ///
    /// Any error fails the job and refunds its reservation; errors never
    /// escape to the spawning task.
    pub async fn run_pipeline(&self, job_id: &JobId, segment_count: u32) {
        let logger = JobLogger::new(job_id, "pipeline");
        let run = async {
            if let Err(e) = self.pipeline_inner(job_id, segment_count).await {
                logger.log_error(&e.to_string());

                if let Ok(Some(job)) = self.ctx.jobs.get_job(job_id).await {
                    let _ = self.ctx.jobs.fail_job(job_id, &e.to_string()).await;
                    finalize::settle_release(&self.ctx, &job, &e.to_string()).await;
                }
            }
        };
        run.instrument(logger.create_span()).await;
    }

    async fn pipeline_inner(&self, job_id: &JobId, segment_count: u32) -> OrchestratorResult<()> {
        let ctx = &self.ctx;
        let mut job = ctx
            .jobs
            .get_job(job_id)
            .await?
            .ok_or_else(|| OrchestratorError::Store(StoreError::not_found(job_id.as_str())))?;

        let logger = JobLogger::new(job_id, "pipeline");
        logger.log_start(&format!("generating {} segments for {:?}", segment_count, job.topic));

        // Beat grid first; every duration decision depends on it.
        if let Some(music_url) = job.pipeline.music_url.clone() {
            job.pipeline.beats = prepare::analyze_music(ctx, &job, &music_url).await;
            ctx.jobs.set_pipeline(job_id, &job.pipeline).await?;
        }
        ctx.jobs.set_progress(job_id, 10).await?;

        let mut drafts = script::generate_script(ctx.text.as_ref(), &job.topic, segment_count).await?;
        drafts.truncate(segment_count as usize);
        let mut segments = script::drafts_to_segments(job_id, drafts);
        ctx.jobs.set_progress(job_id, 25).await?;

        logger.log_progress("resolving narration and imagery");
        let audio_lens = prepare::resolve_assets(ctx, &job, &mut segments).await?;
        prepare::assign_durations(
            &job.pipeline.beats,
            ctx.config.min_segment_duration,
            0.0,
            &mut segments,
            &audio_lens,
        );
        ctx.segments.create_segments(&segments).await?;
        ctx.jobs.set_progress(job_id, 50).await?;

        logger.log_progress("dispatching video generation");
        let submitted = dispatch::dispatch_segments(ctx, &job, &segments).await?;
        ctx.jobs.set_progress(job_id, 70).await?;

        logger.log_progress(&format!("{submitted} segments submitted, awaiting callbacks"));

        // Nothing in flight means no webhook will ever advance this job;
        // settle it now. With zero usable segments the finalizer fails
        // the job and the refund happens there.
        if ctx.segments.count_generating(job_id).await? == 0 {
            finalize::finalize_job(ctx, job_id).await?;
        }
        Ok(())
    }

    /// Regenerate a single segment with optional field overrides.
    ///
    /// Only allowed once the job has settled; the segment is re-prepared
    /// at its original timeline position and re-dispatched. Finalization
    /// is never triggered from here: the job's terminal status and
    /// result stand.
    pub async fn regenerate_segment(
        &self,
        job_id: &JobId,
        index: u32,
        overrides: &SegmentOverrides,
    ) -> OrchestratorResult<Segment> {
        let ctx = &self.ctx;
        let job = ctx
            .jobs
            .get_job(job_id)
            .await?
            .ok_or_else(|| OrchestratorError::Store(StoreError::not_found(job_id.as_str())))?;

        // Only settled jobs can be touched up. While the job is live,
        // resetting a row to Pending would race the last callback's
        // drained-state check and finalize without this segment.
        if !job.status.is_terminal() {
            return Err(OrchestratorError::Store(StoreError::Conflict(format!(
                "job {job_id} is still {}; segments can only be regenerated on settled jobs",
                job.status
            ))));
        }

        let existing = ctx
            .segments
            .get_segment(job_id, index)
            .await?
            .ok_or_else(|| {
                OrchestratorError::Store(StoreError::not_found(format!("{job_id}/{index}")))
            })?;

        let logger = JobLogger::new(job_id, "regenerate");
        logger.log_start(&format!("segment {index}"));

        let mut segment = Segment::new(
            job_id.clone(),
            index,
            overrides.script.clone().unwrap_or(existing.script),
            overrides
                .visual_prompt
                .clone()
                .unwrap_or(existing.visual_prompt),
        );
        segment.motion_prompt = overrides
            .motion_prompt
            .clone()
            .or(existing.motion_prompt);

        // Timeline position: everything before this segment keeps its
        // duration, so the cursor is their sum.
        let cursor: f64 = ctx
            .segments
            .list_segments(job_id)
            .await?
            .iter()
            .filter(|s| s.index < index)
            .map(|s| s.duration)
            .sum();

        let mut slice = [segment];
        let audio_lens = prepare::resolve_assets(ctx, &job, &mut slice).await?;
        prepare::assign_durations(
            &job.pipeline.beats,
            ctx.config.min_segment_duration,
            cursor,
            &mut slice,
            &audio_lens,
        );
        let [segment] = slice;

        ctx.segments.replace_segment(&segment).await?;

        if segment.status == SegmentStatus::Failed {
            logger.log_warning("segment preparation failed, not dispatching");
            return Ok(segment);
        }

        dispatch::dispatch_one(ctx, &job, &segment).await?;

        ctx.segments
            .get_segment(job_id, index)
            .await?
            .ok_or_else(|| {
                OrchestratorError::Store(StoreError::not_found(format!("{job_id}/{index}")))
            })
    }
}
