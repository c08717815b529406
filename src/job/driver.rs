//! State machine driving one job through its lifecycle.
//!
//! `Queued → Processing → {Completed, Failed}`. The driver is owned by the
//! single task executing the job's stages; every transition goes through
//! the store's write lock so pollers observe each checkpoint atomically.
//! Terminal states are immutable: late transitions are dropped.

use crate::error::ShortsmithError;
use crate::job::store::JobStore;
use crate::job::types::{Artifact, Job, JobError, JobStatus, Stage};
use chrono::Utc;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use uuid::Uuid;

/// Writer handle for one job's lifecycle.
pub struct JobDriver {
    store: JobStore,
    id: Uuid,
    cancel: Arc<AtomicBool>,
}

impl JobDriver {
    pub fn new(store: JobStore, id: Uuid) -> Self {
        Self {
            store,
            id,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Flag flipped by [`cancel`](Self::cancel) requests; shared with the
    /// orchestrator so pollers can cancel between stages.
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    /// `Queued → Processing`, progress 0.
    pub fn begin(&self) {
        self.store
            .update(self.id, |job| {
                if job.status == JobStatus::Queued {
                    job.status = JobStatus::Processing;
                    job.progress = 0;
                }
            })
            .ok();
        tracing::info!(job_id = %self.id, "job processing started");
    }

    /// Fails with `Cancelled` if a cancellation was requested.
    ///
    /// Called between stages; a cancelled job never lingers in
    /// `Processing`.
    pub fn ensure_active(&self, stage: Stage) -> Result<(), (Stage, ShortsmithError)> {
        if self.cancel.load(Ordering::SeqCst) {
            Err((stage, ShortsmithError::Cancelled))
        } else {
            Ok(())
        }
    }

    /// Record a successful stage: artifact stored, progress advanced to
    /// the stage's checkpoint. Visible to pollers before the next stage
    /// begins.
    pub fn record_stage(&self, stage: Stage, artifact: Artifact, checkpoint: u8) {
        self.store
            .update(self.id, |job| {
                if job.status.is_terminal() {
                    return;
                }
                job.artifacts
                    .insert(stage.artifact_key().to_string(), artifact);
                // Progress never moves backwards
                job.progress = job.progress.max(checkpoint);
            })
            .ok();
        tracing::info!(job_id = %self.id, stage = %stage, progress = checkpoint, "stage completed");
    }

    /// `Processing → Completed`: records the final artifact, progress 100,
    /// stamps the completion time.
    pub fn complete(&self, final_artifact: Artifact) {
        self.store
            .update(self.id, |job| {
                if job.status.is_terminal() {
                    return;
                }
                job.artifacts
                    .insert(Stage::Compose.artifact_key().to_string(), final_artifact);
                job.status = JobStatus::Completed;
                job.progress = crate::defaults::PROGRESS_COMPLETE;
                job.completed_at = Some(Utc::now());
            })
            .ok();
        tracing::info!(job_id = %self.id, "job completed");
    }

    /// `Processing → Failed`: records `{stage, message}` and stamps the
    /// completion time. A provider error carries its own stage, which wins
    /// over the hint.
    pub fn fail(&self, stage_hint: Stage, err: &ShortsmithError) {
        let stage = match err {
            ShortsmithError::Provider { stage, .. } => *stage,
            _ => stage_hint,
        };
        let message = err.to_string();
        self.store
            .update(self.id, |job| {
                if job.status.is_terminal() {
                    return;
                }
                job.status = JobStatus::Failed;
                job.error = Some(JobError {
                    stage,
                    message: message.clone(),
                });
                job.completed_at = Some(Utc::now());
            })
            .ok();
        tracing::warn!(job_id = %self.id, stage = %stage, error = %err, "job failed");
    }

    /// Current snapshot (test and diagnostics helper).
    pub fn job(&self) -> Option<Job> {
        self.store.get(self.id).ok()
    }
}
