// src/exec/worker.rs

//! Per-job execution worker.

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::exec::CommandRunner;
use crate::store::JobStore;
use crate::types::{Job, JobStatus};

/// How a single execution attempt ended, as far as the worker could tell.
///
/// This is informational only. The store holds the authoritative status; a
/// failed status write means the two can disagree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobOutcome {
    /// Command exited successfully.
    Completed,
    /// Command exited non-zero, died from a signal, or never launched.
    Failed,
    /// The job could not be marked `running`, so nothing was executed.
    Abandoned,
}

/// Runs one job's command to completion and records the attempt.
#[derive(Clone)]
pub struct ExecutionWorker {
    store: Arc<dyn JobStore>,
    runner: Arc<dyn CommandRunner>,
}

impl std::fmt::Debug for ExecutionWorker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionWorker")
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}

impl ExecutionWorker {
    pub fn new(store: Arc<dyn JobStore>, runner: Arc<dyn CommandRunner>) -> Self {
        Self { store, runner }
    }

    /// Execute `job` once.
    ///
    /// 1. mark it `running` (on failure: log and give up, nothing else runs)
    /// 2. run the command, capturing combined output
    /// 3. stamp `last_run`, whatever happened in step 2
    /// 4. mark it `completed` or `failed`
    ///
    /// Store write failures in steps 3 and 4 are logged and otherwise ignored.
    pub async fn execute(&self, job: Job) -> JobOutcome {
        if let Err(err) = self.store.update_job_status(job.id, JobStatus::Running).await {
            error!(
                job_id = job.id,
                job = %job.name,
                error = %err,
                "failed to mark job running; not executing"
            );
            return JobOutcome::Abandoned;
        }

        let result = self.runner.run(&job.command).await;

        if let Err(err) = self.store.update_job_last_run(job.id).await {
            warn!(job_id = job.id, error = %err, "failed to update last_run");
        }

        let (status, outcome) = match result {
            Ok(out) if out.success => {
                info!(
                    job_id = job.id,
                    job = %job.name,
                    output = %out.output_lossy(),
                    "job completed successfully"
                );
                (JobStatus::Completed, JobOutcome::Completed)
            }
            Ok(out) => {
                warn!(
                    job_id = job.id,
                    job = %job.name,
                    exit_code = ?out.exit_code,
                    output = %out.output_lossy(),
                    "job failed"
                );
                (JobStatus::Failed, JobOutcome::Failed)
            }
            Err(err) => {
                warn!(
                    job_id = job.id,
                    job = %job.name,
                    error = %err,
                    "job command could not be run"
                );
                (JobStatus::Failed, JobOutcome::Failed)
            }
        };

        if let Err(err) = self.store.update_job_status(job.id, status).await {
            error!(
                job_id = job.id,
                status = %status,
                error = %err,
                "failed to record final job status"
            );
        }

        outcome
    }
}
