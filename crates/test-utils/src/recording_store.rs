use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use anyhow::anyhow;
use async_trait::async_trait;
use jobsched::errors::{JobschedError, Result};
use jobsched::store::JobStore;
use jobsched::types::{Job, JobId, JobStats, JobStatus, NewJob};

/// Store operations that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    GetMaxConcurrentJobs,
    GetRunningJobCount,
    GetQueuedJobs,
    /// Status writes to this particular status.
    UpdateStatus(JobStatus),
    UpdateLastRun,
}

/// A write that reached the inner store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreWrite {
    Status(JobId, JobStatus),
    LastRun(JobId),
}

/// Wraps another store, recording every successful write and failing the
/// operations it's told to fail.
#[derive(Debug)]
pub struct RecordingStore {
    inner: Arc<dyn JobStore>,
    writes: Mutex<Vec<StoreWrite>>,
    failing: Mutex<HashSet<StoreOp>>,
    queued_reads: Mutex<usize>,
}

impl RecordingStore {
    pub fn new(inner: Arc<dyn JobStore>) -> Self {
        Self {
            inner,
            writes: Mutex::new(Vec::new()),
            failing: Mutex::new(HashSet::new()),
            queued_reads: Mutex::new(0),
        }
    }

    pub fn fail(&self, op: StoreOp) {
        self.failing.lock().unwrap().insert(op);
    }

    pub fn heal(&self, op: StoreOp) {
        self.failing.lock().unwrap().remove(&op);
    }

    pub fn writes(&self) -> Vec<StoreWrite> {
        self.writes.lock().unwrap().clone()
    }

    /// Statuses written for `id`, in order.
    pub fn status_history(&self, id: JobId) -> Vec<JobStatus> {
        self.writes()
            .into_iter()
            .filter_map(|w| match w {
                StoreWrite::Status(job, status) if job == id => Some(status),
                _ => None,
            })
            .collect()
    }

    /// How many times `last_run` was written for `id`.
    pub fn last_run_writes(&self, id: JobId) -> usize {
        self.writes()
            .into_iter()
            .filter(|w| *w == StoreWrite::LastRun(id))
            .count()
    }

    /// How many times the queue was read (successfully or not).
    pub fn queued_reads(&self) -> usize {
        *self.queued_reads.lock().unwrap()
    }

    fn check(&self, op: StoreOp) -> Result<()> {
        if self.failing.lock().unwrap().contains(&op) {
            return Err(JobschedError::Other(anyhow!("injected failure: {op:?}")));
        }
        Ok(())
    }

    fn record(&self, write: StoreWrite) {
        self.writes.lock().unwrap().push(write);
    }
}

#[async_trait]
impl JobStore for RecordingStore {
    async fn get_max_concurrent_jobs(&self) -> Result<i64> {
        self.check(StoreOp::GetMaxConcurrentJobs)?;
        self.inner.get_max_concurrent_jobs().await
    }

    async fn get_running_job_count(&self) -> Result<i64> {
        self.check(StoreOp::GetRunningJobCount)?;
        self.inner.get_running_job_count().await
    }

    async fn get_queued_jobs(&self) -> Result<Vec<Job>> {
        *self.queued_reads.lock().unwrap() += 1;
        self.check(StoreOp::GetQueuedJobs)?;
        self.inner.get_queued_jobs().await
    }

    async fn update_job_status(&self, id: JobId, status: JobStatus) -> Result<()> {
        self.check(StoreOp::UpdateStatus(status))?;
        self.inner.update_job_status(id, status).await?;
        self.record(StoreWrite::Status(id, status));
        Ok(())
    }

    async fn update_job_last_run(&self, id: JobId) -> Result<()> {
        self.check(StoreOp::UpdateLastRun)?;
        self.inner.update_job_last_run(id).await?;
        self.record(StoreWrite::LastRun(id));
        Ok(())
    }

    async fn create_job(&self, job: NewJob) -> Result<Job> {
        self.inner.create_job(job).await
    }

    async fn list_jobs(&self) -> Result<Vec<Job>> {
        self.inner.list_jobs().await
    }

    async fn get_job(&self, id: JobId) -> Result<Job> {
        self.inner.get_job(id).await
    }

    async fn set_max_concurrent_jobs(&self, value: i64) -> Result<()> {
        self.inner.set_max_concurrent_jobs(value).await
    }

    async fn job_stats(&self) -> Result<JobStats> {
        self.inner.job_stats().await
    }
}
