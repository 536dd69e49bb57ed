// src/store/memory.rs

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::debug;

use super::JobStore;
use crate::errors::{JobschedError, Result};
use crate::types::{Job, JobId, JobStats, JobStatus, NewJob};

#[derive(Debug)]
struct MemoryState {
    jobs: BTreeMap<JobId, Job>,
    next_id: JobId,
    max_concurrent_jobs: i64,
}

/// In-process job store.
///
/// Each operation takes the lock for its whole body, so every call is atomic
/// on its own, matching what the SQLite store guarantees per statement.
#[derive(Debug)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new(max_concurrent_jobs: i64) -> Self {
        Self {
            state: Mutex::new(MemoryState {
                jobs: BTreeMap::new(),
                next_id: 1,
                max_concurrent_jobs,
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert a queued job with an explicit creation time.
    ///
    /// Lets callers lay out a queue whose FIFO order doesn't depend on how
    /// fast the jobs were created.
    pub fn create_job_at(&self, job: NewJob, created_at: DateTime<Utc>) -> Result<Job> {
        job.validate()?;

        let mut state = self.state();
        let id = state.next_id;
        state.next_id += 1;

        let record = Job {
            id,
            name: job.name,
            command: job.command,
            status: JobStatus::Queued,
            last_run: None,
            created_at,
            updated_at: created_at,
        };
        state.jobs.insert(id, record.clone());

        debug!(job_id = id, job = %record.name, "memory store: created job");
        Ok(record)
    }

    fn with_job<T>(&self, id: JobId, f: impl FnOnce(&mut Job) -> T) -> Result<T> {
        let mut state = self.state();
        let job = state
            .jobs
            .get_mut(&id)
            .ok_or(JobschedError::JobNotFound(id))?;
        Ok(f(job))
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_MAX_CONCURRENT_JOBS)
    }
}

#[async_trait]
impl JobStore for MemoryStore {
    async fn get_max_concurrent_jobs(&self) -> Result<i64> {
        Ok(self.state().max_concurrent_jobs)
    }

    async fn get_running_job_count(&self) -> Result<i64> {
        let count = self
            .state()
            .jobs
            .values()
            .filter(|j| j.status == JobStatus::Running)
            .count();
        Ok(count as i64)
    }

    async fn get_queued_jobs(&self) -> Result<Vec<Job>> {
        let mut queued: Vec<Job> = self
            .state()
            .jobs
            .values()
            .filter(|j| j.status == JobStatus::Queued)
            .cloned()
            .collect();
        queued.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(queued)
    }

    async fn update_job_status(&self, id: JobId, status: JobStatus) -> Result<()> {
        self.with_job(id, |job| {
            job.status = status;
            job.updated_at = Utc::now();
        })
    }

    async fn update_job_last_run(&self, id: JobId) -> Result<()> {
        self.with_job(id, |job| {
            let now = Utc::now();
            job.last_run = Some(now);
            job.updated_at = now;
        })
    }

    async fn create_job(&self, job: NewJob) -> Result<Job> {
        self.create_job_at(job, Utc::now())
    }

    async fn list_jobs(&self) -> Result<Vec<Job>> {
        let mut jobs: Vec<Job> = self.state().jobs.values().cloned().collect();
        jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(jobs)
    }

    async fn get_job(&self, id: JobId) -> Result<Job> {
        self.with_job(id, |job| job.clone())
    }

    async fn set_max_concurrent_jobs(&self, value: i64) -> Result<()> {
        self.state().max_concurrent_jobs = value;
        debug!(max_concurrent_jobs = value, "memory store: updated ceiling");
        Ok(())
    }

    async fn job_stats(&self) -> Result<JobStats> {
        let mut stats = JobStats::default();
        for job in self.state().jobs.values() {
            stats.record(job.status);
        }
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    #[tokio::test]
    async fn queued_jobs_come_back_oldest_first() {
        let store = MemoryStore::new(2);
        let c = store.create_job_at(NewJob::new("C", "true"), at(3)).unwrap();
        let a = store.create_job_at(NewJob::new("A", "true"), at(1)).unwrap();
        let b = store.create_job_at(NewJob::new("B", "true"), at(2)).unwrap();

        let ids: Vec<_> = store.get_queued_jobs().await.unwrap().iter().map(|j| j.id).collect();
        assert_eq!(ids, vec![a.id, b.id, c.id]);
    }

    #[tokio::test]
    async fn creation_time_ties_fall_back_to_id() {
        let store = MemoryStore::new(2);
        let first = store.create_job_at(NewJob::new("x", "true"), at(5)).unwrap();
        let second = store.create_job_at(NewJob::new("y", "true"), at(5)).unwrap();

        let ids: Vec<_> = store.get_queued_jobs().await.unwrap().iter().map(|j| j.id).collect();
        assert_eq!(ids, vec![first.id, second.id]);
    }

    #[tokio::test]
    async fn running_count_and_queued_set_follow_status_writes() {
        let store = MemoryStore::new(2);
        let a = store.create_job(NewJob::new("A", "true")).await.unwrap();
        let b = store.create_job(NewJob::new("B", "true")).await.unwrap();

        store.update_job_status(a.id, JobStatus::Running).await.unwrap();

        assert_eq!(store.get_running_job_count().await.unwrap(), 1);
        let queued = store.get_queued_jobs().await.unwrap();
        assert_eq!(queued.len(), 1);
        assert_eq!(queued[0].id, b.id);
    }

    #[tokio::test]
    async fn last_run_is_only_set_by_explicit_write() {
        let store = MemoryStore::new(1);
        let job = store.create_job(NewJob::new("A", "true")).await.unwrap();
        assert!(job.last_run.is_none());

        store.update_job_last_run(job.id).await.unwrap();
        let job = store.get_job(job.id).await.unwrap();
        assert!(job.last_run.is_some());
        assert_eq!(job.last_run, Some(job.updated_at));
    }

    #[tokio::test]
    async fn writes_to_unknown_job_are_errors() {
        let store = MemoryStore::new(1);
        assert!(matches!(
            store.update_job_status(42, JobStatus::Running).await,
            Err(JobschedError::JobNotFound(42))
        ));
        assert!(matches!(
            store.update_job_last_run(42).await,
            Err(JobschedError::JobNotFound(42))
        ));
    }

    #[tokio::test]
    async fn ceiling_reads_reflect_latest_write() {
        let store = MemoryStore::new(3);
        assert_eq!(store.get_max_concurrent_jobs().await.unwrap(), 3);
        store.set_max_concurrent_jobs(0).await.unwrap();
        assert_eq!(store.get_max_concurrent_jobs().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn list_is_newest_first_and_stats_add_up() {
        let store = MemoryStore::new(1);
        let old = store.create_job_at(NewJob::new("old", "true"), at(1)).unwrap();
        let new = store.create_job_at(NewJob::new("new", "true"), at(9)).unwrap();
        store.update_job_status(old.id, JobStatus::Running).await.unwrap();
        store.update_job_status(old.id, JobStatus::Failed).await.unwrap();

        let ids: Vec<_> = store.list_jobs().await.unwrap().iter().map(|j| j.id).collect();
        assert_eq!(ids, vec![new.id, old.id]);

        let stats = store.job_stats().await.unwrap();
        assert_eq!(stats.total, 2);
        assert_eq!(stats.queued, 1);
        assert_eq!(stats.failed, 1);
    }
}
