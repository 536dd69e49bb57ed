#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use jobsched::store::{JobStore, MemoryStore};
use jobsched::types::{Job, JobId, JobStatus, NewJob};

/// Builder for a seeded `MemoryStore`.
///
/// Jobs get strictly increasing creation times in the order they're added,
/// one second apart, so FIFO order is the insertion order.
pub struct StoreBuilder {
    max_concurrent_jobs: i64,
    jobs: Vec<(NewJob, JobStatus)>,
}

impl StoreBuilder {
    pub fn new() -> Self {
        Self {
            max_concurrent_jobs: 2,
            jobs: Vec::new(),
        }
    }

    pub fn max_concurrent(mut self, n: i64) -> Self {
        self.max_concurrent_jobs = n;
        self
    }

    pub fn queued(mut self, name: &str, command: &str) -> Self {
        self.jobs.push((NewJob::new(name, command), JobStatus::Queued));
        self
    }

    /// A job that is already marked `running` (as if by an earlier cycle).
    pub fn running(mut self, name: &str, command: &str) -> Self {
        self.jobs.push((NewJob::new(name, command), JobStatus::Running));
        self
    }

    pub async fn build(self) -> SeededStore {
        let store = Arc::new(MemoryStore::new(self.max_concurrent_jobs));
        let mut jobs = Vec::new();

        for (i, (new_job, status)) in self.jobs.into_iter().enumerate() {
            let created_at = base_time() + Duration::seconds(i as i64);
            let job = store
                .create_job_at(new_job, created_at)
                .expect("seed job should be valid");
            if status != JobStatus::Queued {
                store
                    .update_job_status(job.id, status)
                    .await
                    .expect("seed status write");
            }
            jobs.push(job);
        }

        SeededStore { store, jobs }
    }
}

impl Default for StoreBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0)
        .single()
        .expect("valid timestamp")
}

/// A store plus the jobs it was seeded with, in seed order.
pub struct SeededStore {
    pub store: Arc<MemoryStore>,
    pub jobs: Vec<Job>,
}

impl SeededStore {
    pub fn id_of(&self, name: &str) -> JobId {
        self.jobs
            .iter()
            .find(|j| j.name == name)
            .map(|j| j.id)
            .unwrap_or_else(|| panic!("no seeded job named {name}"))
    }

    pub async fn status_of(&self, name: &str) -> JobStatus {
        self.store
            .get_job(self.id_of(name))
            .await
            .expect("seeded job exists")
            .status
    }

    pub async fn job(&self, name: &str) -> Job {
        self.store
            .get_job(self.id_of(name))
            .await
            .expect("seeded job exists")
    }
}
