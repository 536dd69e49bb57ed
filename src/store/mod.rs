// src/store/mod.rs

//! Persistent job and config records.
//!
//! The store is the single source of truth for jobs and for the concurrency
//! ceiling. The scheduler and its workers keep no durable state of their own;
//! everything they need is re-read from here each dispatch cycle.
//!
//! Every method is a single atomic request/response. Nothing here guards a
//! multi-step sequence (e.g. "count running, then mark running"), so callers
//! that combine reads and writes only get a best-effort view.
//!
//! - [`memory`] is an in-process implementation (tests, ephemeral runs).
//! - [`sqlite`] is the durable `sqlx`/SQLite implementation used by the daemon.

use std::fmt::Debug;

use async_trait::async_trait;

use crate::errors::Result;
use crate::types::{Job, JobId, JobStats, JobStatus, NewJob};

pub mod memory;
pub mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Key under which the concurrency ceiling is persisted.
pub const MAX_CONCURRENT_JOBS_KEY: &str = "max_concurrent_jobs";

/// Abstract job store.
///
/// The first five methods are what the scheduling core consumes; the rest
/// back the management API.
#[async_trait]
pub trait JobStore: Send + Sync + Debug {
    /// Current concurrency ceiling.
    async fn get_max_concurrent_jobs(&self) -> Result<i64>;

    /// Number of jobs whose status is `running`.
    async fn get_running_job_count(&self) -> Result<i64>;

    /// Queued jobs, oldest first (`created_at` ascending, ties by id).
    async fn get_queued_jobs(&self) -> Result<Vec<Job>>;

    /// Set `status` and bump `updated_at`.
    async fn update_job_status(&self, id: JobId, status: JobStatus) -> Result<()>;

    /// Set `last_run` and `updated_at` to now.
    async fn update_job_last_run(&self, id: JobId) -> Result<()>;

    /// Insert a new job with status `queued`.
    async fn create_job(&self, job: NewJob) -> Result<Job>;

    /// All jobs, newest first.
    async fn list_jobs(&self) -> Result<Vec<Job>>;

    async fn get_job(&self, id: JobId) -> Result<Job>;

    async fn set_max_concurrent_jobs(&self, value: i64) -> Result<()>;

    async fn job_stats(&self) -> Result<JobStats>;
}
