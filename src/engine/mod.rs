// src/engine/mod.rs

//! Scheduling engine for jobsched.
//!
//! This module ties together:
//! - the concurrency ceiling and running count read from the store
//! - FIFO selection of queued jobs into free slots
//! - the tick-driven loop that launches execution workers and drains them on
//!   shutdown
//!
//! The pure planning functions live in [`core`]; the async/IO shell is
//! implemented in [`scheduler`].

use crate::types::JobId;

/// Why a dispatch cycle launched nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Reading `max_concurrent_jobs` failed.
    ConfigUnavailable,
    /// Counting running jobs failed.
    RunningCountUnavailable,
    /// The ceiling leaves no room.
    NoSlots { max_concurrent_jobs: i64, running: i64 },
    /// Fetching the queue failed.
    QueueUnavailable,
    /// Nothing is queued.
    QueueEmpty,
}

/// What a single dispatch cycle did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleReport {
    Skipped(SkipReason),
    Dispatched {
        /// Launched jobs, oldest first.
        job_ids: Vec<JobId>,
        /// Queued jobs that didn't fit this cycle.
        deferred: usize,
    },
}

impl CycleReport {
    /// Ids launched by this cycle (empty when skipped).
    pub fn dispatched(&self) -> &[JobId] {
        match self {
            CycleReport::Dispatched { job_ids, .. } => job_ids,
            CycleReport::Skipped(_) => &[],
        }
    }
}

pub mod core;
pub mod scheduler;

pub use self::core::{available_slots, select_jobs, DispatchPlan};
pub use scheduler::Scheduler;
