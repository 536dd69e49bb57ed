// src/engine/core.rs

//! Pure dispatch planning.
//!
//! The arithmetic of a dispatch cycle lives here, with no Tokio, store, or
//! processes involved:
//! - how many slots are free given the ceiling and the running count
//! - which queued jobs fill those slots
//!
//! The async shell (`engine::scheduler::Scheduler`) feeds it fresh store
//! reads every cycle and acts on the result.

use crate::types::Job;

/// Free concurrency slots, or `None` when there are none.
///
/// A ceiling at or below the running count (including a zero or negative
/// ceiling) yields `None`.
pub fn available_slots(max_concurrent_jobs: i64, running: i64) -> Option<usize> {
    let available = max_concurrent_jobs.saturating_sub(running);
    if available <= 0 {
        return None;
    }
    Some(usize::try_from(available).unwrap_or(usize::MAX))
}

/// Result of fitting the queue into the free slots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchPlan {
    /// Jobs to launch this cycle, oldest first.
    pub selected: Vec<Job>,
    /// Queued jobs left for a later cycle.
    pub deferred: usize,
}

/// Take at most `slots` jobs from the front of `queued`.
///
/// `queued` must already be ordered oldest first, which is what
/// `JobStore::get_queued_jobs` returns.
pub fn select_jobs(mut queued: Vec<Job>, slots: usize) -> DispatchPlan {
    let deferred = queued.len().saturating_sub(slots);
    queued.truncate(slots);
    DispatchPlan {
        selected: queued,
        deferred,
    }
}
