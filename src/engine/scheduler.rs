// src/engine/scheduler.rs

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info};

use crate::config::MAX_CHECK_INTERVAL_SECS;
use crate::exec::{CommandRunner, ExecutionWorker};
use crate::store::JobStore;
use crate::types::Job;

use super::core::{available_slots, select_jobs};
use super::{CycleReport, SkipReason};

/// Tick-driven dispatch loop.
///
/// Every cycle re-reads the ceiling, the running count and the queue from the
/// store, launches one [`ExecutionWorker`] per selected job without waiting
/// for it, and goes back to sleep. Launched workers are tracked so that
/// shutdown can wait for them.
///
/// Slot accounting is a snapshot read followed by an unguarded launch, so jobs
/// created or finished between the two can push the real running count past
/// the ceiling for a while. Cycles never overlap each other, so the loop can't
/// double-dispatch against itself.
pub struct Scheduler {
    store: Arc<dyn JobStore>,
    worker: ExecutionWorker,
    check_interval: Duration,
    tracker: TaskTracker,
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("check_interval", &self.check_interval)
            .field("in_flight", &self.tracker.len())
            .finish_non_exhaustive()
    }
}

impl Scheduler {
    /// `check_interval` is clamped to between one millisecond and
    /// [`MAX_CHECK_INTERVAL_SECS`].
    pub fn new(
        store: Arc<dyn JobStore>,
        runner: Arc<dyn CommandRunner>,
        check_interval: Duration,
    ) -> Self {
        let worker = ExecutionWorker::new(Arc::clone(&store), runner);
        Self {
            store,
            worker,
            check_interval: check_interval.clamp(
                Duration::from_millis(1),
                Duration::from_secs(MAX_CHECK_INTERVAL_SECS),
            ),
            tracker: TaskTracker::new(),
        }
    }

    pub fn check_interval(&self) -> Duration {
        self.check_interval
    }

    /// Number of launched workers that haven't returned yet.
    pub fn in_flight(&self) -> usize {
        self.tracker.len()
    }

    /// Run dispatch cycles until `cancel` fires, then wait for every launched
    /// worker to finish.
    ///
    /// The first cycle runs immediately; later ones every `check_interval`.
    /// A cycle that overruns the interval makes the loop skip the missed
    /// ticks rather than burst. In-flight commands are never interrupted, so
    /// returning can take as long as the slowest running job.
    pub async fn run(&self, cancel: CancellationToken) {
        info!(
            interval_ms = self.check_interval.as_millis() as u64,
            "scheduler is running, checking for queued jobs"
        );

        if !cancel.is_cancelled() {
            self.dispatch_cycle().await;
        }

        let now = Instant::now();
        let first_tick = now.checked_add(self.check_interval).unwrap_or(now);
        let mut ticker = interval_at(first_tick, self.check_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;

                _ = cancel.cancelled() => {
                    info!(
                        in_flight = self.tracker.len(),
                        "scheduler stopping, waiting for active jobs to complete"
                    );
                    break;
                }
                _ = ticker.tick() => {
                    self.dispatch_cycle().await;
                }
            }
        }

        self.shutdown().await;
    }

    /// Wait until every launched worker has returned.
    pub async fn shutdown(&self) {
        self.tracker.close();
        self.tracker.wait().await;
        info!("all active jobs completed");
    }

    /// One pass of the loop body.
    ///
    /// Any store read failure aborts the cycle; the next tick tries again.
    pub async fn dispatch_cycle(&self) -> CycleReport {
        let max_concurrent_jobs = match self.store.get_max_concurrent_jobs().await {
            Ok(v) => v,
            Err(err) => {
                error!(error = %err, "error fetching max_concurrent_jobs config");
                return CycleReport::Skipped(SkipReason::ConfigUnavailable);
            }
        };

        let running = match self.store.get_running_job_count().await {
            Ok(v) => v,
            Err(err) => {
                error!(error = %err, "error counting running jobs");
                return CycleReport::Skipped(SkipReason::RunningCountUnavailable);
            }
        };

        let Some(slots) = available_slots(max_concurrent_jobs, running) else {
            info!(
                max_concurrent_jobs,
                running, "no available slots, waiting for running jobs to complete"
            );
            return CycleReport::Skipped(SkipReason::NoSlots {
                max_concurrent_jobs,
                running,
            });
        };

        debug!(max_concurrent_jobs, running, available = slots, "computed free slots");

        let queued = match self.store.get_queued_jobs().await {
            Ok(jobs) => jobs,
            Err(err) => {
                error!(error = %err, "error fetching queued jobs");
                return CycleReport::Skipped(SkipReason::QueueUnavailable);
            }
        };

        if queued.is_empty() {
            debug!("no queued jobs found");
            return CycleReport::Skipped(SkipReason::QueueEmpty);
        }

        let found = queued.len();
        let plan = select_jobs(queued, slots);
        if plan.deferred > 0 {
            info!(
                found,
                available = slots,
                deferred = plan.deferred,
                "limiting execution due to concurrency ceiling"
            );
        }

        let job_ids: Vec<_> = plan.selected.iter().map(|j| j.id).collect();
        for job in plan.selected {
            self.launch(job);
        }

        info!(
            spawned = job_ids.len(),
            ?job_ids,
            "spawned jobs, continuing to next check cycle"
        );

        CycleReport::Dispatched {
            job_ids,
            deferred: plan.deferred,
        }
    }

    fn launch(&self, job: Job) {
        let worker = self.worker.clone();
        self.tracker.spawn(async move {
            info!(job_id = job.id, job = %job.name, "executing job");
            let job_id = job.id;
            let outcome = worker.execute(job).await;
            debug!(job_id, ?outcome, "worker finished");
        });
    }
}
