// tests/scheduler_dispatch.rs

mod common;
use crate::common::builders::StoreBuilder;
use crate::common::{init_tracing, wait_until, with_timeout, FakeRunner, RecordingStore, StoreOp};

use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

use jobsched::engine::{CycleReport, Scheduler, SkipReason};
use jobsched::store::JobStore;
use jobsched::types::JobStatus;

type TestResult = Result<(), Box<dyn Error>>;

const TICK: Duration = Duration::from_millis(20);

#[tokio::test]
async fn oldest_jobs_fill_free_slots_and_the_rest_stay_queued() -> TestResult {
    init_tracing();

    let seeded = StoreBuilder::new()
        .max_concurrent(2)
        .queued("A", "echo A")
        .queued("B", "echo B")
        .queued("C", "echo C")
        .build()
        .await;
    let store: Arc<dyn JobStore> = seeded.store.clone();
    let runner = Arc::new(FakeRunner::gated());
    let scheduler = Scheduler::new(store, runner.clone(), TICK);

    let report = scheduler.dispatch_cycle().await;
    assert_eq!(
        report,
        CycleReport::Dispatched {
            job_ids: vec![seeded.id_of("A"), seeded.id_of("B")],
            deferred: 1,
        }
    );

    wait_until(|| async { runner.started().len() == 2 }).await;
    assert_eq!(runner.started(), vec!["echo A", "echo B"]);
    assert_eq!(seeded.status_of("A").await, JobStatus::Running);
    assert_eq!(seeded.status_of("B").await, JobStatus::Running);
    assert_eq!(seeded.status_of("C").await, JobStatus::Queued);

    runner.open_gate();
    with_timeout(scheduler.shutdown()).await;

    assert_eq!(seeded.status_of("A").await, JobStatus::Completed);
    assert_eq!(seeded.status_of("B").await, JobStatus::Completed);
    assert_eq!(seeded.status_of("C").await, JobStatus::Queued);
    assert!(seeded.job("C").await.last_run.is_none());
    Ok(())
}

#[tokio::test]
async fn zero_ceiling_dispatches_nothing() -> TestResult {
    init_tracing();

    let seeded = StoreBuilder::new()
        .max_concurrent(0)
        .queued("A", "echo A")
        .queued("B", "echo B")
        .build()
        .await;
    let store: Arc<dyn JobStore> = seeded.store.clone();
    let runner = Arc::new(FakeRunner::new());
    let scheduler = Scheduler::new(store, runner.clone(), TICK);

    let report = scheduler.dispatch_cycle().await;
    assert_eq!(
        report,
        CycleReport::Skipped(SkipReason::NoSlots {
            max_concurrent_jobs: 0,
            running: 0,
        })
    );
    assert!(report.dispatched().is_empty());

    scheduler.shutdown().await;
    assert!(runner.started().is_empty());
    assert_eq!(seeded.status_of("A").await, JobStatus::Queued);
    assert_eq!(seeded.status_of("B").await, JobStatus::Queued);
    Ok(())
}

#[tokio::test]
async fn running_jobs_count_against_the_ceiling() -> TestResult {
    init_tracing();

    let seeded = StoreBuilder::new()
        .max_concurrent(3)
        .running("busy", "sleep 100")
        .queued("A", "echo A")
        .queued("B", "echo B")
        .queued("C", "echo C")
        .build()
        .await;
    let store: Arc<dyn JobStore> = seeded.store.clone();
    let runner = Arc::new(FakeRunner::new());
    let scheduler = Scheduler::new(store, runner.clone(), TICK);

    let report = scheduler.dispatch_cycle().await;
    assert_eq!(
        report,
        CycleReport::Dispatched {
            job_ids: vec![seeded.id_of("A"), seeded.id_of("B")],
            deferred: 1,
        }
    );

    scheduler.shutdown().await;
    assert_eq!(seeded.status_of("busy").await, JobStatus::Running);
    assert_eq!(seeded.status_of("C").await, JobStatus::Queued);
    Ok(())
}

#[tokio::test]
async fn ceiling_lowered_below_running_count_skips_the_queue_read() -> TestResult {
    init_tracing();

    let seeded = StoreBuilder::new()
        .max_concurrent(1)
        .running("r1", "sleep 1")
        .running("r2", "sleep 1")
        .queued("A", "echo A")
        .build()
        .await;
    let recording = Arc::new(RecordingStore::new(seeded.store.clone()));
    let runner = Arc::new(FakeRunner::new());
    let scheduler = Scheduler::new(recording.clone(), runner.clone(), TICK);

    let report = scheduler.dispatch_cycle().await;
    assert_eq!(
        report,
        CycleReport::Skipped(SkipReason::NoSlots {
            max_concurrent_jobs: 1,
            running: 2,
        })
    );
    assert_eq!(recording.queued_reads(), 0);
    assert!(runner.started().is_empty());
    Ok(())
}

#[tokio::test]
async fn empty_queue_is_a_no_op() -> TestResult {
    init_tracing();

    let seeded = StoreBuilder::new().max_concurrent(4).build().await;
    let store: Arc<dyn JobStore> = seeded.store.clone();
    let runner = Arc::new(FakeRunner::new());
    let scheduler = Scheduler::new(store, runner.clone(), TICK);

    assert_eq!(
        scheduler.dispatch_cycle().await,
        CycleReport::Skipped(SkipReason::QueueEmpty)
    );
    assert_eq!(scheduler.in_flight(), 0);
    Ok(())
}

#[tokio::test]
async fn marked_running_jobs_block_the_next_cycle() -> TestResult {
    init_tracing();

    let seeded = StoreBuilder::new()
        .max_concurrent(2)
        .queued("A", "echo A")
        .queued("B", "echo B")
        .queued("C", "echo C")
        .build()
        .await;
    let store: Arc<dyn JobStore> = seeded.store.clone();
    let runner = Arc::new(FakeRunner::gated());
    let scheduler = Scheduler::new(store.clone(), runner.clone(), TICK);

    scheduler.dispatch_cycle().await;
    wait_until(|| {
        let store = store.clone();
        async move { store.get_running_job_count().await.unwrap() == 2 }
    })
    .await;

    assert_eq!(
        scheduler.dispatch_cycle().await,
        CycleReport::Skipped(SkipReason::NoSlots {
            max_concurrent_jobs: 2,
            running: 2,
        })
    );

    runner.open_gate();
    with_timeout(scheduler.shutdown()).await;
    assert_eq!(runner.peak_concurrency(), 2);
    assert_eq!(seeded.status_of("C").await, JobStatus::Queued);
    Ok(())
}

#[tokio::test]
async fn store_read_failures_abort_the_cycle_without_dispatching() -> TestResult {
    init_tracing();

    let seeded = StoreBuilder::new()
        .max_concurrent(2)
        .queued("A", "echo A")
        .build()
        .await;
    let recording = Arc::new(RecordingStore::new(seeded.store.clone()));
    let runner = Arc::new(FakeRunner::new());
    let scheduler = Scheduler::new(recording.clone(), runner.clone(), TICK);

    recording.fail(StoreOp::GetMaxConcurrentJobs);
    assert_eq!(
        scheduler.dispatch_cycle().await,
        CycleReport::Skipped(SkipReason::ConfigUnavailable)
    );
    assert_eq!(recording.queued_reads(), 0);
    recording.heal(StoreOp::GetMaxConcurrentJobs);

    recording.fail(StoreOp::GetRunningJobCount);
    assert_eq!(
        scheduler.dispatch_cycle().await,
        CycleReport::Skipped(SkipReason::RunningCountUnavailable)
    );
    assert_eq!(recording.queued_reads(), 0);
    recording.heal(StoreOp::GetRunningJobCount);

    recording.fail(StoreOp::GetQueuedJobs);
    assert_eq!(
        scheduler.dispatch_cycle().await,
        CycleReport::Skipped(SkipReason::QueueUnavailable)
    );
    recording.heal(StoreOp::GetQueuedJobs);

    assert!(runner.started().is_empty());
    assert!(recording.writes().is_empty());
    assert_eq!(seeded.status_of("A").await, JobStatus::Queued);

    // Once the store recovers, the job goes out on the next cycle.
    let report = scheduler.dispatch_cycle().await;
    assert_eq!(report.dispatched(), &[seeded.id_of("A")]);
    with_timeout(scheduler.shutdown()).await;
    assert_eq!(seeded.status_of("A").await, JobStatus::Completed);
    Ok(())
}
