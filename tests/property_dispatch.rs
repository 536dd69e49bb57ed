use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use proptest::prelude::*;

use jobsched::engine::{available_slots, select_jobs, Scheduler};
use jobsched::store::{JobStore, MemoryStore};
use jobsched::types::{JobStatus, NewJob};
use jobsched_test_utils::fake_runner::FakeRunner;

// Creation offsets (seconds) for queued jobs. Duplicates are allowed so ties
// on created_at get exercised too.
fn offsets_strategy() -> impl Strategy<Value = Vec<u32>> {
    proptest::collection::vec(0..50u32, 0..20)
}

proptest! {
    #[test]
    fn selection_never_exceeds_free_slots(
        max in -3i64..10,
        running in 0i64..10,
        queued in 0usize..30,
    ) {
        let dispatched = match available_slots(max, running) {
            None => 0,
            Some(slots) => {
                let jobs = (0..queued)
                    .map(|i| {
                        let ts = Utc.timestamp_opt(1_700_000_000 + i as i64, 0).unwrap();
                        jobsched::types::Job {
                            id: i as i64 + 1,
                            name: format!("job-{i}"),
                            command: "true".to_string(),
                            status: JobStatus::Queued,
                            last_run: None,
                            created_at: ts,
                            updated_at: ts,
                        }
                    })
                    .collect();
                let plan = select_jobs(jobs, slots);
                prop_assert_eq!(plan.selected.len() + plan.deferred, queued);
                plan.selected.len()
            }
        };

        prop_assert!(dispatched as i64 <= (max - running).max(0));
    }

    #[test]
    fn cycle_dispatches_the_oldest_queued_jobs(
        max in 0i64..8,
        running in 0usize..4,
        offsets in offsets_strategy(),
    ) {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();

        rt.block_on(async {
            let store = Arc::new(MemoryStore::new(max));
            let base = Utc.timestamp_opt(1_700_000_000, 0).unwrap();

            for i in 0..running {
                let job = store
                    .create_job_at(NewJob::new(format!("busy-{i}"), "sleep"), base)
                    .unwrap();
                store.update_job_status(job.id, JobStatus::Running).await.unwrap();
            }

            let mut queued = Vec::new();
            for (i, offset) in offsets.iter().enumerate() {
                let at = base + chrono::Duration::seconds(i64::from(*offset));
                let job = store
                    .create_job_at(NewJob::new(format!("q-{i}"), format!("cmd-{i}")), at)
                    .unwrap();
                queued.push((job.created_at, job.id));
            }
            queued.sort();

            let scheduler = Scheduler::new(
                store.clone(),
                Arc::new(FakeRunner::gated()),
                Duration::from_secs(1),
            );
            let report = scheduler.dispatch_cycle().await;

            let free = (max - running as i64).max(0) as usize;
            let expected: Vec<i64> = queued
                .iter()
                .take(free)
                .map(|(_, id)| *id)
                .collect();

            prop_assert_eq!(report.dispatched(), expected.as_slice());
            Ok::<(), TestCaseError>(())
        })?;
    }
}
