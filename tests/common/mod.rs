#![allow(dead_code, unused_imports)]

pub use jobsched_test_utils::builders;
pub use jobsched_test_utils::fake_runner::{FakeRunner, Scripted};
pub use jobsched_test_utils::log_capture::{capture_logs, CapturedLogs};
pub use jobsched_test_utils::recording_store::{RecordingStore, StoreOp, StoreWrite};
pub use jobsched_test_utils::{init_tracing, wait_until, with_timeout};
