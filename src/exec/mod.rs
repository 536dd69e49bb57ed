// src/exec/mod.rs

//! Process execution layer.
//!
//! This module is responsible for actually running job commands, using
//! `tokio::process::Command`, and recording each attempt in the store.
//!
//! - [`command`] builds the shell command and captures combined output.
//! - [`backend`] provides the `CommandRunner` trait and the concrete
//!   `ShellRunner` used in production, which tests can replace with a fake.
//! - [`worker`] holds `ExecutionWorker`, which drives one job through
//!   `running` to `completed` or `failed`.

pub mod backend;
pub mod command;
pub mod worker;

pub use backend::{CommandRunner, ShellRunner};
pub use command::CommandOutput;
pub use worker::{ExecutionWorker, JobOutcome};
