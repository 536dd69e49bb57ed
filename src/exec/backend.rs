// src/exec/backend.rs

//! Pluggable command runner abstraction.
//!
//! Workers talk to a `CommandRunner` instead of spawning processes directly.
//! This makes it easy to swap in a fake runner in tests while keeping the
//! production implementation in [`super::command`].

use std::future::Future;
use std::pin::Pin;

use crate::errors::Result;

use super::command::{run_shell, CommandOutput};

/// Trait abstracting how a job's command is executed.
///
/// Production code uses [`ShellRunner`]; tests can provide their own
/// implementation that doesn't spawn real processes.
pub trait CommandRunner: Send + Sync {
    /// Run `command` to completion.
    ///
    /// - `Ok` with `success = false` for a command that ran and failed.
    /// - `Err` when the command could not be launched at all.
    fn run<'a>(
        &'a self,
        command: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<CommandOutput>> + Send + 'a>>;
}

/// Real runner used in production: `sh -c <command>`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShellRunner;

impl CommandRunner for ShellRunner {
    fn run<'a>(
        &'a self,
        command: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<CommandOutput>> + Send + 'a>> {
        Box::pin(async move { Ok(run_shell(command).await?) })
    }
}
