// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `jobsched`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "jobsched",
    version,
    about = "Poll a job queue and run queued shell commands under a concurrency ceiling.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to an optional config file (TOML).
    ///
    /// Environment variables (`CHECK_INTERVAL`, `DATABASE_URL`, `API_PORT`,
    /// `MAX_CONCURRENT_JOBS`) are applied on top of it.
    #[arg(long, value_name = "PATH")]
    pub config: Option<String>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `JOBSCHED_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Don't start the HTTP management API.
    #[arg(long)]
    pub no_api: bool,

    /// Load and validate configuration, print it, and exit.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
