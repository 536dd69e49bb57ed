// src/lib.rs

pub mod api;
pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod shutdown;
pub mod store;
pub mod types;

use std::net::{Ipv4Addr, SocketAddr};
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{error, info};

use crate::api::ApiState;
use crate::cli::CliArgs;
use crate::config::{load_and_validate, Config};
use crate::engine::Scheduler;
use crate::exec::ShellRunner;
use crate::shutdown::install_shutdown_handler;
use crate::store::{JobStore, SqliteStore};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - the job store (a failed connection is fatal)
/// - the management API (optional)
/// - the scheduler loop
/// - SIGINT/SIGTERM handling
pub async fn run(args: CliArgs) -> Result<()> {
    let cfg = load_and_validate(args.config.as_deref().map(Path::new))
        .context("loading configuration")?;

    if args.dry_run {
        print_dry_run(&cfg)?;
        return Ok(());
    }

    info!(
        check_interval_secs = cfg.scheduler.check_interval_secs,
        "starting job scheduler daemon"
    );

    let sqlite = SqliteStore::connect(
        &cfg.store.database_url,
        cfg.scheduler.initial_max_concurrent_jobs,
    )
    .await
    .with_context(|| format!("connecting to job store at {}", cfg.store.database_url))?;
    let store: Arc<dyn JobStore> = Arc::new(sqlite.clone());

    let cancel = install_shutdown_handler();

    let api_handle = if cfg.api.enabled && !args.no_api {
        let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, cfg.api.port));
        let state = ApiState::new(Arc::clone(&store));
        let token = cancel.clone();
        Some(tokio::spawn(async move {
            if let Err(e) = api::serve(addr, state, token).await {
                error!(error = %e, "management API failed");
            }
        }))
    } else {
        info!("management API disabled");
        None
    };

    let scheduler = Scheduler::new(store, Arc::new(ShellRunner), cfg.check_interval());
    scheduler.run(cancel).await;

    // `run` only returns once the token has fired, so the API is already
    // winding down.
    if let Some(handle) = api_handle {
        if let Err(e) = handle.await {
            error!(error = %e, "management API task panicked");
        }
    }

    sqlite.close().await;
    info!("job scheduler daemon stopped");
    Ok(())
}

/// Print the resolved configuration without touching the store.
fn print_dry_run(cfg: &Config) -> Result<()> {
    println!("jobsched dry-run");
    println!();
    print!("{}", toml::to_string_pretty(cfg).context("rendering configuration")?);
    Ok(())
}
