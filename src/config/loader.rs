// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::config::model::{
    Config, RawConfig, DEFAULT_CHECK_INTERVAL_SECS, MAX_CHECK_INTERVAL_SECS,
};
use crate::errors::{JobschedError, Result};

pub const ENV_CHECK_INTERVAL: &str = "CHECK_INTERVAL";
pub const ENV_DATABASE_URL: &str = "DATABASE_URL";
pub const ENV_API_PORT: &str = "API_PORT";
pub const ENV_MAX_CONCURRENT_JOBS: &str = "MAX_CONCURRENT_JOBS";

/// Load variables from a `.env` file into the process environment.
///
/// With no `path`, `.env` is searched for in the current directory and its
/// ancestors. Variables already set in the environment are left alone.
/// Returns the file that was loaded.
pub fn load_env_file(path: Option<&Path>) -> dotenvy::Result<PathBuf> {
    match path {
        Some(path) => dotenvy::from_path(path).map(|()| path.to_path_buf()),
        None => dotenvy::dotenv(),
    }
}

/// Log how [`load_env_file`] went. A missing or unreadable file is never
/// fatal.
pub fn report_env_file(result: &dotenvy::Result<PathBuf>) {
    match result {
        Ok(path) => info!(path = %path.display(), "loaded environment from file"),
        Err(e) if e.not_found() => warn!("no .env file found, using process environment only"),
        Err(e) => warn!(error = %e, "failed to load .env file, using process environment only"),
    }
}

/// Load a configuration file from a given path and return the raw `RawConfig`.
///
/// This only performs TOML deserialization; it does **not** perform semantic
/// validation. Use [`load_config`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfig> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: RawConfig = toml::from_str(&contents)?;

    Ok(config)
}

/// Apply environment overrides on top of file (or default) values.
///
/// `lookup` returns the value of an environment variable; empty values count
/// as unset.
///
/// `CHECK_INTERVAL` never fails: a value that isn't an integer between 1 and
/// [`MAX_CHECK_INTERVAL_SECS`] falls back to the built-in default with a
/// warning. The other variables are configuration errors when they don't
/// parse.
pub fn apply_env_overrides<F>(raw: &mut RawConfig, lookup: F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(value) = get(ENV_CHECK_INTERVAL) {
        raw.scheduler.check_interval_secs = match value.trim().parse::<u64>() {
            Ok(secs) if (1..=MAX_CHECK_INTERVAL_SECS).contains(&secs) => secs,
            _ => {
                warn!(
                    value = %value,
                    default = DEFAULT_CHECK_INTERVAL_SECS,
                    "invalid {ENV_CHECK_INTERVAL}; using default"
                );
                DEFAULT_CHECK_INTERVAL_SECS
            }
        };
    }

    if let Some(value) = get(ENV_DATABASE_URL) {
        raw.store.database_url = value;
    }

    if let Some(value) = get(ENV_API_PORT) {
        raw.api.port = value.trim().parse::<u16>().map_err(|e| {
            JobschedError::ConfigError(format!("{ENV_API_PORT}={value:?} is not a valid port: {e}"))
        })?;
    }

    if let Some(value) = get(ENV_MAX_CONCURRENT_JOBS) {
        raw.scheduler.initial_max_concurrent_jobs = value.trim().parse::<i64>().map_err(|e| {
            JobschedError::ConfigError(format!(
                "{ENV_MAX_CONCURRENT_JOBS}={value:?} is not an integer: {e}"
            ))
        })?;
    }

    Ok(())
}

/// Load an optional config file, apply overrides from `lookup`, and validate.
pub fn load_config<F>(path: Option<&Path>, lookup: F) -> Result<Config>
where
    F: Fn(&str) -> Option<String>,
{
    let mut raw = match path {
        Some(path) => load_from_path(path)?,
        None => RawConfig::default(),
    };
    apply_env_overrides(&mut raw, lookup)?;
    Config::try_from(raw)
}

/// Load configuration using the real process environment.
///
/// This is the recommended entry point for the rest of the application.
pub fn load_and_validate(path: Option<&Path>) -> Result<Config> {
    load_config(path, |key| std::env::var(key).ok())
}
