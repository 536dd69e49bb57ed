// src/config/validate.rs

use crate::config::model::{Config, RawConfig, MAX_CHECK_INTERVAL_SECS};
use crate::errors::{JobschedError, Result};

impl TryFrom<RawConfig> for Config {
    type Error = JobschedError;

    fn try_from(raw: RawConfig) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(Config::new_unchecked(raw.scheduler, raw.store, raw.api))
    }
}

fn validate_raw_config(cfg: &RawConfig) -> Result<()> {
    validate_scheduler(cfg)?;
    validate_store(cfg)?;
    Ok(())
}

fn validate_scheduler(cfg: &RawConfig) -> Result<()> {
    if cfg.scheduler.check_interval_secs == 0 {
        return Err(JobschedError::ConfigError(
            "[scheduler].check_interval_secs must be >= 1 (got 0)".to_string(),
        ));
    }

    if cfg.scheduler.check_interval_secs > MAX_CHECK_INTERVAL_SECS {
        return Err(JobschedError::ConfigError(format!(
            "[scheduler].check_interval_secs must be <= {MAX_CHECK_INTERVAL_SECS} (got {})",
            cfg.scheduler.check_interval_secs
        )));
    }

    if cfg.scheduler.initial_max_concurrent_jobs < 0 {
        return Err(JobschedError::ConfigError(format!(
            "[scheduler].initial_max_concurrent_jobs must be >= 0 (got {})",
            cfg.scheduler.initial_max_concurrent_jobs
        )));
    }

    Ok(())
}

fn validate_store(cfg: &RawConfig) -> Result<()> {
    if cfg.store.database_url.trim().is_empty() {
        return Err(JobschedError::ConfigError(
            "[store].database_url must not be empty".to_string(),
        ));
    }
    Ok(())
}
