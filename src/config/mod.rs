// src/config/mod.rs

//! Daemon configuration: TOML file, environment overrides, validation.

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{
    apply_env_overrides, load_and_validate, load_config, load_env_file, load_from_path,
    report_env_file, ENV_API_PORT, ENV_CHECK_INTERVAL, ENV_DATABASE_URL, ENV_MAX_CONCURRENT_JOBS,
};
pub use model::{
    ApiSection, Config, RawConfig, SchedulerSection, StoreSection, DEFAULT_API_PORT,
    DEFAULT_CHECK_INTERVAL_SECS, DEFAULT_DATABASE_URL, DEFAULT_MAX_CONCURRENT_JOBS,
    MAX_CHECK_INTERVAL_SECS,
};
