// src/config/model.rs

use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const DEFAULT_CHECK_INTERVAL_SECS: u64 = 10;
/// Longest accepted tick period: one day.
pub const MAX_CHECK_INTERVAL_SECS: u64 = 86_400;
pub const DEFAULT_MAX_CONCURRENT_JOBS: i64 = 5;
pub const DEFAULT_DATABASE_URL: &str = "sqlite://jobsched.db";
pub const DEFAULT_API_PORT: u16 = 8080;

/// Configuration as read from a TOML file, before validation.
///
/// ```toml
/// [scheduler]
/// check_interval_secs = 10
/// initial_max_concurrent_jobs = 5
///
/// [store]
/// database_url = "sqlite://jobsched.db"
///
/// [api]
/// enabled = true
/// port = 8080
/// ```
///
/// All sections are optional and have reasonable defaults.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawConfig {
    #[serde(default)]
    pub scheduler: SchedulerSection,

    #[serde(default)]
    pub store: StoreSection,

    #[serde(default)]
    pub api: ApiSection,
}

/// `[scheduler]` section.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SchedulerSection {
    /// Seconds between dispatch cycles.
    #[serde(default = "default_check_interval_secs")]
    pub check_interval_secs: u64,

    /// Ceiling written to the store on first start only.
    ///
    /// Once a value is stored, the API owns it and this is ignored.
    #[serde(default = "default_max_concurrent_jobs")]
    pub initial_max_concurrent_jobs: i64,
}

fn default_check_interval_secs() -> u64 {
    DEFAULT_CHECK_INTERVAL_SECS
}

fn default_max_concurrent_jobs() -> i64 {
    DEFAULT_MAX_CONCURRENT_JOBS
}

impl Default for SchedulerSection {
    fn default() -> Self {
        Self {
            check_interval_secs: default_check_interval_secs(),
            initial_max_concurrent_jobs: default_max_concurrent_jobs(),
        }
    }
}

/// `[store]` section.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StoreSection {
    /// `sqlx` SQLite URL, e.g. `sqlite://jobsched.db` or `sqlite::memory:`.
    #[serde(default = "default_database_url")]
    pub database_url: String,
}

fn default_database_url() -> String {
    DEFAULT_DATABASE_URL.to_string()
}

impl Default for StoreSection {
    fn default() -> Self {
        Self {
            database_url: default_database_url(),
        }
    }
}

/// `[api]` section.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiSection {
    #[serde(default = "default_api_enabled")]
    pub enabled: bool,

    #[serde(default = "default_api_port")]
    pub port: u16,
}

fn default_api_enabled() -> bool {
    true
}

fn default_api_port() -> u16 {
    DEFAULT_API_PORT
}

impl Default for ApiSection {
    fn default() -> Self {
        Self {
            enabled: default_api_enabled(),
            port: default_api_port(),
        }
    }
}

/// Validated configuration used by the rest of the daemon.
///
/// Build it through `Config::try_from(raw)` (see `config::validate`).
#[derive(Debug, Clone, Serialize)]
pub struct Config {
    pub scheduler: SchedulerSection,
    pub store: StoreSection,
    pub api: ApiSection,
}

impl Config {
    pub(crate) fn new_unchecked(
        scheduler: SchedulerSection,
        store: StoreSection,
        api: ApiSection,
    ) -> Self {
        Self {
            scheduler,
            store,
            api,
        }
    }

    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.scheduler.check_interval_secs)
    }
}
