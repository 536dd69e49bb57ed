// src/errors.rs

//! Crate-wide error aliases and helpers.

use thiserror::Error;

use crate::types::JobId;

#[derive(Error, Debug)]
pub enum JobschedError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Store error: {0}")]
    Store(#[from] sqlx::Error),

    #[error("Job not found: {0}")]
    JobNotFound(JobId),

    #[error("Invalid job status: {0}")]
    InvalidStatus(String),

    #[error("Invalid stored config value: {0}")]
    InvalidConfigValue(String),

    #[error("Invalid job: {0}")]
    InvalidJob(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, JobschedError>;
