// src/store/sqlite.rs

//! Durable job store on SQLite via `sqlx`.
//!
//! Timestamps are stored as fixed-width RFC 3339 text (microseconds, `Z`
//! suffix) so that ordering by the text column matches ordering by time.

use std::str::FromStr;
use std::time::Duration;

use anyhow::anyhow;
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use tracing::{debug, info};

use super::{JobStore, MAX_CONCURRENT_JOBS_KEY};
use crate::errors::{JobschedError, Result};
use crate::types::{Job, JobId, JobStats, JobStatus, NewJob};

const JOB_COLUMNS: &str = "id, name, command, status, last_run, created_at, updated_at";

/// Raw `jobs` row as it sits in SQLite.
#[derive(Debug, sqlx::FromRow)]
struct JobRow {
    id: i64,
    name: String,
    command: String,
    status: String,
    last_run: Option<String>,
    created_at: String,
    updated_at: String,
}

impl TryFrom<JobRow> for Job {
    type Error = JobschedError;

    fn try_from(row: JobRow) -> std::result::Result<Self, Self::Error> {
        Ok(Job {
            id: row.id,
            name: row.name,
            command: row.command,
            status: row.status.parse()?,
            last_run: row.last_run.as_deref().map(decode_ts).transpose()?,
            created_at: decode_ts(&row.created_at)?,
            updated_at: decode_ts(&row.updated_at)?,
        })
    }
}

fn encode_ts(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn decode_ts(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| JobschedError::Other(anyhow!("bad timestamp {raw:?} in store: {e}")))
}

fn rows_to_jobs(rows: Vec<JobRow>) -> Result<Vec<Job>> {
    rows.into_iter().map(Job::try_from).collect()
}

/// SQLite-backed [`JobStore`].
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (creating if needed) the database at `url` and make sure the
    /// schema exists.
    ///
    /// `initial_max_concurrent_jobs` is written only when no ceiling has been
    /// stored yet; an existing value always wins.
    pub async fn connect(url: &str, initial_max_concurrent_jobs: i64) -> Result<Self> {
        let in_memory = url.contains(":memory:");

        let mut options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .busy_timeout(Duration::from_secs(5));
        if !in_memory {
            options = options.journal_mode(SqliteJournalMode::Wal);
        }

        // An in-memory database lives and dies with its connection, so keep
        // exactly one and never recycle it.
        let pool_options = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(8)
        };

        let pool = pool_options.connect_with(options).await?;
        let store = Self { pool };
        store.bootstrap(initial_max_concurrent_jobs).await?;

        info!(url, "connected to job store");
        Ok(store)
    }

    async fn bootstrap(&self, initial_max_concurrent_jobs: i64) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS jobs (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                name        TEXT NOT NULL,
                command     TEXT NOT NULL,
                status      TEXT NOT NULL DEFAULT 'queued'
                            CHECK (status IN ('queued', 'running', 'completed', 'failed')),
                last_run    TEXT,
                created_at  TEXT NOT NULL,
                updated_at  TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_jobs_status_created ON jobs (status, created_at)",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS scheduler_config (
                key         TEXT PRIMARY KEY,
                value       TEXT NOT NULL,
                updated_at  TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        let seeded = sqlx::query(
            "INSERT OR IGNORE INTO scheduler_config (key, value, updated_at) VALUES (?, ?, ?)",
        )
        .bind(MAX_CONCURRENT_JOBS_KEY)
        .bind(initial_max_concurrent_jobs.to_string())
        .bind(encode_ts(Utc::now()))
        .execute(&self.pool)
        .await?
        .rows_affected();

        debug!(
            seeded = seeded > 0,
            initial_max_concurrent_jobs, "job store schema ready"
        );
        Ok(())
    }

    /// Close the pool, waiting for in-use connections to be returned.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl JobStore for SqliteStore {
    async fn get_max_concurrent_jobs(&self) -> Result<i64> {
        let raw: Option<String> =
            sqlx::query_scalar("SELECT value FROM scheduler_config WHERE key = ?")
                .bind(MAX_CONCURRENT_JOBS_KEY)
                .fetch_optional(&self.pool)
                .await?;

        let raw = raw.ok_or_else(|| {
            JobschedError::InvalidConfigValue(format!("{MAX_CONCURRENT_JOBS_KEY} is not set"))
        })?;

        raw.trim().parse::<i64>().map_err(|e| {
            JobschedError::InvalidConfigValue(format!("{MAX_CONCURRENT_JOBS_KEY} = {raw:?}: {e}"))
        })
    }

    async fn get_running_job_count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM jobs WHERE status = ?")
            .bind(JobStatus::Running.as_str())
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn get_queued_jobs(&self) -> Result<Vec<Job>> {
        let rows = sqlx::query_as::<_, JobRow>(&format!(
            "SELECT {JOB_COLUMNS} FROM jobs WHERE status = ? ORDER BY created_at ASC, id ASC"
        ))
        .bind(JobStatus::Queued.as_str())
        .fetch_all(&self.pool)
        .await?;
        rows_to_jobs(rows)
    }

    async fn update_job_status(&self, id: JobId, status: JobStatus) -> Result<()> {
        let affected = sqlx::query("UPDATE jobs SET status = ?, updated_at = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(encode_ts(Utc::now()))
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        if affected == 0 {
            return Err(JobschedError::JobNotFound(id));
        }
        Ok(())
    }

    async fn update_job_last_run(&self, id: JobId) -> Result<()> {
        let now = encode_ts(Utc::now());
        let affected = sqlx::query("UPDATE jobs SET last_run = ?, updated_at = ? WHERE id = ?")
            .bind(&now)
            .bind(&now)
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        if affected == 0 {
            return Err(JobschedError::JobNotFound(id));
        }
        Ok(())
    }

    async fn create_job(&self, job: NewJob) -> Result<Job> {
        job.validate()?;

        let now = Utc::now();
        let stamp = encode_ts(now);
        let id = sqlx::query(
            "INSERT INTO jobs (name, command, status, created_at, updated_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&job.name)
        .bind(&job.command)
        .bind(JobStatus::Queued.as_str())
        .bind(&stamp)
        .bind(&stamp)
        .execute(&self.pool)
        .await?
        .last_insert_rowid();

        info!(job_id = id, job = %job.name, "created new job");

        // Round-trip through the stored text so the returned value matches
        // what later reads will produce.
        let stored = decode_ts(&stamp)?;
        Ok(Job {
            id,
            name: job.name,
            command: job.command,
            status: JobStatus::Queued,
            last_run: None,
            created_at: stored,
            updated_at: stored,
        })
    }

    async fn list_jobs(&self) -> Result<Vec<Job>> {
        let rows = sqlx::query_as::<_, JobRow>(&format!(
            "SELECT {JOB_COLUMNS} FROM jobs ORDER BY created_at DESC, id DESC"
        ))
        .fetch_all(&self.pool)
        .await?;
        rows_to_jobs(rows)
    }

    async fn get_job(&self, id: JobId) -> Result<Job> {
        let row = sqlx::query_as::<_, JobRow>(&format!(
            "SELECT {JOB_COLUMNS} FROM jobs WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(JobschedError::JobNotFound(id))?;
        Job::try_from(row)
    }

    async fn set_max_concurrent_jobs(&self, value: i64) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO scheduler_config (key, value, updated_at) VALUES (?, ?, ?)
            ON CONFLICT (key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            "#,
        )
        .bind(MAX_CONCURRENT_JOBS_KEY)
        .bind(value.to_string())
        .bind(encode_ts(Utc::now()))
        .execute(&self.pool)
        .await?;

        info!(max_concurrent_jobs = value, "updated concurrency ceiling");
        Ok(())
    }

    async fn job_stats(&self) -> Result<JobStats> {
        let rows: Vec<(String, i64)> =
            sqlx::query_as("SELECT status, COUNT(*) FROM jobs GROUP BY status")
                .fetch_all(&self.pool)
                .await?;

        let mut stats = JobStats::default();
        for (status, count) in rows {
            let status: JobStatus = status.parse()?;
            stats.total += count;
            match status {
                JobStatus::Queued => stats.queued = count,
                JobStatus::Running => stats.running = count,
                JobStatus::Completed => stats.completed = count,
                JobStatus::Failed => stats.failed = count,
            }
        }
        Ok(stats)
    }
}
