// src/types.rs

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::JobschedError;

/// Store-assigned job identifier.
pub type JobId = i64;

/// Lifecycle status of a job.
///
/// Transitions only move forward: `Queued -> Running -> {Completed, Failed}`.
/// There is no path back to `Queued`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Running,
    Completed,
    Failed,
}

impl JobStatus {
    pub const ALL: [JobStatus; 4] = [
        JobStatus::Queued,
        JobStatus::Running,
        JobStatus::Completed,
        JobStatus::Failed,
    ];

    /// Canonical text form, as stored and serialized.
    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Running => "running",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    /// Whether moving from `self` to `next` is a legal lifecycle step.
    pub fn can_transition_to(self, next: JobStatus) -> bool {
        matches!(
            (self, next),
            (JobStatus::Queued, JobStatus::Running)
                | (JobStatus::Running, JobStatus::Completed)
                | (JobStatus::Running, JobStatus::Failed)
        )
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = JobschedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "queued" => Ok(JobStatus::Queued),
            "running" => Ok(JobStatus::Running),
            "completed" => Ok(JobStatus::Completed),
            "failed" => Ok(JobStatus::Failed),
            other => Err(JobschedError::InvalidStatus(other.to_string())),
        }
    }
}

/// A persisted unit of work: a named shell command with a lifecycle status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub name: String,
    /// Opaque shell command, handed to `sh -c` as-is.
    pub command: String,
    pub status: JobStatus,
    /// Set on every execution attempt, regardless of outcome.
    pub last_run: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a job. New jobs always start out `queued`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewJob {
    pub name: String,
    pub command: String,
}

impl NewJob {
    pub fn new(name: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            command: command.into(),
        }
    }

    /// Both fields must contain something other than whitespace.
    pub fn validate(&self) -> Result<(), JobschedError> {
        if self.name.trim().is_empty() || self.command.trim().is_empty() {
            return Err(JobschedError::InvalidJob(
                "name and command are required".to_string(),
            ));
        }
        Ok(())
    }
}

/// Aggregate job counts per status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobStats {
    pub total: i64,
    pub queued: i64,
    pub running: i64,
    pub completed: i64,
    pub failed: i64,
}

impl JobStats {
    pub fn record(&mut self, status: JobStatus) {
        self.total += 1;
        match status {
            JobStatus::Queued => self.queued += 1,
            JobStatus::Running => self.running += 1,
            JobStatus::Completed => self.completed += 1,
            JobStatus::Failed => self.failed += 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_text() {
        for status in JobStatus::ALL {
            assert_eq!(status.as_str().parse::<JobStatus>().unwrap(), status);
        }
        assert_eq!(" Running ".parse::<JobStatus>().unwrap(), JobStatus::Running);
    }

    #[test]
    fn unknown_status_is_rejected() {
        match "paused".parse::<JobStatus>() {
            Err(JobschedError::InvalidStatus(s)) => assert_eq!(s, "paused"),
            other => panic!("expected InvalidStatus, got {other:?}"),
        }
    }

    #[test]
    fn lifecycle_only_moves_forward() {
        use JobStatus::*;
        assert!(Queued.can_transition_to(Running));
        assert!(Running.can_transition_to(Completed));
        assert!(Running.can_transition_to(Failed));

        assert!(!Running.can_transition_to(Queued));
        assert!(!Queued.can_transition_to(Completed));
        for next in JobStatus::ALL {
            assert!(!Completed.can_transition_to(next));
            assert!(!Failed.can_transition_to(next));
        }
    }

    #[test]
    fn new_job_requires_name_and_command() {
        assert!(NewJob::new("a", "echo a").validate().is_ok());
        assert!(NewJob::new("", "echo a").validate().is_err());
        assert!(NewJob::new("a", "   ").validate().is_err());
    }

    #[test]
    fn stats_record_counts_each_status() {
        let mut stats = JobStats::default();
        stats.record(JobStatus::Queued);
        stats.record(JobStatus::Queued);
        stats.record(JobStatus::Failed);
        assert_eq!(stats.total, 3);
        assert_eq!(stats.queued, 2);
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.running, 0);
    }
}
