//! Process storage trait and types.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use thiserror::Error;

use crate::history::{HistoryEntry, NewHistoryEntry};

use super::{Application, ProcessOutcome, SelectionProcess};

/// Error type for process storage operations.
#[derive(Debug, Error)]
pub enum ProcessError {
    /// Process not found.
    #[error("Process not found: {0}")]
    NotFound(String),

    /// Application not found.
    #[error("Application not found: {0}")]
    ApplicationNotFound(String),

    /// The application is not in the status the operation requires.
    #[error("Application {application_id} is {status}, expected pending")]
    InvalidState {
        application_id: String,
        status: String,
    },

    /// The process is terminal; its row no longer accepts updates.
    #[error("Process {0} is finalized")]
    AlreadyFinalized(String),

    /// The version check failed: another transition committed first.
    #[error("Process {0} was modified concurrently")]
    StaleVersion(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

/// Request to register a pending candidature.
#[derive(Debug, Clone)]
pub struct CreateApplicationRequest {
    pub job_id: String,
    pub candidate_id: String,
}

/// Lifecycle slice to filter process listings by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessStateFilter {
    Active,
    Accepted,
    Rejected,
    Withdrawn,
}

/// Filter for querying processes.
#[derive(Debug, Clone, Default)]
pub struct ProcessFilter {
    /// Filter by job posting.
    pub job_id: Option<String>,
    /// Filter by lifecycle slice.
    pub state: Option<ProcessStateFilter>,
    /// Maximum number of results.
    pub limit: i64,
    /// Offset for pagination.
    pub offset: i64,
}

impl ProcessFilter {
    /// Create a new filter with defaults.
    pub fn new() -> Self {
        Self {
            job_id: None,
            state: None,
            limit: 100,
            offset: 0,
        }
    }

    /// Filter by job posting.
    pub fn with_job_id(mut self, job_id: impl Into<String>) -> Self {
        self.job_id = Some(job_id.into());
        self
    }

    /// Filter by lifecycle slice.
    pub fn with_state(mut self, state: ProcessStateFilter) -> Self {
        self.state = Some(state);
        self
    }

    /// Set limit.
    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = limit;
        self
    }

    /// Set offset.
    pub fn with_offset(mut self, offset: i64) -> Self {
        self.offset = offset;
        self
    }
}

/// The mutation half of a validated transition.
#[derive(Debug, Clone)]
pub enum ProcessChange {
    /// Move to another stage of the same job.
    Move { to_stage_id: String },
    /// Terminate at the current stage.
    Finish {
        outcome: ProcessOutcome,
        finished_at: DateTime<Utc>,
    },
}

/// Trait for process storage backends.
///
/// The two compound operations are transactional: the process row, the
/// application status, and the history entry commit together or not at
/// all.
pub trait ProcessStore: Send + Sync {
    /// Register a pending candidature.
    fn create_application(
        &self,
        request: CreateApplicationRequest,
    ) -> Result<Application, ProcessError>;

    /// Get an application by ID.
    fn get_application(&self, id: &str) -> Result<Option<Application>, ProcessError>;

    /// Reject a pending candidature at the gate. Compare-and-set from
    /// `Pending`; any other status fails with `InvalidState`.
    fn reject_application(&self, id: &str) -> Result<Application, ProcessError>;

    /// Get a process by ID.
    fn get(&self, id: &str) -> Result<Option<SelectionProcess>, ProcessError>;

    /// Get the process bound to an application, if any.
    fn get_by_application(
        &self,
        application_id: &str,
    ) -> Result<Option<SelectionProcess>, ProcessError>;

    /// List processes matching the filter, oldest first.
    fn list(&self, filter: &ProcessFilter) -> Result<Vec<SelectionProcess>, ProcessError>;

    /// Count processes matching the filter.
    fn count(&self, filter: &ProcessFilter) -> Result<i64, ProcessError>;

    /// Accept a pending application into a new process at the given
    /// stage, writing the bootstrap history entry in the same
    /// transaction.
    fn insert_with_bootstrap(
        &self,
        application_id: &str,
        job_id: &str,
        first_stage_id: &str,
    ) -> Result<(SelectionProcess, HistoryEntry), ProcessError>;

    /// Apply a validated transition: version-checked process update plus
    /// history append in one transaction. `Finish` changes also
    /// synchronize the application status.
    fn apply_transition(
        &self,
        process_id: &str,
        expected_version: i64,
        change: ProcessChange,
        entry: NewHistoryEntry,
    ) -> Result<(SelectionProcess, HistoryEntry), ProcessError>;
}
