//! Engine error taxonomy.

use thiserror::Error;

use crate::history::HistoryError;
use crate::process::ProcessError;
use crate::stage::StageError;

/// Everything a transition or gate operation can fail with.
///
/// State errors (`ProcessFinalized`, `InvalidState`) mean the action is
/// illegal for the current lifecycle state. Validation errors
/// (`InvalidTarget`, `FeedbackRequired`, `InsufficientStages`,
/// `NoNextStage`, `NoStagesConfigured`) mean the request violates a
/// structural invariant. `ConcurrentModification` is transient: the
/// caller may re-read and retry; the engine itself never does.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Process not found: {0}")]
    ProcessNotFound(String),

    #[error("Application not found: {0}")]
    ApplicationNotFound(String),

    #[error("Process {process_id} is finalized; no further transitions are permitted")]
    ProcessFinalized { process_id: String },

    #[error("Application {application_id} is {status}, expected pending")]
    InvalidState {
        application_id: String,
        status: String,
    },

    #[error("Stage {target_stage_id} is not a valid target: {reason}")]
    InvalidTarget {
        target_stage_id: String,
        reason: String,
    },

    #[error("Feedback is required for this action")]
    FeedbackRequired,

    #[error("Job {job_id} has {count} stages; jumping requires at least 3")]
    InsufficientStages { job_id: String, count: usize },

    #[error("Process {process_id} is already at the last stage")]
    NoNextStage { process_id: String },

    #[error("Job {job_id} has no stages configured")]
    NoStagesConfigured { job_id: String },

    #[error("Process {process_id} was modified concurrently; re-read and retry")]
    ConcurrentModification { process_id: String },

    #[error("Storage error: {0}")]
    Storage(String),
}

impl EngineError {
    /// Stable machine-readable tag, used in API error bodies and metrics.
    pub fn code(&self) -> &'static str {
        match self {
            EngineError::ProcessNotFound(_) => "process_not_found",
            EngineError::ApplicationNotFound(_) => "application_not_found",
            EngineError::ProcessFinalized { .. } => "process_finalized",
            EngineError::InvalidState { .. } => "invalid_state",
            EngineError::InvalidTarget { .. } => "invalid_target",
            EngineError::FeedbackRequired => "feedback_required",
            EngineError::InsufficientStages { .. } => "insufficient_stages",
            EngineError::NoNextStage { .. } => "no_next_stage",
            EngineError::NoStagesConfigured { .. } => "no_stages_configured",
            EngineError::ConcurrentModification { .. } => "concurrent_modification",
            EngineError::Storage(_) => "storage",
        }
    }
}

impl From<ProcessError> for EngineError {
    fn from(err: ProcessError) -> Self {
        match err {
            ProcessError::NotFound(id) => EngineError::ProcessNotFound(id),
            ProcessError::ApplicationNotFound(id) => EngineError::ApplicationNotFound(id),
            ProcessError::InvalidState {
                application_id,
                status,
            } => EngineError::InvalidState {
                application_id,
                status,
            },
            ProcessError::AlreadyFinalized(process_id) => {
                EngineError::ProcessFinalized { process_id }
            }
            ProcessError::StaleVersion(process_id) => {
                EngineError::ConcurrentModification { process_id }
            }
            ProcessError::Database(msg) => EngineError::Storage(msg),
        }
    }
}

impl From<StageError> for EngineError {
    fn from(err: StageError) -> Self {
        match err {
            StageError::NotFound { job_id } => EngineError::NoStagesConfigured { job_id },
            // The remaining variants concern the administrative surface;
            // reaching them from a transition is a storage-level anomaly.
            other => EngineError::Storage(other.to_string()),
        }
    }
}

impl From<HistoryError> for EngineError {
    fn from(err: HistoryError) -> Self {
        match err {
            HistoryError::Database(msg) => EngineError::Storage(msg),
        }
    }
}
