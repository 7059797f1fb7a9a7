//! Selection process data types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Terminal outcome of a selection process.
///
/// `Withdrawn` is candidate-initiated and deliberately distinct from
/// `Rejected` so a withdrawal is never mistaken for a recruiter decision.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ProcessOutcome {
    Accepted,
    Rejected,
    Withdrawn,
}

impl ProcessOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessOutcome::Accepted => "accepted",
            ProcessOutcome::Rejected => "rejected",
            ProcessOutcome::Withdrawn => "withdrawn",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "accepted" => Some(ProcessOutcome::Accepted),
            "rejected" => Some(ProcessOutcome::Rejected),
            "withdrawn" => Some(ProcessOutcome::Withdrawn),
            _ => None,
        }
    }
}

/// Lifecycle status of a candidature, kept in sync with its process.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    /// Submitted, waiting for the gate decision.
    Pending,
    /// Accepted into an active selection process.
    InProcess,
    /// Process finalized with acceptance.
    Accepted,
    /// Rejected at the gate or during the process.
    Rejected,
    /// Candidate withdrew.
    Withdrawn,
}

impl ApplicationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::InProcess => "in_process",
            ApplicationStatus::Accepted => "accepted",
            ApplicationStatus::Rejected => "rejected",
            ApplicationStatus::Withdrawn => "withdrawn",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(ApplicationStatus::Pending),
            "in_process" => Some(ApplicationStatus::InProcess),
            "accepted" => Some(ApplicationStatus::Accepted),
            "rejected" => Some(ApplicationStatus::Rejected),
            "withdrawn" => Some(ApplicationStatus::Withdrawn),
            _ => None,
        }
    }
}

impl From<ProcessOutcome> for ApplicationStatus {
    fn from(outcome: ProcessOutcome) -> Self {
        match outcome {
            ProcessOutcome::Accepted => ApplicationStatus::Accepted,
            ProcessOutcome::Rejected => ApplicationStatus::Rejected,
            ProcessOutcome::Withdrawn => ApplicationStatus::Withdrawn,
        }
    }
}

/// The engine's projection of a candidature record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Application {
    /// Unique identifier (UUID).
    pub id: String,
    /// Job posting applied to.
    pub job_id: String,
    /// Candidate who applied.
    pub candidate_id: String,
    /// Lifecycle status.
    pub status: ApplicationStatus,
    /// When the candidature was submitted.
    pub submitted_at: DateTime<Utc>,
    /// Last status change.
    pub updated_at: DateTime<Utc>,
}

/// The record binding one candidature to its current pipeline stage.
///
/// `finished_at` being set means the process is terminal and no further
/// transitions are permitted; `outcome` is set exactly then.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SelectionProcess {
    /// Unique identifier (UUID).
    pub id: String,
    /// The candidature this process tracks (1:1).
    pub application_id: String,
    /// Job posting whose stages the process moves through.
    pub job_id: String,
    /// Stage the process currently sits at. For terminal processes, the
    /// stage at which the decision happened.
    pub current_stage_id: String,
    /// When the process was bootstrapped.
    pub started_at: DateTime<Utc>,
    /// Set exactly when the process becomes terminal.
    pub finished_at: Option<DateTime<Utc>>,
    /// Terminal outcome; set if and only if `finished_at` is set.
    pub outcome: Option<ProcessOutcome>,
    /// Optimistic-concurrency counter, bumped on every committed
    /// transition.
    pub version: i64,
    /// Last transition timestamp.
    pub updated_at: DateTime<Utc>,
}

impl SelectionProcess {
    /// Returns true if the process is terminal.
    pub fn is_terminal(&self) -> bool {
        self.finished_at.is_some()
    }

    /// Returns true if the process still accepts transitions.
    pub fn is_active(&self) -> bool {
        self.finished_at.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn active_process() -> SelectionProcess {
        SelectionProcess {
            id: "p-1".to_string(),
            application_id: "a-1".to_string(),
            job_id: "j-1".to_string(),
            current_stage_id: "s-1".to_string(),
            started_at: Utc::now(),
            finished_at: None,
            outcome: None,
            version: 1,
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_active_process_is_not_terminal() {
        let process = active_process();
        assert!(process.is_active());
        assert!(!process.is_terminal());
    }

    #[test]
    fn test_finished_process_is_terminal() {
        let mut process = active_process();
        process.finished_at = Some(Utc::now());
        process.outcome = Some(ProcessOutcome::Accepted);
        assert!(process.is_terminal());
        assert!(!process.is_active());
    }

    #[test]
    fn test_outcome_roundtrip() {
        for outcome in [
            ProcessOutcome::Accepted,
            ProcessOutcome::Rejected,
            ProcessOutcome::Withdrawn,
        ] {
            assert_eq!(ProcessOutcome::parse(outcome.as_str()), Some(outcome));
        }
        assert_eq!(ProcessOutcome::parse("hired"), None);
    }

    #[test]
    fn test_application_status_roundtrip() {
        for status in [
            ApplicationStatus::Pending,
            ApplicationStatus::InProcess,
            ApplicationStatus::Accepted,
            ApplicationStatus::Rejected,
            ApplicationStatus::Withdrawn,
        ] {
            assert_eq!(ApplicationStatus::parse(status.as_str()), Some(status));
        }
    }

    #[test]
    fn test_outcome_maps_to_application_status() {
        assert_eq!(
            ApplicationStatus::from(ProcessOutcome::Accepted),
            ApplicationStatus::Accepted
        );
        assert_eq!(
            ApplicationStatus::from(ProcessOutcome::Rejected),
            ApplicationStatus::Rejected
        );
        assert_eq!(
            ApplicationStatus::from(ProcessOutcome::Withdrawn),
            ApplicationStatus::Withdrawn
        );
    }

    #[test]
    fn test_process_serialization() {
        let process = active_process();
        let json = serde_json::to_string(&process).unwrap();
        assert!(json.contains("\"outcome\":null"));

        let deserialized: SelectionProcess = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, process);
    }
}
