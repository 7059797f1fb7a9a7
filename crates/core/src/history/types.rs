//! History entry data types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What a transition did to a selection process.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TransitionAction {
    /// Process created at the job's first stage.
    Bootstrap,
    /// Moved to the immediately following stage.
    Advance,
    /// Moved forward past at least one stage.
    Jump,
    /// Moved back to an earlier stage.
    Revert,
    /// Terminal acceptance at the current stage.
    Finalize,
    /// Terminal recruiter rejection at the current stage.
    Reject,
    /// Terminal candidate-initiated withdrawal.
    Withdraw,
}

impl TransitionAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransitionAction::Bootstrap => "bootstrap",
            TransitionAction::Advance => "advance",
            TransitionAction::Jump => "jump",
            TransitionAction::Revert => "revert",
            TransitionAction::Finalize => "finalize",
            TransitionAction::Reject => "reject",
            TransitionAction::Withdraw => "withdraw",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "bootstrap" => Some(TransitionAction::Bootstrap),
            "advance" => Some(TransitionAction::Advance),
            "jump" => Some(TransitionAction::Jump),
            "revert" => Some(TransitionAction::Revert),
            "finalize" => Some(TransitionAction::Finalize),
            "reject" => Some(TransitionAction::Reject),
            "withdraw" => Some(TransitionAction::Withdraw),
            _ => None,
        }
    }

    /// Returns true if this action ends the process.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TransitionAction::Finalize | TransitionAction::Reject | TransitionAction::Withdraw
        )
    }
}

/// One immutable entry of a process's audit trail.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HistoryEntry {
    /// Ledger-assigned id.
    pub id: i64,
    /// Process the entry belongs to.
    pub process_id: String,
    /// Stage the process left; `None` only for the bootstrap entry.
    pub from_stage_id: Option<String>,
    /// Stage the process ended the transition on. Terminal actions keep
    /// the stage the decision happened at.
    pub to_stage_id: String,
    /// What happened.
    pub action: TransitionAction,
    /// Recruiter feedback. Mandatory for revert and reject.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
    /// When the transition was committed.
    pub occurred_at: DateTime<Utc>,
}

/// A history entry about to be appended.
#[derive(Debug, Clone)]
pub struct NewHistoryEntry {
    pub process_id: String,
    pub from_stage_id: Option<String>,
    pub to_stage_id: String,
    pub action: TransitionAction,
    pub feedback: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

impl NewHistoryEntry {
    pub fn new(
        process_id: impl Into<String>,
        from_stage_id: Option<String>,
        to_stage_id: impl Into<String>,
        action: TransitionAction,
        feedback: Option<String>,
    ) -> Self {
        Self {
            process_id: process_id.into(),
            from_stage_id,
            to_stage_id: to_stage_id.into(),
            action,
            feedback,
            occurred_at: Utc::now(),
        }
    }
}
