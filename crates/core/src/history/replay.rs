//! History replay.
//!
//! Folding a process's ledger entries in order from a null stage must
//! reconstruct the process's `current_stage_id` and `outcome`. Tests use
//! this as a consistency check; nothing at runtime depends on it.

use crate::process::ProcessOutcome;

use super::{HistoryEntry, TransitionAction};

/// The state reached by replaying a sequence of history entries.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReplayedState {
    pub current_stage_id: Option<String>,
    pub outcome: Option<ProcessOutcome>,
}

/// Fold entries (oldest first) over an initial null stage.
pub fn replay(entries: &[HistoryEntry]) -> ReplayedState {
    let mut state = ReplayedState::default();

    for entry in entries {
        state.current_stage_id = Some(entry.to_stage_id.clone());
        match entry.action {
            TransitionAction::Finalize => state.outcome = Some(ProcessOutcome::Accepted),
            TransitionAction::Reject => state.outcome = Some(ProcessOutcome::Rejected),
            TransitionAction::Withdraw => state.outcome = Some(ProcessOutcome::Withdrawn),
            TransitionAction::Bootstrap
            | TransitionAction::Advance
            | TransitionAction::Jump
            | TransitionAction::Revert => {}
        }
    }

    state
}
