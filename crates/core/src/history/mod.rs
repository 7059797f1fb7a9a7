//! Append-only history of selection process transitions.

mod ledger;
mod replay;
mod sqlite;
mod types;

pub use ledger::{HistoryError, HistoryLedger};
pub use replay::{replay, ReplayedState};
pub use sqlite::SqliteHistoryLedger;
pub use types::{HistoryEntry, NewHistoryEntry, TransitionAction};

pub(crate) use sqlite::insert_entry;
