//! History ledger trait.

use thiserror::Error;

use super::{HistoryEntry, NewHistoryEntry};

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("Database error: {0}")]
    Database(String),
}

/// Durable, append-only record of process transitions.
///
/// Entries are immutable once appended and are never deleted. The engine
/// appends through the process store's transactions so a ledger write
/// always commits together with the process mutation it records; the
/// standalone `append` exists for the trait's own tests and tooling.
pub trait HistoryLedger: Send + Sync {
    /// Append an entry. The only write operation.
    fn append(&self, entry: NewHistoryEntry) -> Result<HistoryEntry, HistoryError>;

    /// All entries of a process, oldest first.
    fn list_for(&self, process_id: &str) -> Result<Vec<HistoryEntry>, HistoryError>;
}
