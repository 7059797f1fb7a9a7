//! SQLite-backed history ledger implementation.

use rusqlite::{params, Connection};

use crate::storage::{parse_timestamp, unknown_tag, Db};

use super::{HistoryEntry, HistoryError, HistoryLedger, NewHistoryEntry, TransitionAction};

/// SQLite-backed history ledger.
pub struct SqliteHistoryLedger {
    db: Db,
}

impl SqliteHistoryLedger {
    pub fn new(db: Db) -> Self {
        Self { db }
    }
}

/// Insert a history entry on an existing connection.
///
/// Shared with the process store so an entry commits inside the same
/// transaction as the process mutation it records.
pub(crate) fn insert_entry(
    conn: &Connection,
    entry: &NewHistoryEntry,
) -> rusqlite::Result<HistoryEntry> {
    conn.execute(
        "INSERT INTO history_entries (process_id, from_stage_id, to_stage_id, action, feedback, occurred_at) VALUES (?, ?, ?, ?, ?, ?)",
        params![
            entry.process_id,
            entry.from_stage_id,
            entry.to_stage_id,
            entry.action.as_str(),
            entry.feedback,
            entry.occurred_at.to_rfc3339(),
        ],
    )?;

    Ok(HistoryEntry {
        id: conn.last_insert_rowid(),
        process_id: entry.process_id.clone(),
        from_stage_id: entry.from_stage_id.clone(),
        to_stage_id: entry.to_stage_id.clone(),
        action: entry.action,
        feedback: entry.feedback.clone(),
        occurred_at: entry.occurred_at,
    })
}

fn row_to_entry(row: &rusqlite::Row) -> rusqlite::Result<HistoryEntry> {
    let action_str: String = row.get(4)?;
    let action = TransitionAction::parse(&action_str)
        .ok_or_else(|| unknown_tag(4, "transition action", &action_str))?;

    let occurred_at_str: String = row.get(6)?;

    Ok(HistoryEntry {
        id: row.get(0)?,
        process_id: row.get(1)?,
        from_stage_id: row.get(2)?,
        to_stage_id: row.get(3)?,
        action,
        feedback: row.get(5)?,
        occurred_at: parse_timestamp(6, occurred_at_str)?,
    })
}

impl HistoryLedger for SqliteHistoryLedger {
    fn append(&self, entry: NewHistoryEntry) -> Result<HistoryEntry, HistoryError> {
        let conn = self.db.conn();
        insert_entry(&conn, &entry).map_err(|e| HistoryError::Database(e.to_string()))
    }

    fn list_for(&self, process_id: &str) -> Result<Vec<HistoryEntry>, HistoryError> {
        let conn = self.db.conn();

        let mut stmt = conn
            .prepare(
                "SELECT id, process_id, from_stage_id, to_stage_id, action, feedback, occurred_at FROM history_entries WHERE process_id = ? ORDER BY occurred_at ASC, id ASC",
            )
            .map_err(|e| HistoryError::Database(e.to_string()))?;

        let rows = stmt
            .query_map(params![process_id], row_to_entry)
            .map_err(|e| HistoryError::Database(e.to_string()))?;

        let mut entries = Vec::new();
        for row_result in rows {
            entries.push(row_result.map_err(|e| HistoryError::Database(e.to_string()))?);
        }

        Ok(entries)
    }
}
