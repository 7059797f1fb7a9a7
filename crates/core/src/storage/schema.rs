//! Database schema.
//!
//! The whole schema lives in one place because the tables are not
//! independent: the stage registry checks the processes table before
//! allowing structural edits, and a transition writes the processes and
//! history tables in the same transaction.

use rusqlite::Connection;

pub(crate) fn init(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS stages (
            id TEXT PRIMARY KEY,
            job_id TEXT NOT NULL,
            name TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            position INTEGER NOT NULL,
            status TEXT NOT NULL,
            UNIQUE (job_id, position)
        );

        CREATE INDEX IF NOT EXISTS idx_stages_job_id ON stages(job_id);

        CREATE TABLE IF NOT EXISTS applications (
            id TEXT PRIMARY KEY,
            job_id TEXT NOT NULL,
            candidate_id TEXT NOT NULL,
            status TEXT NOT NULL,
            submitted_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_applications_job_id ON applications(job_id);

        CREATE TABLE IF NOT EXISTS processes (
            id TEXT PRIMARY KEY,
            application_id TEXT NOT NULL UNIQUE,
            job_id TEXT NOT NULL,
            current_stage_id TEXT NOT NULL,
            started_at TEXT NOT NULL,
            finished_at TEXT,
            outcome TEXT,
            version INTEGER NOT NULL DEFAULT 1,
            updated_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_processes_job_id ON processes(job_id);

        CREATE TABLE IF NOT EXISTS history_entries (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            process_id TEXT NOT NULL,
            from_stage_id TEXT,
            to_stage_id TEXT NOT NULL,
            action TEXT NOT NULL,
            feedback TEXT,
            occurred_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_history_entries_process_id
            ON history_entries(process_id);
        "#,
    )
}
