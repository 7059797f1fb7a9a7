//! SQLite-backed process store implementation.

use chrono::Utc;
use rusqlite::{params, OptionalExtension};

use crate::history::{self, HistoryEntry, NewHistoryEntry, TransitionAction};
use crate::storage::{parse_timestamp, unknown_tag, Db};

use super::{
    Application, ApplicationStatus, CreateApplicationRequest, ProcessChange, ProcessError,
    ProcessFilter, ProcessOutcome, ProcessStateFilter, ProcessStore, SelectionProcess,
};

const PROCESS_COLUMNS: &str =
    "id, application_id, job_id, current_stage_id, started_at, finished_at, outcome, version, updated_at";

const APPLICATION_COLUMNS: &str = "id, job_id, candidate_id, status, submitted_at, updated_at";

/// SQLite-backed process store.
pub struct SqliteProcessStore {
    db: Db,
}

impl SqliteProcessStore {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    fn row_to_process(row: &rusqlite::Row) -> rusqlite::Result<SelectionProcess> {
        let started_at_str: String = row.get(4)?;
        let finished_at_str: Option<String> = row.get(5)?;
        let outcome_str: Option<String> = row.get(6)?;
        let updated_at_str: String = row.get(8)?;

        let finished_at = finished_at_str.map(|s| parse_timestamp(5, s)).transpose()?;
        let outcome = outcome_str
            .map(|s| ProcessOutcome::parse(&s).ok_or_else(|| unknown_tag(6, "process outcome", &s)))
            .transpose()?;

        Ok(SelectionProcess {
            id: row.get(0)?,
            application_id: row.get(1)?,
            job_id: row.get(2)?,
            current_stage_id: row.get(3)?,
            started_at: parse_timestamp(4, started_at_str)?,
            finished_at,
            outcome,
            version: row.get(7)?,
            updated_at: parse_timestamp(8, updated_at_str)?,
        })
    }

    fn row_to_application(row: &rusqlite::Row) -> rusqlite::Result<Application> {
        let status_str: String = row.get(3)?;
        let status = ApplicationStatus::parse(&status_str)
            .ok_or_else(|| unknown_tag(3, "application status", &status_str))?;

        let submitted_at_str: String = row.get(4)?;
        let updated_at_str: String = row.get(5)?;

        Ok(Application {
            id: row.get(0)?,
            job_id: row.get(1)?,
            candidate_id: row.get(2)?,
            status,
            submitted_at: parse_timestamp(4, submitted_at_str)?,
            updated_at: parse_timestamp(5, updated_at_str)?,
        })
    }

    fn build_where_clause(filter: &ProcessFilter) -> (String, Vec<Box<dyn rusqlite::ToSql>>) {
        let mut conditions: Vec<&'static str> = Vec::new();
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(ref job_id) = filter.job_id {
            conditions.push("job_id = ?");
            params.push(Box::new(job_id.clone()));
        }

        match filter.state {
            Some(ProcessStateFilter::Active) => conditions.push("finished_at IS NULL"),
            Some(ProcessStateFilter::Accepted) => {
                conditions.push("outcome = ?");
                params.push(Box::new(ProcessOutcome::Accepted.as_str()));
            }
            Some(ProcessStateFilter::Rejected) => {
                conditions.push("outcome = ?");
                params.push(Box::new(ProcessOutcome::Rejected.as_str()));
            }
            Some(ProcessStateFilter::Withdrawn) => {
                conditions.push("outcome = ?");
                params.push(Box::new(ProcessOutcome::Withdrawn.as_str()));
            }
            None => {}
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        (where_clause, params)
    }
}

impl ProcessStore for SqliteProcessStore {
    fn create_application(
        &self,
        request: CreateApplicationRequest,
    ) -> Result<Application, ProcessError> {
        let conn = self.db.conn();

        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now();

        conn.execute(
            "INSERT INTO applications (id, job_id, candidate_id, status, submitted_at, updated_at) VALUES (?, ?, ?, ?, ?, ?)",
            params![
                id,
                request.job_id,
                request.candidate_id,
                ApplicationStatus::Pending.as_str(),
                now.to_rfc3339(),
                now.to_rfc3339(),
            ],
        )
        .map_err(|e| ProcessError::Database(e.to_string()))?;

        Ok(Application {
            id,
            job_id: request.job_id,
            candidate_id: request.candidate_id,
            status: ApplicationStatus::Pending,
            submitted_at: now,
            updated_at: now,
        })
    }

    fn get_application(&self, id: &str) -> Result<Option<Application>, ProcessError> {
        let conn = self.db.conn();

        conn.query_row(
            &format!("SELECT {} FROM applications WHERE id = ?", APPLICATION_COLUMNS),
            params![id],
            Self::row_to_application,
        )
        .optional()
        .map_err(|e| ProcessError::Database(e.to_string()))
    }

    fn reject_application(&self, id: &str) -> Result<Application, ProcessError> {
        let conn = self.db.conn();

        let now = Utc::now();
        let affected = conn
            .execute(
                "UPDATE applications SET status = ?, updated_at = ? WHERE id = ? AND status = ?",
                params![
                    ApplicationStatus::Rejected.as_str(),
                    now.to_rfc3339(),
                    id,
                    ApplicationStatus::Pending.as_str(),
                ],
            )
            .map_err(|e| ProcessError::Database(e.to_string()))?;

        if affected == 0 {
            let status: Option<String> = conn
                .query_row(
                    "SELECT status FROM applications WHERE id = ?",
                    params![id],
                    |row| row.get(0),
                )
                .optional()
                .map_err(|e| ProcessError::Database(e.to_string()))?;

            return Err(match status {
                None => ProcessError::ApplicationNotFound(id.to_string()),
                Some(status) => ProcessError::InvalidState {
                    application_id: id.to_string(),
                    status,
                },
            });
        }

        conn.query_row(
            &format!("SELECT {} FROM applications WHERE id = ?", APPLICATION_COLUMNS),
            params![id],
            Self::row_to_application,
        )
        .map_err(|e| ProcessError::Database(e.to_string()))
    }

    fn get(&self, id: &str) -> Result<Option<SelectionProcess>, ProcessError> {
        let conn = self.db.conn();

        conn.query_row(
            &format!("SELECT {} FROM processes WHERE id = ?", PROCESS_COLUMNS),
            params![id],
            Self::row_to_process,
        )
        .optional()
        .map_err(|e| ProcessError::Database(e.to_string()))
    }

    fn get_by_application(
        &self,
        application_id: &str,
    ) -> Result<Option<SelectionProcess>, ProcessError> {
        let conn = self.db.conn();

        conn.query_row(
            &format!(
                "SELECT {} FROM processes WHERE application_id = ?",
                PROCESS_COLUMNS
            ),
            params![application_id],
            Self::row_to_process,
        )
        .optional()
        .map_err(|e| ProcessError::Database(e.to_string()))
    }

    fn list(&self, filter: &ProcessFilter) -> Result<Vec<SelectionProcess>, ProcessError> {
        let conn = self.db.conn();

        let (where_clause, params) = Self::build_where_clause(filter);

        let sql = format!(
            "SELECT {} FROM processes {} ORDER BY started_at ASC LIMIT ? OFFSET ?",
            PROCESS_COLUMNS, where_clause
        );

        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| ProcessError::Database(e.to_string()))?;

        let mut all_params: Vec<Box<dyn rusqlite::ToSql>> = params;
        all_params.push(Box::new(filter.limit));
        all_params.push(Box::new(filter.offset));

        let param_refs: Vec<&dyn rusqlite::ToSql> = all_params.iter().map(|p| p.as_ref()).collect();

        let rows = stmt
            .query_map(param_refs.as_slice(), Self::row_to_process)
            .map_err(|e| ProcessError::Database(e.to_string()))?;

        let mut processes = Vec::new();
        for row_result in rows {
            processes.push(row_result.map_err(|e| ProcessError::Database(e.to_string()))?);
        }

        Ok(processes)
    }

    fn count(&self, filter: &ProcessFilter) -> Result<i64, ProcessError> {
        let conn = self.db.conn();

        let (where_clause, params) = Self::build_where_clause(filter);

        let sql = format!("SELECT COUNT(*) FROM processes {}", where_clause);

        let param_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();

        conn.query_row(&sql, param_refs.as_slice(), |row| row.get(0))
            .map_err(|e| ProcessError::Database(e.to_string()))
    }

    fn insert_with_bootstrap(
        &self,
        application_id: &str,
        job_id: &str,
        first_stage_id: &str,
    ) -> Result<(SelectionProcess, HistoryEntry), ProcessError> {
        let mut conn = self.db.conn();

        let tx = conn
            .transaction()
            .map_err(|e| ProcessError::Database(e.to_string()))?;

        let now = Utc::now();

        // Compare-and-set the candidature out of pending; anything else
        // means the gate decision already happened.
        let affected = tx
            .execute(
                "UPDATE applications SET status = ?, updated_at = ? WHERE id = ? AND status = ?",
                params![
                    ApplicationStatus::InProcess.as_str(),
                    now.to_rfc3339(),
                    application_id,
                    ApplicationStatus::Pending.as_str(),
                ],
            )
            .map_err(|e| ProcessError::Database(e.to_string()))?;

        if affected == 0 {
            let status: Option<String> = tx
                .query_row(
                    "SELECT status FROM applications WHERE id = ?",
                    params![application_id],
                    |row| row.get(0),
                )
                .optional()
                .map_err(|e| ProcessError::Database(e.to_string()))?;

            return Err(match status {
                None => ProcessError::ApplicationNotFound(application_id.to_string()),
                Some(status) => ProcessError::InvalidState {
                    application_id: application_id.to_string(),
                    status,
                },
            });
        }

        let process_id = uuid::Uuid::new_v4().to_string();

        tx.execute(
            "INSERT INTO processes (id, application_id, job_id, current_stage_id, started_at, version, updated_at) VALUES (?, ?, ?, ?, ?, 1, ?)",
            params![
                process_id,
                application_id,
                job_id,
                first_stage_id,
                now.to_rfc3339(),
                now.to_rfc3339(),
            ],
        )
        .map_err(|e| ProcessError::Database(e.to_string()))?;

        let entry = history::insert_entry(
            &tx,
            &NewHistoryEntry::new(
                process_id.clone(),
                None,
                first_stage_id,
                TransitionAction::Bootstrap,
                None,
            ),
        )
        .map_err(|e| ProcessError::Database(e.to_string()))?;

        tx.commit().map_err(|e| ProcessError::Database(e.to_string()))?;

        Ok((
            SelectionProcess {
                id: process_id,
                application_id: application_id.to_string(),
                job_id: job_id.to_string(),
                current_stage_id: first_stage_id.to_string(),
                started_at: now,
                finished_at: None,
                outcome: None,
                version: 1,
                updated_at: now,
            },
            entry,
        ))
    }

    fn apply_transition(
        &self,
        process_id: &str,
        expected_version: i64,
        change: ProcessChange,
        entry: NewHistoryEntry,
    ) -> Result<(SelectionProcess, HistoryEntry), ProcessError> {
        let mut conn = self.db.conn();

        let tx = conn
            .transaction()
            .map_err(|e| ProcessError::Database(e.to_string()))?;

        let now = Utc::now();

        let affected = match &change {
            ProcessChange::Move { to_stage_id } => tx
                .execute(
                    "UPDATE processes SET current_stage_id = ?, version = version + 1, updated_at = ? WHERE id = ? AND version = ? AND finished_at IS NULL",
                    params![to_stage_id, now.to_rfc3339(), process_id, expected_version],
                )
                .map_err(|e| ProcessError::Database(e.to_string()))?,
            ProcessChange::Finish {
                outcome,
                finished_at,
            } => tx
                .execute(
                    "UPDATE processes SET finished_at = ?, outcome = ?, version = version + 1, updated_at = ? WHERE id = ? AND version = ? AND finished_at IS NULL",
                    params![
                        finished_at.to_rfc3339(),
                        outcome.as_str(),
                        now.to_rfc3339(),
                        process_id,
                        expected_version,
                    ],
                )
                .map_err(|e| ProcessError::Database(e.to_string()))?,
        };

        if affected == 0 {
            // Classify: missing row, terminal row, or lost race.
            let finished_at: Option<Option<String>> = tx
                .query_row(
                    "SELECT finished_at FROM processes WHERE id = ?",
                    params![process_id],
                    |row| row.get(0),
                )
                .optional()
                .map_err(|e| ProcessError::Database(e.to_string()))?;

            return Err(match finished_at {
                None => ProcessError::NotFound(process_id.to_string()),
                Some(Some(_)) => ProcessError::AlreadyFinalized(process_id.to_string()),
                Some(None) => ProcessError::StaleVersion(process_id.to_string()),
            });
        }

        let entry = history::insert_entry(&tx, &entry)
            .map_err(|e| ProcessError::Database(e.to_string()))?;

        if let ProcessChange::Finish { outcome, .. } = &change {
            tx.execute(
                "UPDATE applications SET status = ?, updated_at = ? WHERE id = (SELECT application_id FROM processes WHERE id = ?)",
                params![
                    ApplicationStatus::from(*outcome).as_str(),
                    now.to_rfc3339(),
                    process_id,
                ],
            )
            .map_err(|e| ProcessError::Database(e.to_string()))?;
        }

        let process = tx
            .query_row(
                &format!("SELECT {} FROM processes WHERE id = ?", PROCESS_COLUMNS),
                params![process_id],
                Self::row_to_process,
            )
            .map_err(|e| ProcessError::Database(e.to_string()))?;

        tx.commit().map_err(|e| ProcessError::Database(e.to_string()))?;

        Ok((process, entry))
    }
}
