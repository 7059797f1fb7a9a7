//! SQLite-backed stage registry implementation.

use rusqlite::{params, Connection, OptionalExtension};

use crate::storage::{unknown_tag, Db};

use super::{NewStage, PipelineStage, StageError, StageRegistry, StageStatus};

/// SQLite-backed stage registry.
pub struct SqliteStageRegistry {
    db: Db,
}

impl SqliteStageRegistry {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    fn row_to_stage(row: &rusqlite::Row) -> rusqlite::Result<PipelineStage> {
        let status_str: String = row.get(5)?;
        let status =
            StageStatus::parse(&status_str).ok_or_else(|| unknown_tag(5, "stage status", &status_str))?;

        Ok(PipelineStage {
            id: row.get(0)?,
            job_id: row.get(1)?,
            name: row.get(2)?,
            description: row.get(3)?,
            order: row.get(4)?,
            status,
        })
    }

    fn job_is_locked(conn: &Connection, job_id: &str) -> Result<bool, StageError> {
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM processes WHERE job_id = ?",
                params![job_id],
                |row| row.get(0),
            )
            .map_err(|e| StageError::Database(e.to_string()))?;
        Ok(count > 0)
    }

    fn list_locked(conn: &Connection, job_id: &str) -> Result<Vec<PipelineStage>, StageError> {
        let mut stmt = conn
            .prepare(
                "SELECT id, job_id, name, description, position, status FROM stages WHERE job_id = ? ORDER BY position ASC",
            )
            .map_err(|e| StageError::Database(e.to_string()))?;

        let rows = stmt
            .query_map(params![job_id], Self::row_to_stage)
            .map_err(|e| StageError::Database(e.to_string()))?;

        let mut stages = Vec::new();
        for row_result in rows {
            stages.push(row_result.map_err(|e| StageError::Database(e.to_string()))?);
        }

        Ok(stages)
    }
}

impl StageRegistry for SqliteStageRegistry {
    fn define_stages(
        &self,
        job_id: &str,
        stages: Vec<NewStage>,
    ) -> Result<Vec<PipelineStage>, StageError> {
        if stages.is_empty() {
            return Err(StageError::EmptyPipeline {
                job_id: job_id.to_string(),
            });
        }

        let mut conn = self.db.conn();

        if Self::job_is_locked(&conn, job_id)? {
            return Err(StageError::StageLocked {
                job_id: job_id.to_string(),
            });
        }

        let tx = conn
            .transaction()
            .map_err(|e| StageError::Database(e.to_string()))?;

        tx.execute("DELETE FROM stages WHERE job_id = ?", params![job_id])
            .map_err(|e| StageError::Database(e.to_string()))?;

        for (idx, stage) in stages.iter().enumerate() {
            let id = uuid::Uuid::new_v4().to_string();
            tx.execute(
                "INSERT INTO stages (id, job_id, name, description, position, status) VALUES (?, ?, ?, ?, ?, ?)",
                params![
                    id,
                    job_id,
                    stage.name,
                    stage.description,
                    (idx + 1) as u32,
                    StageStatus::Active.as_str(),
                ],
            )
            .map_err(|e| StageError::Database(e.to_string()))?;
        }

        let created = Self::list_locked(&tx, job_id)?;

        tx.commit().map_err(|e| StageError::Database(e.to_string()))?;

        Ok(created)
    }

    fn list_stages(&self, job_id: &str) -> Result<Vec<PipelineStage>, StageError> {
        let conn = self.db.conn();
        let stages = Self::list_locked(&conn, job_id)?;

        if stages.is_empty() {
            return Err(StageError::NotFound {
                job_id: job_id.to_string(),
            });
        }

        Ok(stages)
    }

    fn stage_at(&self, job_id: &str, order: u32) -> Result<PipelineStage, StageError> {
        let conn = self.db.conn();

        conn.query_row(
            "SELECT id, job_id, name, description, position, status FROM stages WHERE job_id = ? AND position = ?",
            params![job_id, order],
            Self::row_to_stage,
        )
        .optional()
        .map_err(|e| StageError::Database(e.to_string()))?
        .ok_or_else(|| StageError::StageNotFound {
            job_id: job_id.to_string(),
            order,
        })
    }

    fn get(&self, stage_id: &str) -> Result<Option<PipelineStage>, StageError> {
        let conn = self.db.conn();

        conn.query_row(
            "SELECT id, job_id, name, description, position, status FROM stages WHERE id = ?",
            params![stage_id],
            Self::row_to_stage,
        )
        .optional()
        .map_err(|e| StageError::Database(e.to_string()))
    }

    fn reorder(&self, job_id: &str, ordering: &[String]) -> Result<Vec<PipelineStage>, StageError> {
        let mut conn = self.db.conn();

        if Self::job_is_locked(&conn, job_id)? {
            return Err(StageError::StageLocked {
                job_id: job_id.to_string(),
            });
        }

        let existing = Self::list_locked(&conn, job_id)?;
        if existing.is_empty() {
            return Err(StageError::NotFound {
                job_id: job_id.to_string(),
            });
        }

        if ordering.len() != existing.len() {
            return Err(StageError::InvalidOrdering(format!(
                "expected {} stage ids, got {}",
                existing.len(),
                ordering.len()
            )));
        }

        let mut expected: Vec<&str> = existing.iter().map(|s| s.id.as_str()).collect();
        let mut given: Vec<&str> = ordering.iter().map(String::as_str).collect();
        expected.sort_unstable();
        given.sort_unstable();
        if expected != given {
            return Err(StageError::InvalidOrdering(
                "stage ids do not match the job's stages".to_string(),
            ));
        }

        let tx = conn
            .transaction()
            .map_err(|e| StageError::Database(e.to_string()))?;

        // Two-pass position assignment: park at negative positions first so
        // the UNIQUE(job_id, position) constraint never trips mid-update.
        for (idx, stage_id) in ordering.iter().enumerate() {
            tx.execute(
                "UPDATE stages SET position = ? WHERE id = ? AND job_id = ?",
                params![-((idx + 1) as i64), stage_id, job_id],
            )
            .map_err(|e| StageError::Database(e.to_string()))?;
        }
        tx.execute(
            "UPDATE stages SET position = -position WHERE job_id = ? AND position < 0",
            params![job_id],
        )
        .map_err(|e| StageError::Database(e.to_string()))?;

        let reordered = Self::list_locked(&tx, job_id)?;

        tx.commit().map_err(|e| StageError::Database(e.to_string()))?;

        Ok(reordered)
    }
}
