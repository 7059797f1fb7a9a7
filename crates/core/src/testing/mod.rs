//! Test scaffolding shared by integration tests and the server's test
//! fixture.

use std::path::Path;
use std::sync::Arc;

use crate::engine::{ApplicationGate, TransitionEngine};
use crate::history::SqliteHistoryLedger;
use crate::process::{Application, CreateApplicationRequest, ProcessStore, SqliteProcessStore};
use crate::stage::{NewStage, PipelineStage, SqliteStageRegistry, StageRegistry};
use crate::storage::{Db, StorageError};

/// A fully wired engine over a single database.
pub struct PipelineHarness {
    db: Db,
    pub stages: Arc<SqliteStageRegistry>,
    pub processes: Arc<SqliteProcessStore>,
    pub ledger: Arc<SqliteHistoryLedger>,
    pub engine: TransitionEngine,
    pub gate: ApplicationGate,
}

impl PipelineHarness {
    /// Wire every component over an in-memory database.
    pub fn in_memory() -> Result<Self, StorageError> {
        Ok(Self::from_db(Db::in_memory()?))
    }

    /// Wire every component over a file-backed database.
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        Ok(Self::from_db(Db::open(path)?))
    }

    fn from_db(db: Db) -> Self {
        let stages = Arc::new(SqliteStageRegistry::new(db.clone()));
        let processes = Arc::new(SqliteProcessStore::new(db.clone()));
        let ledger = Arc::new(SqliteHistoryLedger::new(db.clone()));
        let engine = TransitionEngine::new(stages.clone(), processes.clone(), ledger.clone());
        let gate = ApplicationGate::new(stages.clone(), processes.clone());
        Self {
            db,
            stages,
            processes,
            ledger,
            engine,
            gate,
        }
    }

    /// Run raw SQL against the underlying database, for fault injection.
    pub fn execute_batch(&self, sql: &str) {
        self.db.conn().execute_batch(sql).expect("raw SQL failed");
    }

    /// Define a pipeline of named stages for a job.
    pub fn seed_job(&self, job_id: &str, stage_names: &[&str]) -> Vec<PipelineStage> {
        self.stages
            .define_stages(
                job_id,
                stage_names
                    .iter()
                    .map(|name| NewStage::new(*name, ""))
                    .collect(),
            )
            .expect("seeding stages should succeed")
    }

    /// Register a pending candidature for a job.
    pub fn pending_application(&self, job_id: &str, candidate_id: &str) -> Application {
        self.processes
            .create_application(CreateApplicationRequest {
                job_id: job_id.to_string(),
                candidate_id: candidate_id.to_string(),
            })
            .expect("creating application should succeed")
    }
}
