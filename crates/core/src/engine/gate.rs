//! The application gate.
//!
//! Bridges a candidature in `Pending` status to a live selection process,
//! or terminates it before any stage is entered.

use std::sync::Arc;

use tracing::info;

use crate::metrics;
use crate::process::{Application, ApplicationStatus, ProcessStore, SelectionProcess};
use crate::stage::{StageError, StageRegistry};

use super::EngineError;

/// Decides whether a pending candidature enters the pipeline.
pub struct ApplicationGate {
    stages: Arc<dyn StageRegistry>,
    processes: Arc<dyn ProcessStore>,
}

impl ApplicationGate {
    pub fn new(stages: Arc<dyn StageRegistry>, processes: Arc<dyn ProcessStore>) -> Self {
        Self { stages, processes }
    }

    /// Accept a pending candidature into a selection process bound to the
    /// job's first stage, recording the bootstrap history entry.
    pub fn accept(&self, application_id: &str) -> Result<SelectionProcess, EngineError> {
        let application = self
            .processes
            .get_application(application_id)?
            .ok_or_else(|| EngineError::ApplicationNotFound(application_id.to_string()))?;

        if application.status != ApplicationStatus::Pending {
            return Err(EngineError::InvalidState {
                application_id: application.id,
                status: application.status.as_str().to_string(),
            });
        }

        let stages = match self.stages.list_stages(&application.job_id) {
            Ok(stages) => stages,
            Err(StageError::NotFound { job_id }) => {
                return Err(EngineError::NoStagesConfigured { job_id })
            }
            Err(e) => return Err(e.into()),
        };
        let first = stages.first().ok_or_else(|| EngineError::NoStagesConfigured {
            job_id: application.job_id.clone(),
        })?;

        // The store re-checks pending status under the transaction, so a
        // racing accept loses there rather than here.
        let (process, _) =
            self.processes
                .insert_with_bootstrap(&application.id, &application.job_id, &first.id)?;

        metrics::GATE_DECISIONS.with_label_values(&["accepted"]).inc();

        info!(
            application_id = %application.id,
            process_id = %process.id,
            job_id = %process.job_id,
            first_stage = %first.name,
            "Candidature accepted into selection process"
        );

        Ok(process)
    }

    /// Reject a pending candidature. No process is created and nothing is
    /// written to the ledger; there is no process to record against.
    pub fn reject(&self, application_id: &str) -> Result<Application, EngineError> {
        let application = self.processes.reject_application(application_id)?;

        metrics::GATE_DECISIONS.with_label_values(&["rejected"]).inc();

        info!(
            application_id = %application.id,
            job_id = %application.job_id,
            "Candidature rejected at the gate"
        );

        Ok(application)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::{HistoryLedger, SqliteHistoryLedger, TransitionAction};
    use crate::process::{CreateApplicationRequest, SqliteProcessStore};
    use crate::stage::{NewStage, SqliteStageRegistry};
    use crate::storage::Db;

    struct Harness {
        stages: Arc<SqliteStageRegistry>,
        processes: Arc<SqliteProcessStore>,
        ledger: SqliteHistoryLedger,
        gate: ApplicationGate,
    }

    fn harness() -> Harness {
        let db = Db::in_memory().unwrap();
        let stages = Arc::new(SqliteStageRegistry::new(db.clone()));
        let processes = Arc::new(SqliteProcessStore::new(db.clone()));
        let ledger = SqliteHistoryLedger::new(db);
        let gate = ApplicationGate::new(stages.clone(), processes.clone());
        Harness {
            stages,
            processes,
            ledger,
            gate,
        }
    }

    fn pending_application(h: &Harness, job_id: &str) -> Application {
        h.processes
            .create_application(CreateApplicationRequest {
                job_id: job_id.to_string(),
                candidate_id: "cand-1".to_string(),
            })
            .unwrap()
    }

    #[test]
    fn test_accept_creates_process_at_first_stage() {
        let h = harness();
        let stages = h
            .stages
            .define_stages(
                "job-1",
                vec![
                    NewStage::new("Screening", ""),
                    NewStage::new("Offer", ""),
                ],
            )
            .unwrap();
        let application = pending_application(&h, "job-1");

        let process = h.gate.accept(&application.id).unwrap();

        assert_eq!(process.current_stage_id, stages[0].id);
        assert_eq!(process.application_id, application.id);
        assert!(process.is_active());

        let app = h
            .processes
            .get_application(&application.id)
            .unwrap()
            .unwrap();
        assert_eq!(app.status, ApplicationStatus::InProcess);

        let trail = h.ledger.list_for(&process.id).unwrap();
        assert_eq!(trail.len(), 1);
        assert_eq!(trail[0].action, TransitionAction::Bootstrap);
        assert_eq!(trail[0].from_stage_id, None);
        assert_eq!(trail[0].to_stage_id, stages[0].id);
    }

    #[test]
    fn test_accept_without_stages_fails() {
        let h = harness();
        let application = pending_application(&h, "job-1");

        let result = h.gate.accept(&application.id);
        assert!(matches!(result, Err(EngineError::NoStagesConfigured { .. })));

        // The candidature stays pending.
        let app = h
            .processes
            .get_application(&application.id)
            .unwrap()
            .unwrap();
        assert_eq!(app.status, ApplicationStatus::Pending);
    }

    #[test]
    fn test_accept_twice_fails_loudly() {
        let h = harness();
        h.stages
            .define_stages("job-1", vec![NewStage::new("Screening", "")])
            .unwrap();
        let application = pending_application(&h, "job-1");

        h.gate.accept(&application.id).unwrap();
        let result = h.gate.accept(&application.id);
        assert!(matches!(result, Err(EngineError::InvalidState { .. })));
    }

    #[test]
    fn test_accept_missing_application() {
        let h = harness();
        let result = h.gate.accept("missing");
        assert!(matches!(result, Err(EngineError::ApplicationNotFound(_))));
    }

    #[test]
    fn test_reject_pending_application() {
        let h = harness();
        let application = pending_application(&h, "job-1");

        let rejected = h.gate.reject(&application.id).unwrap();
        assert_eq!(rejected.status, ApplicationStatus::Rejected);

        // No process, no ledger entries.
        assert!(h
            .processes
            .get_by_application(&application.id)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_reject_twice_fails_loudly() {
        let h = harness();
        let application = pending_application(&h, "job-1");

        h.gate.reject(&application.id).unwrap();
        let result = h.gate.reject(&application.id);
        assert!(matches!(result, Err(EngineError::InvalidState { .. })));
    }

    #[test]
    fn test_reject_after_accept_fails() {
        let h = harness();
        h.stages
            .define_stages("job-1", vec![NewStage::new("Screening", "")])
            .unwrap();
        let application = pending_application(&h, "job-1");

        h.gate.accept(&application.id).unwrap();
        let result = h.gate.reject(&application.id);
        assert!(matches!(result, Err(EngineError::InvalidState { .. })));
    }
}
