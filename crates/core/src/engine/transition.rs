//! The transition engine.
//!
//! The only component allowed to mutate a selection process. Every
//! operation validates against the stage registry, then hands the store a
//! version-checked mutation plus the history entry recording it; the two
//! commit as one transaction or not at all.

use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use crate::history::{HistoryEntry, HistoryLedger, NewHistoryEntry, TransitionAction};
use crate::metrics;
use crate::process::{ProcessChange, ProcessOutcome, ProcessStore, SelectionProcess};
use crate::stage::{PipelineStage, StageError, StageRegistry};

use super::EngineError;

/// Validates and applies state changes to selection processes.
pub struct TransitionEngine {
    stages: Arc<dyn StageRegistry>,
    processes: Arc<dyn ProcessStore>,
    ledger: Arc<dyn HistoryLedger>,
}

impl TransitionEngine {
    pub fn new(
        stages: Arc<dyn StageRegistry>,
        processes: Arc<dyn ProcessStore>,
        ledger: Arc<dyn HistoryLedger>,
    ) -> Self {
        Self {
            stages,
            processes,
            ledger,
        }
    }

    /// Move the process to the stage immediately after the current one.
    pub fn advance_to_next(
        &self,
        process_id: &str,
        feedback: Option<String>,
    ) -> Result<SelectionProcess, EngineError> {
        let result = self.do_advance(process_id, feedback);
        observe("advance", &result);
        result
    }

    /// Move the process forward to any later stage, skipping the ones in
    /// between.
    pub fn jump_to_stage(
        &self,
        process_id: &str,
        target_stage_id: &str,
        feedback: Option<String>,
    ) -> Result<SelectionProcess, EngineError> {
        let result = self.do_jump(process_id, target_stage_id, feedback);
        observe("jump", &result);
        result
    }

    /// Move the process back to an earlier stage. Requires feedback:
    /// sending a candidate backwards demands an explanation.
    pub fn revert_to_stage(
        &self,
        process_id: &str,
        target_stage_id: &str,
        feedback: String,
    ) -> Result<SelectionProcess, EngineError> {
        let result = self.do_revert(process_id, target_stage_id, feedback);
        observe("revert", &result);
        result
    }

    /// Terminal acceptance, legal from any active stage. The current
    /// stage is kept as the stage at which acceptance occurred.
    pub fn finalize(
        &self,
        process_id: &str,
        feedback: Option<String>,
    ) -> Result<SelectionProcess, EngineError> {
        let result = self.do_finish(
            process_id,
            ProcessOutcome::Accepted,
            TransitionAction::Finalize,
            normalize_feedback(feedback),
        );
        observe("finalize", &result);
        result
    }

    /// Terminal recruiter rejection, legal from any active stage.
    /// Requires feedback.
    pub fn reject(
        &self,
        process_id: &str,
        feedback: String,
    ) -> Result<SelectionProcess, EngineError> {
        let result = self.do_reject(process_id, feedback);
        observe("reject", &result);
        result
    }

    /// Candidate-initiated withdrawal, legal from any active stage. No
    /// feedback involved; kept distinct from rejection in the outcome
    /// taxonomy.
    pub fn withdraw(&self, process_id: &str) -> Result<SelectionProcess, EngineError> {
        let result = self.do_finish(
            process_id,
            ProcessOutcome::Withdrawn,
            TransitionAction::Withdraw,
            None,
        );
        observe("withdraw", &result);
        result
    }

    /// Read a process.
    pub fn get(&self, process_id: &str) -> Result<SelectionProcess, EngineError> {
        self.processes
            .get(process_id)?
            .ok_or_else(|| EngineError::ProcessNotFound(process_id.to_string()))
    }

    /// Read a process's audit trail, oldest entry first.
    pub fn history(&self, process_id: &str) -> Result<Vec<HistoryEntry>, EngineError> {
        // Resolve the process first so a missing id is a not-found, not
        // an empty trail.
        self.get(process_id)?;
        Ok(self.ledger.list_for(process_id)?)
    }

    fn do_advance(
        &self,
        process_id: &str,
        feedback: Option<String>,
    ) -> Result<SelectionProcess, EngineError> {
        let process = self.load_active(process_id)?;
        let current = self.current_stage(&process)?;

        let next = match self.stages.stage_at(&process.job_id, current.order + 1) {
            Ok(stage) => stage,
            Err(StageError::StageNotFound { .. }) => {
                return Err(EngineError::NoNextStage {
                    process_id: process.id,
                })
            }
            Err(e) => return Err(e.into()),
        };

        let entry = NewHistoryEntry::new(
            &process.id,
            Some(current.id.clone()),
            &next.id,
            TransitionAction::Advance,
            normalize_feedback(feedback),
        );

        let (updated, _) = self.processes.apply_transition(
            &process.id,
            process.version,
            ProcessChange::Move {
                to_stage_id: next.id.clone(),
            },
            entry,
        )?;

        info!(
            process_id = %updated.id,
            from = %current.name,
            to = %next.name,
            "Candidature advanced to next stage"
        );

        Ok(updated)
    }

    fn do_jump(
        &self,
        process_id: &str,
        target_stage_id: &str,
        feedback: Option<String>,
    ) -> Result<SelectionProcess, EngineError> {
        let process = self.load_active(process_id)?;

        // A jump only means something when there is a stage to skip over;
        // checked before the target so a malformed target on a two-stage
        // job still reports the structural problem.
        let stages = self.stages.list_stages(&process.job_id)?;
        if stages.len() < 3 {
            return Err(EngineError::InsufficientStages {
                job_id: process.job_id,
                count: stages.len(),
            });
        }

        let current = self.current_stage(&process)?;
        let target = self.resolve_target(&process, target_stage_id)?;

        if target.order <= current.order {
            return Err(EngineError::InvalidTarget {
                target_stage_id: target_stage_id.to_string(),
                reason: format!(
                    "jump target must come after the current stage (current order {}, target order {})",
                    current.order, target.order
                ),
            });
        }

        let entry = NewHistoryEntry::new(
            &process.id,
            Some(current.id.clone()),
            &target.id,
            TransitionAction::Jump,
            normalize_feedback(feedback),
        );

        let (updated, _) = self.processes.apply_transition(
            &process.id,
            process.version,
            ProcessChange::Move {
                to_stage_id: target.id.clone(),
            },
            entry,
        )?;

        info!(
            process_id = %updated.id,
            from = %current.name,
            to = %target.name,
            skipped = target.order - current.order - 1,
            "Candidature jumped forward"
        );

        Ok(updated)
    }

    fn do_revert(
        &self,
        process_id: &str,
        target_stage_id: &str,
        feedback: String,
    ) -> Result<SelectionProcess, EngineError> {
        let process = self.load_active(process_id)?;
        let feedback = require_feedback(&feedback)?;

        let current = self.current_stage(&process)?;
        let target = self.resolve_target(&process, target_stage_id)?;

        if target.order >= current.order {
            return Err(EngineError::InvalidTarget {
                target_stage_id: target_stage_id.to_string(),
                reason: format!(
                    "revert target must come before the current stage (current order {}, target order {})",
                    current.order, target.order
                ),
            });
        }

        let entry = NewHistoryEntry::new(
            &process.id,
            Some(current.id.clone()),
            &target.id,
            TransitionAction::Revert,
            Some(feedback),
        );

        let (updated, _) = self.processes.apply_transition(
            &process.id,
            process.version,
            ProcessChange::Move {
                to_stage_id: target.id.clone(),
            },
            entry,
        )?;

        info!(
            process_id = %updated.id,
            from = %current.name,
            to = %target.name,
            "Candidature reverted to earlier stage"
        );

        Ok(updated)
    }

    fn do_reject(
        &self,
        process_id: &str,
        feedback: String,
    ) -> Result<SelectionProcess, EngineError> {
        // Terminal immutability outranks the feedback law: a finalized
        // process reports ProcessFinalized whatever the payload.
        let process = self.load_active(process_id)?;
        let feedback = require_feedback(&feedback)?;
        self.finish(
            process,
            ProcessOutcome::Rejected,
            TransitionAction::Reject,
            Some(feedback),
        )
    }

    fn do_finish(
        &self,
        process_id: &str,
        outcome: ProcessOutcome,
        action: TransitionAction,
        feedback: Option<String>,
    ) -> Result<SelectionProcess, EngineError> {
        let process = self.load_active(process_id)?;
        self.finish(process, outcome, action, feedback)
    }

    fn finish(
        &self,
        process: SelectionProcess,
        outcome: ProcessOutcome,
        action: TransitionAction,
        feedback: Option<String>,
    ) -> Result<SelectionProcess, EngineError> {
        let now = Utc::now();

        let entry = NewHistoryEntry::new(
            &process.id,
            Some(process.current_stage_id.clone()),
            &process.current_stage_id,
            action,
            feedback,
        );

        let (updated, _) = self.processes.apply_transition(
            &process.id,
            process.version,
            ProcessChange::Finish {
                outcome,
                finished_at: now,
            },
            entry,
        )?;

        metrics::PROCESSES_FINISHED
            .with_label_values(&[outcome.as_str()])
            .inc();

        info!(
            process_id = %updated.id,
            outcome = outcome.as_str(),
            stage_id = %updated.current_stage_id,
            "Selection process finished"
        );

        Ok(updated)
    }

    fn load_active(&self, process_id: &str) -> Result<SelectionProcess, EngineError> {
        let process = self.get(process_id)?;
        if process.is_terminal() {
            return Err(EngineError::ProcessFinalized {
                process_id: process.id,
            });
        }
        Ok(process)
    }

    fn current_stage(&self, process: &SelectionProcess) -> Result<PipelineStage, EngineError> {
        self.stages.get(&process.current_stage_id)?.ok_or_else(|| {
            EngineError::Storage(format!(
                "process {} references missing stage {}",
                process.id, process.current_stage_id
            ))
        })
    }

    fn resolve_target(
        &self,
        process: &SelectionProcess,
        target_stage_id: &str,
    ) -> Result<PipelineStage, EngineError> {
        let target = self.stages.get(target_stage_id)?.ok_or_else(|| {
            EngineError::InvalidTarget {
                target_stage_id: target_stage_id.to_string(),
                reason: "stage does not exist".to_string(),
            }
        })?;

        if target.job_id != process.job_id {
            return Err(EngineError::InvalidTarget {
                target_stage_id: target_stage_id.to_string(),
                reason: "stage belongs to a different job".to_string(),
            });
        }

        Ok(target)
    }
}

fn normalize_feedback(feedback: Option<String>) -> Option<String> {
    feedback.filter(|f| !f.trim().is_empty())
}

fn require_feedback(feedback: &str) -> Result<String, EngineError> {
    if feedback.trim().is_empty() {
        return Err(EngineError::FeedbackRequired);
    }
    Ok(feedback.to_string())
}

fn observe(action: &str, result: &Result<SelectionProcess, EngineError>) {
    match result {
        Ok(_) => metrics::TRANSITIONS_TOTAL
            .with_label_values(&[action])
            .inc(),
        Err(e) => metrics::TRANSITION_FAILURES
            .with_label_values(&[e.code()])
            .inc(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::ApplicationGate;
    use crate::history::SqliteHistoryLedger;
    use crate::process::{CreateApplicationRequest, SqliteProcessStore};
    use crate::stage::{NewStage, SqliteStageRegistry};
    use crate::storage::Db;

    struct Harness {
        stages: Arc<SqliteStageRegistry>,
        processes: Arc<SqliteProcessStore>,
        ledger: Arc<SqliteHistoryLedger>,
        engine: TransitionEngine,
        gate: ApplicationGate,
    }

    fn harness() -> Harness {
        let db = Db::in_memory().unwrap();
        let stages = Arc::new(SqliteStageRegistry::new(db.clone()));
        let processes = Arc::new(SqliteProcessStore::new(db.clone()));
        let ledger = Arc::new(SqliteHistoryLedger::new(db));
        let engine = TransitionEngine::new(
            stages.clone(),
            processes.clone(),
            ledger.clone(),
        );
        let gate = ApplicationGate::new(stages.clone(), processes.clone());
        Harness {
            stages,
            processes,
            ledger,
            engine,
            gate,
        }
    }

    fn seed_job(h: &Harness, job_id: &str, names: &[&str]) -> Vec<PipelineStage> {
        h.stages
            .define_stages(job_id, names.iter().map(|n| NewStage::new(*n, "")).collect())
            .unwrap()
    }

    fn start_process(h: &Harness, job_id: &str) -> SelectionProcess {
        let application = h
            .processes
            .create_application(CreateApplicationRequest {
                job_id: job_id.to_string(),
                candidate_id: "cand-1".to_string(),
            })
            .unwrap();
        h.gate.accept(&application.id).unwrap()
    }

    #[test]
    fn test_advance_moves_to_next_stage() {
        let h = harness();
        let stages = seed_job(&h, "job-1", &["Screening", "Tech Interview", "Offer"]);
        let process = start_process(&h, "job-1");
        assert_eq!(process.current_stage_id, stages[0].id);

        let advanced = h.engine.advance_to_next(&process.id, None).unwrap();
        assert_eq!(advanced.current_stage_id, stages[1].id);
        assert_eq!(advanced.version, process.version + 1);
    }

    #[test]
    fn test_advance_past_last_stage_fails() {
        let h = harness();
        seed_job(&h, "job-1", &["Screening", "Offer"]);
        let process = start_process(&h, "job-1");

        h.engine.advance_to_next(&process.id, None).unwrap();
        let result = h.engine.advance_to_next(&process.id, None);
        assert!(matches!(result, Err(EngineError::NoNextStage { .. })));
    }

    #[test]
    fn test_advance_missing_process() {
        let h = harness();
        let result = h.engine.advance_to_next("missing", None);
        assert!(matches!(result, Err(EngineError::ProcessNotFound(_))));
    }

    #[test]
    fn test_jump_skips_stages() {
        let h = harness();
        let stages = seed_job(&h, "job-1", &["Screening", "Tech Interview", "Offer"]);
        let process = start_process(&h, "job-1");

        let jumped = h
            .engine
            .jump_to_stage(&process.id, &stages[2].id, None)
            .unwrap();
        assert_eq!(jumped.current_stage_id, stages[2].id);
    }

    #[test]
    fn test_jump_requires_three_stages() {
        let h = harness();
        let stages = seed_job(&h, "job-1", &["Screening", "Offer"]);
        let process = start_process(&h, "job-1");

        let result = h.engine.jump_to_stage(&process.id, &stages[1].id, None);
        assert!(matches!(
            result,
            Err(EngineError::InsufficientStages { count: 2, .. })
        ));
    }

    #[test]
    fn test_jump_insufficient_stages_reported_before_bad_target() {
        let h = harness();
        seed_job(&h, "job-1", &["Only Stage"]);
        let process = start_process(&h, "job-1");

        // Target does not even exist, but the structural check comes first.
        let result = h.engine.jump_to_stage(&process.id, "nonsense", None);
        assert!(matches!(
            result,
            Err(EngineError::InsufficientStages { count: 1, .. })
        ));
    }

    #[test]
    fn test_jump_rejects_backward_target() {
        let h = harness();
        let stages = seed_job(&h, "job-1", &["Screening", "Tech Interview", "Offer"]);
        let process = start_process(&h, "job-1");
        h.engine.advance_to_next(&process.id, None).unwrap();

        let result = h.engine.jump_to_stage(&process.id, &stages[0].id, None);
        assert!(matches!(result, Err(EngineError::InvalidTarget { .. })));
    }

    #[test]
    fn test_jump_rejects_current_stage_as_target() {
        let h = harness();
        let stages = seed_job(&h, "job-1", &["Screening", "Tech Interview", "Offer"]);
        let process = start_process(&h, "job-1");

        let result = h.engine.jump_to_stage(&process.id, &stages[0].id, None);
        assert!(matches!(result, Err(EngineError::InvalidTarget { .. })));
    }

    #[test]
    fn test_jump_rejects_stage_of_other_job() {
        let h = harness();
        seed_job(&h, "job-1", &["Screening", "Tech Interview", "Offer"]);
        let other = seed_job(&h, "job-2", &["A", "B", "C"]);
        let process = start_process(&h, "job-1");

        let result = h.engine.jump_to_stage(&process.id, &other[2].id, None);
        assert!(matches!(result, Err(EngineError::InvalidTarget { .. })));
    }

    #[test]
    fn test_revert_requires_feedback() {
        let h = harness();
        let stages = seed_job(&h, "job-1", &["Screening", "Tech Interview", "Offer"]);
        let process = start_process(&h, "job-1");
        h.engine.advance_to_next(&process.id, None).unwrap();

        let empty = h
            .engine
            .revert_to_stage(&process.id, &stages[0].id, String::new());
        assert!(matches!(empty, Err(EngineError::FeedbackRequired)));

        let whitespace = h
            .engine
            .revert_to_stage(&process.id, &stages[0].id, "   ".to_string());
        assert!(matches!(whitespace, Err(EngineError::FeedbackRequired)));

        let reverted = h
            .engine
            .revert_to_stage(&process.id, &stages[0].id, "needs re-screen".to_string())
            .unwrap();
        assert_eq!(reverted.current_stage_id, stages[0].id);
    }

    #[test]
    fn test_revert_rejects_forward_target() {
        let h = harness();
        let stages = seed_job(&h, "job-1", &["Screening", "Tech Interview", "Offer"]);
        let process = start_process(&h, "job-1");

        let result =
            h.engine
                .revert_to_stage(&process.id, &stages[2].id, "why not".to_string());
        assert!(matches!(result, Err(EngineError::InvalidTarget { .. })));
    }

    #[test]
    fn test_finalize_from_middle_stage() {
        let h = harness();
        let stages = seed_job(&h, "job-1", &["Screening", "Tech Interview", "Offer"]);
        let process = start_process(&h, "job-1");
        h.engine.advance_to_next(&process.id, None).unwrap();

        let finished = h
            .engine
            .finalize(&process.id, Some("great fit".to_string()))
            .unwrap();
        assert!(finished.is_terminal());
        assert_eq!(finished.outcome, Some(ProcessOutcome::Accepted));
        // The stage at which acceptance occurred is kept.
        assert_eq!(finished.current_stage_id, stages[1].id);
    }

    #[test]
    fn test_reject_requires_feedback() {
        let h = harness();
        seed_job(&h, "job-1", &["Screening", "Offer"]);
        let process = start_process(&h, "job-1");

        let result = h.engine.reject(&process.id, "  ".to_string());
        assert!(matches!(result, Err(EngineError::FeedbackRequired)));

        let rejected = h
            .engine
            .reject(&process.id, "not enough experience".to_string())
            .unwrap();
        assert_eq!(rejected.outcome, Some(ProcessOutcome::Rejected));
    }

    #[test]
    fn test_withdraw_needs_no_feedback() {
        let h = harness();
        seed_job(&h, "job-1", &["Screening", "Offer"]);
        let process = start_process(&h, "job-1");

        let withdrawn = h.engine.withdraw(&process.id).unwrap();
        assert_eq!(withdrawn.outcome, Some(ProcessOutcome::Withdrawn));
        assert!(withdrawn.is_terminal());
    }

    #[test]
    fn test_terminal_process_rejects_every_operation() {
        let h = harness();
        let stages = seed_job(&h, "job-1", &["Screening", "Tech Interview", "Offer"]);
        let process = start_process(&h, "job-1");
        h.engine
            .reject(&process.id, "position closed".to_string())
            .unwrap();

        assert!(matches!(
            h.engine.advance_to_next(&process.id, None),
            Err(EngineError::ProcessFinalized { .. })
        ));
        assert!(matches!(
            h.engine.jump_to_stage(&process.id, &stages[2].id, None),
            Err(EngineError::ProcessFinalized { .. })
        ));
        assert!(matches!(
            h.engine
                .revert_to_stage(&process.id, &stages[0].id, "again".to_string()),
            Err(EngineError::ProcessFinalized { .. })
        ));
        assert!(matches!(
            h.engine.finalize(&process.id, None),
            Err(EngineError::ProcessFinalized { .. })
        ));
        assert!(matches!(
            h.engine.reject(&process.id, "again".to_string()),
            Err(EngineError::ProcessFinalized { .. })
        ));
        assert!(matches!(
            h.engine.withdraw(&process.id),
            Err(EngineError::ProcessFinalized { .. })
        ));
        // Terminal immutability outranks the feedback law.
        assert!(matches!(
            h.engine.reject(&process.id, String::new()),
            Err(EngineError::ProcessFinalized { .. })
        ));
    }

    #[test]
    fn test_history_records_every_movement() {
        let h = harness();
        let stages = seed_job(&h, "job-1", &["Screening", "Tech Interview", "Offer"]);
        let process = start_process(&h, "job-1");

        h.engine.advance_to_next(&process.id, None).unwrap();
        h.engine
            .jump_to_stage(&process.id, &stages[2].id, None)
            .unwrap();
        h.engine
            .revert_to_stage(&process.id, &stages[0].id, "restart".to_string())
            .unwrap();
        h.engine.finalize(&process.id, None).unwrap();

        let trail = h.engine.history(&process.id).unwrap();
        let actions: Vec<TransitionAction> = trail.iter().map(|e| e.action).collect();
        assert_eq!(
            actions,
            vec![
                TransitionAction::Bootstrap,
                TransitionAction::Advance,
                TransitionAction::Jump,
                TransitionAction::Revert,
                TransitionAction::Finalize,
            ]
        );
        assert_eq!(trail[3].feedback.as_deref(), Some("restart"));
    }

    #[test]
    fn test_history_replay_matches_process() {
        let h = harness();
        let stages = seed_job(&h, "job-1", &["Screening", "Tech Interview", "Offer"]);
        let process = start_process(&h, "job-1");

        h.engine.advance_to_next(&process.id, None).unwrap();
        h.engine
            .revert_to_stage(&process.id, &stages[0].id, "redo".to_string())
            .unwrap();
        let finished = h.engine.withdraw(&process.id).unwrap();

        let trail = h.engine.history(&process.id).unwrap();
        let replayed = crate::history::replay(&trail);
        assert_eq!(
            replayed.current_stage_id.as_deref(),
            Some(finished.current_stage_id.as_str())
        );
        assert_eq!(replayed.outcome, finished.outcome);
    }

    #[test]
    fn test_history_for_missing_process() {
        let h = harness();
        let result = h.engine.history("missing");
        assert!(matches!(result, Err(EngineError::ProcessNotFound(_))));
    }

    #[test]
    fn test_empty_feedback_on_forward_moves_is_dropped() {
        let h = harness();
        seed_job(&h, "job-1", &["Screening", "Tech Interview", "Offer"]);
        let process = start_process(&h, "job-1");

        h.engine
            .advance_to_next(&process.id, Some("  ".to_string()))
            .unwrap();

        let trail = h.ledger.list_for(&process.id).unwrap();
        assert_eq!(trail[1].feedback, None);
    }
}
