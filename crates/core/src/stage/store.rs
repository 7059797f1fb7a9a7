//! Stage registry trait and types.

use serde::Deserialize;
use thiserror::Error;

use super::PipelineStage;

/// Error type for stage registry operations.
#[derive(Debug, Error)]
pub enum StageError {
    /// The job has no stages configured.
    #[error("No stages configured for job: {job_id}")]
    NotFound { job_id: String },

    /// No stage of the job sits at the requested order.
    #[error("Job {job_id} has no stage at order {order}")]
    StageNotFound { job_id: String, order: u32 },

    /// The job's stages are referenced by a selection process and can no
    /// longer be structurally edited.
    #[error("Stages of job {job_id} are locked by existing selection processes")]
    StageLocked { job_id: String },

    /// A stage definition with no stages at all.
    #[error("Job {job_id} requires at least one stage")]
    EmptyPipeline { job_id: String },

    /// Reordering input is not a permutation of the job's stages.
    #[error("Invalid stage ordering: {0}")]
    InvalidOrdering(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

/// A stage to be created, as supplied by the administrative surface.
#[derive(Debug, Clone, Deserialize)]
pub struct NewStage {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

impl NewStage {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }
}

/// Source of truth for a job's ordered stages.
pub trait StageRegistry: Send + Sync {
    /// Replace the stage list of a job, assigning orders 1..n.
    ///
    /// Rejected with `StageLocked` once any selection process references
    /// the job.
    fn define_stages(
        &self,
        job_id: &str,
        stages: Vec<NewStage>,
    ) -> Result<Vec<PipelineStage>, StageError>;

    /// All stages of a job, ordered by `order` ascending.
    fn list_stages(&self, job_id: &str) -> Result<Vec<PipelineStage>, StageError>;

    /// The stage of a job at a given order, used to resolve "next" and
    /// "previous" during transitions.
    fn stage_at(&self, job_id: &str, order: u32) -> Result<PipelineStage, StageError>;

    /// Look up a stage by id.
    fn get(&self, stage_id: &str) -> Result<Option<PipelineStage>, StageError>;

    /// Permute the stages of a job, reassigning orders 1..n to match the
    /// given id sequence.
    ///
    /// Rejected with `StageLocked` once any selection process references
    /// the job, and with `InvalidOrdering` when the ids are not exactly
    /// the job's stages.
    fn reorder(&self, job_id: &str, ordering: &[String]) -> Result<Vec<PipelineStage>, StageError>;
}
