//! Stage data types.

use serde::{Deserialize, Serialize};

/// Administrative status of a stage, independent of any selection process.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    Draft,
    Active,
}

impl StageStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StageStatus::Draft => "draft",
            StageStatus::Active => "active",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "draft" => Some(StageStatus::Draft),
            "active" => Some(StageStatus::Active),
            _ => None,
        }
    }
}

/// One ordered step of a job's recruiting process.
///
/// Stages of a job are totally ordered by `order`; the registry assigns
/// orders densely starting at 1 and never lets two stages of the same job
/// share a value.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PipelineStage {
    /// Unique identifier (UUID).
    pub id: String,
    /// Job posting this stage belongs to.
    pub job_id: String,
    /// Display name (e.g. "Screening", "Tech Interview").
    pub name: String,
    /// Longer description shown to recruiters.
    pub description: String,
    /// Position in the pipeline, starting at 1.
    pub order: u32,
    /// Administrative status.
    pub status: StageStatus,
}

impl PipelineStage {
    /// Returns true if this is the entry stage of its pipeline.
    pub fn is_first(&self) -> bool {
        self.order == 1
    }
}
