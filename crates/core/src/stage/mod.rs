//! Pipeline stages ("etapas") and the per-job stage registry.

mod sqlite;
mod store;
mod types;

pub use sqlite::SqliteStageRegistry;
pub use store::{NewStage, StageError, StageRegistry};
pub use types::{PipelineStage, StageStatus};
