pub mod config;
pub mod engine;
pub mod history;
pub mod metrics;
pub mod process;
pub mod stage;
pub mod storage;
pub mod testing;

pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, DatabaseConfig,
    ServerConfig,
};
pub use engine::{ApplicationGate, EngineError, TransitionEngine};
pub use history::{
    replay, HistoryEntry, HistoryError, HistoryLedger, NewHistoryEntry, ReplayedState,
    SqliteHistoryLedger, TransitionAction,
};
pub use process::{
    Application, ApplicationStatus, CreateApplicationRequest, ProcessChange, ProcessError,
    ProcessFilter, ProcessOutcome, ProcessStateFilter, ProcessStore, SelectionProcess,
    SqliteProcessStore,
};
pub use stage::{NewStage, PipelineStage, SqliteStageRegistry, StageError, StageRegistry, StageStatus};
pub use storage::{Db, StorageError};
