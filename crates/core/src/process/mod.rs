//! Selection processes and the candidatures they are bound to.

mod sqlite;
mod store;
mod types;

pub use sqlite::SqliteProcessStore;
pub use store::{
    CreateApplicationRequest, ProcessChange, ProcessError, ProcessFilter, ProcessStateFilter,
    ProcessStore,
};
pub use types::{Application, ApplicationStatus, ProcessOutcome, SelectionProcess};
