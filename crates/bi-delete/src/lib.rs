//! bi-delete
//!
//! Cascading dashboard deletion: select dashboards by filter, discover the
//! charts, datasets and databases they depend on, protect anything still used
//! elsewhere, then delete in dependency order behind a backup and an optional
//! rollback.

pub mod backup;
pub mod context;
pub mod display;
pub mod error;
pub mod executor;
pub mod planner;
pub mod preflight;
pub mod protector;
pub mod resolver;
pub mod rollback;
pub mod selection;

#[cfg(test)]
mod tests;

pub use context::{
    BackupSettings, CONFIRM_TOKEN, CascadeOptions, DeleteContext, ExecutionOptions,
    parse_db_passwords,
};
pub use error::{AbortReason, Result as DeleteResult};
pub use executor::{DeleteEngine, DeleteFailure, DeleteOutcome, EngineState, ExecutionReport};
pub use planner::{CascadeTarget, DeletePlan, PlanWarning, plan_deletion};
pub use rollback::RollbackOutcome;
