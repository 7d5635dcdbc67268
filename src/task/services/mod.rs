//! Application services for task lifecycle orchestration.

mod cleanup;
mod error;
mod integration;
mod lifecycle;
mod outcome;
mod requests;
mod squash;

pub use error::{TaskLifecycleError, TaskLifecycleResult};
pub use lifecycle::TaskLifecycleService;
pub use outcome::{
    ChangesApplied, ChangesCommitted, IntegrationKind, MergeOutcome, PruneReport, TaskAborted,
    TaskCreated, TaskIntegrated,
};
pub use requests::{CreateTaskRequest, DEFAULT_PRUNE_DAYS, MergeRequest, MergeStrategy, PruneRequest};
pub use squash::{SquashError, SquashStep};
