//! Domain model for task lifecycle management.
//!
//! A task is a registry record paired with a dedicated branch. The domain
//! owns the status machine, branch naming and identifier assignment while
//! keeping version control and persistence outside its boundary.

mod branch;
mod error;
mod ids;
mod task;

pub use branch::{BranchName, TaskPrefix};
pub use error::{ParseTaskStatusError, TaskDomainError};
pub use ids::{CommitId, TaskId, TaskName};
pub use task::{NewTask, PersistedTaskData, Task, TaskStatus};
