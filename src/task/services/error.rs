//! Service-level errors for task lifecycle operations.
//!
//! The `Display` text of every variant is the message shown to the user, so
//! stage-specific prefixes live here rather than in the presentation layer.

use super::squash::SquashError;
use crate::task::{
    domain::{BranchName, TaskDomainError, TaskName, TaskStatus},
    ports::{TaskRegistryError, VcsError},
};
use thiserror::Error;

/// Service-level errors for task lifecycle operations.
#[derive(Debug, Error)]
pub enum TaskLifecycleError {
    /// Domain validation failed.
    #[error(transparent)]
    Domain(#[from] TaskDomainError),

    /// Registry operation failed.
    #[error(transparent)]
    Registry(#[from] TaskRegistryError),

    /// The working directory is not a repository.
    #[error("Not in a Git repository")]
    NotARepository,

    /// Initialization was requested inside an existing repository.
    #[error("Already in a Git repository")]
    AlreadyARepository,

    /// The working tree is dirty and `force` was not requested.
    #[error("You have uncommitted changes. Use --force to proceed anyway")]
    UncommittedChanges,

    /// The checked-out branch could not be resolved.
    #[error("Unable to determine current branch")]
    UnknownCurrentBranch,

    /// The branches to compare could not be resolved.
    #[error("Unable to determine branches")]
    UnknownBranches,

    /// The requested base branch does not exist.
    #[error("Base branch '{0}' does not exist")]
    BaseBranchMissing(BranchName),

    /// A record for the derived task branch already exists.
    #[error("Task branch '{0}' is already registered")]
    DuplicateTaskBranch(BranchName),

    /// The checked-out branch is not in the task namespace.
    #[error("Not on a task branch")]
    NotOnTaskBranch,

    /// The checked-out task branch has no registry record.
    #[error("Branch '{0}' is not registered as a task")]
    UnregisteredTaskBranch(BranchName),

    /// The current task already left the `Active` status.
    #[error("Task '{name}' is {status}; only active tasks can be {action}")]
    TaskNotActive {
        /// Task name.
        name: TaskName,
        /// Current status.
        status: TaskStatus,
        /// Attempted action, in past participle form.
        action: &'static str,
    },

    /// The working tree has nothing to commit.
    #[error("No changes to commit")]
    NoChangesToCommit,

    /// Repository initialization failed.
    #[error("Failed to initialize repository: {0}")]
    Initialize(VcsError),

    /// Checking out the base branch failed.
    #[error("Failed to checkout base branch: {0}")]
    CheckoutBase(VcsError),

    /// Creating the task branch failed.
    #[error("Failed to create task branch: {0}")]
    CreateBranch(VcsError),

    /// Committing on the task branch failed.
    #[error("Failed to commit: {0}")]
    Commit(VcsError),

    /// The no-commit merge used by apply failed.
    #[error("Failed to merge changes: {0}")]
    Apply(VcsError),

    /// The merge-commit integration failed.
    #[error("Failed to merge: {0}")]
    Merge(VcsError),

    /// The squash integration failed.
    #[error(transparent)]
    Squash(#[from] SquashError),

    /// Discarding working-tree changes failed.
    #[error("{0}")]
    Reset(VcsError),

    /// Returning to the base branch after discarding changes failed.
    #[error("Failed to switch back to {base}: {source}")]
    ReturnToBase {
        /// Base branch that could not be checked out.
        base: BranchName,
        /// Adapter failure.
        source: VcsError,
    },

    /// Deleting the task branch failed.
    #[error("Failed to delete branch: {0}")]
    DeleteBranch(VcsError),

    /// A read-only inspection (log, diff) failed.
    #[error("{0}")]
    Inspect(VcsError),
}

/// Result type for task lifecycle service operations.
pub type TaskLifecycleResult<T> = Result<T, TaskLifecycleError>;
