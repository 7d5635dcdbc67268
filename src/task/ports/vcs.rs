//! Version-control port used by the task lifecycle.
//!
//! Each mutating operation reports success with the tool's textual output or
//! fails with a [`VcsError`] carrying the tool's error text. Queries that have
//! no meaningful failure mode (existence checks, status) return plain values.

use crate::task::domain::{BranchName, CommitId};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for version-control operations.
pub type VcsResult<T> = Result<T, VcsError>;

/// Version-control capability set required by the task lifecycle.
///
/// Every call acts on the single working repository the adapter was built
/// for. Implementations hold no state of their own beyond that repository.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VersionControl: Send + Sync {
    /// Returns whether the working directory is inside a repository.
    async fn is_repository(&self) -> bool;

    /// Creates a repository with an initial commit on `main_branch`.
    async fn initialize(&self, main_branch: &BranchName) -> VcsResult<String>;

    /// Returns the checked-out branch, or `None` when it cannot be resolved
    /// (no repository, detached `HEAD`).
    async fn current_branch(&self) -> Option<BranchName>;

    /// Returns whether a local branch named `name` exists.
    async fn branch_exists(&self, name: &BranchName) -> bool;

    /// Creates `name` at the current position and checks it out.
    async fn create_and_checkout(&self, name: &BranchName) -> VcsResult<String>;

    /// Checks out an existing branch.
    async fn checkout(&self, name: &BranchName) -> VcsResult<String>;

    /// Returns the porcelain working-tree status; empty means clean.
    async fn working_tree_status(&self) -> String;

    /// Stages every change and commits it with `message`.
    async fn commit_all(&self, message: &str) -> VcsResult<CommitId>;

    /// Commits only what is already staged, leaving the rest of the working
    /// tree alone.
    async fn commit_staged(&self, message: &str) -> VcsResult<CommitId>;

    /// Merges `branch` into the current branch without committing and
    /// without fast-forwarding.
    async fn merge_no_commit(&self, branch: &BranchName) -> VcsResult<String>;

    /// Aborts an in-progress merge.
    async fn abort_merge(&self) -> VcsResult<String>;

    /// Resets the index to `HEAD`, dropping staged or conflicted merge
    /// results while keeping unrelated unstaged edits.
    ///
    /// Unlike [`VersionControl::abort_merge`] this also works after a squash
    /// merge, which records no merge in progress.
    async fn discard_merge(&self) -> VcsResult<String>;

    /// Merges `branch` into the current branch with an explicit merge commit.
    async fn merge_with_commit(&self, branch: &BranchName, message: &str)
    -> VcsResult<CommitId>;

    /// Applies the combined changes of `branch` to the working tree without
    /// creating commits.
    async fn squash_merge(&self, branch: &BranchName) -> VcsResult<String>;

    /// Fast-forwards the current branch to `branch`.
    async fn merge_fast_forward(&self, branch: &BranchName) -> VcsResult<String>;

    /// Discards tracked changes and removes untracked files.
    async fn reset_hard_and_clean(&self) -> VcsResult<String>;

    /// Force-deletes a local branch.
    async fn delete_branch(&self, name: &BranchName) -> VcsResult<String>;

    /// Lists commits reachable from `head` but not from `base`, newest first,
    /// one line per commit.
    async fn log_between(
        &self,
        base: &BranchName,
        head: &BranchName,
        graph: bool,
    ) -> VcsResult<Vec<String>>;

    /// Returns the textual diff `base..head`.
    async fn diff_between(&self, base: &BranchName, head: &BranchName) -> VcsResult<String>;

    /// Returns the first configured main-branch candidate that exists.
    async fn main_branch_name(&self) -> Option<BranchName>;
}

/// Errors returned by version-control adapters.
#[derive(Debug, Clone, Error)]
pub enum VcsError {
    /// The tool ran and reported failure; carries its error text.
    #[error("{0}")]
    Command(String),

    /// The working directory is not a repository.
    #[error("Not a git repository")]
    NotARepository,

    /// The tool could not be started or its output could not be collected.
    #[error("failed to run version control: {0}")]
    Spawn(Arc<dyn std::error::Error + Send + Sync>),
}

impl VcsError {
    /// Builds a command failure from the tool's error text.
    pub fn command(message: impl Into<String>) -> Self {
        Self::Command(message.into().trim().to_owned())
    }

    /// Wraps a process-spawning error.
    pub fn spawn(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Spawn(Arc::new(err))
    }
}
