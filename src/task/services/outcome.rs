//! Successful results of task lifecycle operations.
//!
//! Each outcome renders the confirmation line shown to the user through its
//! `Display` implementation.

use crate::task::domain::{BranchName, CommitId, Task, TaskName};
use std::fmt;

/// Timestamp layout used in confirmation messages.
const DISPLAY_TIMESTAMP: &str = "%Y-%m-%d %H:%M:%S";

/// A task was started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskCreated {
    /// The new task record.
    pub task: Task,
}

impl fmt::Display for TaskCreated {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let description = match self.task.description() {
            "" => "None",
            text => text,
        };
        write!(
            f,
            "Created task branch '{}'\nDescription: {description}\nCreated: {}",
            self.task.branch(),
            self.task.created().format(DISPLAY_TIMESTAMP)
        )
    }
}

/// Pending changes were committed on a task branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangesCommitted {
    /// Task branch that received the commit.
    pub branch: BranchName,
    /// Abbreviated identifier of the new commit.
    pub commit: CommitId,
    /// Commit message.
    pub message: String,
}

impl fmt::Display for ChangesCommitted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{} {}] {}", self.branch, self.commit, self.message)
    }
}

/// Which committing integration completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntegrationKind {
    /// All task commits collapsed into one commit.
    Squash,
    /// Non-fast-forward merge commit.
    MergeCommit,
}

/// A task was integrated into its base branch and marked merged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskIntegrated {
    /// The task record after the transition.
    pub task: Task,
    /// Integration flavour.
    pub kind: IntegrationKind,
    /// Commit created on the base branch.
    pub commit: CommitId,
}

impl fmt::Display for TaskIntegrated {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let task_branch = self.task.branch();
        let base_branch = self.task.base_branch();
        match self.kind {
            IntegrationKind::Squash => write!(
                f,
                "Squashed and merged '{task_branch}' into '{base_branch}' and switched to {base_branch}"
            ),
            IntegrationKind::MergeCommit => write!(
                f,
                "Merged '{task_branch}' into '{base_branch}' and stayed on {base_branch}"
            ),
        }
    }
}

/// Task changes were staged on the base branch without a commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangesApplied {
    /// Task branch whose changes were applied.
    pub task_branch: BranchName,
    /// Base branch that received the changes.
    pub base_branch: BranchName,
    /// Whether the base branch is still checked out.
    pub stayed_on_base: bool,
}

impl fmt::Display for ChangesApplied {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Applied changes from '{}' to '{}' (not committed)",
            self.task_branch, self.base_branch
        )?;
        if self.stayed_on_base {
            write!(f, " and stayed on {}", self.base_branch)?;
        }
        Ok(())
    }
}

/// Result of a merge request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeOutcome {
    /// Squash or commit integration completed.
    Integrated(TaskIntegrated),
    /// Changes were applied without committing.
    Applied(ChangesApplied),
}

impl fmt::Display for MergeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integrated(integrated) => fmt::Display::fmt(integrated, f),
            Self::Applied(applied) => fmt::Display::fmt(applied, f),
        }
    }
}

/// A task was abandoned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskAborted {
    /// Task name.
    pub name: TaskName,
    /// Base branch now checked out.
    pub base_branch: BranchName,
    /// Whether the branch and its record were removed.
    pub branch_deleted: bool,
}

impl fmt::Display for TaskAborted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.branch_deleted {
            write!(f, "Abandoned and deleted task '{}'", self.name)
        } else {
            write!(
                f,
                "Abandoned all changes in task '{}' and switched to {}",
                self.name, self.base_branch
            )
        }
    }
}

/// Result of a prune run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PruneReport {
    /// Records whose branches were deleted and that left the registry.
    pub removed: Vec<Task>,
    /// Inactivity threshold that was applied.
    pub days: u32,
}

impl PruneReport {
    /// Returns how many tasks were removed.
    #[must_use]
    pub fn count(&self) -> usize {
        self.removed.len()
    }
}

impl fmt::Display for PruneReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.removed.is_empty() {
            return f.write_str("No branches were deleted");
        }
        write!(
            f,
            "Cleaned up {} task branch(es) older than {} days",
            self.count(),
            self.days
        )
    }
}
