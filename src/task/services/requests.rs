//! Request payloads accepted by the task lifecycle service.

/// Default inactivity threshold, in days, used by prune.
pub const DEFAULT_PRUNE_DAYS: u32 = 30;

/// Request payload for starting a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTaskRequest {
    pub(crate) name: String,
    pub(crate) description: Option<String>,
    pub(crate) force: bool,
    pub(crate) base_branch: Option<String>,
}

impl CreateTaskRequest {
    /// Creates a request for a task called `name`, forked from the current
    /// branch.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            force: false,
            base_branch: None,
        }
    }

    /// Sets the task description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Forks the task from `base_branch` instead of the current branch.
    #[must_use]
    pub fn with_base_branch(mut self, base_branch: impl Into<String>) -> Self {
        self.base_branch = Some(base_branch.into());
        self
    }

    /// Proceeds even when the working tree has uncommitted changes.
    #[must_use]
    pub const fn forced(mut self, force: bool) -> Self {
        self.force = force;
        self
    }
}

/// How a task branch is brought into its base branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeStrategy {
    /// Collapse the task's commits into a single commit on the base branch.
    Squash,
    /// Merge with an explicit, non-fast-forward merge commit.
    Commit,
    /// Stage the task's changes on the base branch without committing.
    Apply {
        /// Check the task branch out again afterwards.
        return_to_task: bool,
    },
}

/// Request payload for integrating the current task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeRequest {
    pub(crate) strategy: MergeStrategy,
    pub(crate) message: Option<String>,
}

impl MergeRequest {
    /// Creates a request using `strategy`.
    #[must_use]
    pub const fn new(strategy: MergeStrategy) -> Self {
        Self {
            strategy,
            message: None,
        }
    }

    /// Builds a request from command-line style flags.
    ///
    /// `squash` wins over `commit`; with neither, the changes are applied
    /// and the base branch stays checked out.
    #[must_use]
    pub const fn from_flags(commit: bool, squash: bool) -> Self {
        let strategy = if squash {
            MergeStrategy::Squash
        } else if commit {
            MergeStrategy::Commit
        } else {
            MergeStrategy::Apply {
                return_to_task: false,
            }
        };
        Self::new(strategy)
    }

    /// Sets the commit message used by squash and commit integration.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        let message = message.into();
        self.message = (!message.trim().is_empty()).then_some(message);
        self
    }

    /// Returns the selected strategy.
    #[must_use]
    pub const fn strategy(&self) -> MergeStrategy {
        self.strategy
    }
}

/// Request payload for pruning stale tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PruneRequest {
    pub(crate) days: u32,
    pub(crate) merged_only: bool,
}

impl PruneRequest {
    /// Creates a request removing tasks inactive for at least `days` days.
    #[must_use]
    pub const fn new(days: u32) -> Self {
        Self {
            days,
            merged_only: false,
        }
    }

    /// Restricts pruning to merged tasks.
    #[must_use]
    pub const fn merged_only(mut self, merged_only: bool) -> Self {
        self.merged_only = merged_only;
        self
    }

    /// Returns the inactivity threshold in days.
    #[must_use]
    pub const fn days(&self) -> u32 {
        self.days
    }
}

impl Default for PruneRequest {
    fn default() -> Self {
        Self::new(DEFAULT_PRUNE_DAYS)
    }
}
