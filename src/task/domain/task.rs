//! Task aggregate root and related task lifecycle types.

use super::{BranchName, ParseTaskStatusError, TaskDomainError, TaskId, TaskName};
use chrono::{DateTime, Utc};
use mockable::Clock;
use std::fmt;

/// Task lifecycle status.
///
/// `Active` is the only non-terminal status; a task leaves it exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskStatus {
    /// Work is ongoing on the task branch.
    Active,
    /// The task branch has been integrated into its base branch.
    Merged,
    /// The task has been abandoned.
    Aborted,
}

impl TaskStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::Merged => "Merged",
            Self::Aborted => "Aborted",
        }
    }

    /// Returns whether this status admits no further transitions.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Active)
    }

    /// Returns whether a transition from `self` to `target` is permitted.
    #[must_use]
    pub const fn can_transition_to(self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Active, Self::Merged | Self::Aborted)
        )
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for TaskStatus {
    type Error = ParseTaskStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "active" => Ok(Self::Active),
            "merged" => Ok(Self::Merged),
            "aborted" => Ok(Self::Aborted),
            _ => Err(ParseTaskStatusError(value.to_owned())),
        }
    }
}

/// Parameter object for creating a brand-new task record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    /// Registry-assigned identifier.
    pub id: TaskId,
    /// User-supplied label.
    pub name: TaskName,
    /// Derived task branch.
    pub branch: BranchName,
    /// Branch the task was forked from.
    pub base_branch: BranchName,
    /// Free-text description, empty when none was given.
    pub description: String,
}

/// Task aggregate root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    id: TaskId,
    name: TaskName,
    branch: BranchName,
    base_branch: BranchName,
    description: String,
    status: TaskStatus,
    created: DateTime<Utc>,
    last_activity: DateTime<Utc>,
    commits: u32,
}

/// Parameter object for reconstructing a persisted task aggregate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedTaskData {
    /// Persisted task identifier.
    pub id: TaskId,
    /// Persisted task name.
    pub name: TaskName,
    /// Persisted task branch.
    pub branch: BranchName,
    /// Persisted base branch.
    pub base_branch: BranchName,
    /// Persisted description.
    pub description: String,
    /// Persisted lifecycle status.
    pub status: TaskStatus,
    /// Persisted creation timestamp.
    pub created: DateTime<Utc>,
    /// Persisted latest activity timestamp.
    pub last_activity: DateTime<Utc>,
    /// Persisted commit counter.
    pub commits: u32,
}

impl Task {
    /// Creates a new active task with zero commits.
    #[must_use]
    pub fn new(data: NewTask, clock: &impl Clock) -> Self {
        let timestamp = clock.utc();
        Self {
            id: data.id,
            name: data.name,
            branch: data.branch,
            base_branch: data.base_branch,
            description: data.description.trim().to_owned(),
            status: TaskStatus::Active,
            created: timestamp,
            last_activity: timestamp,
            commits: 0,
        }
    }

    /// Reconstructs a task from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedTaskData) -> Self {
        Self {
            id: data.id,
            name: data.name,
            branch: data.branch,
            base_branch: data.base_branch,
            description: data.description,
            status: data.status,
            created: data.created,
            last_activity: data.last_activity,
            commits: data.commits,
        }
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn id(&self) -> TaskId {
        self.id
    }

    /// Returns the task name.
    #[must_use]
    pub const fn name(&self) -> &TaskName {
        &self.name
    }

    /// Returns the task branch.
    #[must_use]
    pub const fn branch(&self) -> &BranchName {
        &self.branch
    }

    /// Returns the branch this task was forked from.
    #[must_use]
    pub const fn base_branch(&self) -> &BranchName {
        &self.base_branch
    }

    /// Returns the description, empty when none was given.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the task lifecycle status.
    #[must_use]
    pub const fn status(&self) -> TaskStatus {
        self.status
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created(&self) -> DateTime<Utc> {
        self.created
    }

    /// Returns the most recent mutation timestamp.
    #[must_use]
    pub const fn last_activity(&self) -> DateTime<Utc> {
        self.last_activity
    }

    /// Returns the informational commit counter.
    #[must_use]
    pub const fn commits(&self) -> u32 {
        self.commits
    }

    /// Returns whether the task is still active.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        matches!(self.status, TaskStatus::Active)
    }

    /// Returns whether the last activity is at least `days` whole days before
    /// `now`.
    #[must_use]
    pub fn is_stale(&self, now: DateTime<Utc>, days: u32) -> bool {
        now.signed_duration_since(self.last_activity).num_days() >= i64::from(days)
    }

    /// Transitions the task to a new status.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidStateTransition`] when the status
    /// machine does not permit the transition. The task is left unchanged.
    pub fn transition_to(
        &mut self,
        target: TaskStatus,
        clock: &impl Clock,
    ) -> Result<(), TaskDomainError> {
        if !self.status.can_transition_to(target) {
            return Err(TaskDomainError::InvalidStateTransition {
                task_id: self.id,
                from: self.status,
                to: target,
            });
        }
        self.status = target;
        self.touch(clock);
        Ok(())
    }

    /// Marks the task as integrated and counts the integration commit.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidStateTransition`] unless the task is
    /// active.
    pub fn mark_merged(&mut self, clock: &impl Clock) -> Result<(), TaskDomainError> {
        self.transition_to(TaskStatus::Merged, clock)?;
        self.commits = self.commits.saturating_add(1);
        Ok(())
    }

    /// Marks the task as abandoned.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidStateTransition`] unless the task is
    /// active.
    pub fn mark_aborted(&mut self, clock: &impl Clock) -> Result<(), TaskDomainError> {
        self.transition_to(TaskStatus::Aborted, clock)
    }

    /// Updates the `last_activity` timestamp to the current clock time.
    fn touch(&mut self, clock: &impl Clock) {
        self.last_activity = clock.utc();
    }
}
