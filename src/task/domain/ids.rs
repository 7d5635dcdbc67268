//! Identifier and validated scalar types for the task domain.

use super::TaskDomainError;
use std::fmt;

/// Registry-assigned identifier for a task record.
///
/// Identifiers are positive and assigned as `max(existing) + 1`, so they are
/// never reused while the registry keeps its highest record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskId(u64);

impl TaskId {
    /// The identifier given to the first task of an empty registry.
    pub const FIRST: Self = Self(1);

    /// Creates a validated task identifier.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidTaskId`] when the value is zero.
    pub const fn new(value: u64) -> Result<Self, TaskDomainError> {
        if value == 0 {
            return Err(TaskDomainError::InvalidTaskId(value));
        }
        Ok(Self(value))
    }

    /// Returns the identifier following the highest identifier in `existing`.
    ///
    /// Returns [`Self::FIRST`] when `existing` is empty.
    #[must_use]
    pub fn next_after(existing: impl IntoIterator<Item = Self>) -> Self {
        existing
            .into_iter()
            .max()
            .map_or(Self::FIRST, |highest| Self(highest.0.saturating_add(1)))
    }

    /// Returns the underlying numeric value.
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// User-supplied task label.
///
/// The name is trimmed and must not be empty; combined with the task prefix it
/// forms the task branch name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TaskName(String);

impl TaskName {
    /// Creates a validated task name.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::EmptyTaskName`] when the value is empty after
    /// trimming.
    pub fn new(value: impl Into<String>) -> Result<Self, TaskDomainError> {
        let raw = value.into();
        let normalized = raw.trim();
        if normalized.is_empty() {
            return Err(TaskDomainError::EmptyTaskName);
        }
        Ok(Self(normalized.to_owned()))
    }

    /// Returns the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for TaskName {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for TaskName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Abbreviated commit identifier reported by the version-control adapter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CommitId(String);

impl CommitId {
    /// Length of the abbreviated form shown to users.
    pub const ABBREVIATED_LEN: usize = 7;

    /// Wraps a commit identifier, keeping at most the abbreviated prefix.
    #[must_use]
    pub fn abbreviated(value: &str) -> Self {
        let trimmed = value.trim();
        Self(trimmed.chars().take(Self::ABBREVIATED_LEN).collect())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CommitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
