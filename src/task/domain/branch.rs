//! Branch-name value objects and the task branch namespace.

use super::{TaskDomainError, TaskName};
use std::fmt;

/// Maximum length for a validated branch name.
const MAX_BRANCH_NAME_LENGTH: usize = 255;

/// Characters git refuses in ref names (`git check-ref-format`).
const FORBIDDEN_REF_CHARS: [char; 7] = ['~', '^', ':', '?', '*', '[', '\\'];

/// Validated Git branch name.
///
/// Branch names must be non-empty after trimming, must not contain
/// whitespace, control characters, `..`, `@{` or any of `~^:?*[\`, must not
/// start with `-` or end with `/`, `.` or `.lock`, and must not exceed
/// `MAX_BRANCH_NAME_LENGTH` bytes.
///
/// # Examples
///
///     use codesnap::task::domain::BranchName;
///
///     let name = BranchName::new("codesnap@task/feature-x").expect("valid");
///     assert_eq!(name.as_str(), "codesnap@task/feature-x");
///     assert!(BranchName::new("two words").is_err());
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BranchName(String);

impl BranchName {
    /// Creates a validated branch name.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidBranchName`] when the value violates
    /// git ref-name rules or exceeds the length limit.
    pub fn new(value: impl Into<String>) -> Result<Self, TaskDomainError> {
        let raw = value.into();
        let normalized = raw.trim();

        if Self::is_invalid_branch_name(normalized) {
            return Err(TaskDomainError::InvalidBranchName(raw));
        }

        Ok(Self(normalized.to_owned()))
    }

    /// Validates branch name constraints.
    fn is_invalid_branch_name(name: &str) -> bool {
        let is_empty = name.is_empty();
        let exceeds_length_limit = name.len() > MAX_BRANCH_NAME_LENGTH;
        let contains_forbidden_char = name
            .chars()
            .any(|ch| ch.is_whitespace() || ch.is_control() || FORBIDDEN_REF_CHARS.contains(&ch));
        let contains_forbidden_sequence =
            name.contains("..") || name.contains("@{") || name.contains("//") || name == "@";
        let has_bad_boundary = name.starts_with('-')
            || name.starts_with('/')
            || name.ends_with('/')
            || name.ends_with('.')
            || name.ends_with(".lock");

        is_empty
            || exceeds_length_limit
            || contains_forbidden_char
            || contains_forbidden_sequence
            || has_bad_boundary
    }

    /// Returns the branch name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for BranchName {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for BranchName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<&str> for BranchName {
    type Error = TaskDomainError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Fixed prefix that places task branches in their own namespace.
///
/// A branch is a task branch when its name *contains* the prefix, matching
/// how the lifecycle resolves the current task from the checked-out branch.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TaskPrefix(String);

impl TaskPrefix {
    /// Prefix used when no configuration overrides it.
    pub const DEFAULT: &'static str = "codesnap@task/";

    /// Creates a validated task prefix.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidTaskPrefix`] when the prefix is empty
    /// or contains whitespace.
    pub fn new(value: impl Into<String>) -> Result<Self, TaskDomainError> {
        let raw = value.into();
        if raw.is_empty() || raw.chars().any(char::is_whitespace) {
            return Err(TaskDomainError::InvalidTaskPrefix(raw));
        }
        Ok(Self(raw))
    }

    /// Derives the task branch name `<prefix><name>`.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidBranchName`] when the combined name
    /// is not a valid branch name.
    pub fn branch_for(&self, name: &TaskName) -> Result<BranchName, TaskDomainError> {
        BranchName::new(format!("{}{}", self.0, name.as_str()))
    }

    /// Returns whether `branch` lies in the task namespace.
    #[must_use]
    pub fn matches(&self, branch: &BranchName) -> bool {
        branch.as_str().contains(self.0.as_str())
    }

    /// Returns the prefix as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for TaskPrefix {
    fn default() -> Self {
        Self(Self::DEFAULT.to_owned())
    }
}

impl fmt::Display for TaskPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
