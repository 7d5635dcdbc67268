//! Flat record models for the JSON task registry.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Stored form of one task record.
///
/// Every field is a plain value; `status` is kept as text and only parsed
/// into the domain enum when the record is loaded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskRecord {
    /// Task identifier.
    pub id: u64,
    /// Task name.
    pub name: String,
    /// Task branch name.
    pub branch: String,
    /// Branch the task was forked from.
    pub base_branch: String,
    /// Free-form description.
    #[serde(default)]
    pub description: String,
    /// Lifecycle status text.
    pub status: String,
    /// Creation timestamp.
    pub created: DateTime<Utc>,
    /// Last lifecycle activity timestamp.
    pub last_activity: DateTime<Utc>,
    /// Integration commit count.
    #[serde(default)]
    pub commits: u32,
}
