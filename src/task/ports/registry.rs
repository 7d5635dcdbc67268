//! Registry port for task record persistence.

use crate::task::domain::Task;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for task registry operations.
pub type TaskRegistryResult<T> = Result<T, TaskRegistryError>;

/// Task record persistence contract.
///
/// The registry stores an ordered collection of task records and replaces it
/// wholesale on save. Implementations must never leave the store readable in
/// a partially written state.
#[async_trait]
pub trait TaskRegistry: Send + Sync {
    /// Loads every task record in registry order.
    ///
    /// An absent store yields an empty list.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRegistryError::Corrupt`] when stored records cannot be
    /// decoded, or [`TaskRegistryError::Persistence`] on I/O failure.
    async fn load_all(&self) -> TaskRegistryResult<Vec<Task>>;

    /// Atomically replaces the stored records with `tasks`.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRegistryError::Persistence`] when the store cannot be
    /// written. The previous contents remain intact in that case.
    async fn save_all(&self, tasks: &[Task]) -> TaskRegistryResult<()>;
}

/// Errors returned by task registry implementations.
#[derive(Debug, Clone, Error)]
pub enum TaskRegistryError {
    /// Stored data could not be decoded into task records.
    #[error("task registry is corrupt: {0}")]
    Corrupt(String),

    /// Persistence-layer failure.
    #[error("task registry error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl TaskRegistryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
