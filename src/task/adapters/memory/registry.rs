//! In-memory task registry.

use async_trait::async_trait;
use std::sync::{Arc, RwLock};

use crate::task::{
    domain::Task,
    ports::{TaskRegistry, TaskRegistryError, TaskRegistryResult},
};

/// Thread-safe in-memory task registry.
///
/// Clones share state, so a test can keep a handle for inspection after
/// passing one to the service.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTaskRegistry {
    state: Arc<RwLock<InMemoryRegistryState>>,
}

#[derive(Debug, Default)]
struct InMemoryRegistryState {
    tasks: Vec<Task>,
    fail_saves: Option<String>,
    save_count: usize,
}

impl InMemoryTaskRegistry {
    /// Creates an empty in-memory registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry pre-populated with `tasks`.
    #[must_use]
    pub fn with_tasks(tasks: impl IntoIterator<Item = Task>) -> Self {
        let registry = Self::new();
        if let Ok(mut state) = registry.state.write() {
            state.tasks = tasks.into_iter().collect();
        }
        registry
    }

    /// Makes every subsequent save fail with `message`; `None` restores
    /// normal behaviour.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRegistryError::Persistence`] when the state lock is
    /// poisoned.
    pub fn fail_saves(&self, message: Option<&str>) -> TaskRegistryResult<()> {
        let mut state = self.state.write().map_err(|err| {
            TaskRegistryError::persistence(std::io::Error::other(err.to_string()))
        })?;
        state.fail_saves = message.map(str::to_owned);
        Ok(())
    }

    /// Returns how many saves have succeeded.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRegistryError::Persistence`] when the state lock is
    /// poisoned.
    pub fn save_count(&self) -> TaskRegistryResult<usize> {
        let state = self.state.read().map_err(|err| {
            TaskRegistryError::persistence(std::io::Error::other(err.to_string()))
        })?;
        Ok(state.save_count)
    }

    /// Returns a copy of the stored records.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRegistryError::Persistence`] when the state lock is
    /// poisoned.
    pub fn snapshot(&self) -> TaskRegistryResult<Vec<Task>> {
        let state = self.state.read().map_err(|err| {
            TaskRegistryError::persistence(std::io::Error::other(err.to_string()))
        })?;
        Ok(state.tasks.clone())
    }
}

#[async_trait]
impl TaskRegistry for InMemoryTaskRegistry {
    async fn load_all(&self) -> TaskRegistryResult<Vec<Task>> {
        self.snapshot()
    }

    async fn save_all(&self, tasks: &[Task]) -> TaskRegistryResult<()> {
        let mut state = self.state.write().map_err(|err| {
            TaskRegistryError::persistence(std::io::Error::other(err.to_string()))
        })?;
        if let Some(message) = &state.fail_saves {
            return Err(TaskRegistryError::persistence(std::io::Error::other(
                message.clone(),
            )));
        }
        state.tasks = tasks.to_vec();
        state.save_count = state.save_count.saturating_add(1);
        Ok(())
    }
}
