//! Shared world state for task lifecycle BDD scenarios.

use std::sync::Arc;

use codesnap::task::{
    adapters::memory::{InMemoryTaskRegistry, InMemoryVersionControl},
    domain::Task,
    services::{TaskLifecycleError, TaskLifecycleService},
};
use mockable::DefaultClock;
use rstest::fixture;

/// Service type used by the BDD world.
pub type TestTaskService =
    TaskLifecycleService<InMemoryTaskRegistry, InMemoryVersionControl, DefaultClock>;

/// Scenario world for task lifecycle behaviour tests.
pub struct TaskLifecycleWorld {
    pub service: TestTaskService,
    pub registry: InMemoryTaskRegistry,
    pub vcs: InMemoryVersionControl,
    pub last_error: Option<String>,
}

impl TaskLifecycleWorld {
    /// Creates a world over a fresh repository with `branch` checked out.
    #[must_use]
    pub fn on_branch(branch: &str) -> Self {
        let registry = InMemoryTaskRegistry::new();
        let vcs = InMemoryVersionControl::with_branch(branch);
        let service = TaskLifecycleService::new(
            Arc::new(registry.clone()),
            Arc::new(vcs.clone()),
            Arc::new(DefaultClock),
        );
        Self {
            service,
            registry,
            vcs,
            last_error: None,
        }
    }

    /// Keeps the error text of a failed operation for later assertions.
    pub fn record<T>(&mut self, result: Result<T, TaskLifecycleError>) {
        self.last_error = result.err().map(|err| err.to_string());
    }

    /// Looks up the stored record for the task called `name`.
    ///
    /// # Errors
    ///
    /// Returns an error if the registry is unavailable or holds no such task.
    pub fn task_named(&self, name: &str) -> Result<Task, eyre::Report> {
        self.registry
            .snapshot()?
            .into_iter()
            .find(|task| task.name().as_str() == name)
            .ok_or_else(|| eyre::eyre!("no task named '{name}' in the registry"))
    }
}

impl Default for TaskLifecycleWorld {
    fn default() -> Self {
        Self::on_branch("main")
    }
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> TaskLifecycleWorld {
    TaskLifecycleWorld::default()
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}
