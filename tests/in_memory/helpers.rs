//! Shared test helpers for in-memory lifecycle integration tests.

use codesnap::task::{
    adapters::memory::{InMemoryTaskRegistry, InMemoryVersionControl},
    domain::Task,
    services::{CreateTaskRequest, TaskLifecycleService},
};
use mockable::DefaultClock;
use rstest::fixture;
use std::sync::Arc;

/// Service wired to in-memory adapters.
pub type TestService =
    TaskLifecycleService<InMemoryTaskRegistry, InMemoryVersionControl, DefaultClock>;

/// A service plus handles on the adapters it owns.
pub struct Workspace {
    pub service: TestService,
    pub registry: InMemoryTaskRegistry,
    pub vcs: InMemoryVersionControl,
}

impl Workspace {
    /// Wires a service to the given adapters.
    #[must_use]
    pub fn new(registry: InMemoryTaskRegistry, vcs: InMemoryVersionControl) -> Self {
        let service = TaskLifecycleService::new(
            Arc::new(registry.clone()),
            Arc::new(vcs.clone()),
            Arc::new(DefaultClock),
        );
        Self {
            service,
            registry,
            vcs,
        }
    }

    /// Starts `name` and commits one file on its branch.
    ///
    /// # Errors
    ///
    /// Returns an error if creation or the commit fails.
    pub async fn start_with_commit(&self, name: &str) -> eyre::Result<Task> {
        let created = self.service.create_task(CreateTaskRequest::new(name)).await?;
        self.vcs.write_file(&format!("{name}.txt"));
        self.service.commit(&format!("work on {name}")).await?;
        Ok(created.task)
    }

    /// Returns the stored records.
    ///
    /// # Errors
    ///
    /// Returns an error if the registry state is unavailable.
    pub fn records(&self) -> eyre::Result<Vec<Task>> {
        Ok(self.registry.snapshot()?)
    }
}

/// Provides a repository on `main` with one initial commit and an empty
/// registry.
#[fixture]
pub fn workspace() -> Workspace {
    Workspace::new(
        InMemoryTaskRegistry::new(),
        InMemoryVersionControl::with_branch("main"),
    )
}
