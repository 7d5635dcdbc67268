//! Shared fixtures for task lifecycle unit tests.

use crate::task::{
    adapters::memory::{InMemoryTaskRegistry, InMemoryVersionControl},
    domain::{BranchName, NewTask, Task, TaskId, TaskName, TaskStatus},
    services::{CreateTaskRequest, TaskLifecycleService},
};
use chrono::{DateTime, Duration, Local, TimeZone, Utc};
use mockable::Clock;
use std::sync::{Arc, PoisonError, RwLock};

/// Clock whose time only moves when a test advances it.
#[derive(Debug)]
pub struct ManualClock {
    now: RwLock<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: RwLock::new(now),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.write().unwrap_or_else(PoisonError::into_inner);
        *now += by;
    }
}

impl Clock for ManualClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.now.read().unwrap_or_else(PoisonError::into_inner)
    }
}

pub fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0)
        .single()
        .expect("valid start time")
}

pub type TestService =
    TaskLifecycleService<InMemoryTaskRegistry, InMemoryVersionControl, ManualClock>;

/// Service wired to in-memory adapters, with handles kept for inspection.
pub struct Harness {
    pub service: TestService,
    pub registry: InMemoryTaskRegistry,
    pub vcs: InMemoryVersionControl,
    pub clock: Arc<ManualClock>,
}

impl Harness {
    pub fn on_branch(branch: &str) -> Self {
        Self::with_parts(
            InMemoryTaskRegistry::new(),
            InMemoryVersionControl::with_branch(branch),
        )
    }

    pub fn with_parts(registry: InMemoryTaskRegistry, vcs: InMemoryVersionControl) -> Self {
        let clock = Arc::new(ManualClock::new(start_time()));
        let service = TaskLifecycleService::new(
            Arc::new(registry.clone()),
            Arc::new(vcs.clone()),
            Arc::clone(&clock),
        );
        Self {
            service,
            registry,
            vcs,
            clock,
        }
    }

    /// Starts `name` from the current branch and commits one change on it.
    pub async fn start_with_commit(&self, name: &str) -> Task {
        let created = self
            .service
            .create_task(CreateTaskRequest::new(name))
            .await
            .expect("task creation should succeed");
        self.vcs.write_file(&format!("{name}.txt"));
        self.service
            .commit(&format!("work on {name}"))
            .await
            .expect("commit should succeed");
        created.task
    }

    pub fn records(&self) -> Vec<Task> {
        self.registry.snapshot().expect("registry snapshot")
    }
}

/// Builds a stored task record without touching version control.
pub fn stored_task(
    id: u64,
    name: &str,
    status: TaskStatus,
    clock: &impl Clock,
) -> Task {
    let mut task = Task::new(
        NewTask {
            id: TaskId::new(id).expect("positive id"),
            name: TaskName::new(name).expect("valid name"),
            branch: BranchName::new(format!("codesnap@task/{name}")).expect("valid branch"),
            base_branch: BranchName::new("main").expect("valid branch"),
            description: String::new(),
        },
        clock,
    );
    match status {
        TaskStatus::Active => {}
        TaskStatus::Merged => task.mark_merged(clock).expect("active task merges"),
        TaskStatus::Aborted => task.mark_aborted(clock).expect("active task aborts"),
    }
    task
}
