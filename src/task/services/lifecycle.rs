//! Task lifecycle orchestration service.
//!
//! The service translates lifecycle operations into ordered version-control
//! calls and keeps the registry in lock-step with the branches it creates and
//! deletes. Integration lives in `integration.rs`; abort and prune live in
//! `cleanup.rs`.

use super::{
    error::{TaskLifecycleError, TaskLifecycleResult},
    outcome::{ChangesCommitted, TaskCreated},
    requests::CreateTaskRequest,
};
use crate::task::{
    domain::{BranchName, NewTask, Task, TaskId, TaskName, TaskPrefix},
    ports::{TaskRegistry, VersionControl},
};
use mockable::Clock;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Task lifecycle orchestration service.
#[derive(Clone)]
pub struct TaskLifecycleService<R, V, C>
where
    R: TaskRegistry,
    V: VersionControl,
    C: Clock + Send + Sync,
{
    pub(super) registry: Arc<R>,
    pub(super) vcs: Arc<V>,
    pub(super) clock: Arc<C>,
    pub(super) prefix: TaskPrefix,
}

/// Registry contents together with the record of the checked-out task.
pub(super) struct CurrentTask {
    pub(super) tasks: Vec<Task>,
    pub(super) task: Task,
}

impl CurrentTask {
    /// Returns the registry contents with the current record replaced by its
    /// updated copy, matched on branch name.
    pub(super) fn updated_tasks(&self) -> Vec<Task> {
        self.tasks
            .iter()
            .map(|task| {
                if task.branch() == self.task.branch() {
                    self.task.clone()
                } else {
                    task.clone()
                }
            })
            .collect()
    }

    /// Returns the registry contents without the current record.
    pub(super) fn remaining_tasks(&self) -> Vec<Task> {
        self.tasks
            .iter()
            .filter(|task| task.branch() != self.task.branch())
            .cloned()
            .collect()
    }
}

impl<R, V, C> TaskLifecycleService<R, V, C>
where
    R: TaskRegistry,
    V: VersionControl,
    C: Clock + Send + Sync,
{
    /// Creates a new task lifecycle service using the default task prefix.
    #[must_use]
    pub fn new(registry: Arc<R>, vcs: Arc<V>, clock: Arc<C>) -> Self {
        Self {
            registry,
            vcs,
            clock,
            prefix: TaskPrefix::default(),
        }
    }

    /// Replaces the task branch prefix.
    #[must_use]
    pub fn with_prefix(mut self, prefix: TaskPrefix) -> Self {
        self.prefix = prefix;
        self
    }

    /// Returns the task branch prefix in use.
    #[must_use]
    pub const fn prefix(&self) -> &TaskPrefix {
        &self.prefix
    }

    /// Initializes a repository with an initial commit on `main_branch`.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::AlreadyARepository`] when the working
    /// directory is already a repository, or
    /// [`TaskLifecycleError::Initialize`] when the adapter fails.
    pub async fn initialize_repository(&self, main_branch: &str) -> TaskLifecycleResult<String> {
        let branch = BranchName::new(main_branch)?;
        if self.vcs.is_repository().await {
            return Err(TaskLifecycleError::AlreadyARepository);
        }
        let output = self
            .vcs
            .initialize(&branch)
            .await
            .map_err(TaskLifecycleError::Initialize)?;
        info!(branch = %branch, "initialized repository");
        Ok(output)
    }

    /// Starts a task: forks `<prefix><name>` from the base branch and records
    /// it as active.
    ///
    /// Every precondition is checked before the repository is touched. If the
    /// registry cannot be saved after the branch was created, the branch is
    /// removed again so that no branch exists without its record.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError`] when validation or a precondition
    /// fails, when the adapter cannot check out or create a branch, or when
    /// the registry rejects persistence.
    pub async fn create_task(&self, request: CreateTaskRequest) -> TaskLifecycleResult<TaskCreated> {
        let name = TaskName::new(request.name)?;
        let branch = self.prefix.branch_for(&name)?;
        let explicit_base = request
            .base_branch
            .map(BranchName::new)
            .transpose()?;

        self.require_repository().await?;
        if !request.force && !self.vcs.working_tree_status().await.trim().is_empty() {
            return Err(TaskLifecycleError::UncommittedChanges);
        }
        let base_branch = match explicit_base {
            Some(base) => base,
            None => self
                .vcs
                .current_branch()
                .await
                .ok_or(TaskLifecycleError::UnknownCurrentBranch)?,
        };
        if !self.vcs.branch_exists(&base_branch).await {
            return Err(TaskLifecycleError::BaseBranchMissing(base_branch));
        }
        let mut tasks = self.registry.load_all().await?;
        if tasks.iter().any(|task| task.branch() == &branch) {
            return Err(TaskLifecycleError::DuplicateTaskBranch(branch));
        }

        self.vcs
            .checkout(&base_branch)
            .await
            .map_err(TaskLifecycleError::CheckoutBase)?;
        self.vcs
            .create_and_checkout(&branch)
            .await
            .map_err(TaskLifecycleError::CreateBranch)?;

        let task = Task::new(
            NewTask {
                id: TaskId::next_after(tasks.iter().map(Task::id)),
                name,
                branch,
                base_branch,
                description: request.description.unwrap_or_default(),
            },
            &*self.clock,
        );
        tasks.push(task.clone());
        if let Err(err) = self.registry.save_all(&tasks).await {
            self.discard_created_branch(&task).await;
            return Err(err.into());
        }

        info!(task = %task.name(), branch = %task.branch(), base = %task.base_branch(), "created task");
        Ok(TaskCreated { task })
    }

    /// Stages every pending change on the current task branch and commits it.
    ///
    /// The registry is not touched.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::NoChangesToCommit`] for a clean tree,
    /// [`TaskLifecycleError::NotOnTaskBranch`] outside the task namespace, or
    /// [`TaskLifecycleError::Commit`] with the adapter's error text.
    pub async fn commit(&self, message: &str) -> TaskLifecycleResult<ChangesCommitted> {
        self.require_repository().await?;
        if self.vcs.working_tree_status().await.trim().is_empty() {
            return Err(TaskLifecycleError::NoChangesToCommit);
        }
        let branch = self.current_task_branch().await?;
        let commit = self
            .vcs
            .commit_all(message)
            .await
            .map_err(TaskLifecycleError::Commit)?;
        debug!(branch = %branch, commit = %commit, "committed task changes");
        Ok(ChangesCommitted {
            branch,
            commit,
            message: message.to_owned(),
        })
    }

    /// Returns every task record in registry order.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::Registry`] when the registry cannot be
    /// read.
    pub async fn list_tasks(&self) -> TaskLifecycleResult<Vec<Task>> {
        Ok(self.registry.load_all().await?)
    }

    /// Returns the record for the checked-out task branch, if any.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::Registry`] when the registry cannot be
    /// read.
    pub async fn current_task(&self) -> TaskLifecycleResult<Option<Task>> {
        let Some(branch) = self.vcs.current_branch().await else {
            return Ok(None);
        };
        if !self.prefix.matches(&branch) {
            return Ok(None);
        }
        let tasks = self.registry.load_all().await?;
        Ok(tasks.into_iter().find(|task| task.branch() == &branch))
    }

    /// Lists commits on the current branch that its origin branch lacks.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::UnknownBranches`] when neither branch can
    /// be resolved, or [`TaskLifecycleError::Inspect`] when the adapter fails.
    pub async fn task_log(&self, graph: bool) -> TaskLifecycleResult<Vec<String>> {
        let (base, head) = self.comparison_branches().await?;
        self.vcs
            .log_between(&base, &head, graph)
            .await
            .map_err(TaskLifecycleError::Inspect)
    }

    /// Returns the diff between the origin branch and the current branch.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::UnknownBranches`] when neither branch can
    /// be resolved, or [`TaskLifecycleError::Inspect`] when the adapter fails.
    pub async fn task_diff(&self) -> TaskLifecycleResult<String> {
        let (base, head) = self.comparison_branches().await?;
        self.vcs
            .diff_between(&base, &head)
            .await
            .map_err(TaskLifecycleError::Inspect)
    }

    /// Returns the porcelain working-tree status; empty means clean.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::NotARepository`] outside a repository.
    pub async fn working_tree_status(&self) -> TaskLifecycleResult<String> {
        self.require_repository().await?;
        Ok(self.vcs.working_tree_status().await)
    }

    pub(super) async fn require_repository(&self) -> TaskLifecycleResult<()> {
        if self.vcs.is_repository().await {
            Ok(())
        } else {
            Err(TaskLifecycleError::NotARepository)
        }
    }

    /// Resolves the checked-out branch and checks it is in the task namespace.
    pub(super) async fn current_task_branch(&self) -> TaskLifecycleResult<BranchName> {
        self.vcs
            .current_branch()
            .await
            .filter(|branch| self.prefix.matches(branch))
            .ok_or(TaskLifecycleError::NotOnTaskBranch)
    }

    /// Loads the registry and locates the record for the checked-out branch.
    pub(super) async fn load_current_task(&self) -> TaskLifecycleResult<CurrentTask> {
        let branch = self.current_task_branch().await?;
        let tasks = self.registry.load_all().await?;
        let Some(task) = tasks.iter().find(|task| task.branch() == &branch).cloned() else {
            return Err(TaskLifecycleError::UnregisteredTaskBranch(branch));
        };
        Ok(CurrentTask { tasks, task })
    }

    /// Fails unless the current task is still active.
    pub(super) fn require_active(task: &Task, action: &'static str) -> TaskLifecycleResult<()> {
        if task.is_active() {
            return Ok(());
        }
        Err(TaskLifecycleError::TaskNotActive {
            name: task.name().clone(),
            status: task.status(),
            action,
        })
    }

    async fn comparison_branches(&self) -> TaskLifecycleResult<(BranchName, BranchName)> {
        let head = self
            .vcs
            .current_branch()
            .await
            .ok_or(TaskLifecycleError::UnknownBranches)?;
        let base = match self.current_task().await? {
            Some(task) => task.base_branch().clone(),
            None => self
                .vcs
                .main_branch_name()
                .await
                .ok_or(TaskLifecycleError::UnknownBranches)?,
        };
        Ok((base, head))
    }

    async fn discard_created_branch(&self, task: &Task) {
        if let Err(err) = self.vcs.checkout(task.base_branch()).await {
            warn!(branch = %task.base_branch(), error = %err, "could not return to base branch after failed save");
            return;
        }
        if let Err(err) = self.vcs.delete_branch(task.branch()).await {
            warn!(branch = %task.branch(), error = %err, "could not delete task branch after failed save");
        }
    }
}
