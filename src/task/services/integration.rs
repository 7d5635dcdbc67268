//! Merge strategies that bring a task branch into its base branch.

use super::{
    error::{TaskLifecycleError, TaskLifecycleResult},
    lifecycle::{CurrentTask, TaskLifecycleService},
    outcome::{ChangesApplied, IntegrationKind, MergeOutcome, TaskIntegrated},
    requests::{MergeRequest, MergeStrategy},
    squash::{SquashSaga, temporary_branch_name},
};
use crate::task::{
    domain::{BranchName, CommitId, Task},
    ports::{TaskRegistry, VersionControl},
};
use mockable::Clock;
use tracing::{info, warn};

impl<R, V, C> TaskLifecycleService<R, V, C>
where
    R: TaskRegistry,
    V: VersionControl,
    C: Clock + Send + Sync,
{
    /// Integrates or applies the current task according to `request`.
    ///
    /// Squash and commit integration require an active task and mark it
    /// merged on success. Apply stages the changes on the base branch
    /// without committing and never changes the task status.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::NotOnTaskBranch`] or
    /// [`TaskLifecycleError::UnregisteredTaskBranch`] when no current task
    /// can be resolved, [`TaskLifecycleError::TaskNotActive`] when a
    /// committing integration targets a finished task, and a stage-specific
    /// variant when the adapter fails. A failed integration leaves the task
    /// status unchanged.
    pub async fn merge(&self, request: MergeRequest) -> TaskLifecycleResult<MergeOutcome> {
        let mut current = self.load_current_task().await?;
        match request.strategy {
            MergeStrategy::Squash => {
                let message = merge_message(request.message, &current.task);
                self.squash_integrate(&mut current, &message)
                    .await
                    .map(MergeOutcome::Integrated)
            }
            MergeStrategy::Commit => {
                let message = merge_message(request.message, &current.task);
                self.commit_integrate(&mut current, &message)
                    .await
                    .map(MergeOutcome::Integrated)
            }
            MergeStrategy::Apply { return_to_task } => self
                .apply_changes(&current.task, return_to_task)
                .await
                .map(MergeOutcome::Applied),
        }
    }

    /// Applies the current task's changes to its base branch without
    /// committing.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::CheckoutBase`] or
    /// [`TaskLifecycleError::Apply`] when the adapter fails, after aborting
    /// the merge and restoring the task branch.
    pub async fn apply(&self, return_to_task: bool) -> TaskLifecycleResult<ChangesApplied> {
        let current = self.load_current_task().await?;
        self.apply_changes(&current.task, return_to_task).await
    }

    async fn apply_changes(
        &self,
        task: &Task,
        return_to_task: bool,
    ) -> TaskLifecycleResult<ChangesApplied> {
        let task_branch = task.branch();
        let base_branch = task.base_branch();

        self.vcs
            .checkout(base_branch)
            .await
            .map_err(TaskLifecycleError::CheckoutBase)?;
        if let Err(err) = self.vcs.merge_no_commit(task_branch).await {
            self.abandon_merge(task_branch).await;
            return Err(TaskLifecycleError::Apply(err));
        }

        let mut stayed_on_base = true;
        if return_to_task {
            match self.vcs.checkout(task_branch).await {
                Ok(_) => stayed_on_base = false,
                Err(err) => {
                    warn!(branch = %task_branch, error = %err, "could not return to task branch after applying");
                }
            }
        }

        info!(task = %task.name(), base = %base_branch, "applied task changes without committing");
        Ok(ChangesApplied {
            task_branch: task_branch.clone(),
            base_branch: base_branch.clone(),
            stayed_on_base,
        })
    }

    async fn squash_integrate(
        &self,
        current: &mut CurrentTask,
        message: &str,
    ) -> TaskLifecycleResult<TaskIntegrated> {
        Self::require_active(&current.task, "merged")?;
        let task_branch = current.task.branch().clone();
        let base_branch = current.task.base_branch().clone();

        let temporary = temporary_branch_name(&*self.vcs, self.clock.utc()).await?;
        let commit = SquashSaga::new(&*self.vcs, &task_branch, &base_branch, temporary)
            .run(message)
            .await?;

        let integrated = self
            .record_merge(current, IntegrationKind::Squash, commit)
            .await?;
        if let Err(err) = self.vcs.checkout(&base_branch).await {
            warn!(branch = %base_branch, error = %err, "could not check out base branch after squash");
        }
        Ok(integrated)
    }

    async fn commit_integrate(
        &self,
        current: &mut CurrentTask,
        message: &str,
    ) -> TaskLifecycleResult<TaskIntegrated> {
        Self::require_active(&current.task, "merged")?;
        let task_branch = current.task.branch().clone();

        self.vcs
            .checkout(current.task.base_branch())
            .await
            .map_err(TaskLifecycleError::CheckoutBase)?;
        let commit = match self.vcs.merge_with_commit(&task_branch, message).await {
            Ok(commit) => commit,
            Err(err) => {
                self.abandon_merge(&task_branch).await;
                return Err(TaskLifecycleError::Merge(err));
            }
        };

        self.record_merge(current, IntegrationKind::MergeCommit, commit)
            .await
    }

    async fn record_merge(
        &self,
        current: &mut CurrentTask,
        kind: IntegrationKind,
        commit: CommitId,
    ) -> TaskLifecycleResult<TaskIntegrated> {
        current.task.mark_merged(&*self.clock)?;
        self.registry.save_all(&current.updated_tasks()).await?;
        info!(
            task = %current.task.name(),
            base = %current.task.base_branch(),
            commit = %commit,
            ?kind,
            "merged task"
        );
        Ok(TaskIntegrated {
            task: current.task.clone(),
            kind,
            commit,
        })
    }

    /// Best-effort cleanup after a failed merge: abort it and go back to the
    /// task branch.
    async fn abandon_merge(&self, task_branch: &BranchName) {
        if let Err(err) = self.vcs.abort_merge().await {
            warn!(error = %err, "could not abort the failed merge");
        }
        if let Err(err) = self.vcs.checkout(task_branch).await {
            warn!(branch = %task_branch, error = %err, "could not return to task branch after failed merge");
        }
    }
}

fn merge_message(requested: Option<String>, task: &Task) -> String {
    requested.unwrap_or_else(|| format!("Merge task '{}'", task.name()))
}
