//! Abandoning the current task and pruning stale ones.

use super::{
    error::{TaskLifecycleError, TaskLifecycleResult},
    lifecycle::TaskLifecycleService,
    outcome::{PruneReport, TaskAborted},
    requests::PruneRequest,
};
use crate::task::{
    domain::{Task, TaskStatus},
    ports::{TaskRegistry, VersionControl},
};
use chrono::{DateTime, Utc};
use mockable::Clock;
use tracing::{debug, info, warn};

impl<R, V, C> TaskLifecycleService<R, V, C>
where
    R: TaskRegistry,
    V: VersionControl,
    C: Clock + Send + Sync,
{
    /// Discards the current task's working-tree changes, returns to the base
    /// branch and marks the task aborted.
    ///
    /// With `delete_branch`, the task branch is deleted and the record leaves
    /// the registry. The `Aborted` status is persisted before the deletion is
    /// attempted and is kept if the deletion fails.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::NotOnTaskBranch`] or
    /// [`TaskLifecycleError::UnregisteredTaskBranch`] when no current task
    /// can be resolved, [`TaskLifecycleError::TaskNotActive`] for a finished
    /// task, and [`TaskLifecycleError::Reset`],
    /// [`TaskLifecycleError::ReturnToBase`] or
    /// [`TaskLifecycleError::DeleteBranch`] when the adapter fails.
    pub async fn abort(&self, delete_branch: bool) -> TaskLifecycleResult<TaskAborted> {
        let mut current = self.load_current_task().await?;
        Self::require_active(&current.task, "aborted")?;
        let base_branch = current.task.base_branch().clone();

        self.vcs
            .reset_hard_and_clean()
            .await
            .map_err(TaskLifecycleError::Reset)?;
        self.vcs
            .checkout(&base_branch)
            .await
            .map_err(|source| TaskLifecycleError::ReturnToBase {
                base: base_branch.clone(),
                source,
            })?;

        current.task.mark_aborted(&*self.clock)?;
        self.registry.save_all(&current.updated_tasks()).await?;
        info!(task = %current.task.name(), base = %base_branch, "aborted task");

        if delete_branch {
            self.vcs
                .delete_branch(current.task.branch())
                .await
                .map_err(TaskLifecycleError::DeleteBranch)?;
            self.registry.save_all(&current.remaining_tasks()).await?;
            info!(task = %current.task.name(), branch = %current.task.branch(), "deleted task branch");
        }

        Ok(TaskAborted {
            name: current.task.name().clone(),
            base_branch,
            branch_deleted: delete_branch,
        })
    }

    /// Deletes stale task branches and removes their records.
    ///
    /// The checked-out branch is never touched. A record leaves the registry
    /// only when its branch existed and was deleted; per-branch failures are
    /// logged and skipped. The registry is written once, and only when
    /// something was removed.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::NotARepository`] outside a repository or
    /// [`TaskLifecycleError::Registry`] when the registry cannot be read or
    /// written.
    pub async fn prune(&self, request: PruneRequest) -> TaskLifecycleResult<PruneReport> {
        self.require_repository().await?;
        let current_branch = self.vcs.current_branch().await;
        let now = self.clock.utc();
        let tasks = self.registry.load_all().await?;

        let mut removed = Vec::new();
        for task in &tasks {
            if current_branch.as_ref() == Some(task.branch()) {
                continue;
            }
            if !is_prunable(task, request, now) {
                continue;
            }
            if !self.vcs.branch_exists(task.branch()).await {
                debug!(branch = %task.branch(), "skipping record whose branch no longer exists");
                continue;
            }
            match self.vcs.delete_branch(task.branch()).await {
                Ok(_) => removed.push(task.clone()),
                Err(err) => {
                    warn!(branch = %task.branch(), error = %err, "could not delete stale task branch");
                }
            }
        }

        if !removed.is_empty() {
            let remaining: Vec<Task> = tasks
                .into_iter()
                .filter(|task| !removed.iter().any(|gone| gone.branch() == task.branch()))
                .collect();
            self.registry.save_all(&remaining).await?;
        }

        info!(count = removed.len(), days = request.days, "pruned task branches");
        Ok(PruneReport {
            removed,
            days: request.days,
        })
    }
}

fn is_prunable(task: &Task, request: PruneRequest, now: DateTime<Utc>) -> bool {
    if request.merged_only && task.status() != TaskStatus::Merged {
        return false;
    }
    task.is_stale(now, request.days)
}
