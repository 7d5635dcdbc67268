//! Squash integration as a short-lived saga.
//!
//! Git has no single "squash-merge and integrate" primitive, so the squash is
//! a fixed sequence of dependent steps. Every step is independently
//! fallible. Once the temporary branch may hold work (the squash-merge step
//! onwards) a failure triggers the compensating action: drop any squash
//! result still sitting in the index, check the task branch out again and
//! delete the temporary branch if it exists.
//! Compensation failures are logged and swallowed so the first error is the
//! one reported.

use crate::task::{
    domain::{BranchName, CommitId, TaskDomainError},
    ports::{VcsError, VersionControl},
};
use chrono::{DateTime, Utc};
use std::fmt;
use thiserror::Error;
use tracing::{debug, warn};

/// Upper bound on suffixes tried when the timestamped name is taken.
const MAX_TEMPORARY_SUFFIX: u32 = 100;

/// Ordered steps of the squash saga.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SquashStep {
    /// Check out the base branch.
    CheckoutBase,
    /// Create the temporary branch at the base branch.
    CreateTemporaryBranch,
    /// Squash-merge the task branch into the temporary branch.
    SquashMerge,
    /// Commit the squashed changes on the temporary branch.
    CommitSquash,
    /// Check out the base branch again.
    ReturnToBase,
    /// Fast-forward the base branch to the temporary branch.
    FastForwardBase,
    /// Delete the temporary branch.
    DeleteTemporaryBranch,
}

impl SquashStep {
    /// Returns whether a failure at this step requires compensation.
    ///
    /// Nothing has been created before the squash merge, so the first two
    /// steps fail without cleanup.
    #[must_use]
    pub const fn needs_compensation(self) -> bool {
        !matches!(self, Self::CheckoutBase | Self::CreateTemporaryBranch)
    }

    /// Returns whether a failure at this step can leave staged or conflicted
    /// squash results in the index.
    #[must_use]
    pub const fn leaves_merge_state(self) -> bool {
        matches!(self, Self::SquashMerge | Self::CommitSquash)
    }

    const fn describe(self) -> &'static str {
        match self {
            Self::CheckoutBase => "checking out the base branch",
            Self::CreateTemporaryBranch => "creating the temporary branch",
            Self::SquashMerge => "squash-merging the task branch",
            Self::CommitSquash => "committing the squashed changes",
            Self::ReturnToBase => "returning to the base branch",
            Self::FastForwardBase => "fast-forwarding the base branch",
            Self::DeleteTemporaryBranch => "deleting the temporary branch",
        }
    }
}

impl fmt::Display for SquashStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

/// First failure encountered by the squash saga.
///
/// Displays the adapter's error text unchanged.
#[derive(Debug, Clone, Error)]
#[error("{source}")]
pub struct SquashError {
    step: SquashStep,
    source: VcsError,
}

impl SquashError {
    const fn new(step: SquashStep, source: VcsError) -> Self {
        Self { step, source }
    }

    /// Returns the step that failed.
    #[must_use]
    pub const fn step(&self) -> SquashStep {
        self.step
    }

    /// Returns the adapter failure.
    #[must_use]
    pub const fn vcs_error(&self) -> &VcsError {
        &self.source
    }
}

/// Squash saga bound to one task branch, base branch and temporary branch.
pub(crate) struct SquashSaga<'a, V: VersionControl> {
    vcs: &'a V,
    task_branch: &'a BranchName,
    base_branch: &'a BranchName,
    temporary_branch: BranchName,
}

impl<'a, V: VersionControl> SquashSaga<'a, V> {
    pub(crate) const fn new(
        vcs: &'a V,
        task_branch: &'a BranchName,
        base_branch: &'a BranchName,
        temporary_branch: BranchName,
    ) -> Self {
        Self {
            vcs,
            task_branch,
            base_branch,
            temporary_branch,
        }
    }

    /// Runs every step, compensating on failure.
    ///
    /// On success the base branch is checked out and holds one new commit.
    pub(crate) async fn run(self, message: &str) -> Result<CommitId, SquashError> {
        match self.execute(message).await {
            Ok(commit) => Ok(commit),
            Err(err) => {
                warn!(
                    step = %err.step(),
                    error = %err.vcs_error(),
                    task_branch = %self.task_branch,
                    "squash integration failed"
                );
                if err.step().needs_compensation() {
                    self.compensate(err.step()).await;
                }
                Err(err)
            }
        }
    }

    async fn execute(&self, message: &str) -> Result<CommitId, SquashError> {
        let base = self.base_branch;
        let temporary = &self.temporary_branch;

        self.vcs
            .checkout(base)
            .await
            .map_err(at(SquashStep::CheckoutBase))?;
        self.vcs
            .create_and_checkout(temporary)
            .await
            .map_err(at(SquashStep::CreateTemporaryBranch))?;
        self.vcs
            .squash_merge(self.task_branch)
            .await
            .map_err(at(SquashStep::SquashMerge))?;
        let commit = self
            .vcs
            .commit_staged(message)
            .await
            .map_err(at(SquashStep::CommitSquash))?;
        self.vcs
            .checkout(base)
            .await
            .map_err(at(SquashStep::ReturnToBase))?;
        self.vcs
            .merge_fast_forward(temporary)
            .await
            .map_err(at(SquashStep::FastForwardBase))?;
        self.vcs
            .delete_branch(temporary)
            .await
            .map_err(at(SquashStep::DeleteTemporaryBranch))?;

        debug!(%commit, temporary_branch = %temporary, "squash saga completed");
        Ok(commit)
    }

    async fn compensate(&self, failed: SquashStep) {
        if failed.leaves_merge_state()
            && let Err(err) = self.vcs.discard_merge().await
        {
            warn!(
                temporary_branch = %self.temporary_branch,
                error = %err,
                "could not discard the failed squash result"
            );
        }
        if let Err(err) = self.vcs.checkout(self.task_branch).await {
            warn!(
                task_branch = %self.task_branch,
                error = %err,
                "could not return to the task branch after a failed squash"
            );
        }
        if !self.vcs.branch_exists(&self.temporary_branch).await {
            return;
        }
        if let Err(err) = self.vcs.delete_branch(&self.temporary_branch).await {
            warn!(
                temporary_branch = %self.temporary_branch,
                error = %err,
                "could not delete the temporary squash branch"
            );
        }
    }
}

const fn at(step: SquashStep) -> impl Fn(VcsError) -> SquashError {
    move |source| SquashError::new(step, source)
}

/// Picks a temporary branch name derived from `now` that does not exist yet.
///
/// # Errors
///
/// Returns a domain error only if the derived name is not a valid branch name.
pub(crate) async fn temporary_branch_name<V: VersionControl>(
    vcs: &V,
    now: DateTime<Utc>,
) -> Result<BranchName, TaskDomainError> {
    let stem = format!("temp-{}", now.format("%Y%m%d%H%M%S"));
    let plain = BranchName::new(stem.as_str())?;
    if !vcs.branch_exists(&plain).await {
        return Ok(plain);
    }
    for suffix in 1..=MAX_TEMPORARY_SUFFIX {
        let suffixed = BranchName::new(format!("{stem}-{suffix}"))?;
        if !vcs.branch_exists(&suffixed).await {
            return Ok(suffixed);
        }
    }
    BranchName::new(format!("{stem}-{}", MAX_TEMPORARY_SUFFIX.saturating_add(1)))
}
