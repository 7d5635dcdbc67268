//! In-memory integration tests for prune.

use super::helpers::{Workspace, workspace};
use codesnap::task::{
    domain::{BranchName, TaskStatus},
    ports::VersionControl,
    services::{MergeRequest, PruneRequest},
};
use eyre::ensure;
use rstest::rstest;

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn prune_spares_checked_out_task(workspace: Workspace) -> eyre::Result<()> {
    workspace.start_with_commit("first").await?;
    workspace
        .vcs
        .checkout(&BranchName::new("main")?)
        .await?;
    workspace.start_with_commit("second").await?;

    let report = workspace.service.prune(PruneRequest::new(0)).await?;

    ensure!(report.count() == 1);
    let names: Vec<String> = workspace
        .records()?
        .iter()
        .map(|task| task.name().as_str().to_owned())
        .collect();
    ensure!(names == vec!["second".to_owned()]);
    ensure!(
        workspace
            .vcs
            .branch_names()
            .contains(&"codesnap@task/second".to_owned())
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn prune_merged_only_ignores_stale_active_tasks(workspace: Workspace) -> eyre::Result<()> {
    workspace.start_with_commit("merged-one").await?;
    workspace
        .service
        .merge(MergeRequest::from_flags(true, false))
        .await?;
    workspace.start_with_commit("active-one").await?;
    workspace
        .vcs
        .checkout(&BranchName::new("main")?)
        .await?;

    let report = workspace
        .service
        .prune(PruneRequest::new(0).merged_only(true))
        .await?;

    ensure!(report.count() == 1);
    ensure!(
        report
            .removed
            .iter()
            .all(|task| task.status() == TaskStatus::Merged)
    );
    let remaining = workspace.records()?;
    ensure!(remaining.len() == 1);
    ensure!(
        remaining
            .first()
            .is_some_and(|task| task.status() == TaskStatus::Active)
    );
    Ok(())
}
