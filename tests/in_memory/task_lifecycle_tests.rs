//! In-memory integration tests for task lifecycle flows.

use super::helpers::{Workspace, workspace};
use codesnap::task::{
    adapters::memory::VcsOperation,
    domain::TaskStatus,
    services::{CreateTaskRequest, MergeOutcome, MergeRequest, TaskLifecycleError},
};
use eyre::{bail, ensure};
use rstest::rstest;
use std::collections::BTreeSet;

const FEATURE_BRANCH: &str = "codesnap@task/feature-x";

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn create_on_clean_repository_registers_active_task(
    workspace: Workspace,
) -> eyre::Result<()> {
    workspace
        .service
        .create_task(CreateTaskRequest::new("feature-x"))
        .await?;

    ensure!(workspace.vcs.branch_names().contains(&FEATURE_BRANCH.to_owned()));
    ensure!(workspace.vcs.head().as_deref() == Some(FEATURE_BRANCH));
    let records = workspace.records()?;
    ensure!(records.len() == 1, "expected one record, found {}", records.len());
    let record = records
        .first()
        .ok_or_else(|| eyre::eyre!("missing task record"))?;
    ensure!(record.status() == TaskStatus::Active);
    ensure!(record.base_branch().as_str() == "main");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn dirty_create_leaves_branches_and_records_untouched(
    workspace: Workspace,
) -> eyre::Result<()> {
    workspace.vcs.write_file("notes.txt");
    let branches_before = workspace.vcs.branch_names();

    let result = workspace
        .service
        .create_task(CreateTaskRequest::new("feature-x"))
        .await;

    ensure!(matches!(result, Err(TaskLifecycleError::UncommittedChanges)));
    ensure!(workspace.vcs.branch_names() == branches_before);
    ensure!(workspace.records()?.is_empty());
    ensure!(workspace.vcs.count_calls(VcsOperation::CreateAndCheckout) == 0);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn abort_with_delete_returns_to_main(workspace: Workspace) -> eyre::Result<()> {
    workspace
        .service
        .create_task(CreateTaskRequest::new("feature-x"))
        .await?;

    workspace.service.abort(true).await?;

    ensure!(!workspace.vcs.branch_names().contains(&FEATURE_BRANCH.to_owned()));
    ensure!(workspace.records()?.is_empty());
    ensure!(workspace.vcs.head().as_deref() == Some("main"));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn commit_merge_creates_merge_commit_on_main(workspace: Workspace) -> eyre::Result<()> {
    workspace.start_with_commit("feature-x").await?;

    let outcome = workspace
        .service
        .merge(MergeRequest::from_flags(true, false).with_message("done"))
        .await?;

    ensure!(matches!(outcome, MergeOutcome::Integrated(_)));
    ensure!(workspace.vcs.head().as_deref() == Some("main"));
    ensure!(workspace.vcs.history("main").last().map(String::as_str) == Some("done"));
    let status = workspace.records()?.first().map(|task| task.status());
    ensure!(status == Some(TaskStatus::Merged));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn squash_merge_removes_temporary_branch(workspace: Workspace) -> eyre::Result<()> {
    workspace.start_with_commit("feature-x").await?;

    workspace
        .service
        .merge(MergeRequest::from_flags(false, true))
        .await?;

    ensure!(
        workspace
            .vcs
            .branch_names()
            .iter()
            .all(|branch| !branch.starts_with("temp-"))
    );
    let status = workspace.records()?.first().map(|task| task.status());
    ensure!(status == Some(TaskStatus::Merged));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn squash_failure_at_commit_restores_task_branch(workspace: Workspace) -> eyre::Result<()> {
    workspace.start_with_commit("feature-x").await?;
    workspace
        .vcs
        .fail_on(VcsOperation::CommitStaged, "error: unable to commit");

    let result = workspace
        .service
        .merge(MergeRequest::from_flags(false, true))
        .await;

    ensure!(result.is_err());
    ensure!(workspace.vcs.head().as_deref() == Some(FEATURE_BRANCH));
    ensure!(
        workspace
            .vcs
            .branch_names()
            .iter()
            .all(|branch| !branch.starts_with("temp-"))
    );
    Ok(())
}

#[rstest]
#[case::distinct(&["alpha", "beta", "gamma"])]
#[case::repeated(&["alpha", "alpha", "beta", "alpha"])]
#[tokio::test(flavor = "multi_thread")]
async fn lifecycle_sequences_never_duplicate_branches(
    workspace: Workspace,
    #[case] names: &[&str],
) -> eyre::Result<()> {
    for name in names {
        let created = workspace
            .service
            .create_task(CreateTaskRequest::new(*name))
            .await;
        match created {
            Ok(_) => {
                workspace.vcs.write_file(&format!("{name}.txt"));
                workspace.service.commit(&format!("work on {name}")).await?;
                workspace
                    .service
                    .merge(MergeRequest::from_flags(false, true))
                    .await?;
            }
            Err(TaskLifecycleError::DuplicateTaskBranch(_)) => {}
            Err(err) => bail!("unexpected create failure: {err}"),
        }
        workspace
            .service
            .prune(codesnap::task::services::PruneRequest::new(0).merged_only(true))
            .await?;
    }

    let records = workspace.records()?;
    let branches: BTreeSet<String> = records
        .iter()
        .map(|task| task.branch().as_str().to_owned())
        .collect();
    ensure!(branches.len() == records.len());
    Ok(())
}
