//! Service orchestration tests for starting tasks, committing and inspection.

use super::support::{Harness, start_time};
use crate::task::{
    adapters::memory::{InMemoryTaskRegistry, InMemoryVersionControl, VcsOperation},
    domain::{BranchName, Task, TaskId, TaskStatus},
    ports::{TaskRegistryError, VersionControl},
    services::{CreateTaskRequest, TaskLifecycleError},
};
use eyre::ensure;
use rstest::{fixture, rstest};

#[fixture]
fn harness() -> Harness {
    Harness::on_branch("main")
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn create_task_forks_branch_and_records_active_task(harness: Harness) -> eyre::Result<()> {
    let created = harness
        .service
        .create_task(CreateTaskRequest::new("feature-x").with_description("Parser cleanup"))
        .await?;

    let task = &created.task;
    ensure!(task.id() == TaskId::FIRST);
    ensure!(task.branch().as_str() == "codesnap@task/feature-x");
    ensure!(task.base_branch().as_str() == "main");
    ensure!(task.status() == TaskStatus::Active);
    ensure!(task.commits() == 0);
    ensure!(task.created() == start_time());
    ensure!(harness.vcs.head().as_deref() == Some("codesnap@task/feature-x"));
    ensure!(harness.records() == vec![task.clone()]);
    ensure!(
        created.to_string()
            == "Created task branch 'codesnap@task/feature-x'\nDescription: Parser cleanup\nCreated: 2024-05-01 09:30:00"
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn create_task_uses_explicit_base_branch(harness: Harness) -> eyre::Result<()> {
    harness.vcs.add_branch("develop", "main");

    let created = harness
        .service
        .create_task(CreateTaskRequest::new("feature-y").with_base_branch("develop"))
        .await?;

    ensure!(created.task.base_branch().as_str() == "develop");
    ensure!(created.to_string().contains("Description: None"));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn create_task_assigns_increasing_ids(harness: Harness) -> eyre::Result<()> {
    harness
        .service
        .create_task(CreateTaskRequest::new("first"))
        .await?;
    let second = harness
        .service
        .create_task(CreateTaskRequest::new("second").with_base_branch("main"))
        .await?;

    ensure!(second.task.id().value() == 2);
    ensure!(harness.records().len() == 2);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn create_task_rejects_dirty_tree_without_side_effects(harness: Harness) {
    harness.vcs.write_file("notes.txt");
    let branches_before = harness.vcs.branch_names();

    let result = harness
        .service
        .create_task(CreateTaskRequest::new("feature-x"))
        .await;

    assert!(matches!(result, Err(TaskLifecycleError::UncommittedChanges)));
    assert_eq!(
        result.map(|created| created.task).err().map(|err| err.to_string()),
        Some("You have uncommitted changes. Use --force to proceed anyway".to_owned())
    );
    assert_eq!(harness.vcs.branch_names(), branches_before);
    assert!(harness.records().is_empty());
    assert!(harness.vcs.calls().is_empty());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn create_task_with_force_carries_dirty_changes(harness: Harness) -> eyre::Result<()> {
    harness.vcs.write_file("notes.txt");

    harness
        .service
        .create_task(CreateTaskRequest::new("feature-x").forced(true))
        .await?;

    ensure!(harness.vcs.head().as_deref() == Some("codesnap@task/feature-x"));
    ensure!(harness.records().len() == 1);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn create_task_requires_a_repository() {
    let harness = Harness::with_parts(InMemoryTaskRegistry::new(), InMemoryVersionControl::new());

    let result = harness
        .service
        .create_task(CreateTaskRequest::new("feature-x"))
        .await;

    assert!(matches!(result, Err(TaskLifecycleError::NotARepository)));
    assert!(harness.records().is_empty());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn create_task_rejects_missing_base_branch(harness: Harness) {
    let result = harness
        .service
        .create_task(CreateTaskRequest::new("feature-x").with_base_branch("develop"))
        .await;

    let message = result.as_ref().err().map(ToString::to_string);
    assert!(matches!(result, Err(TaskLifecycleError::BaseBranchMissing(_))));
    assert_eq!(message.as_deref(), Some("Base branch 'develop' does not exist"));
    assert_eq!(harness.vcs.branch_names(), vec!["main".to_owned()]);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn create_task_rejects_blank_name(harness: Harness) {
    let result = harness
        .service
        .create_task(CreateTaskRequest::new("   "))
        .await;

    assert!(matches!(result, Err(TaskLifecycleError::Domain(_))));
    assert!(harness.vcs.calls().is_empty());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn create_task_rejects_registered_branch(harness: Harness) -> eyre::Result<()> {
    harness
        .service
        .create_task(CreateTaskRequest::new("feature-x"))
        .await?;
    let calls_before = harness.vcs.calls().len();

    let result = harness
        .service
        .create_task(CreateTaskRequest::new("feature-x").with_base_branch("main"))
        .await;

    ensure!(matches!(result, Err(TaskLifecycleError::DuplicateTaskBranch(_))));
    ensure!(harness.vcs.calls().len() == calls_before);
    ensure!(harness.records().len() == 1);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn create_task_records_nothing_when_branch_creation_fails(harness: Harness) {
    harness
        .vcs
        .fail_on(VcsOperation::CreateAndCheckout, "fatal: cannot lock ref");

    let result = harness
        .service
        .create_task(CreateTaskRequest::new("feature-x"))
        .await;

    let message = result.as_ref().err().map(ToString::to_string);
    assert_eq!(
        message.as_deref(),
        Some("Failed to create task branch: fatal: cannot lock ref")
    );
    assert!(harness.records().is_empty());
    assert_eq!(harness.vcs.head().as_deref(), Some("main"));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn create_task_reports_base_checkout_failure(harness: Harness) {
    harness
        .vcs
        .fail_on_branch(VcsOperation::Checkout, "main", "error: checkout blocked");

    let result = harness
        .service
        .create_task(CreateTaskRequest::new("feature-x"))
        .await;

    let message = result.as_ref().err().map(ToString::to_string);
    assert_eq!(
        message.as_deref(),
        Some("Failed to checkout base branch: error: checkout blocked")
    );
    assert_eq!(harness.vcs.branch_names(), vec!["main".to_owned()]);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn create_task_removes_branch_when_registry_save_fails(harness: Harness) -> eyre::Result<()> {
    harness.registry.fail_saves(Some("disk full"))?;

    let result = harness
        .service
        .create_task(CreateTaskRequest::new("feature-x"))
        .await;

    ensure!(matches!(
        result,
        Err(TaskLifecycleError::Registry(TaskRegistryError::Persistence(_)))
    ));
    ensure!(harness.vcs.branch_names() == vec!["main".to_owned()]);
    ensure!(harness.vcs.head().as_deref() == Some("main"));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn commit_reports_branch_and_short_hash(harness: Harness) -> eyre::Result<()> {
    harness
        .service
        .create_task(CreateTaskRequest::new("feature-x"))
        .await?;
    harness.vcs.write_file("parser.rs");

    let committed = harness.service.commit("Tidy parser").await?;

    ensure!(committed.commit.as_str().len() == 7);
    ensure!(
        committed.to_string()
            == format!("[codesnap@task/feature-x {}] Tidy parser", committed.commit)
    );
    ensure!(harness.service.working_tree_status().await?.is_empty());
    ensure!(harness.records().first().map(Task::commits) == Some(0));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn commit_rejects_clean_tree(harness: Harness) -> eyre::Result<()> {
    harness
        .service
        .create_task(CreateTaskRequest::new("feature-x"))
        .await?;

    let result = harness.service.commit("nothing").await;

    ensure!(matches!(result, Err(TaskLifecycleError::NoChangesToCommit)));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn commit_rejects_non_task_branch(harness: Harness) {
    harness.vcs.write_file("parser.rs");

    let result = harness.service.commit("Tidy parser").await;

    assert!(matches!(result, Err(TaskLifecycleError::NotOnTaskBranch)));
    assert_eq!(harness.vcs.count_calls(VcsOperation::CommitAll), 0);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn commit_wraps_adapter_failure(harness: Harness) -> eyre::Result<()> {
    harness
        .service
        .create_task(CreateTaskRequest::new("feature-x"))
        .await?;
    harness.vcs.write_file("parser.rs");
    harness
        .vcs
        .fail_on(VcsOperation::CommitAll, "pre-commit hook rejected");

    let result = harness.service.commit("Tidy parser").await;

    let message = result.as_ref().err().map(ToString::to_string);
    ensure!(message.as_deref() == Some("Failed to commit: pre-commit hook rejected"));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn current_task_resolves_registered_branch(harness: Harness) -> eyre::Result<()> {
    ensure!(harness.service.current_task().await?.is_none());

    let created = harness
        .service
        .create_task(CreateTaskRequest::new("feature-x"))
        .await?;

    ensure!(harness.service.current_task().await? == Some(created.task));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn log_and_diff_compare_against_task_base(harness: Harness) -> eyre::Result<()> {
    harness.vcs.add_branch("develop", "main");
    harness
        .service
        .create_task(CreateTaskRequest::new("feature-x").with_base_branch("develop"))
        .await?;
    harness.vcs.write_file("parser.rs");
    harness.service.commit("Tidy parser").await?;

    let log = harness.service.task_log(false).await?;
    let graph = harness.service.task_log(true).await?;
    let diff = harness.service.task_diff().await?;

    ensure!(log.len() == 1);
    ensure!(log.first().is_some_and(|line| line.ends_with(" Tidy parser")));
    ensure!(graph.first().is_some_and(|line| line.starts_with("* ")));
    ensure!(diff.contains("parser.rs"));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn log_falls_back_to_main_branch_off_task(harness: Harness) -> eyre::Result<()> {
    harness.vcs.add_branch("spike", "main");
    harness.vcs.commit_on("spike", "Spike commit", "spike.rs");
    harness.vcs.checkout(&BranchName::new("spike")?).await?;

    let log = harness.service.task_log(false).await?;

    ensure!(log.len() == 1);
    ensure!(log.first().is_some_and(|line| line.ends_with("Spike commit")));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn log_without_main_branch_reports_unknown_branches() {
    let harness = Harness::with_parts(
        InMemoryTaskRegistry::new(),
        InMemoryVersionControl::with_branch("trunk"),
    );

    let result = harness.service.task_log(false).await;

    assert!(matches!(result, Err(TaskLifecycleError::UnknownBranches)));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn initialize_repository_creates_initial_commit() -> eyre::Result<()> {
    let harness = Harness::with_parts(InMemoryTaskRegistry::new(), InMemoryVersionControl::new());

    harness.service.initialize_repository("master").await?;

    ensure!(harness.vcs.head().as_deref() == Some("master"));
    ensure!(harness.vcs.history("master") == vec!["Initial commit".to_owned()]);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn initialize_repository_rejects_existing_repository(harness: Harness) {
    let result = harness.service.initialize_repository("master").await;

    let message = result.as_ref().err().map(ToString::to_string);
    assert_eq!(message.as_deref(), Some("Already in a Git repository"));
    assert_eq!(harness.vcs.count_calls(VcsOperation::Initialize), 0);
}
