//! Given steps for task lifecycle BDD scenarios.

use super::world::{TaskLifecycleWorld, run_async};
use codesnap::task::{
    adapters::memory::VcsOperation,
    domain::BranchName,
    ports::VersionControl,
    services::{CreateTaskRequest, MergeRequest, MergeStrategy},
};
use eyre::WrapErr;
use rstest_bdd_macros::given;

#[given(r#"a clean repository on branch "{branch}""#)]
fn clean_repository(world: &mut TaskLifecycleWorld, branch: String) {
    *world = TaskLifecycleWorld::on_branch(&branch);
}

#[given(r#"the file "{path}" has uncommitted changes"#)]
fn file_has_changes(world: &mut TaskLifecycleWorld, path: String) {
    world.vcs.write_file(&path);
}

#[given(r#"an active task "{name}" with one commit"#)]
fn active_task_with_commit(world: &mut TaskLifecycleWorld, name: String) -> Result<(), eyre::Report> {
    run_async(world.service.create_task(CreateTaskRequest::new(name.as_str())))
        .wrap_err("create task for scenario setup")?;
    world.vcs.write_file(&format!("{name}.txt"));
    run_async(world.service.commit(&format!("work on {name}")))
        .wrap_err("commit on task branch for scenario setup")?;
    Ok(())
}

#[given("the current task has been merged")]
fn current_task_merged(world: &mut TaskLifecycleWorld) -> Result<(), eyre::Report> {
    run_async(world.service.merge(MergeRequest::new(MergeStrategy::Commit)))
        .wrap_err("merge task for scenario setup")?;
    Ok(())
}

#[given(r#"the branch "{branch}" is checked out"#)]
fn branch_checked_out(world: &mut TaskLifecycleWorld, branch: String) -> Result<(), eyre::Report> {
    let name = BranchName::new(branch)?;
    run_async(world.vcs.checkout(&name)).wrap_err("checkout for scenario setup")?;
    Ok(())
}

#[given(r#"the squash commit fails with "{message}""#)]
fn squash_commit_fails(world: &mut TaskLifecycleWorld, message: String) {
    world.vcs.fail_on(VcsOperation::CommitStaged, &message);
}

#[given(r#"merging "{branch}" conflicts"#)]
fn merging_conflicts(world: &mut TaskLifecycleWorld, branch: String) {
    world.vcs.set_conflict(&branch);
}
