//! Then steps for task lifecycle BDD scenarios.

use super::world::TaskLifecycleWorld;
use codesnap::task::domain::TaskStatus;
use rstest_bdd_macros::then;

#[then(r#"the current branch is "{branch}""#)]
fn current_branch_is(world: &TaskLifecycleWorld, branch: String) -> Result<(), eyre::Report> {
    let head = world.vcs.head();
    if head.as_deref() != Some(branch.as_str()) {
        return Err(eyre::eyre!("expected branch {branch}, found {head:?}"));
    }
    Ok(())
}

#[then("the number of registered tasks is {count:usize}")]
fn registered_task_count(world: &TaskLifecycleWorld, count: usize) -> Result<(), eyre::Report> {
    let stored = world.registry.snapshot()?.len();
    if stored != count {
        return Err(eyre::eyre!("expected {count} registered tasks, found {stored}"));
    }
    Ok(())
}

#[then(r#"the task "{name}" has status "{status}""#)]
fn task_has_status(
    world: &TaskLifecycleWorld,
    name: String,
    status: String,
) -> Result<(), eyre::Report> {
    let expected = TaskStatus::try_from(status.as_str())
        .map_err(|err| eyre::eyre!("invalid expected status in scenario: {err}"))?;
    let task = world.task_named(&name)?;
    if task.status() != expected {
        return Err(eyre::eyre!(
            "expected status {}, found {}",
            expected.as_str(),
            task.status().as_str()
        ));
    }
    Ok(())
}

#[then(r#"the task "{name}" has base branch "{branch}""#)]
fn task_has_base_branch(
    world: &TaskLifecycleWorld,
    name: String,
    branch: String,
) -> Result<(), eyre::Report> {
    let task = world.task_named(&name)?;
    if task.base_branch().as_str() != branch {
        return Err(eyre::eyre!(
            "expected base branch {branch}, found {}",
            task.base_branch()
        ));
    }
    Ok(())
}

#[then(r#"the operation fails with "{message}""#)]
fn operation_fails_with(world: &TaskLifecycleWorld, message: String) -> Result<(), eyre::Report> {
    match world.last_error.as_deref() {
        Some(actual) if actual == message => Ok(()),
        other => Err(eyre::eyre!("expected failure '{message}', got {other:?}")),
    }
}

#[then(r#"the branch "{branch}" does not exist"#)]
fn branch_missing(world: &TaskLifecycleWorld, branch: String) -> Result<(), eyre::Report> {
    if world.vcs.branch_names().contains(&branch) {
        return Err(eyre::eyre!("branch {branch} still exists"));
    }
    Ok(())
}

#[then(r#"the last commit on "{branch}" is "{message}""#)]
fn last_commit_is(
    world: &TaskLifecycleWorld,
    branch: String,
    message: String,
) -> Result<(), eyre::Report> {
    let history = world.vcs.history(&branch);
    if history.last() != Some(&message) {
        return Err(eyre::eyre!("expected last commit '{message}', found {:?}", history.last()));
    }
    Ok(())
}

#[then("no temporary branch remains")]
fn no_temporary_branch(world: &TaskLifecycleWorld) -> Result<(), eyre::Report> {
    let leftovers: Vec<String> = world
        .vcs
        .branch_names()
        .into_iter()
        .filter(|branch| branch.starts_with("temp-"))
        .collect();
    if !leftovers.is_empty() {
        return Err(eyre::eyre!("temporary branches remain: {leftovers:?}"));
    }
    Ok(())
}
