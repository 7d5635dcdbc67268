//! When steps for task lifecycle BDD scenarios.

use super::world::{TaskLifecycleWorld, run_async};
use codesnap::task::services::{CreateTaskRequest, MergeRequest, MergeStrategy, PruneRequest};
use rstest_bdd_macros::when;

#[when(r#"I start the task "{name}""#)]
fn start_task(world: &mut TaskLifecycleWorld, name: String) {
    let result = run_async(world.service.create_task(CreateTaskRequest::new(name)));
    world.record(result);
}

#[when(r#"I merge the current task with a merge commit and message "{message}""#)]
fn merge_with_commit(world: &mut TaskLifecycleWorld, message: String) {
    let request = MergeRequest::new(MergeStrategy::Commit).with_message(message);
    let result = run_async(world.service.merge(request));
    world.record(result);
}

#[when("I squash-merge the current task")]
fn squash_merge(world: &mut TaskLifecycleWorld) {
    let result = run_async(world.service.merge(MergeRequest::new(MergeStrategy::Squash)));
    world.record(result);
}

#[when("I abort the current task and delete its branch")]
fn abort_and_delete(world: &mut TaskLifecycleWorld) {
    let result = run_async(world.service.abort(true));
    world.record(result);
}

#[when("I prune merged tasks inactive for {days:u32} days")]
fn prune_merged(world: &mut TaskLifecycleWorld, days: u32) {
    let result = run_async(world.service.prune(PruneRequest::new(days).merged_only(true)));
    world.record(result);
}
