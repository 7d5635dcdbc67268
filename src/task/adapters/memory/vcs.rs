//! In-memory version control for lifecycle tests.
//!
//! Models just enough of a repository to exercise every lifecycle path:
//! branches are linear commit histories, the working tree and the index are
//! sets of changed paths, and merges copy the commits (or paths) the target
//! lacks. Failures
//! can be injected per operation and optionally per branch, and every
//! mutating call is journaled so tests can assert on call order.

use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::task::{
    domain::{BranchName, CommitId},
    ports::{VcsError, VcsResult, VersionControl},
};

/// Journaled version-control operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VcsOperation {
    /// Repository initialization.
    Initialize,
    /// Branch creation followed by checkout.
    CreateAndCheckout,
    /// Branch checkout.
    Checkout,
    /// Stage-all commit.
    CommitAll,
    /// Commit of the index only.
    CommitStaged,
    /// No-commit, no-fast-forward merge.
    MergeNoCommit,
    /// Merge abort.
    AbortMerge,
    /// Index reset after a failed merge or squash.
    DiscardMerge,
    /// Merge with an explicit merge commit.
    MergeWithCommit,
    /// Squash merge.
    SquashMerge,
    /// Fast-forward-only merge.
    MergeFastForward,
    /// Hard reset plus clean.
    ResetHardAndClean,
    /// Branch deletion.
    DeleteBranch,
    /// Log between two branches.
    LogBetween,
    /// Diff between two branches.
    DiffBetween,
}

/// One journaled call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VcsCall {
    /// Operation invoked.
    pub operation: VcsOperation,
    /// Branch argument, when the operation takes one.
    pub target: Option<String>,
}

#[derive(Debug, Clone)]
struct FakeCommit {
    id: String,
    message: String,
    paths: BTreeSet<String>,
}

#[derive(Debug, Clone)]
struct FailureRule {
    operation: VcsOperation,
    branch: Option<String>,
    message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PendingMerge {
    Clean,
    Conflicted,
}

#[derive(Debug)]
struct RepositoryState {
    initialized: bool,
    head: Option<String>,
    branches: BTreeMap<String, Vec<FakeCommit>>,
    dirty: BTreeSet<String>,
    staged: BTreeSet<String>,
    pending_merge: Option<PendingMerge>,
    conflicting_branches: BTreeSet<String>,
    failures: Vec<FailureRule>,
    calls: Vec<VcsCall>,
    main_branch_candidates: Vec<String>,
    commit_counter: u64,
}

impl Default for RepositoryState {
    fn default() -> Self {
        Self {
            initialized: false,
            head: None,
            branches: BTreeMap::new(),
            dirty: BTreeSet::new(),
            staged: BTreeSet::new(),
            pending_merge: None,
            conflicting_branches: BTreeSet::new(),
            failures: Vec::new(),
            calls: Vec::new(),
            main_branch_candidates: vec!["master".to_owned(), "main".to_owned()],
            commit_counter: 0,
        }
    }
}

impl RepositoryState {
    fn record(&mut self, operation: VcsOperation, target: Option<&str>) -> VcsResult<()> {
        self.calls.push(VcsCall {
            operation,
            target: target.map(str::to_owned),
        });
        let failure = self.failures.iter().find(|rule| {
            rule.operation == operation
                && rule
                    .branch
                    .as_deref()
                    .is_none_or(|branch| Some(branch) == target)
        });
        match failure {
            Some(rule) => Err(VcsError::command(rule.message.clone())),
            None => Ok(()),
        }
    }

    fn require_initialized(&self) -> VcsResult<()> {
        if self.initialized {
            Ok(())
        } else {
            Err(VcsError::NotARepository)
        }
    }

    fn head_name(&self) -> VcsResult<String> {
        self.head
            .clone()
            .ok_or_else(|| VcsError::command("fatal: HEAD does not point to a branch"))
    }

    fn history(&self, branch: &str) -> VcsResult<&Vec<FakeCommit>> {
        self.branches.get(branch).ok_or_else(|| {
            VcsError::command(format!(
                "fatal: ambiguous argument '{branch}': unknown revision or path not in the working tree."
            ))
        })
    }

    /// Commits reachable from `head` but not from `base`, oldest first.
    fn commits_missing_from(&self, base: &str, head: &str) -> VcsResult<Vec<FakeCommit>> {
        let known: BTreeSet<&str> = self
            .history(base)?
            .iter()
            .map(|commit| commit.id.as_str())
            .collect();
        Ok(self
            .history(head)?
            .iter()
            .filter(|commit| !known.contains(commit.id.as_str()))
            .cloned()
            .collect())
    }

    fn next_commit(&mut self, message: &str, paths: BTreeSet<String>) -> FakeCommit {
        self.commit_counter = self.commit_counter.saturating_add(1);
        FakeCommit {
            id: format!("{:07x}{:033x}", 0x00c0_ffee_u64.wrapping_add(self.commit_counter), 0),
            message: message.to_owned(),
            paths,
        }
    }

    fn push_commit(&mut self, branch: &str, commit: FakeCommit) -> VcsResult<()> {
        let Some(history) = self.branches.get_mut(branch) else {
            return Err(VcsError::command(format!(
                "error: branch '{branch}' not found."
            )));
        };
        history.push(commit);
        Ok(())
    }

    fn commit_paths(&mut self, message: &str, paths: BTreeSet<String>) -> VcsResult<CommitId> {
        let head = self.head_name()?;
        let commit = self.next_commit(message, paths);
        let id = CommitId::abbreviated(&commit.id);
        self.push_commit(&head, commit)?;
        self.pending_merge = None;
        Ok(id)
    }

    fn conflict(&mut self, source: &str) -> VcsResult<()> {
        if !self.conflicting_branches.contains(source) {
            return Ok(());
        }
        self.pending_merge = Some(PendingMerge::Conflicted);
        self.staged.insert(format!("{source}.conflict"));
        Err(VcsError::command(format!(
            "CONFLICT (content): Merge conflict in {source}.conflict\nAutomatic merge failed; fix conflicts and then commit the result."
        )))
    }
}

/// Thread-safe in-memory repository.
///
/// Clones share state, so a test can keep a handle for inspection after
/// passing one to the service.
#[derive(Debug, Clone, Default)]
pub struct InMemoryVersionControl {
    state: Arc<RwLock<RepositoryState>>,
}

impl InMemoryVersionControl {
    /// Creates a directory that is not yet a repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an initialized repository with `branch` checked out and one
    /// initial commit.
    #[must_use]
    pub fn with_branch(branch: &str) -> Self {
        let vcs = Self::new();
        {
            let mut state = vcs.write();
            state.initialized = true;
            let initial = state.next_commit("Initial commit", BTreeSet::from([".gitignore".to_owned()]));
            state.branches.insert(branch.to_owned(), vec![initial]);
            state.head = Some(branch.to_owned());
        }
        vcs
    }

    /// Replaces the main-branch candidate list.
    #[must_use]
    pub fn with_main_branch_candidates(self, candidates: &[&str]) -> Self {
        self.write().main_branch_candidates =
            candidates.iter().map(|name| (*name).to_owned()).collect();
        self
    }

    /// Creates `branch` at the tip of `from` without checking it out.
    pub fn add_branch(&self, branch: &str, from: &str) {
        let mut state = self.write();
        let history = state.branches.get(from).cloned().unwrap_or_default();
        state.branches.insert(branch.to_owned(), history);
    }

    /// Marks `path` as modified in the working tree.
    pub fn write_file(&self, path: &str) {
        self.write().dirty.insert(path.to_owned());
    }

    /// Appends a commit touching `path` directly to `branch`.
    pub fn commit_on(&self, branch: &str, message: &str, path: &str) {
        let mut state = self.write();
        let commit = state.next_commit(message, BTreeSet::from([path.to_owned()]));
        if let Some(history) = state.branches.get_mut(branch) {
            history.push(commit);
        }
    }

    /// Makes every merge of `branch` conflict.
    pub fn set_conflict(&self, branch: &str) {
        self.write().conflicting_branches.insert(branch.to_owned());
    }

    /// Makes every call of `operation` fail with `message`.
    pub fn fail_on(&self, operation: VcsOperation, message: &str) {
        self.write().failures.push(FailureRule {
            operation,
            branch: None,
            message: message.to_owned(),
        });
    }

    /// Makes calls of `operation` targeting `branch` fail with `message`.
    pub fn fail_on_branch(&self, operation: VcsOperation, branch: &str, message: &str) {
        self.write().failures.push(FailureRule {
            operation,
            branch: Some(branch.to_owned()),
            message: message.to_owned(),
        });
    }

    /// Removes every injected failure.
    pub fn clear_failures(&self) {
        self.write().failures.clear();
    }

    /// Returns every branch name in lexical order.
    #[must_use]
    pub fn branch_names(&self) -> Vec<String> {
        self.read().branches.keys().cloned().collect()
    }

    /// Returns the checked-out branch name.
    #[must_use]
    pub fn head(&self) -> Option<String> {
        self.read().head.clone()
    }

    /// Returns the commit messages of `branch`, oldest first.
    #[must_use]
    pub fn history(&self, branch: &str) -> Vec<String> {
        self.read()
            .branches
            .get(branch)
            .map(|history| history.iter().map(|commit| commit.message.clone()).collect())
            .unwrap_or_default()
    }

    /// Returns the paths staged in the index.
    #[must_use]
    pub fn staged_paths(&self) -> Vec<String> {
        self.read().staged.iter().cloned().collect()
    }

    /// Returns the paths of the newest commit on `branch`.
    #[must_use]
    pub fn tip_paths(&self, branch: &str) -> Vec<String> {
        self.read()
            .branches
            .get(branch)
            .and_then(|history| history.last())
            .map(|commit| commit.paths.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Returns whether a merge is in progress.
    #[must_use]
    pub fn has_pending_merge(&self) -> bool {
        self.read().pending_merge.is_some()
    }

    /// Returns the journaled calls, oldest first.
    #[must_use]
    pub fn calls(&self) -> Vec<VcsCall> {
        self.read().calls.clone()
    }

    /// Returns how many journaled calls used `operation`.
    #[must_use]
    pub fn count_calls(&self, operation: VcsOperation) -> usize {
        self.read()
            .calls
            .iter()
            .filter(|call| call.operation == operation)
            .count()
    }

    fn read(&self) -> RwLockReadGuard<'_, RepositoryState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, RepositoryState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl VersionControl for InMemoryVersionControl {
    async fn is_repository(&self) -> bool {
        self.read().initialized
    }

    async fn initialize(&self, main_branch: &BranchName) -> VcsResult<String> {
        let mut state = self.write();
        state.record(VcsOperation::Initialize, Some(main_branch.as_str()))?;
        if state.initialized {
            return Err(VcsError::command("repository already initialized"));
        }
        state.initialized = true;
        let initial = state.next_commit("Initial commit", BTreeSet::from([".gitignore".to_owned()]));
        state
            .branches
            .insert(main_branch.as_str().to_owned(), vec![initial]);
        state.head = Some(main_branch.as_str().to_owned());
        Ok(format!("Initialized repository on {main_branch}"))
    }

    async fn current_branch(&self) -> Option<BranchName> {
        let state = self.read();
        if !state.initialized {
            return None;
        }
        state
            .head
            .as_deref()
            .and_then(|head| BranchName::new(head).ok())
    }

    async fn branch_exists(&self, name: &BranchName) -> bool {
        self.read().branches.contains_key(name.as_str())
    }

    async fn create_and_checkout(&self, name: &BranchName) -> VcsResult<String> {
        let mut state = self.write();
        state.record(VcsOperation::CreateAndCheckout, Some(name.as_str()))?;
        state.require_initialized()?;
        if state.branches.contains_key(name.as_str()) {
            return Err(VcsError::command(format!(
                "fatal: a branch named '{name}' already exists"
            )));
        }
        let head = state.head_name()?;
        let history = state.history(&head)?.clone();
        state.branches.insert(name.as_str().to_owned(), history);
        state.head = Some(name.as_str().to_owned());
        Ok(format!("Switched to a new branch '{name}'"))
    }

    async fn checkout(&self, name: &BranchName) -> VcsResult<String> {
        let mut state = self.write();
        state.record(VcsOperation::Checkout, Some(name.as_str()))?;
        state.require_initialized()?;
        if !state.branches.contains_key(name.as_str()) {
            return Err(VcsError::command(format!(
                "error: pathspec '{name}' did not match any file(s) known to git"
            )));
        }
        if state.pending_merge == Some(PendingMerge::Conflicted) {
            return Err(VcsError::command(
                "error: you need to resolve your current index first",
            ));
        }
        state.head = Some(name.as_str().to_owned());
        Ok(format!("Switched to branch '{name}'"))
    }

    async fn working_tree_status(&self) -> String {
        let state = self.read();
        let (staged_marker, dirty_marker) =
            if state.pending_merge == Some(PendingMerge::Conflicted) {
                ("UU", "UU")
            } else {
                ("M ", " M")
            };
        let staged = state
            .staged
            .iter()
            .map(|path| format!("{staged_marker} {path}"));
        let dirty = state
            .dirty
            .iter()
            .filter(|path| !state.staged.contains(*path))
            .map(|path| format!("{dirty_marker} {path}"));
        staged.chain(dirty).collect::<Vec<_>>().join("\n")
    }

    async fn commit_all(&self, message: &str) -> VcsResult<CommitId> {
        let mut state = self.write();
        state.record(VcsOperation::CommitAll, None)?;
        state.require_initialized()?;
        if state.pending_merge == Some(PendingMerge::Conflicted) {
            return Err(VcsError::command(
                "error: Committing is not possible because you have unmerged files.",
            ));
        }
        if state.dirty.is_empty() && state.staged.is_empty() {
            return Err(VcsError::command("nothing to commit, working tree clean"));
        }
        let mut paths = std::mem::take(&mut state.dirty);
        paths.append(&mut state.staged);
        state.commit_paths(message, paths)
    }

    async fn commit_staged(&self, message: &str) -> VcsResult<CommitId> {
        let mut state = self.write();
        state.record(VcsOperation::CommitStaged, None)?;
        state.require_initialized()?;
        if state.pending_merge == Some(PendingMerge::Conflicted) {
            return Err(VcsError::command(
                "error: Committing is not possible because you have unmerged files.",
            ));
        }
        if state.staged.is_empty() {
            return Err(VcsError::command(
                "nothing added to commit but untracked files present",
            ));
        }
        let paths = std::mem::take(&mut state.staged);
        state.commit_paths(message, paths)
    }

    async fn merge_no_commit(&self, branch: &BranchName) -> VcsResult<String> {
        let mut state = self.write();
        state.record(VcsOperation::MergeNoCommit, Some(branch.as_str()))?;
        state.require_initialized()?;
        let head = state.head_name()?;
        let incoming = state.commits_missing_from(&head, branch.as_str())?;
        state.conflict(branch.as_str())?;
        if incoming.is_empty() {
            return Ok("Already up to date.".to_owned());
        }
        let paths: Vec<String> = incoming
            .iter()
            .flat_map(|commit| commit.paths.iter().cloned())
            .collect();
        state.dirty.extend(paths);
        state.pending_merge = Some(PendingMerge::Clean);
        Ok("Automatic merge went well; stopped before committing as requested".to_owned())
    }

    async fn abort_merge(&self) -> VcsResult<String> {
        let mut state = self.write();
        state.record(VcsOperation::AbortMerge, None)?;
        if state.pending_merge.take().is_none() {
            return Err(VcsError::command(
                "fatal: There is no merge to abort (MERGE_HEAD missing).",
            ));
        }
        state.dirty.clear();
        state.staged.clear();
        Ok(String::new())
    }

    async fn discard_merge(&self) -> VcsResult<String> {
        let mut state = self.write();
        state.record(VcsOperation::DiscardMerge, None)?;
        state.require_initialized()?;
        state.staged.clear();
        state.pending_merge = None;
        Ok(String::new())
    }

    async fn merge_with_commit(&self, branch: &BranchName, message: &str) -> VcsResult<CommitId> {
        let mut state = self.write();
        state.record(VcsOperation::MergeWithCommit, Some(branch.as_str()))?;
        state.require_initialized()?;
        let head = state.head_name()?;
        let incoming = state.commits_missing_from(&head, branch.as_str())?;
        state.conflict(branch.as_str())?;
        if incoming.is_empty() {
            let tip = state
                .history(&head)?
                .last()
                .map(|commit| CommitId::abbreviated(&commit.id))
                .ok_or_else(|| VcsError::command("fatal: empty branch"))?;
            return Ok(tip);
        }
        for commit in incoming {
            state.push_commit(&head, commit)?;
        }
        let merge = state.next_commit(message, BTreeSet::new());
        let id = CommitId::abbreviated(&merge.id);
        state.push_commit(&head, merge)?;
        Ok(id)
    }

    async fn squash_merge(&self, branch: &BranchName) -> VcsResult<String> {
        let mut state = self.write();
        state.record(VcsOperation::SquashMerge, Some(branch.as_str()))?;
        state.require_initialized()?;
        let head = state.head_name()?;
        let incoming = state.commits_missing_from(&head, branch.as_str())?;
        state.conflict(branch.as_str())?;
        if incoming.is_empty() {
            return Ok("Already up to date.".to_owned());
        }
        let paths: Vec<String> = incoming
            .iter()
            .flat_map(|commit| commit.paths.iter().cloned())
            .collect();
        state.staged.extend(paths);
        Ok("Squash commit -- not updating HEAD".to_owned())
    }

    async fn merge_fast_forward(&self, branch: &BranchName) -> VcsResult<String> {
        let mut state = self.write();
        state.record(VcsOperation::MergeFastForward, Some(branch.as_str()))?;
        state.require_initialized()?;
        let head = state.head_name()?;
        let current = state.history(&head)?.clone();
        let source = state.history(branch.as_str())?.clone();
        let is_ancestor = current.len() <= source.len()
            && current
                .iter()
                .zip(source.iter())
                .all(|(ours, theirs)| ours.id == theirs.id);
        if !is_ancestor {
            return Err(VcsError::command(
                "fatal: Not possible to fast-forward, aborting.",
            ));
        }
        state.branches.insert(head, source);
        Ok("Fast-forward".to_owned())
    }

    async fn reset_hard_and_clean(&self) -> VcsResult<String> {
        let mut state = self.write();
        state.record(VcsOperation::ResetHardAndClean, None)?;
        state.require_initialized()?;
        state.dirty.clear();
        state.staged.clear();
        state.pending_merge = None;
        Ok("HEAD is now at tip".to_owned())
    }

    async fn delete_branch(&self, name: &BranchName) -> VcsResult<String> {
        let mut state = self.write();
        state.record(VcsOperation::DeleteBranch, Some(name.as_str()))?;
        state.require_initialized()?;
        if state.head.as_deref() == Some(name.as_str()) {
            return Err(VcsError::command(format!(
                "error: Cannot delete branch '{name}' checked out"
            )));
        }
        if state.branches.remove(name.as_str()).is_none() {
            return Err(VcsError::command(format!(
                "error: branch '{name}' not found."
            )));
        }
        Ok(format!("Deleted branch {name}"))
    }

    async fn log_between(
        &self,
        base: &BranchName,
        head: &BranchName,
        graph: bool,
    ) -> VcsResult<Vec<String>> {
        let mut state = self.write();
        state.record(VcsOperation::LogBetween, Some(head.as_str()))?;
        state.require_initialized()?;
        let commits = state.commits_missing_from(base.as_str(), head.as_str())?;
        let marker = if graph { "* " } else { "" };
        Ok(commits
            .iter()
            .rev()
            .map(|commit| {
                format!(
                    "{marker}{} {}",
                    CommitId::abbreviated(&commit.id),
                    commit.message
                )
            })
            .collect())
    }

    async fn diff_between(&self, base: &BranchName, head: &BranchName) -> VcsResult<String> {
        let mut state = self.write();
        state.record(VcsOperation::DiffBetween, Some(head.as_str()))?;
        state.require_initialized()?;
        let paths: BTreeSet<String> = state
            .commits_missing_from(base.as_str(), head.as_str())?
            .into_iter()
            .flat_map(|commit| commit.paths)
            .collect();
        Ok(paths
            .iter()
            .map(|path| format!("diff --git a/{path} b/{path}"))
            .collect::<Vec<_>>()
            .join("\n"))
    }

    async fn main_branch_name(&self) -> Option<BranchName> {
        let state = self.read();
        state
            .main_branch_candidates
            .iter()
            .find(|candidate| state.branches.contains_key(candidate.as_str()))
            .and_then(|candidate| BranchName::new(candidate.as_str()).ok())
    }
}
