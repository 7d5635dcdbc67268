//! [`VersionControl`] implementation that shells out to `git`.

use super::command::run_git;
use crate::task::{
    domain::{BranchName, CommitId},
    ports::{VcsError, VcsResult, VersionControl},
};
use async_trait::async_trait;
use camino::{Utf8Path, Utf8PathBuf};
use cap_std::{ambient_authority, fs_utf8::Dir};

/// Header written into a generated `.gitignore`.
const GITIGNORE_HEADER: &str = "# CodeSnap auto-generated .gitignore\n";

/// Message of the commit created by [`VersionControl::initialize`].
const INITIAL_COMMIT_MESSAGE: &str = "Initial commit";

/// Length requested from `git rev-parse --short`.
const SHORT_HASH_ARG: &str = "--short=7";

/// `git` adapter for one working repository.
#[derive(Debug, Clone)]
pub struct GitCli {
    root: Utf8PathBuf,
    main_branch_candidates: Vec<BranchName>,
    excluded_paths: Vec<String>,
}

impl GitCli {
    /// Creates an adapter operating in `root`.
    ///
    /// The main branch is looked up as `master`, then `main`.
    #[must_use]
    pub fn new(root: impl Into<Utf8PathBuf>) -> Self {
        let main_branch_candidates = ["master", "main"]
            .into_iter()
            .filter_map(|name| BranchName::new(name).ok())
            .collect();
        Self {
            root: root.into(),
            main_branch_candidates,
            excluded_paths: Vec::new(),
        }
    }

    /// Replaces the ordered main-branch candidate list.
    #[must_use]
    pub fn with_main_branch_candidates(mut self, candidates: Vec<BranchName>) -> Self {
        self.main_branch_candidates = candidates;
        self
    }

    /// Keeps `path` out of status, staging and cleaning.
    ///
    /// Used for the registry directory, which lives inside the working tree
    /// but must never be committed or removed by `git clean`. The path is
    /// added to the repository's `info/exclude` file before anything is
    /// staged, so `git add -A` skips it without naming it in a pathspec.
    #[must_use]
    pub fn with_excluded_path(mut self, path: impl Into<String>) -> Self {
        self.excluded_paths.push(path.into());
        self
    }

    /// Returns the repository root.
    #[must_use]
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    async fn git(&self, args: &[&str]) -> VcsResult<String> {
        run_git(&self.root, args).await
    }

    async fn succeeds(&self, args: &[&str]) -> bool {
        self.git(args).await.is_ok()
    }

    /// Runs `git <command> -- . :(exclude)<path>...`.
    async fn git_with_pathspec(&self, command: &[&str]) -> VcsResult<String> {
        let exclusions: Vec<String> = self
            .excluded_paths
            .iter()
            .map(|path| format!(":(exclude){path}"))
            .collect();
        let mut args: Vec<&str> = command.to_vec();
        args.extend(["--", "."]);
        args.extend(exclusions.iter().map(String::as_str));
        self.git(&args).await
    }

    /// Appends every excluded path missing from `info/exclude`.
    async fn exclude_locally(&self) -> VcsResult<()> {
        if self.excluded_paths.is_empty() {
            return Ok(());
        }
        let location = self
            .git(&["rev-parse", "--git-path", "info/exclude"])
            .await?;
        let exclude_file = self.root.join(location.trim());
        let patterns = self.excluded_paths.clone();
        tokio::task::spawn_blocking(move || append_patterns(&exclude_file, &patterns))
            .await
            .map_err(VcsError::spawn)?
            .map_err(VcsError::spawn)
    }

    async fn head_commit(&self) -> VcsResult<CommitId> {
        let hash = self.git(&["rev-parse", SHORT_HASH_ARG, "HEAD"]).await?;
        Ok(CommitId::abbreviated(&hash))
    }

    async fn write_gitignore(&self) -> VcsResult<()> {
        let root = self.root.clone();
        let mut contents = GITIGNORE_HEADER.to_owned();
        for path in &self.excluded_paths {
            contents.push_str(path);
            contents.push('\n');
        }
        tokio::task::spawn_blocking(move || -> Result<(), std::io::Error> {
            let dir = Dir::open_ambient_dir(&root, ambient_authority())?;
            if !dir.exists(".gitignore") {
                dir.write(".gitignore", contents)?;
            }
            Ok(())
        })
        .await
        .map_err(VcsError::spawn)?
        .map_err(VcsError::spawn)
    }
}

#[async_trait]
impl VersionControl for GitCli {
    async fn is_repository(&self) -> bool {
        self.git(&["rev-parse", "--is-inside-work-tree"])
            .await
            .is_ok_and(|output| output.trim() == "true")
    }

    async fn initialize(&self, main_branch: &BranchName) -> VcsResult<String> {
        if self.is_repository().await {
            return Err(VcsError::command("Already a git repository"));
        }
        self.git(&["init"]).await?;
        self.write_gitignore().await?;
        self.git(&["add", "-A"]).await?;
        self.git(&["checkout", "-b", main_branch.as_str()]).await?;
        self.git(&["commit", "-m", INITIAL_COMMIT_MESSAGE]).await
    }

    async fn current_branch(&self) -> Option<BranchName> {
        let name = self.git(&["symbolic-ref", "--short", "-q", "HEAD"]).await.ok()?;
        BranchName::new(name.trim()).ok()
    }

    async fn branch_exists(&self, name: &BranchName) -> bool {
        let reference = format!("refs/heads/{name}");
        self.succeeds(&["show-ref", "--verify", "--quiet", &reference])
            .await
    }

    async fn create_and_checkout(&self, name: &BranchName) -> VcsResult<String> {
        self.git(&["checkout", "-b", name.as_str()]).await
    }

    async fn checkout(&self, name: &BranchName) -> VcsResult<String> {
        self.git(&["checkout", name.as_str()]).await
    }

    async fn working_tree_status(&self) -> String {
        self.git_with_pathspec(&["status", "--porcelain"])
            .await
            .unwrap_or_default()
    }

    async fn commit_all(&self, message: &str) -> VcsResult<CommitId> {
        self.exclude_locally().await?;
        self.git(&["add", "-A"]).await?;
        self.commit_staged(message).await
    }

    async fn commit_staged(&self, message: &str) -> VcsResult<CommitId> {
        self.git(&["commit", "-m", message]).await?;
        self.head_commit().await
    }

    async fn merge_no_commit(&self, branch: &BranchName) -> VcsResult<String> {
        self.git(&["merge", "--no-commit", "--no-ff", branch.as_str()])
            .await
    }

    async fn abort_merge(&self) -> VcsResult<String> {
        self.git(&["merge", "--abort"]).await
    }

    async fn discard_merge(&self) -> VcsResult<String> {
        self.git(&["reset", "--merge"]).await
    }

    async fn merge_with_commit(&self, branch: &BranchName, message: &str) -> VcsResult<CommitId> {
        self.git(&["merge", "--no-ff", branch.as_str(), "-m", message])
            .await?;
        self.head_commit().await
    }

    async fn squash_merge(&self, branch: &BranchName) -> VcsResult<String> {
        self.git(&["merge", "--squash", branch.as_str()]).await
    }

    async fn merge_fast_forward(&self, branch: &BranchName) -> VcsResult<String> {
        self.git(&["merge", "--ff-only", branch.as_str()]).await
    }

    async fn reset_hard_and_clean(&self) -> VcsResult<String> {
        let reset = self.git(&["reset", "--hard", "HEAD"]).await?;
        let mut args = vec!["clean", "-fd"];
        for path in &self.excluded_paths {
            args.extend(["-e", path.as_str()]);
        }
        let cleaned = self.git(&args).await?;
        Ok(format!("{reset}\n{cleaned}").trim().to_owned())
    }

    async fn delete_branch(&self, name: &BranchName) -> VcsResult<String> {
        self.git(&["branch", "-D", name.as_str()]).await
    }

    async fn log_between(
        &self,
        base: &BranchName,
        head: &BranchName,
        graph: bool,
    ) -> VcsResult<Vec<String>> {
        let range = format!("{base}..{head}");
        let mut args = vec!["log"];
        if graph {
            args.extend(["--graph", "--oneline", "--decorate"]);
        } else {
            args.push("--oneline");
        }
        args.push(&range);
        let output = self.git(&args).await?;
        Ok(output
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(str::to_owned)
            .collect())
    }

    async fn diff_between(&self, base: &BranchName, head: &BranchName) -> VcsResult<String> {
        let range = format!("{base}..{head}");
        self.git(&["diff", &range]).await
    }

    async fn main_branch_name(&self) -> Option<BranchName> {
        for candidate in &self.main_branch_candidates {
            if self.branch_exists(candidate).await {
                return Some(candidate.clone());
            }
        }
        None
    }
}

/// Adds each of `patterns` to `exclude_file` unless a line already holds it.
fn append_patterns(exclude_file: &Utf8Path, patterns: &[String]) -> Result<(), std::io::Error> {
    let (Some(parent), Some(file_name)) = (exclude_file.parent(), exclude_file.file_name()) else {
        return Err(std::io::Error::other(format!(
            "'{exclude_file}' is not a file path"
        )));
    };
    Dir::create_ambient_dir_all(parent, ambient_authority())?;
    let dir = Dir::open_ambient_dir(parent, ambient_authority())?;
    let mut contents = if dir.exists(file_name) {
        dir.read_to_string(file_name)?
    } else {
        String::new()
    };
    let missing: Vec<&String> = patterns
        .iter()
        .filter(|pattern| !contents.lines().any(|line| line.trim() == pattern.as_str()))
        .collect();
    if missing.is_empty() {
        return Ok(());
    }
    if !contents.is_empty() && !contents.ends_with('\n') {
        contents.push('\n');
    }
    for pattern in missing {
        contents.push_str(pattern);
        contents.push('\n');
    }
    dir.write(file_name, contents)
}
