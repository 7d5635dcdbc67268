//! Process plumbing for `git` invocations.

use crate::task::ports::{VcsError, VcsResult};
use camino::Utf8Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

/// Runs `git <args>` in `root` and returns its standard output.
///
/// Trailing whitespace is removed from the output. On failure the error
/// carries the tool's standard error, or its standard output when standard
/// error is empty (`git commit` reports "nothing to commit" there).
pub(super) async fn run_git(root: &Utf8Path, args: &[&str]) -> VcsResult<String> {
    debug!(%root, ?args, "running git");
    let output = Command::new("git")
        .args(args)
        .current_dir(root)
        .stdin(Stdio::null())
        .output()
        .await
        .map_err(VcsError::spawn)?;

    let stdout = String::from_utf8_lossy(&output.stdout);
    if output.status.success() {
        return Ok(stdout.trim_end().to_owned());
    }
    let stderr = String::from_utf8_lossy(&output.stderr);
    let message = if stderr.trim().is_empty() {
        stdout
    } else {
        stderr
    };
    debug!(status = ?output.status.code(), error = %message.trim(), "git failed");
    Err(VcsError::command(message))
}
