//! Command-line grammar.

use camino::Utf8PathBuf;
use clap::{Parser, Subcommand};

/// Top-level CLI parser for the `codesnap` binary.
#[derive(Debug, Parser)]
#[command(
    name = "codesnap",
    version,
    about = "CodeSnap - isolated task branches on top of git"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Repository root (defaults to the current directory)
    #[arg(short = 'C', long = "repo", global = true)]
    pub repo: Option<Utf8PathBuf>,

    /// Verbose mode (debug logging)
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

impl Cli {
    /// Default log filter derived from the verbosity flags.
    #[must_use]
    pub const fn log_level(&self) -> &'static str {
        if self.quiet {
            "error"
        } else if self.verbose {
            "debug"
        } else {
            "warn"
        }
    }
}

/// Lifecycle commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Initialize a new repository with CodeSnap
    Init {
        /// Name of the main branch
        #[arg(long, default_value = "master")]
        branch: String,
    },
    /// Create a new task branch
    Start {
        /// Task name
        name: String,
        /// Task description
        #[arg(short, long, default_value = "")]
        description: String,
        /// Create the task branch even with uncommitted changes
        #[arg(long)]
        force: bool,
        /// Base branch (defaults to the current branch)
        #[arg(long)]
        branch: Option<String>,
    },
    /// Commit changes to the current task branch
    Commit {
        /// Commit message
        message: String,
    },
    /// Apply the task's changes to its base branch without committing
    Apply {
        /// Stay on the base branch afterwards
        #[arg(long)]
        stay: bool,
    },
    /// Bring the task's changes into its base branch
    Merge {
        /// Create a merge commit
        #[arg(long)]
        commit: bool,
        /// Squash all task commits into one
        #[arg(long)]
        squash: bool,
        /// Commit message
        #[arg(short, long)]
        message: Option<String>,
    },
    /// Abandon all changes in the current task
    Abort {
        /// Also delete the task branch and its record
        #[arg(long)]
        delete: bool,
    },
    /// List all tasks
    List,
    /// Show commits in the current task
    Log {
        /// Show the commit graph
        #[arg(long)]
        graph: bool,
    },
    /// Show differences between the task branch and its base
    Diff,
    /// Show the working tree status
    Status,
    /// Clean up stale task branches
    Prune {
        /// Delete branches inactive for at least this many days
        #[arg(long)]
        days: Option<u32>,
        /// Only delete merged branches
        #[arg(long)]
        merged: bool,
    },
}
