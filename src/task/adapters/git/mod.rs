//! Version-control adapter backed by the `git` command-line tool.

mod cli;
mod command;

pub use cli::GitCli;
