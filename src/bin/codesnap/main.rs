//! `codesnap` command-line entry point.
//!
//! A thin presentation layer: it loads configuration, wires the git and JSON
//! registry adapters into the lifecycle service, runs one command and prints
//! the outcome. Results go to standard output, errors and logs to standard
//! error.

mod cli;
mod render;

use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;
use cli::{Cli, Command};
use codesnap::{
    config::{CodesnapConfig, ConfigError, Settings},
    task::{
        adapters::{file::JsonFileTaskRegistry, git::GitCli},
        services::{
            CreateTaskRequest, MergeRequest, PruneRequest, TaskLifecycleError,
            TaskLifecycleService,
        },
    },
};
use mockable::DefaultClock;
use render::Line;
use std::{process::ExitCode, sync::Arc};
use thiserror::Error;
use tracing::warn;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter.
const LOG_ENV: &str = "CODESNAP_LOG";

type Service = TaskLifecycleService<JsonFileTaskRegistry, GitCli, DefaultClock>;

/// Errors reported by the binary.
#[derive(Debug, Error)]
enum CliError {
    #[error("failed to read current directory: {0}")]
    CurrentDir(#[source] std::io::Error),

    #[error("repository path '{0}' is not valid UTF-8")]
    NonUtf8Path(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Lifecycle(#[from] TaskLifecycleError),

    #[error("failed to initialize logging: {0}")]
    Tracing(String),
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let outcome = match init_tracing(cli.log_level()) {
        Ok(()) => run(cli).await,
        Err(err) => Err(err),
    };
    let written = match outcome {
        Ok(lines) => render::emit(&lines).map(|()| ExitCode::SUCCESS),
        Err(err) => render::emit_error(&err.to_string()).map(|()| ExitCode::FAILURE),
    };
    written.unwrap_or(ExitCode::FAILURE)
}

fn init_tracing(default_level: &str) -> Result<(), CliError> {
    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| CliError::Tracing(err.to_string()))
}

fn resolve_root(repo: Option<Utf8PathBuf>) -> Result<Utf8PathBuf, CliError> {
    if let Some(path) = repo {
        return Ok(path);
    }
    let current = std::env::current_dir().map_err(CliError::CurrentDir)?;
    Utf8PathBuf::from_path_buf(current)
        .map_err(|path| CliError::NonUtf8Path(path.display().to_string()))
}

fn build_service(root: &Utf8Path, settings: &Settings) -> Service {
    let git = GitCli::new(root)
        .with_main_branch_candidates(settings.main_branch_candidates.clone())
        .with_excluded_path(settings.registry_dir.as_str());
    let registry = JsonFileTaskRegistry::new(
        root,
        settings.registry_dir.clone(),
        settings.registry_file.clone(),
    );
    TaskLifecycleService::new(Arc::new(registry), Arc::new(git), Arc::new(DefaultClock))
        .with_prefix(settings.task_prefix.clone())
}

async fn run(cli: Cli) -> Result<Vec<Line>, CliError> {
    let root = resolve_root(cli.repo)?;
    let settings = CodesnapConfig::load(&root)?;
    let service = build_service(&root, &settings);
    execute(&service, cli.command, &settings).await
}

async fn execute(
    service: &Service,
    command: Command,
    settings: &Settings,
) -> Result<Vec<Line>, CliError> {
    let lines = match command {
        Command::Init { branch } => {
            service.initialize_repository(&branch).await?;
            vec![Line::Success(format!(
                "Created Git repository with {branch} branch"
            ))]
        }
        Command::Start {
            name,
            description,
            force,
            branch,
        } => {
            let mut request = CreateTaskRequest::new(name)
                .with_description(description)
                .forced(force);
            if let Some(base) = branch {
                request = request.with_base_branch(base);
            }
            let created = service.create_task(request).await?;
            vec![Line::Success(created.to_string())]
        }
        Command::Commit { message } => {
            let committed = service.commit(&message).await?;
            vec![Line::Success(committed.to_string())]
        }
        Command::Apply { stay } => {
            let applied = service.apply(!stay).await?;
            vec![Line::Info(applied.to_string())]
        }
        Command::Merge {
            commit,
            squash,
            message,
        } => {
            let mut request = MergeRequest::from_flags(commit, squash);
            if let Some(text) = message {
                request = request.with_message(text);
            }
            let merged = service.merge(request).await?;
            vec![Line::Success(merged.to_string())]
        }
        Command::Abort { delete } => {
            let aborted = service.abort(delete).await?;
            vec![Line::Info(aborted.to_string())]
        }
        Command::List => {
            let tasks = service.list_tasks().await.unwrap_or_else(|err| {
                warn!(error = %err, "could not read the task registry");
                Vec::new()
            });
            render::task_table(&tasks)
        }
        Command::Log { graph } => {
            let commits = service.task_log(graph).await?;
            if commits.is_empty() {
                vec![Line::Info("No commits found".to_owned())]
            } else {
                commits.into_iter().map(Line::Plain).collect()
            }
        }
        Command::Diff => {
            let diff = service.task_diff().await?;
            if diff.trim().is_empty() {
                vec![Line::Info("No differences found".to_owned())]
            } else {
                vec![Line::Plain(diff)]
            }
        }
        Command::Status => {
            let status = service.working_tree_status().await?;
            if status.trim().is_empty() {
                vec![Line::Info("Working directory clean.".to_owned())]
            } else {
                vec![Line::Plain(status)]
            }
        }
        Command::Prune { days, merged } => {
            let request =
                PruneRequest::new(days.unwrap_or(settings.prune_days)).merged_only(merged);
            let report = service.prune(request).await?;
            if report.count() == 0 {
                vec![Line::Info(report.to_string())]
            } else {
                vec![Line::Success(report.to_string())]
            }
        }
    };
    Ok(lines)
}
