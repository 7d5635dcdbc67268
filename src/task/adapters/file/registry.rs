//! JSON file task registry.
//!
//! Records live in a single JSON array inside a registry directory under the
//! repository root. Saves write a sibling temporary file and rename it over
//! the registry file, so readers observe either the old or the new contents.

use super::models::TaskRecord;
use crate::task::{
    domain::{BranchName, PersistedTaskData, Task, TaskId, TaskName, TaskStatus},
    ports::{TaskRegistry, TaskRegistryError, TaskRegistryResult},
};
use async_trait::async_trait;
use camino::{Utf8Path, Utf8PathBuf};
use cap_std::{ambient_authority, fs_utf8::Dir};
use tracing::debug;

/// Suffix appended to the registry file name while a save is in flight.
const TEMPORARY_SUFFIX: &str = ".tmp";

/// Task registry stored as a JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileTaskRegistry {
    root: Utf8PathBuf,
    directory: Utf8PathBuf,
    file_name: String,
}

impl JsonFileTaskRegistry {
    /// Creates a registry stored at `<root>/<directory>/<file_name>`.
    ///
    /// `directory` is resolved relative to `root`.
    #[must_use]
    pub fn new(
        root: impl Into<Utf8PathBuf>,
        directory: impl Into<Utf8PathBuf>,
        file_name: impl Into<String>,
    ) -> Self {
        Self {
            root: root.into(),
            directory: directory.into(),
            file_name: file_name.into(),
        }
    }

    /// Returns the full path of the registry file.
    #[must_use]
    pub fn path(&self) -> Utf8PathBuf {
        self.root.join(&self.directory).join(&self.file_name)
    }

    async fn run_blocking<F, T>(&self, f: F) -> TaskRegistryResult<T>
    where
        F: FnOnce(&Utf8Path, &Utf8Path, &str) -> TaskRegistryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let root = self.root.clone();
        let directory = self.directory.clone();
        let file_name = self.file_name.clone();
        tokio::task::spawn_blocking(move || f(&root, &directory, &file_name))
            .await
            .map_err(TaskRegistryError::persistence)?
    }
}

#[async_trait]
impl TaskRegistry for JsonFileTaskRegistry {
    async fn load_all(&self) -> TaskRegistryResult<Vec<Task>> {
        let records = self
            .run_blocking(|root, directory, file_name| {
                read_records(root, directory, file_name)
            })
            .await?;
        debug!(path = %self.path(), count = records.len(), "loaded task registry");
        records.into_iter().map(record_to_task).collect()
    }

    async fn save_all(&self, tasks: &[Task]) -> TaskRegistryResult<()> {
        let records: Vec<TaskRecord> = tasks.iter().map(task_to_record).collect();
        let count = records.len();
        let payload =
            serde_json::to_string_pretty(&records).map_err(TaskRegistryError::persistence)?;
        self.run_blocking(move |root, directory, file_name| {
            write_atomically(root, directory, file_name, &payload)
        })
        .await?;
        debug!(path = %self.path(), count, "saved task registry");
        Ok(())
    }
}

fn read_records(
    root: &Utf8Path,
    directory: &Utf8Path,
    file_name: &str,
) -> TaskRegistryResult<Vec<TaskRecord>> {
    let root_dir =
        Dir::open_ambient_dir(root, ambient_authority()).map_err(TaskRegistryError::persistence)?;
    if !root_dir.exists(directory) {
        return Ok(Vec::new());
    }
    let registry_dir = root_dir
        .open_dir(directory)
        .map_err(TaskRegistryError::persistence)?;
    if !registry_dir.exists(file_name) {
        return Ok(Vec::new());
    }
    let contents = registry_dir
        .read_to_string(file_name)
        .map_err(TaskRegistryError::persistence)?;
    if contents.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(&contents).map_err(|err| TaskRegistryError::Corrupt(err.to_string()))
}

fn write_atomically(
    root: &Utf8Path,
    directory: &Utf8Path,
    file_name: &str,
    payload: &str,
) -> TaskRegistryResult<()> {
    let root_dir =
        Dir::open_ambient_dir(root, ambient_authority()).map_err(TaskRegistryError::persistence)?;
    root_dir
        .create_dir_all(directory)
        .map_err(TaskRegistryError::persistence)?;
    let registry_dir = root_dir
        .open_dir(directory)
        .map_err(TaskRegistryError::persistence)?;
    let temporary = format!("{file_name}{TEMPORARY_SUFFIX}");
    registry_dir
        .write(&temporary, payload)
        .map_err(TaskRegistryError::persistence)?;
    registry_dir
        .rename(&temporary, &registry_dir, file_name)
        .map_err(TaskRegistryError::persistence)
}

fn record_to_task(record: TaskRecord) -> TaskRegistryResult<Task> {
    let TaskRecord {
        id,
        name,
        branch,
        base_branch,
        description,
        status,
        created,
        last_activity,
        commits,
    } = record;

    let corrupt = |err: &dyn std::fmt::Display| {
        TaskRegistryError::Corrupt(format!("record {id}: {err}"))
    };
    let data = PersistedTaskData {
        id: TaskId::new(id).map_err(|err| corrupt(&err))?,
        name: TaskName::new(name).map_err(|err| corrupt(&err))?,
        branch: BranchName::new(branch).map_err(|err| corrupt(&err))?,
        base_branch: BranchName::new(base_branch).map_err(|err| corrupt(&err))?,
        description,
        status: TaskStatus::try_from(status.as_str()).map_err(|err| corrupt(&err))?,
        created,
        last_activity,
        commits,
    };
    Ok(Task::from_persisted(data))
}

fn task_to_record(task: &Task) -> TaskRecord {
    TaskRecord {
        id: task.id().value(),
        name: task.name().as_str().to_owned(),
        branch: task.branch().as_str().to_owned(),
        base_branch: task.base_branch().as_str().to_owned(),
        description: task.description().to_owned(),
        status: task.status().as_str().to_owned(),
        created: task.created(),
        last_activity: task.last_activity(),
        commits: task.commits(),
    }
}
