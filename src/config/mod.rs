//! Layered configuration loading.
//!
//! Sources, highest precedence first:
//! 1. Environment variables prefixed `CODESNAP_`, with `__` separating
//!    sections (`CODESNAP_PRUNE__DAYS=14` sets `prune.days`).
//! 2. Project file `<repo>/.codesnap/config.toml`.
//! 3. User file `<config dir>/codesnap/config.toml`.
//! 4. Built-in defaults.

mod error;

pub use error::ConfigError;

use crate::task::{
    domain::{BranchName, TaskPrefix},
    services::DEFAULT_PRUNE_DAYS,
};
use camino::{Utf8Path, Utf8PathBuf};
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "CODESNAP_";

/// Directory holding project-level state and configuration.
pub const PROJECT_DIR: &str = ".codesnap";

/// Configuration file name, both per project and per user.
pub const CONFIG_FILE: &str = "config.toml";

/// Raw configuration as merged from every source.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CodesnapConfig {
    /// Prefix prepended to task names to form branch names.
    pub task_prefix: String,
    /// Ordered candidates for the main branch.
    pub main_branch_candidates: Vec<String>,
    /// Registry location.
    #[serde(default)]
    pub registry: RegistryConfig,
    /// Prune defaults.
    #[serde(default)]
    pub prune: PruneConfig,
}

/// Registry file location, relative to the repository root.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RegistryConfig {
    /// Registry directory.
    pub dir: String,
    /// Registry file name inside `dir`.
    pub file: String,
}

/// Prune defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct PruneConfig {
    /// Inactivity threshold in days.
    pub days: u32,
}

impl Default for CodesnapConfig {
    fn default() -> Self {
        Self {
            task_prefix: TaskPrefix::DEFAULT.to_owned(),
            main_branch_candidates: vec!["master".to_owned(), "main".to_owned()],
            registry: RegistryConfig::default(),
            prune: PruneConfig::default(),
        }
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            dir: PROJECT_DIR.to_owned(),
            file: "tasks.json".to_owned(),
        }
    }
}

impl Default for PruneConfig {
    fn default() -> Self {
        Self {
            days: DEFAULT_PRUNE_DAYS,
        }
    }
}

/// Validated configuration with domain types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Task branch prefix.
    pub task_prefix: TaskPrefix,
    /// Ordered main-branch candidates.
    pub main_branch_candidates: Vec<BranchName>,
    /// Registry directory, relative to the repository root.
    pub registry_dir: Utf8PathBuf,
    /// Registry file name.
    pub registry_file: String,
    /// Default prune threshold in days.
    pub prune_days: u32,
}

impl CodesnapConfig {
    /// Loads and validates configuration for the repository at
    /// `project_root`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Figment`] when a source cannot be parsed and
    /// [`ConfigError::InvalidValue`] when a value fails validation.
    pub fn load(project_root: &Utf8Path) -> Result<Settings, ConfigError> {
        Self::load_from(Self::figment(project_root))
    }

    /// Extracts and validates configuration from an explicit provider chain.
    ///
    /// # Errors
    ///
    /// Same as [`CodesnapConfig::load`].
    pub fn load_from(figment: Figment) -> Result<Settings, ConfigError> {
        let config: Self = figment.extract().map_err(Box::new)?;
        config.validate()
    }

    /// Builds the full provider chain, including the user file.
    #[must_use]
    pub fn figment(project_root: &Utf8Path) -> Figment {
        Self::figment_with(project_root, Self::user_config_path().as_deref())
    }

    /// Builds the provider chain with an explicit user file.
    ///
    /// Missing files are skipped.
    #[must_use]
    pub fn figment_with(project_root: &Utf8Path, user_config: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(path) = user_config.filter(|path| path.exists()) {
            figment = figment.merge(Toml::file(path));
        }
        let project_config = project_root.join(PROJECT_DIR).join(CONFIG_FILE);
        if project_config.exists() {
            figment = figment.merge(Toml::file(project_config.as_std_path()));
        }
        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Path of the user configuration file, when a config directory exists.
    #[must_use]
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("codesnap").join(CONFIG_FILE))
    }

    /// Converts raw values into domain types.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for an unusable task prefix, an
    /// empty or invalid candidate list, an absolute or escaping registry
    /// directory, or an empty registry file name.
    pub fn validate(self) -> Result<Settings, ConfigError> {
        let task_prefix = TaskPrefix::new(self.task_prefix)
            .map_err(|err| ConfigError::invalid("task_prefix", err.to_string()))?;

        if self.main_branch_candidates.is_empty() {
            return Err(ConfigError::invalid(
                "main_branch_candidates",
                "at least one candidate is required",
            ));
        }
        let main_branch_candidates = self
            .main_branch_candidates
            .into_iter()
            .map(BranchName::new)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|err| ConfigError::invalid("main_branch_candidates", err.to_string()))?;

        let registry_dir = Utf8PathBuf::from(self.registry.dir);
        if registry_dir.as_str().trim().is_empty()
            || registry_dir.is_absolute()
            || registry_dir
                .components()
                .any(|component| matches!(component, camino::Utf8Component::ParentDir))
        {
            return Err(ConfigError::invalid(
                "registry.dir",
                format!("'{registry_dir}' must be a relative path inside the repository"),
            ));
        }

        let registry_file = self.registry.file;
        if registry_file.trim().is_empty() || registry_file.contains(['/', '\\']) {
            return Err(ConfigError::invalid(
                "registry.file",
                format!("'{registry_file}' must be a plain file name"),
            ));
        }

        Ok(Settings {
            task_prefix,
            main_branch_candidates,
            registry_dir,
            registry_file,
            prune_days: self.prune.days,
        })
    }
}
