//! User configuration.
//!
//! Loaded from an optional YAML file (by default
//! `<config_dir>/cmdgen/config.yaml`). Every field has a default, so a
//! partial file only overrides what it names.
//!
//! # Example YAML
//!
//! ```yaml
//! tool:
//!   binary: gcloud
//! index:
//!   jobs: 4
//!   index_all: false
//!   priority_prefixes: [run, compute, iam]
//! render:
//!   max_positionals: 1
//! llm:
//!   model: gemini-2.5-flash
//!   max_iterations: 5
//! ```

use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::RenderOptions;

/// Flags accepted by every command of the default target CLI.
pub const DEFAULT_WIDE_FLAGS: &[&str] = &[
    "--project",
    "--quiet",
    "--format",
    "--verbosity",
    "--account",
    "--configuration",
];

/// Top-level groups whose commands are parsed eagerly during an index build.
pub const DEFAULT_PRIORITY_PREFIXES: &[&str] = &[
    "run",
    "compute",
    "projects",
    "iam",
    "pubsub",
    "storage",
    "secrets",
    "artifacts",
    "services",
    "container",
    "builds",
];

/// Errors from loading or saving configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// The target CLI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolConfig {
    /// Binary name or path (e.g. `gcloud`).
    pub binary: String,
    /// Flags accepted by every command, added to each spec's flag set.
    pub wide_flags: Vec<String>,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            binary: "gcloud".to_string(),
            wide_flags: DEFAULT_WIDE_FLAGS.iter().map(|f| f.to_string()).collect(),
        }
    }
}

/// Index build settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Cache directory; `None` uses the platform cache dir joined with `cmdgen`.
    pub cache_dir: Option<PathBuf>,
    pub priority_prefixes: Vec<String>,
    /// Parse help for every discovered path instead of priority prefixes only.
    pub index_all: bool,
    pub list_timeout_secs: u64,
    pub help_timeout_secs: u64,
    /// Upper bound on help invocations during a fallback crawl.
    pub probe_budget: usize,
    /// Help parsing workers; `1` is sequential.
    pub jobs: usize,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            cache_dir: None,
            priority_prefixes: DEFAULT_PRIORITY_PREFIXES
                .iter()
                .map(|p| p.to_string())
                .collect(),
            index_all: false,
            list_timeout_secs: 45,
            help_timeout_secs: 60,
            probe_budget: 4096,
            jobs: 1,
        }
    }
}

impl IndexConfig {
    /// Configured cache dir, else `<platform cache dir>/cmdgen`, else `.cmdgen-cache`.
    pub fn resolved_cache_dir(&self) -> PathBuf {
        self.cache_dir.clone().unwrap_or_else(|| {
            dirs::cache_dir()
                .map(|dir| dir.join("cmdgen"))
                .unwrap_or_else(|| PathBuf::from(".cmdgen-cache"))
        })
    }

    /// Returns `true` when `path` should be parsed during the build.
    pub fn is_priority(&self, path: &str) -> bool {
        if self.index_all {
            return true;
        }
        path.split_whitespace()
            .next()
            .is_some_and(|first| self.priority_prefixes.iter().any(|p| p == first))
    }
}

/// Model generator settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub endpoint: String,
    pub model: String,
    /// Environment variable holding the API key.
    pub api_key_env: String,
    pub max_iterations: usize,
    pub request_timeout_secs: u64,
    pub validation_timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            model: "gemini-2.5-pro".to_string(),
            api_key_env: "GEMINI_API_KEY".to_string(),
            max_iterations: 3,
            request_timeout_secs: 60,
            validation_timeout_secs: 10,
        }
    }
}

/// Full configuration file.
///
/// # Examples
///
/// ```
/// use cmdgen_core::Config;
///
/// let config: Config = serde_yaml::from_str("index:\n  jobs: 8\n").unwrap();
/// assert_eq!(config.index.jobs, 8);
/// assert_eq!(config.tool.binary, "gcloud");
/// assert_eq!(config.llm.max_iterations, 3);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub tool: ToolConfig,
    pub index: IndexConfig,
    pub render: RenderOptions,
    pub llm: LlmConfig,
}

impl Config {
    /// Loads configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if parsing fails.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let file = std::fs::File::open(path)?;
        let config = serde_yaml::from_reader(BufReader::new(file))?;
        Ok(config)
    }

    /// Saves the configuration as YAML, creating parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let file = std::fs::File::create(path)?;
        serde_yaml::to_writer(BufWriter::new(file), self)?;
        Ok(())
    }

    /// Loads `path` if given, else the default location when it exists,
    /// else defaults.
    ///
    /// An explicitly named file that is missing is an error; a missing
    /// default file is not.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => match Self::default_path() {
                Some(default) if default.is_file() => Self::load(default),
                _ => Ok(Self::default()),
            },
        }
    }

    /// `<config_dir>/cmdgen/config.yaml`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("cmdgen").join("config.yaml"))
    }
}
