//! Error type for index discovery and persistence.

use thiserror::Error;

/// Typed error for index builds and cache I/O.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// Filesystem I/O failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing or serialization failure.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Neither the command listing nor the help crawl produced any path.
    #[error("no commands discovered from '{tool}'; is the tool installed and on PATH?")]
    NoCommands { tool: String },

    /// The parallel help-parsing pool could not be created.
    #[error("failed to build worker pool: {0}")]
    WorkerPool(String),
}

pub type Result<T> = std::result::Result<T, DiscoveryError>;
