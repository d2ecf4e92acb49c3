// src/errors.rs

//! Crate-wide error type and result alias.

use thiserror::Error;

use crate::engine::TaskName;

#[derive(Error, Debug)]
pub enum AssetflowError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error(
        "Unknown task '{name}'{}",
        .referenced_by
            .as_ref()
            .map(|by| format!(" (required by '{by}')"))
            .unwrap_or_default()
    )]
    UnknownTask {
        name: TaskName,
        referenced_by: Option<TaskName>,
    },

    #[error("Cycle detected in task graph: {}", .path.join(" -> "))]
    Cycle { path: Vec<TaskName> },

    #[error("Task '{task}' failed: {cause}")]
    TaskExecution { task: TaskName, cause: String },

    #[error("A build run is already in progress (run {0})")]
    RunInProgress(u64),

    #[error("Build interrupted before the run completed")]
    Interrupted,

    #[error("Failed to watch {patterns:?} for task '{task}': {source}")]
    WatchObserver {
        task: TaskName,
        patterns: Vec<String>,
        #[source]
        source: notify::Error,
    },

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, AssetflowError>;
