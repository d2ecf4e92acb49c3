// src/pipeline/error.rs

use thiserror::Error;

/// Failure of a pipeline input or stage.
///
/// A `TransformError` never escapes a task on its own: the task runner wraps
/// it as the cause of an `AssetflowError::TaskExecution`.
#[derive(Debug, Error)]
pub enum TransformError {
    #[error("stage '{stage}' failed on '{path}': {message}")]
    Stage {
        stage: String,
        path: String,
        message: String,
    },

    #[error("pipeline '{pipeline}' requires input but {patterns:?} matched no files")]
    MissingInput {
        pipeline: String,
        patterns: Vec<String>,
    },

    #[error("input '{input}' failed: {message}")]
    Input { input: String, message: String },

    #[error("cannot resolve module '{specifier}' required from '{from}'")]
    UnresolvedModule { specifier: String, from: String },

    #[error("'{path}' is not valid UTF-8")]
    NotUtf8 { path: String },

    #[error(transparent)]
    Fs(#[from] anyhow::Error),
}

impl TransformError {
    pub fn stage(stage: &str, path: impl std::fmt::Display, message: impl std::fmt::Display) -> Self {
        TransformError::Stage {
            stage: stage.to_string(),
            path: path.to_string(),
            message: message.to_string(),
        }
    }
}
