// src/exec/mod.rs

//! Task execution layer.
//!
//! This module runs task actions (pipelines, clean steps, custom bodies) on
//! the tokio runtime and reports back to the orchestration runtime via
//! `RuntimeEvent::TaskCompleted`.
//!
//! - [`executor_loop`] owns the loop that receives scheduled tasks and keeps
//!   invocations of the same task from overlapping.
//! - [`task_runner`] executes a single task action.
//! - [`backend`] provides the `ExecutorBackend` trait and the concrete
//!   `RealExecutorBackend` that the runtime uses in production, and which
//!   tests can replace with a fake implementation.

pub mod backend;
pub mod executor_loop;
pub mod task_runner;

use std::path::PathBuf;
use std::sync::Arc;

use crate::engine::TaskName;
use crate::fs::FileSystem;
use crate::reload::NotificationChannel;
use crate::types::BuildMode;

pub use backend::{ExecutorBackend, RealExecutorBackend};
pub use executor_loop::spawn_executor;

/// Session-wide execution settings, shared by every task.
#[derive(Debug, Clone)]
pub struct ExecContext {
    pub mode: BuildMode,
    pub fs: Arc<dyn FileSystem>,
    pub source_root: PathBuf,
    pub output_root: PathBuf,
    /// Present in watch mode.
    pub notifier: Option<NotificationChannel>,
}

impl ExecContext {
    pub fn task_context(&self, task: &str, changed: Vec<PathBuf>) -> TaskContext {
        TaskContext {
            task: task.to_string(),
            mode: self.mode,
            fs: Arc::clone(&self.fs),
            source_root: self.source_root.clone(),
            output_root: self.output_root.clone(),
            changed,
            notifier: self.notifier.clone(),
        }
    }
}

/// What a single task invocation sees.
#[derive(Debug, Clone)]
pub struct TaskContext {
    pub task: TaskName,
    pub mode: BuildMode,
    pub fs: Arc<dyn FileSystem>,
    pub source_root: PathBuf,
    pub output_root: PathBuf,
    /// Source-root-relative paths behind a rebuild; empty in a full run.
    pub changed: Vec<PathBuf>,
    pub notifier: Option<NotificationChannel>,
}
