// src/engine/mod.rs

//! Orchestration engine for assetflow.
//!
//! This module ties together:
//! - the task graph scheduler (one resolved run at a time)
//! - the rebuild queue (leaf re-executions requested by watch bindings)
//! - the main runtime event loop that reacts to:
//!   - run requests
//!   - file-watch triggers
//!   - task completion events
//!   - shutdown signals
//!
//! The pure core state machine lives in [`core`]; the async/IO shell is
//! implemented in [`runtime`].

use std::path::PathBuf;

use crate::dag::DispatchOrigin;

/// Canonical task name type used throughout the engine.
pub type TaskName = String;

/// Outcome of a task body for the scheduler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    Success,
    /// The body failed; carries the rendered cause chain.
    Failed(String),
}

/// Why a task was triggered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerReason {
    /// Manual trigger (tests, tooling).
    Manual,
    /// Triggered due to a filesystem event.
    FileWatch,
}

/// Runtime options used by both the core and the async shell.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuntimeOptions {
    /// Exit once the first run finished and nothing is in flight.
    pub exit_when_idle: bool,
    /// Install watch bindings after the first run and keep going.
    pub watch: bool,
}

impl RuntimeOptions {
    pub fn one_shot() -> Self {
        Self {
            exit_when_idle: true,
            watch: false,
        }
    }

    pub fn watching() -> Self {
        Self {
            exit_when_idle: false,
            watch: true,
        }
    }
}

/// Events flowing into the runtime from the CLI, watchers and executors.
#[derive(Debug, Clone)]
pub enum RuntimeEvent {
    /// Resolve `target` and run its plan.
    RunRequested { target: TaskName },
    /// Re-execute a single task, without graph resolution.
    TaskTriggered {
        task: TaskName,
        reason: TriggerReason,
        /// Source-root-relative paths that changed.
        changed: Vec<PathBuf>,
    },
    /// A task body finished.
    TaskCompleted {
        task: TaskName,
        origin: DispatchOrigin,
        outcome: TaskOutcome,
    },
    /// Graceful shutdown requested (e.g. Ctrl-C).
    ShutdownRequested,
}

pub mod core;
pub mod event_handlers;
pub mod rebuild;
pub mod runtime;

pub use core::CoreRuntime;
pub use event_handlers::{CoreCommand, CoreStep};
pub use rebuild::RebuildQueue;
pub use runtime::{Runtime, WatchSetup};
