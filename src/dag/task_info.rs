// src/dag/task_info.rs

//! Task metadata and per-run state.

use std::path::PathBuf;

use crate::engine::TaskName;

/// Per-run phase of a task (internal).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Phase {
    /// Planned for this run, waiting on dependencies.
    Pending,
    /// Dispatched to the executor.
    Running,
    DoneSuccess,
    DoneFailed,
    /// Never started because another task of the run failed.
    Skipped,
}

/// Public, read-only view of a task's per-run state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskRunState {
    /// The task is not part of the current (or last) run.
    NotInRun,
    Pending,
    Running,
    DoneSuccess,
    DoneFailed,
    Skipped,
}

impl From<Option<Phase>> for TaskRunState {
    fn from(phase: Option<Phase>) -> Self {
        match phase {
            None => TaskRunState::NotInRun,
            Some(Phase::Pending) => TaskRunState::Pending,
            Some(Phase::Running) => TaskRunState::Running,
            Some(Phase::DoneSuccess) => TaskRunState::DoneSuccess,
            Some(Phase::DoneFailed) => TaskRunState::DoneFailed,
            Some(Phase::Skipped) => TaskRunState::Skipped,
        }
    }
}

/// Static task information plus per-run state.
#[derive(Debug, Clone)]
pub struct TaskInfo {
    pub name: TaskName,
    /// Direct dependencies, in declared order.
    pub deps: Vec<TaskName>,

    pub(crate) phase: Option<Phase>,

    /// Last run in which this task succeeded.
    pub last_successful_run: Option<u64>,

    /// Last run in which this task failed.
    pub last_failed_run: Option<u64>,
}

impl TaskInfo {
    pub fn new(name: TaskName, deps: Vec<TaskName>) -> Self {
        Self {
            name,
            deps,
            phase: None,
            last_successful_run: None,
            last_failed_run: None,
        }
    }
}

/// Why a task was dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOrigin {
    /// Part of a resolved run.
    Run(u64),
    /// Leaf re-execution requested by a watch binding.
    Rebuild,
}

/// A task the executor should start now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledTask {
    pub name: TaskName,
    pub origin: DispatchOrigin,
    /// Source-root-relative paths that triggered a rebuild (empty for runs).
    pub changed: Vec<PathBuf>,
}

impl ScheduledTask {
    pub fn for_run(name: TaskName, run_id: u64) -> Self {
        Self {
            name,
            origin: DispatchOrigin::Run(run_id),
            changed: Vec::new(),
        }
    }

    pub fn rebuild(name: TaskName, changed: Vec<PathBuf>) -> Self {
        Self {
            name,
            origin: DispatchOrigin::Rebuild,
            changed,
        }
    }
}
