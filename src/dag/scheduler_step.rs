// src/dag/scheduler_step.rs

//! Step-by-step execution result types for the scheduler.

use crate::dag::task_info::ScheduledTask;
use crate::engine::TaskName;

/// Record of one run: which planned tasks completed, in completion order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunState {
    pub run_id: u64,
    pub target: TaskName,
    /// Invocation order of the resolved plan.
    pub planned: Vec<TaskName>,
    /// Tasks that finished successfully, in completion order.
    pub completed: Vec<TaskName>,
}

impl RunState {
    pub fn has_completed(&self, task: &str) -> bool {
        self.completed.iter().any(|t| t == task)
    }
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Succeeded(RunState),
    Failed {
        state: RunState,
        /// First task that failed.
        task: TaskName,
        cause: String,
    },
}

impl RunOutcome {
    pub fn state(&self) -> &RunState {
        match self {
            RunOutcome::Succeeded(state) | RunOutcome::Failed { state, .. } => state,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, RunOutcome::Succeeded(_))
    }
}

/// Structured result of a single scheduler "step".
#[derive(Debug, Clone, Default)]
pub struct SchedulerStep {
    /// Tasks that became ready to run as a result of this step.
    pub newly_scheduled: Vec<ScheduledTask>,
    /// Pending tasks that will not run because of a failure in this step.
    pub newly_skipped: Vec<TaskName>,
    /// Set when this step ended the run.
    pub finished: Option<RunOutcome>,
}
