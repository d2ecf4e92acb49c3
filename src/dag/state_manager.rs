// src/dag/state_manager.rs

//! Per-run state transitions for tasks in the scheduler.

use std::collections::HashMap;

use tracing::{debug, info, warn};

use crate::dag::task_info::{Phase, ScheduledTask, TaskInfo};
use crate::engine::TaskName;

/// Mutates per-run phases of the planned tasks.
pub struct StateManager<'a> {
    tasks: &'a mut HashMap<TaskName, TaskInfo>,
    run_id: u64,
}

impl<'a> StateManager<'a> {
    pub fn new(tasks: &'a mut HashMap<TaskName, TaskInfo>, run_id: u64) -> Self {
        Self { tasks, run_id }
    }

    /// Clear every phase, then mark the planned tasks `Pending`.
    pub fn begin(&mut self, planned: &[TaskName]) {
        for info in self.tasks.values_mut() {
            info.phase = None;
        }
        for name in planned {
            if let Some(info) = self.tasks.get_mut(name) {
                info.phase = Some(Phase::Pending);
                debug!(task = %name, run_id = self.run_id, "marked Pending for this run");
            } else {
                warn!(task = %name, "planned task missing from tasks map");
            }
        }
    }

    pub fn deps_satisfied_for_info(&self, info: &TaskInfo) -> bool {
        ReadOnlyStateManager::new(self.tasks).deps_satisfied_for_info(info)
    }

    /// Record a terminal outcome for a running task. Returns `false` (and
    /// changes nothing) when the task is not running in this run.
    pub fn finish(&mut self, task: &str, success: bool) -> bool {
        let Some(info) = self.tasks.get_mut(task) else {
            return false;
        };
        if info.phase != Some(Phase::Running) {
            return false;
        }
        if success {
            info.phase = Some(Phase::DoneSuccess);
            info.last_successful_run = Some(self.run_id);
        } else {
            info.phase = Some(Phase::DoneFailed);
            info.last_failed_run = Some(self.run_id);
        }
        true
    }

    /// Skip every planned task that has not started yet. Running tasks are
    /// left to finish.
    pub fn skip_pending(&mut self, planned: &[TaskName]) -> Vec<TaskName> {
        let mut skipped = Vec::new();
        for name in planned {
            if let Some(info) = self.tasks.get_mut(name) {
                if info.phase == Some(Phase::Pending) {
                    info.phase = Some(Phase::Skipped);
                    debug!(task = %name, run_id = self.run_id, "skipping after failure");
                    skipped.push(name.clone());
                }
            }
        }
        skipped
    }

    /// Mark every `Pending` task whose dependencies succeeded as `Running`
    /// and return them in plan order.
    pub fn collect_new_ready_tasks(&mut self, planned: &[TaskName]) -> Vec<ScheduledTask> {
        let candidates: Vec<TaskName> = planned
            .iter()
            .filter(|name| {
                self.tasks.get(*name).is_some_and(|info| {
                    info.phase == Some(Phase::Pending) && self.deps_satisfied_for_info(info)
                })
            })
            .cloned()
            .collect();

        let mut ready = Vec::with_capacity(candidates.len());
        for name in candidates {
            if let Some(info) = self.tasks.get_mut(&name) {
                info!(task = %info.name, run_id = self.run_id, "starting task");
                info.phase = Some(Phase::Running);
                ready.push(ScheduledTask::for_run(name, self.run_id));
            }
        }
        ready
    }

    /// Whether no planned task is pending or running.
    pub fn all_terminal(&self, planned: &[TaskName]) -> bool {
        !planned.iter().any(|name| {
            self.tasks
                .get(name)
                .is_some_and(|info| matches!(info.phase, Some(Phase::Pending | Phase::Running)))
        })
    }
}

/// Read-only view for dependency checks.
pub struct ReadOnlyStateManager<'a> {
    tasks: &'a HashMap<TaskName, TaskInfo>,
}

impl<'a> ReadOnlyStateManager<'a> {
    pub fn new(tasks: &'a HashMap<TaskName, TaskInfo>) -> Self {
        Self { tasks }
    }

    /// A dependency is satisfied only by success in the current run; the plan
    /// always contains every transitive dependency.
    pub fn deps_satisfied_for_info(&self, info: &TaskInfo) -> bool {
        info.deps.iter().all(|dep_name| match self.tasks.get(dep_name) {
            Some(dep) => dep.phase == Some(Phase::DoneSuccess),
            None => {
                warn!(task = %info.name, dep = %dep_name, "dependency missing from tasks map");
                false
            }
        })
    }
}
