// src/dag/scheduler.rs

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::dag::graph::TaskGraph;
use crate::dag::resolve::{resolve, RunPlan};
use crate::dag::scheduler_step::{RunOutcome, RunState, SchedulerStep};
use crate::dag::state_manager::{ReadOnlyStateManager, StateManager};
use crate::dag::task_info::{TaskInfo, TaskRunState};
use crate::engine::{TaskName, TaskOutcome};
use crate::errors::{AssetflowError, Result};

#[derive(Debug)]
struct ActiveRun {
    state: RunState,
    failure: Option<(TaskName, String)>,
}

/// Scheduler holds the immutable graph plus mutable per-run state.
///
/// It is responsible for:
/// - starting a run from a resolved plan
/// - deciding when a planned task is ready (all deps succeeded in this run)
/// - recording completions and failures
/// - skipping tasks that had not started when a failure arrived
/// - reporting the run's outcome once nothing is pending or running
#[derive(Debug)]
pub struct Scheduler {
    graph: Arc<TaskGraph>,
    tasks: HashMap<TaskName, TaskInfo>,
    /// Monotonically increasing run ID.
    run_counter: u64,
    current: Option<ActiveRun>,
}

impl Scheduler {
    pub fn new(graph: Arc<TaskGraph>) -> Self {
        let tasks = graph
            .tasks()
            .map(|task| {
                (
                    task.name.clone(),
                    TaskInfo::new(task.name.clone(), task.deps.clone()),
                )
            })
            .collect();

        Self {
            graph,
            tasks,
            run_counter: 0,
            current: None,
        }
    }

    pub fn graph(&self) -> &Arc<TaskGraph> {
        &self.graph
    }

    /// Returns `true` if there is currently no active run.
    pub fn is_idle(&self) -> bool {
        self.current.is_none()
    }

    pub fn current_run_id(&self) -> Option<u64> {
        self.current.as_ref().map(|run| run.state.run_id)
    }

    /// Snapshot of the active run.
    pub fn current_run(&self) -> Option<&RunState> {
        self.current.as_ref().map(|run| &run.state)
    }

    /// Read-only view of the given task's run state.
    pub fn run_state_of(&self, task: &str) -> Option<TaskRunState> {
        let info = self.tasks.get(task)?;
        Some(info.phase.into())
    }

    /// Names of tasks planned for the active run, in plan order.
    pub fn tasks_in_current_run(&self) -> Vec<TaskName> {
        self.current
            .as_ref()
            .map(|run| run.state.planned.clone())
            .unwrap_or_default()
    }

    /// Whether the dependencies of `task` are satisfied for the current run.
    ///
    /// Returns `None` if the task is unknown.
    pub fn deps_satisfied(&self, task: &str) -> Option<bool> {
        let info = self.tasks.get(task)?;
        Some(ReadOnlyStateManager::new(&self.tasks).deps_satisfied_for_info(info))
    }

    /// Resolve `target` and start a run for it.
    pub fn start_target(&mut self, target: &str) -> Result<SchedulerStep> {
        if let Some(run_id) = self.current_run_id() {
            return Err(AssetflowError::RunInProgress(run_id));
        }
        let plan = resolve(&self.graph, target)?;
        self.start_run(plan)
    }

    /// Start a run for an already resolved plan. Returns the tasks that can
    /// start immediately.
    pub fn start_run(&mut self, plan: RunPlan) -> Result<SchedulerStep> {
        if let Some(run_id) = self.current_run_id() {
            return Err(AssetflowError::RunInProgress(run_id));
        }

        self.run_counter += 1;
        let run_id = self.run_counter;
        let state = RunState {
            run_id,
            target: plan.target().to_string(),
            planned: plan.order().to_vec(),
            completed: Vec::new(),
        };

        info!(run_id, target = %state.target, tasks = state.planned.len(), "starting build run");

        let mut manager = StateManager::new(&mut self.tasks, run_id);
        manager.begin(&state.planned);
        let newly_scheduled = manager.collect_new_ready_tasks(&state.planned);

        self.current = Some(ActiveRun {
            state,
            failure: None,
        });

        Ok(SchedulerStep {
            newly_scheduled,
            ..SchedulerStep::default()
        })
    }

    /// Record the outcome of a task dispatched for the active run.
    pub fn handle_completion(&mut self, task: &str, outcome: TaskOutcome) -> SchedulerStep {
        let Some(run) = self.current.as_mut() else {
            warn!(task = %task, "completion with no active run; ignoring");
            return SchedulerStep::default();
        };
        let run_id = run.state.run_id;

        let mut manager = StateManager::new(&mut self.tasks, run_id);
        let success = matches!(outcome, TaskOutcome::Success);
        if !manager.finish(task, success) {
            warn!(task = %task, run_id, "completion for a task not running in this run; ignoring");
            return SchedulerStep::default();
        }

        let mut step = SchedulerStep::default();
        match outcome {
            TaskOutcome::Success => {
                debug!(task = %task, run_id, "task completed successfully");
                run.state.completed.push(task.to_string());
                if run.failure.is_none() {
                    step.newly_scheduled = manager.collect_new_ready_tasks(&run.state.planned);
                }
            }
            TaskOutcome::Failed(cause) => {
                warn!(task = %task, run_id, cause = %cause, "task failed; skipping tasks not yet started");
                if run.failure.is_none() {
                    run.failure = Some((task.to_string(), cause));
                }
                step.newly_skipped = manager.skip_pending(&run.state.planned);
            }
        }

        if manager.all_terminal(&run.state.planned) {
            step.finished = self.finish_run();
        }
        step
    }

    fn finish_run(&mut self) -> Option<RunOutcome> {
        let run = self.current.take()?;
        let outcome = match run.failure {
            None => {
                info!(run_id = run.state.run_id, target = %run.state.target, "build run succeeded");
                RunOutcome::Succeeded(run.state)
            }
            Some((task, cause)) => {
                info!(run_id = run.state.run_id, target = %run.state.target, failed = %task, "build run failed");
                RunOutcome::Failed {
                    state: run.state,
                    task,
                    cause,
                }
            }
        };
        Some(outcome)
    }
}
