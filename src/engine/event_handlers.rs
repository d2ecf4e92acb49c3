// src/engine/event_handlers.rs

//! Event handling logic for the core runtime.

use std::path::PathBuf;

use tracing::{error, info, warn};

use crate::dag::{DispatchOrigin, RunOutcome, ScheduledTask, Scheduler};
use crate::engine::rebuild::RebuildQueue;
use crate::engine::{RuntimeOptions, TaskName, TaskOutcome, TriggerReason};
use crate::errors::AssetflowError;
use crate::watch::WatchBinding;

/// Command produced by the pure core, to be executed by the outer IO shell.
#[derive(Debug, Clone)]
pub enum CoreCommand {
    /// Send these tasks to the executor.
    DispatchTasks(Vec<ScheduledTask>),
    /// Attach file-system observers for these bindings.
    StartWatching(Vec<WatchBinding>),
    /// Request that the process exits.
    RequestExit,
}

/// Decision returned by the core after handling a single `RuntimeEvent`.
#[derive(Debug, Clone)]
pub struct CoreStep {
    /// Commands the IO shell should execute.
    pub commands: Vec<CoreCommand>,
    /// Whether the outer runtime loop should keep running.
    pub keep_running: bool,
}

impl CoreStep {
    pub(crate) fn continue_with(commands: Vec<CoreCommand>) -> Self {
        Self {
            commands,
            keep_running: true,
        }
    }

    pub(crate) fn exit(mut commands: Vec<CoreCommand>) -> Self {
        commands.push(CoreCommand::RequestExit);
        Self {
            commands,
            keep_running: false,
        }
    }
}

/// Mutable core state shared by the handlers.
pub(crate) struct CoreState<'a> {
    pub scheduler: &'a mut Scheduler,
    pub rebuilds: &'a mut RebuildQueue,
    pub options: &'a RuntimeOptions,
    pub watching: &'a mut bool,
    pub last_outcome: &'a mut Option<RunOutcome>,
    pub fatal: &'a mut Option<AssetflowError>,
}

fn dispatch(commands: &mut Vec<CoreCommand>, tasks: Vec<ScheduledTask>) {
    if !tasks.is_empty() {
        commands.push(CoreCommand::DispatchTasks(tasks));
    }
}

/// Handle a request to run a target.
///
/// Resolution errors (unknown task, cycle) are fatal before anything runs.
/// A request while a run is active is rejected and logged.
pub(crate) fn handle_run_request(state: CoreState<'_>, target: TaskName) -> CoreStep {
    match state.scheduler.start_target(&target) {
        Ok(step) => {
            let mut commands = Vec::new();
            dispatch(&mut commands, step.newly_scheduled);
            CoreStep::continue_with(commands)
        }
        Err(err @ AssetflowError::RunInProgress(_)) => {
            warn!(target = %target, error = %err, "ignoring run request");
            CoreStep::continue_with(Vec::new())
        }
        Err(err) => {
            error!(target = %target, error = %err, "cannot start build run");
            *state.fatal = Some(err);
            CoreStep::exit(Vec::new())
        }
    }
}

/// Handle a rebuild trigger for a single task.
///
/// The task is re-executed as a leaf: no dependency resolution, its
/// dependencies are assumed satisfied by the initial run.
pub(crate) fn handle_task_trigger(
    state: CoreState<'_>,
    task: TaskName,
    reason: TriggerReason,
    changed: Vec<PathBuf>,
) -> CoreStep {
    if !state.scheduler.graph().contains(&task) {
        warn!(task = %task, "trigger for unknown task; ignoring");
        return CoreStep::continue_with(Vec::new());
    }

    info!(task = %task, ?reason, changed = ?changed, "rebuild requested");

    if !state.scheduler.is_idle() {
        state.rebuilds.defer(task, changed);
        return CoreStep::continue_with(Vec::new());
    }

    let mut commands = Vec::new();
    dispatch(&mut commands, state.rebuilds.request(task, changed).into_iter().collect());
    CoreStep::continue_with(commands)
}

/// Handle a task completion event.
pub(crate) fn handle_task_completion(
    state: CoreState<'_>,
    task: TaskName,
    origin: DispatchOrigin,
    outcome: TaskOutcome,
) -> CoreStep {
    match origin {
        DispatchOrigin::Run(run_id) => handle_run_completion(state, task, run_id, outcome),
        DispatchOrigin::Rebuild => handle_rebuild_completion(state, task, outcome),
    }
}

fn handle_run_completion(
    state: CoreState<'_>,
    task: TaskName,
    run_id: u64,
    outcome: TaskOutcome,
) -> CoreStep {
    if state.scheduler.current_run_id() != Some(run_id) {
        warn!(task = %task, run_id, "completion for a run that is no longer active; ignoring");
        return CoreStep::continue_with(Vec::new());
    }

    let mut commands = Vec::new();
    let step = state.scheduler.handle_completion(&task, outcome);
    dispatch(&mut commands, step.newly_scheduled);

    let Some(finished) = step.finished else {
        return CoreStep::continue_with(commands);
    };

    if let RunOutcome::Failed { task, cause, .. } = &finished {
        error!(task = %task, cause = %cause, "build failed");
    }

    if state.options.watch {
        if !*state.watching {
            *state.watching = true;
            let bindings = state
                .scheduler
                .graph()
                .bindings_of(&finished.state().planned)
                .cloned()
                .collect::<Vec<_>>();
            info!(bindings = bindings.len(), "initial build finished; watching for changes");
            commands.push(CoreCommand::StartWatching(bindings));
        }
        *state.last_outcome = Some(finished);
        dispatch(&mut commands, state.rebuilds.release());
        return CoreStep::continue_with(commands);
    }

    *state.last_outcome = Some(finished);
    dispatch(&mut commands, state.rebuilds.release());

    if state.options.exit_when_idle && state.rebuilds.is_empty() {
        return CoreStep::exit(commands);
    }
    CoreStep::continue_with(commands)
}

fn handle_rebuild_completion(state: CoreState<'_>, task: TaskName, outcome: TaskOutcome) -> CoreStep {
    match outcome {
        TaskOutcome::Success => info!(task = %task, "rebuild finished"),
        TaskOutcome::Failed(cause) => {
            error!(task = %task, cause = %cause, "rebuild failed; still watching")
        }
    }

    let mut commands = Vec::new();
    dispatch(&mut commands, state.rebuilds.complete(&task).into_iter().collect());

    if !state.options.watch
        && state.options.exit_when_idle
        && state.scheduler.is_idle()
        && state.last_outcome.is_some()
        && state.rebuilds.is_empty()
    {
        return CoreStep::exit(commands);
    }
    CoreStep::continue_with(commands)
}
