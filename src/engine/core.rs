// src/engine/core.rs

//! Pure core runtime state machine.
//!
//! This module contains a synchronous, deterministic "core runtime" that
//! consumes [`RuntimeEvent`]s and produces:
//! - an updated core state
//! - a list of "commands" describing what the IO shell should do next
//!
//! The async/IO-heavy shell (`engine::runtime::Runtime`) is responsible for:
//! - reading events from channels
//! - sending `ScheduledTask`s to the executor
//! - attaching file watchers
//! - handling Ctrl+C / shutdown
//!
//! The core is unit tested without any Tokio, channels, filesystem, or
//! task bodies.

use crate::dag::{RunOutcome, RunState, Scheduler};
use crate::engine::event_handlers::{
    handle_run_request, handle_task_completion, handle_task_trigger, CoreState, CoreStep,
};
use crate::engine::rebuild::RebuildQueue;
use crate::engine::{RuntimeEvent, RuntimeOptions};
use crate::errors::{AssetflowError, Result};

/// Pure core runtime state.
///
/// This owns:
/// - the scheduler
/// - the rebuild queue
/// - runtime options
/// - the outcome of the last finished run
///
/// It has **no** channels, no Tokio types, and does not perform any IO.
#[derive(Debug)]
pub struct CoreRuntime {
    scheduler: Scheduler,
    rebuilds: RebuildQueue,
    options: RuntimeOptions,
    watching: bool,
    last_outcome: Option<RunOutcome>,
    fatal: Option<AssetflowError>,
}

impl CoreRuntime {
    pub fn new(scheduler: Scheduler, options: RuntimeOptions) -> Self {
        Self {
            scheduler,
            rebuilds: RebuildQueue::new(),
            options,
            watching: false,
            last_outcome: None,
            fatal: None,
        }
    }

    pub fn is_idle(&self) -> bool {
        self.scheduler.is_idle()
    }

    /// No rebuild in flight or parked.
    pub fn rebuilds_settled(&self) -> bool {
        self.rebuilds.is_empty()
    }

    pub fn is_watching(&self) -> bool {
        self.watching
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn last_outcome(&self) -> Option<&RunOutcome> {
        self.last_outcome.as_ref()
    }

    /// Handle a single runtime event, updating core state and returning the
    /// resulting commands for the IO shell.
    pub fn step(&mut self, event: RuntimeEvent) -> CoreStep {
        let state = CoreState {
            scheduler: &mut self.scheduler,
            rebuilds: &mut self.rebuilds,
            options: &self.options,
            watching: &mut self.watching,
            last_outcome: &mut self.last_outcome,
            fatal: &mut self.fatal,
        };

        match event {
            RuntimeEvent::RunRequested { target } => handle_run_request(state, target),
            RuntimeEvent::TaskTriggered {
                task,
                reason,
                changed,
            } => handle_task_trigger(state, task, reason, changed),
            RuntimeEvent::TaskCompleted {
                task,
                origin,
                outcome,
            } => handle_task_completion(state, task, origin, outcome),
            RuntimeEvent::ShutdownRequested => CoreStep {
                commands: Vec::new(),
                keep_running: false,
            },
        }
    }

    /// Final result once the loop stopped.
    ///
    /// - A resolution error is returned as is.
    /// - In watch mode, a session that got past its initial run is a success,
    ///   whatever the outcome of individual builds.
    /// - Otherwise the last run decides; no finished run means the loop was
    ///   interrupted.
    pub fn into_result(self) -> Result<RunState> {
        if let Some(err) = self.fatal {
            return Err(err);
        }
        match self.last_outcome {
            Some(outcome) if self.watching => Ok(outcome.state().clone()),
            Some(RunOutcome::Succeeded(state)) => Ok(state),
            Some(RunOutcome::Failed { task, cause, .. }) => {
                Err(AssetflowError::TaskExecution { task, cause })
            }
            None => Err(AssetflowError::Interrupted),
        }
    }
}
