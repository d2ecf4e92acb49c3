// src/dag/mod.rs

//! Task graph representation and scheduling.
//!
//! - [`task`] defines tasks and their actions.
//! - [`graph`] holds the validated registry of tasks.
//! - [`resolve`] turns a target into an invocation order.
//! - [`scheduler`] contains the per-run state machine that decides which
//!   tasks are ready to run, and when dependents can be scheduled.
//! - [`task_info`] provides task metadata and scheduled task types.
//! - [`scheduler_step`] defines the result types for scheduler steps.
//! - [`state_manager`] manages per-run state transitions.

pub mod graph;
pub mod resolve;
pub mod scheduler;
pub mod scheduler_step;
pub mod state_manager;
pub mod task;
pub mod task_info;
mod validate;

pub use graph::TaskGraph;
pub use resolve::{resolve, RunPlan};
pub use scheduler::Scheduler;
pub use scheduler_step::{RunOutcome, RunState, SchedulerStep};
pub use task::{BodyFuture, Task, TaskAction, TaskBody};
pub use task_info::{DispatchOrigin, ScheduledTask, TaskRunState};
