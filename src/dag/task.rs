// src/dag/task.rs

//! Task definitions: a name, ordered dependencies and an action.

use std::fmt;
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::Arc;

use crate::engine::TaskName;
use crate::exec::TaskContext;
use crate::pipeline::Pipeline;
use crate::types::ModeFlag;
use crate::watch::WatchBinding;

/// Future returned by a [`TaskBody`]. Resolving it is the task's completion
/// signal.
pub type BodyFuture = Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send>>;

/// An arbitrary asynchronous task body.
pub trait TaskBody: Send + Sync {
    fn run(&self, ctx: TaskContext) -> BodyFuture;
}

impl<F, Fut> TaskBody for F
where
    F: Fn(TaskContext) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    fn run(&self, ctx: TaskContext) -> BodyFuture {
        Box::pin(self(ctx))
    }
}

/// What a task does when dispatched.
#[derive(Clone, Default)]
pub enum TaskAction {
    /// Pure aggregation: completes as soon as it runs.
    #[default]
    Noop,
    /// Marker contributing a flag to the run's [`crate::BuildMode`]. The
    /// mode is computed from the plan before anything executes, so running
    /// it does nothing.
    SetMode(ModeFlag),
    /// Remove paths relative to the output root.
    Clean(Vec<PathBuf>),
    Pipeline(Arc<Pipeline>),
    Custom(Arc<dyn TaskBody>),
}

impl fmt::Debug for TaskAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskAction::Noop => f.write_str("Noop"),
            TaskAction::SetMode(flag) => f.debug_tuple("SetMode").field(flag).finish(),
            TaskAction::Clean(paths) => f.debug_tuple("Clean").field(paths).finish(),
            TaskAction::Pipeline(p) => f.debug_tuple("Pipeline").field(&p.name()).finish(),
            TaskAction::Custom(_) => f.write_str("Custom"),
        }
    }
}

impl fmt::Display for TaskAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskAction::Noop => f.write_str("-"),
            TaskAction::SetMode(flag) => write!(f, "set {flag}"),
            TaskAction::Clean(paths) => {
                let list: Vec<_> = paths.iter().map(|p| p.display().to_string()).collect();
                write!(f, "clean {}", list.join(", "))
            }
            TaskAction::Pipeline(p) => write!(f, "pipeline {} <- {}", p.name(), p.describe_input()),
            TaskAction::Custom(_) => f.write_str("custom"),
        }
    }
}

/// A named unit of work.
#[derive(Debug, Clone)]
pub struct Task {
    pub name: TaskName,
    /// Direct dependencies, in declared order.
    pub deps: Vec<TaskName>,
    pub action: TaskAction,
    /// Watch binding installed when this task is part of a watch run.
    pub binding: Option<WatchBinding>,
}

impl Task {
    pub fn new(name: impl Into<TaskName>) -> Self {
        Self {
            name: name.into(),
            deps: Vec::new(),
            action: TaskAction::Noop,
            binding: None,
        }
    }

    pub fn after<I, S>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<TaskName>,
    {
        self.deps.extend(deps.into_iter().map(Into::into));
        self
    }

    pub fn action(mut self, action: TaskAction) -> Self {
        self.action = action;
        self
    }

    pub fn pipeline(self, pipeline: Pipeline) -> Self {
        self.action(TaskAction::Pipeline(Arc::new(pipeline)))
    }

    pub fn body(self, body: impl TaskBody + 'static) -> Self {
        self.action(TaskAction::Custom(Arc::new(body)))
    }

    pub fn binds(mut self, binding: WatchBinding) -> Self {
        self.binding = Some(binding);
        self
    }
}
