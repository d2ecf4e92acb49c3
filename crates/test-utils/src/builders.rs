#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use assetflow::dag::{BodyFuture, Task, TaskBody, TaskGraph};
use assetflow::errors::Result;
use assetflow::exec::TaskContext;

#[derive(Debug, Default)]
struct LogInner {
    started: Vec<String>,
    finished: Vec<String>,
    running: HashMap<String, usize>,
    overlapped: Vec<String>,
}

/// Shared record of which task bodies ran, in which order, and whether two
/// invocations of the same task ever overlapped.
#[derive(Debug, Clone, Default)]
pub struct ExecutionLog {
    inner: Arc<Mutex<LogInner>>,
}

impl ExecutionLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn start(&self, task: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner.started.push(task.to_string());
        let running = inner.running.entry(task.to_string()).or_default();
        *running += 1;
        if *running > 1 {
            inner.overlapped.push(task.to_string());
        }
    }

    fn finish(&self, task: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner.finished.push(task.to_string());
        if let Some(running) = inner.running.get_mut(task) {
            *running -= 1;
        }
    }

    /// Task names in start order.
    pub fn started(&self) -> Vec<String> {
        self.inner.lock().unwrap().started.clone()
    }

    /// Task names in completion order.
    pub fn finished(&self) -> Vec<String> {
        self.inner.lock().unwrap().finished.clone()
    }

    /// How many times `task` started.
    pub fn count(&self, task: &str) -> usize {
        self.started().iter().filter(|t| *t == task).count()
    }

    pub fn position(&self, task: &str) -> Option<usize> {
        self.started().iter().position(|t| t == task)
    }

    /// Tasks that started while another invocation of themselves was running.
    pub fn overlapped(&self) -> Vec<String> {
        self.inner.lock().unwrap().overlapped.clone()
    }
}

/// Task body that records itself in an [`ExecutionLog`], optionally sleeping
/// and optionally failing.
#[derive(Debug, Clone)]
pub struct RecordingBody {
    log: ExecutionLog,
    delay: Option<Duration>,
    fail: bool,
}

impl RecordingBody {
    pub fn new(log: ExecutionLog) -> Self {
        Self {
            log,
            delay: None,
            fail: false,
        }
    }

    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }
}

impl TaskBody for RecordingBody {
    fn run(&self, ctx: TaskContext) -> BodyFuture {
        let body = self.clone();
        Box::pin(async move {
            body.log.start(&ctx.task);
            if let Some(delay) = body.delay {
                tokio::time::sleep(delay).await;
            }
            body.log.finish(&ctx.task);
            if body.fail {
                anyhow::bail!("{} failed on purpose", ctx.task);
            }
            Ok(())
        })
    }
}

/// Builder for task graphs whose bodies record into a shared log.
#[derive(Debug, Default)]
pub struct GraphBuilder {
    tasks: Vec<Task>,
    log: ExecutionLog,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn task(self, name: &str, deps: &[&str]) -> Self {
        let body = RecordingBody::new(self.log.clone());
        self.body_task(name, deps, body)
    }

    pub fn slow_task(self, name: &str, deps: &[&str], delay: Duration) -> Self {
        let body = RecordingBody::new(self.log.clone()).delay(delay);
        self.body_task(name, deps, body)
    }

    pub fn failing_task(self, name: &str, deps: &[&str]) -> Self {
        let body = RecordingBody::new(self.log.clone()).failing();
        self.body_task(name, deps, body)
    }

    fn body_task(self, name: &str, deps: &[&str], body: RecordingBody) -> Self {
        self.with_task(Task::new(name).after(deps.iter().copied()).body(body))
    }

    /// Add a pre-built task as is.
    pub fn with_task(mut self, task: Task) -> Self {
        self.tasks.push(task);
        self
    }

    pub fn log(&self) -> ExecutionLog {
        self.log.clone()
    }

    pub fn try_build(self) -> Result<TaskGraph> {
        TaskGraph::new(self.tasks)
    }

    /// Build without the acyclicity / dependency checks.
    pub fn build_unchecked(self) -> TaskGraph {
        TaskGraph::new_unchecked(self.tasks).expect("duplicate task names in builder")
    }

    pub fn build(self) -> TaskGraph {
        self.try_build().expect("Failed to build valid graph from builder")
    }
}
