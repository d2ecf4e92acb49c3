// src/exec/backend.rs

//! Pluggable executor backend abstraction.
//!
//! The runtime talks to an `ExecutorBackend` instead of a raw mpsc sender.
//! This makes it easy to swap in a fake executor in tests while keeping the
//! production executor in [`executor_loop`](super::executor_loop).

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use anyhow::anyhow;
use tokio::sync::mpsc;

use crate::dag::{ScheduledTask, TaskGraph};
use crate::engine::RuntimeEvent;
use crate::errors::Result;
use crate::exec::executor_loop::spawn_executor;
use crate::exec::ExecContext;

/// Trait abstracting how scheduled tasks are executed.
///
/// Production code uses [`RealExecutorBackend`]; tests can provide their own
/// implementation that doesn't run real task bodies.
pub trait ExecutorBackend: Send {
    /// Dispatch the given tasks for execution.
    ///
    /// The implementation must eventually report a
    /// `RuntimeEvent::TaskCompleted` for each task.
    fn spawn_ready_tasks(
        &mut self,
        tasks: Vec<ScheduledTask>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;
}

/// Real executor backend used in production.
///
/// Forwards scheduled tasks to the background loop started by
/// [`spawn_executor`].
pub struct RealExecutorBackend {
    tx: mpsc::Sender<ScheduledTask>,
}

impl RealExecutorBackend {
    /// Spawns the background executor loop immediately.
    pub fn new(
        graph: Arc<TaskGraph>,
        ctx: ExecContext,
        runtime_tx: mpsc::Sender<RuntimeEvent>,
    ) -> Self {
        let tx = spawn_executor(graph, ctx, runtime_tx);
        Self { tx }
    }
}

impl ExecutorBackend for RealExecutorBackend {
    fn spawn_ready_tasks(
        &mut self,
        tasks: Vec<ScheduledTask>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        // Clone the sender so the future doesn't borrow `self` across `await`.
        let tx = self.tx.clone();

        Box::pin(async move {
            for task in tasks {
                tx.send(task)
                    .await
                    .map_err(|err| anyhow!("executor loop stopped: {err}"))?;
            }
            Ok(())
        })
    }
}
