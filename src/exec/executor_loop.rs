// src/exec/executor_loop.rs

//! Main executor loop that manages running task invocations.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::dag::{ScheduledTask, TaskGraph};
use crate::engine::{RuntimeEvent, TaskName, TaskOutcome};
use crate::exec::task_runner::run_task;
use crate::exec::ExecContext;

/// Spawn the background executor loop.
///
/// Each scheduled task runs in its own tokio task, and **per task name
/// invocations never overlap**: if the previous invocation of a task is still
/// running, the new one waits for it before starting.
pub fn spawn_executor(
    graph: Arc<TaskGraph>,
    ctx: ExecContext,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
) -> mpsc::Sender<ScheduledTask> {
    let (tx, mut rx) = mpsc::channel::<ScheduledTask>(32);

    tokio::spawn(async move {
        debug!("executor loop started");

        // Latest invocation per task name.
        let mut active: HashMap<TaskName, JoinHandle<()>> = HashMap::new();

        while let Some(task) = rx.recv().await {
            handle_scheduled_task(task, &graph, &ctx, &mut active, &runtime_tx).await;
        }

        debug!("executor loop finished (channel closed)");
    });

    tx
}

async fn handle_scheduled_task(
    scheduled: ScheduledTask,
    graph: &TaskGraph,
    ctx: &ExecContext,
    active: &mut HashMap<TaskName, JoinHandle<()>>,
    runtime_tx: &mpsc::Sender<RuntimeEvent>,
) {
    let name = scheduled.name.clone();

    let Some(task) = graph.get(&name).cloned() else {
        warn!(task = %name, "scheduled task missing from graph");
        let _ = runtime_tx
            .send(RuntimeEvent::TaskCompleted {
                task: name.clone(),
                origin: scheduled.origin,
                outcome: TaskOutcome::Failed(format!("unknown task '{name}'")),
            })
            .await;
        return;
    };

    let previous = active.remove(&name).filter(|handle| !handle.is_finished());
    if previous.is_some() {
        info!(task = %name, "previous invocation still running; chaining behind it");
    }

    let ctx = ctx.clone();
    let rt_tx = runtime_tx.clone();
    let spawn_name = name.clone();

    let handle = tokio::spawn(async move {
        if let Some(previous) = previous {
            if let Err(err) = previous.await {
                warn!(task = %spawn_name, error = %err, "previous invocation panicked");
            }
        }
        run_task(task, scheduled, ctx, rt_tx).await;
        debug!(task = %spawn_name, "task runner future finished");
    });

    active.insert(name, handle);
}
