// src/exec/task_runner.rs

//! Individual task runner.

use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::dag::{ScheduledTask, Task, TaskAction};
use crate::engine::{RuntimeEvent, TaskOutcome};
use crate::exec::{ExecContext, TaskContext};
use crate::pipeline::{Pipeline, PipelineContext};

/// Run a single task action and emit its `TaskCompleted` event.
pub async fn run_task(
    task: Arc<Task>,
    scheduled: ScheduledTask,
    ctx: ExecContext,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
) {
    let tctx = ctx.task_context(&task.name, scheduled.changed);
    debug!(task = %task.name, origin = ?scheduled.origin, action = ?task.action, "running task");

    let outcome = match execute_action(&task.action, tctx).await {
        Ok(()) => TaskOutcome::Success,
        Err(err) => {
            let cause = format!("{err:#}");
            error!(task = %task.name, error = %cause, "task failed");
            TaskOutcome::Failed(cause)
        }
    };

    if runtime_tx
        .send(RuntimeEvent::TaskCompleted {
            task: task.name.clone(),
            origin: scheduled.origin,
            outcome,
        })
        .await
        .is_err()
    {
        debug!(task = %task.name, "runtime gone; dropping completion");
    }
}

/// Execute `action` to completion.
pub async fn execute_action(action: &TaskAction, ctx: TaskContext) -> Result<()> {
    match action {
        TaskAction::Noop | TaskAction::SetMode(_) => Ok(()),
        TaskAction::Clean(paths) => {
            for path in paths {
                let target = ctx.output_root.join(path);
                ctx.fs
                    .remove(&target)
                    .with_context(|| format!("cleaning {:?}", target))?;
                debug!(task = %ctx.task, path = %target.display(), "removed");
            }
            info!(task = %ctx.task, paths = paths.len(), "output cleaned");
            Ok(())
        }
        TaskAction::Pipeline(pipeline) => run_pipeline(Arc::clone(pipeline), ctx).await,
        TaskAction::Custom(body) => body.run(ctx).await,
    }
}

async fn run_pipeline(pipeline: Arc<Pipeline>, ctx: TaskContext) -> Result<()> {
    let kind = pipeline.kind();
    let mode = ctx.mode;
    let notifier = ctx.notifier.clone();

    let report = tokio::task::spawn_blocking(move || {
        pipeline.execute(&PipelineContext {
            fs: ctx.fs.as_ref(),
            source_root: &ctx.source_root,
            output_root: &ctx.output_root,
            mode: ctx.mode,
            changed: &ctx.changed,
        })
    })
    .await
    .map_err(|err| anyhow!("pipeline worker panicked: {err}"))??;

    debug!(pipeline = %report.pipeline, written = report.written.len(), "pipeline finished");

    if mode.watch() {
        if let Some(notifier) = notifier {
            let reached = notifier.publish(kind)?;
            debug!(%kind, reached, "live clients notified");
        }
    }
    Ok(())
}
