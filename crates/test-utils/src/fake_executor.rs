use std::collections::HashSet;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use assetflow::dag::ScheduledTask;
use assetflow::engine::{RuntimeEvent, TaskOutcome};
use assetflow::errors::Result;
use assetflow::exec::ExecutorBackend;

/// A fake executor that:
/// - records which tasks were "run" (and what changed, for rebuilds)
/// - immediately reports TaskCompleted for each scheduled task, failing the
///   ones configured with [`FakeExecutor::fail`].
pub struct FakeExecutor {
    runtime_tx: mpsc::Sender<RuntimeEvent>,
    executed: Arc<Mutex<Vec<ScheduledTask>>>,
    failing: HashSet<String>,
}

impl FakeExecutor {
    pub fn new(
        runtime_tx: mpsc::Sender<RuntimeEvent>,
        executed: Arc<Mutex<Vec<ScheduledTask>>>,
    ) -> Self {
        Self {
            runtime_tx,
            executed,
            failing: HashSet::new(),
        }
    }

    pub fn fail(mut self, task: &str) -> Self {
        self.failing.insert(task.to_string());
        self
    }
}

impl ExecutorBackend for FakeExecutor {
    fn spawn_ready_tasks(
        &mut self,
        tasks: Vec<ScheduledTask>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let tx = self.runtime_tx.clone();
        let executed = Arc::clone(&self.executed);
        let failing = self.failing.clone();

        Box::pin(async move {
            for t in tasks {
                {
                    let mut guard = executed.lock().unwrap();
                    guard.push(t.clone());
                }

                let outcome = if failing.contains(&t.name) {
                    TaskOutcome::Failed(format!("{} failed", t.name))
                } else {
                    TaskOutcome::Success
                };

                tx.send(RuntimeEvent::TaskCompleted {
                    task: t.name.clone(),
                    origin: t.origin,
                    outcome,
                })
                .await
                .map_err(anyhow::Error::from)?;
            }
            Ok(())
        })
    }
}
