// src/engine/runtime.rs

use std::fmt;
use std::path::PathBuf;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::dag::{RunState, ScheduledTask};
use crate::errors::Result;
use crate::exec::ExecutorBackend;
use crate::reload::NotificationChannel;
use crate::watch::{spawn_watchers, WatchBinding, WatcherHandle};

use super::core::CoreRuntime;
use super::{CoreCommand, RuntimeEvent};

/// Where observers are attached once the core asks for them.
#[derive(Debug, Clone)]
pub struct WatchSetup {
    /// Root that binding patterns are relative to (the source root).
    pub root: PathBuf,
    /// Changes below this directory never trigger rebuilds.
    pub output_root: PathBuf,
    /// Sender the observers report changes on.
    pub runtime_tx: mpsc::Sender<RuntimeEvent>,
}

/// Drives the scheduler in response to `RuntimeEvent`s, and delegates task
/// execution to an `ExecutorBackend`.
///
/// This is a pure IO shell around `CoreRuntime`, which contains all the
/// runtime semantics. This struct handles async IO: reading events from
/// channels, dispatching tasks to the executor and owning the file watchers
/// and the notification channel for the lifetime of the session.
pub struct Runtime<E: ExecutorBackend> {
    core: CoreRuntime,
    event_rx: mpsc::Receiver<RuntimeEvent>,
    executor: E,
    watch: Option<WatchSetup>,
    notifier: Option<NotificationChannel>,
    watchers: Option<WatcherHandle>,
}

impl<E: ExecutorBackend> fmt::Debug for Runtime<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("core", &self.core)
            .field("watch", &self.watch)
            .finish_non_exhaustive()
    }
}

impl<E: ExecutorBackend> Runtime<E> {
    pub fn new(core: CoreRuntime, event_rx: mpsc::Receiver<RuntimeEvent>, executor: E) -> Self {
        Self {
            core,
            event_rx,
            executor,
            watch: None,
            notifier: None,
            watchers: None,
        }
    }

    pub fn with_watch(mut self, setup: WatchSetup) -> Self {
        self.watch = Some(setup);
        self
    }

    /// Channel closed when the runtime stops.
    pub fn with_notifier(mut self, notifier: NotificationChannel) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Main event loop.
    ///
    /// - Consumes `RuntimeEvent`s from `event_rx`.
    /// - Feeds them into the core runtime.
    /// - Executes commands returned by the core (dispatch, watch, exit).
    ///
    /// On exit every observer is dropped and the notification channel is
    /// closed before the core's result is returned.
    pub async fn run(mut self) -> Result<RunState> {
        info!("assetflow runtime started");

        loop {
            let event = match self.event_rx.recv().await {
                Some(e) => e,
                None => {
                    info!("runtime event channel closed; exiting");
                    break;
                }
            };

            debug!(?event, "runtime received event");

            let step = self.core.step(event);

            for command in step.commands {
                self.execute_command(command).await?;
            }

            if !step.keep_running {
                debug!("core requested exit; stopping runtime");
                break;
            }
        }

        self.shutdown();
        self.core.into_result()
    }

    fn shutdown(&mut self) {
        if let Some(watchers) = self.watchers.take() {
            debug!(observers = watchers.len(), "dropping file watchers");
        }
        if let Some(notifier) = &self.notifier {
            notifier.close();
        }
        info!("runtime exiting");
    }

    async fn execute_command(&mut self, command: CoreCommand) -> Result<()> {
        match command {
            CoreCommand::DispatchTasks(tasks) => self.spawn_ready(tasks).await?,
            CoreCommand::StartWatching(bindings) => self.start_watching(bindings),
            CoreCommand::RequestExit => debug!("core issued RequestExit command"),
        }
        Ok(())
    }

    fn start_watching(&mut self, bindings: Vec<WatchBinding>) {
        let Some(setup) = &self.watch else {
            warn!(bindings = bindings.len(), "no watch setup; bindings ignored");
            return;
        };

        let (handle, errors) = spawn_watchers(
            &setup.root,
            &setup.output_root,
            bindings,
            setup.runtime_tx.clone(),
        );
        for err in errors {
            warn!(error = %err, "watch binding degraded to initial build only");
        }
        self.watchers = Some(handle);
    }

    async fn spawn_ready(&mut self, tasks: Vec<ScheduledTask>) -> Result<()> {
        if tasks.is_empty() {
            return Ok(());
        }

        let names: Vec<_> = tasks.iter().map(|t| t.name.as_str()).collect();
        debug!(?names, "dispatching ready tasks");

        self.executor.spawn_ready_tasks(tasks).await
    }
}
