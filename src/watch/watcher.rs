// src/watch/watcher.rs

use std::path::{Path, PathBuf};

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::engine::{RuntimeEvent, TaskName};
use crate::errors::AssetflowError;
use crate::watch::event_handler::process_event;
use crate::watch::path_utils::relative_str;
use crate::watch::patterns::{TaskWatchProfile, WatchBinding};

struct Observer {
    task: TaskName,
    _inner: RecommendedWatcher,
}

/// Handle for the file-system observers of a watch session.
///
/// This exists mainly so the underlying `RecommendedWatcher`s are kept alive
/// for as long as needed. Dropping this handle stops file watching.
pub struct WatcherHandle {
    observers: Vec<Observer>,
}

impl std::fmt::Debug for WatcherHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatcherHandle")
            .field("tasks", &self.tasks())
            .finish()
    }
}

impl WatcherHandle {
    /// Number of attached observers (one per healthy binding).
    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }

    /// Tasks with an attached observer.
    pub fn tasks(&self) -> Vec<&str> {
        self.observers.iter().map(|o| o.task.as_str()).collect()
    }
}

/// Attach one observer per binding and forward matching changes to the
/// runtime as `RuntimeEvent::TaskTriggered`.
///
/// - `root` is the directory binding patterns are relative to.
/// - Changes below `output_root` are ignored.
///
/// A binding whose observer cannot be attached is reported in the returned
/// error list and simply not watched; the other bindings are unaffected.
pub fn spawn_watchers(
    root: &Path,
    output_root: &Path,
    bindings: Vec<WatchBinding>,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
) -> (WatcherHandle, Vec<AssetflowError>) {
    let root = root.canonicalize().unwrap_or_else(|_| root.to_path_buf());
    let ignored_dir = relative_str(&root, output_root).filter(|rel| !rel.is_empty());

    // Channel from the blocking notify callbacks into the async world, tagged
    // with the index of the profile the observer belongs to.
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<(usize, Event)>();

    let mut profiles = Vec::new();
    let mut observers = Vec::new();
    let mut errors = Vec::new();

    for binding in bindings {
        let profile = match TaskWatchProfile::compile(&binding) {
            Ok(p) => p,
            Err(err) => {
                errors.push(AssetflowError::Other(err));
                continue;
            }
        };

        match attach(&root, &binding, profiles.len(), event_tx.clone()) {
            Ok(watcher) => {
                info!(task = %binding.task, patterns = ?binding.patterns, "watching");
                profiles.push(profile);
                observers.push(Observer {
                    task: binding.task,
                    _inner: watcher,
                });
            }
            Err(source) => errors.push(AssetflowError::WatchObserver {
                task: binding.task,
                patterns: binding.patterns,
                source,
            }),
        }
    }

    tokio::spawn(async move {
        while let Some((index, event)) = event_rx.recv().await {
            debug!(?event, "received notify event");
            let Some(profile) = profiles.get(index) else {
                continue;
            };
            if !process_event(&root, ignored_dir.as_deref(), profile, &event, &runtime_tx).await {
                break;
            }
        }
        debug!("watcher event loop finished");
    });

    (WatcherHandle { observers }, errors)
}

fn attach(
    root: &Path,
    binding: &WatchBinding,
    index: usize,
    event_tx: mpsc::UnboundedSender<(usize, Event)>,
) -> notify::Result<RecommendedWatcher> {
    let task = binding.task.clone();
    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| match res {
            Ok(event) => {
                // Receiver gone means the session is shutting down.
                let _ = event_tx.send((index, event));
            }
            Err(err) => warn!(task = %task, error = %err, "file watch error"),
        },
        Config::default(),
    )?;

    for base in binding.static_bases() {
        let dir: PathBuf = root.join(base);
        watcher.watch(&dir, RecursiveMode::Recursive)?;
        debug!(task = %binding.task, dir = %dir.display(), "observer attached");
    }

    Ok(watcher)
}
