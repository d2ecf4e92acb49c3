// src/watch/event_handler.rs

//! Turning notify events into rebuild triggers.

use std::path::{Path, PathBuf};

use notify::event::ModifyKind;
use notify::{Event, EventKind};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::engine::{RuntimeEvent, TriggerReason};
use crate::watch::path_utils::{is_within, relative_str};
use crate::watch::patterns::TaskWatchProfile;

/// Root-relative paths of `event` that should rebuild `profile`'s task.
///
/// Only content-affecting events count (create, modify, remove); metadata
/// changes and accesses are ignored, as is anything below `ignored_dir`.
pub fn changed_paths(
    root: &Path,
    ignored_dir: Option<&str>,
    profile: &TaskWatchProfile,
    event: &Event,
) -> Vec<PathBuf> {
    let relevant = match &event.kind {
        EventKind::Create(_) | EventKind::Remove(_) => true,
        EventKind::Modify(ModifyKind::Metadata(_)) => false,
        EventKind::Modify(_) => true,
        _ => false,
    };
    if !relevant {
        return Vec::new();
    }

    let mut out = Vec::new();
    for path in &event.paths {
        let Some(rel) = relative_str(root, path) else {
            warn!("could not relativize path {:?} against root {:?}", path, root);
            continue;
        };
        if ignored_dir.is_some_and(|dir| is_within(&rel, dir)) {
            continue;
        }
        if profile.matches(&rel) {
            let rel = PathBuf::from(rel);
            if !out.contains(&rel) {
                out.push(rel);
            }
        }
    }
    out
}

/// Forward one event for one binding. A single event triggers the bound task
/// at most once, carrying every matching path.
///
/// Returns `false` once the runtime is gone.
pub async fn process_event(
    root: &Path,
    ignored_dir: Option<&str>,
    profile: &TaskWatchProfile,
    event: &Event,
    runtime_tx: &mpsc::Sender<RuntimeEvent>,
) -> bool {
    let changed = changed_paths(root, ignored_dir, profile, event);
    if changed.is_empty() {
        return true;
    }

    debug!(task = %profile.task(), ?changed, "watch match -> triggering task");

    if let Err(err) = runtime_tx
        .send(RuntimeEvent::TaskTriggered {
            task: profile.task().to_string(),
            reason: TriggerReason::FileWatch,
            changed,
        })
        .await
    {
        warn!("failed to send RuntimeEvent::TaskTriggered: {err}");
        return false;
    }
    true
}
