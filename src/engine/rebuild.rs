// src/engine/rebuild.rs

use std::collections::{HashSet, VecDeque};
use std::path::PathBuf;

use tracing::debug;

use crate::dag::ScheduledTask;
use crate::engine::TaskName;

/// Leaf re-executions requested by watch bindings.
///
/// Semantics:
/// - A task is never dispatched twice at the same time: a request for a task
///   that is in flight is parked.
/// - At most one parked request exists per task; later requests merge their
///   changed paths into it.
/// - Requests can also be deferred while a full run is active and released in
///   arrival order once it finished.
#[derive(Debug, Default)]
pub struct RebuildQueue {
    in_flight: HashSet<TaskName>,
    /// Parked requests in arrival order.
    pending: VecDeque<(TaskName, Vec<PathBuf>)>,
}

impl RebuildQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if nothing is in flight or parked.
    pub fn is_empty(&self) -> bool {
        self.in_flight.is_empty() && self.pending.is_empty()
    }

    pub fn is_in_flight(&self, task: &str) -> bool {
        self.in_flight.contains(task)
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Request a rebuild. Returns the task to dispatch now, if any.
    pub fn request(&mut self, task: TaskName, changed: Vec<PathBuf>) -> Option<ScheduledTask> {
        if self.in_flight.contains(&task) {
            debug!(task = %task, "rebuild already in flight; parking request");
            self.park(task, changed);
            return None;
        }
        self.in_flight.insert(task.clone());
        Some(ScheduledTask::rebuild(task, changed))
    }

    /// Park a request without dispatching it.
    pub fn defer(&mut self, task: TaskName, changed: Vec<PathBuf>) {
        debug!(task = %task, "deferring rebuild until the active run finishes");
        self.park(task, changed);
    }

    fn park(&mut self, task: TaskName, changed: Vec<PathBuf>) {
        if let Some((_, paths)) = self.pending.iter_mut().find(|(name, _)| *name == task) {
            for path in changed {
                if !paths.contains(&path) {
                    paths.push(path);
                }
            }
        } else {
            self.pending.push_back((task, changed));
        }
    }

    /// A rebuild finished. Returns the parked follow-up for the same task.
    pub fn complete(&mut self, task: &str) -> Option<ScheduledTask> {
        self.in_flight.remove(task);
        let index = self.pending.iter().position(|(name, _)| name == task)?;
        let (name, changed) = self.pending.remove(index)?;
        self.in_flight.insert(name.clone());
        Some(ScheduledTask::rebuild(name, changed))
    }

    /// Dispatch every parked request whose task is not in flight.
    pub fn release(&mut self) -> Vec<ScheduledTask> {
        let mut ready = Vec::new();
        let mut kept = VecDeque::new();
        while let Some((name, changed)) = self.pending.pop_front() {
            if self.in_flight.contains(&name) {
                kept.push_back((name, changed));
            } else {
                self.in_flight.insert(name.clone());
                ready.push(ScheduledTask::rebuild(name, changed));
            }
        }
        self.pending = kept;
        ready
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(s: &str) -> PathBuf {
        PathBuf::from(s)
    }

    #[test]
    fn second_request_waits_and_merges() {
        let mut q = RebuildQueue::new();

        assert!(q.request("js:build".into(), vec![p("a.js")]).is_some());
        assert!(q.request("js:build".into(), vec![p("b.js")]).is_none());
        assert!(q.request("js:build".into(), vec![p("b.js"), p("c.js")]).is_none());
        assert_eq!(q.pending_len(), 1);

        let next = q.complete("js:build").unwrap();
        assert_eq!(next.changed, vec![p("b.js"), p("c.js")]);
        assert!(q.is_in_flight("js:build"));

        assert!(q.complete("js:build").is_none());
        assert!(q.is_empty());
    }

    #[test]
    fn distinct_tasks_do_not_block_each_other() {
        let mut q = RebuildQueue::new();
        assert!(q.request("js:build".into(), vec![]).is_some());
        assert!(q.request("css:build".into(), vec![]).is_some());
    }

    #[test]
    fn deferred_requests_release_in_order() {
        let mut q = RebuildQueue::new();
        q.defer("css:build".into(), vec![p("a.scss")]);
        q.defer("js:build".into(), vec![p("a.js")]);
        q.defer("css:build".into(), vec![p("b.scss")]);

        let ready: Vec<_> = q.release().into_iter().map(|t| (t.name, t.changed)).collect();
        assert_eq!(
            ready,
            vec![
                ("css:build".to_string(), vec![p("a.scss"), p("b.scss")]),
                ("js:build".to_string(), vec![p("a.js")]),
            ]
        );
    }
}
