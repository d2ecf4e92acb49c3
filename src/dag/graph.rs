// src/dag/graph.rs

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::dag::task::Task;
use crate::dag::validate::validate_tasks;
use crate::engine::TaskName;
use crate::errors::{AssetflowError, Result};
use crate::watch::WatchBinding;

/// Registry of tasks keyed by name, with dependents precomputed.
///
/// Construction validates that every dependency and binding target exists and
/// that the dependency relation is acyclic. The graph is immutable once built;
/// [`TaskGraph::extend`] produces a new validated graph.
#[derive(Debug, Clone, Default)]
pub struct TaskGraph {
    tasks: BTreeMap<TaskName, Arc<Task>>,
    dependents: BTreeMap<TaskName, Vec<TaskName>>,
}

impl TaskGraph {
    pub fn new(tasks: impl IntoIterator<Item = Task>) -> Result<Self> {
        let graph = Self::new_unchecked(tasks)?;
        validate_tasks(&graph.tasks)?;
        Ok(graph)
    }

    /// Build without dependency or cycle validation. Duplicate names are
    /// still rejected; anything else surfaces when a run is resolved.
    pub fn new_unchecked(tasks: impl IntoIterator<Item = Task>) -> Result<Self> {
        let mut map = BTreeMap::new();
        for task in tasks {
            insert_unique(&mut map, task)?;
        }
        Ok(Self::from_map(map))
    }

    /// A new graph with `tasks` added.
    pub fn extend(&self, tasks: impl IntoIterator<Item = Task>) -> Result<Self> {
        let mut map = self.tasks.clone();
        for task in tasks {
            insert_unique(&mut map, task)?;
        }
        validate_tasks(&map)?;
        Ok(Self::from_map(map))
    }

    fn from_map(tasks: BTreeMap<TaskName, Arc<Task>>) -> Self {
        let mut dependents: BTreeMap<TaskName, Vec<TaskName>> = BTreeMap::new();
        for task in tasks.values() {
            for dep in &task.deps {
                dependents.entry(dep.clone()).or_default().push(task.name.clone());
            }
        }
        Self { tasks, dependents }
    }

    pub fn get(&self, name: &str) -> Option<&Arc<Task>> {
        self.tasks.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tasks.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// All tasks, sorted by name.
    pub fn tasks(&self) -> impl Iterator<Item = &Arc<Task>> {
        self.tasks.values()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tasks.keys().map(String::as_str)
    }

    /// Immediate dependencies of a task, in declared order.
    pub fn dependencies_of(&self, name: &str) -> &[TaskName] {
        self.tasks.get(name).map(|t| t.deps.as_slice()).unwrap_or(&[])
    }

    /// Immediate dependents of a task.
    pub fn dependents_of(&self, name: &str) -> &[TaskName] {
        self.dependents.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Watch bindings declared by the named tasks, in the given order.
    pub fn bindings_of<'a>(&'a self, names: &'a [TaskName]) -> impl Iterator<Item = &'a WatchBinding> {
        names
            .iter()
            .filter_map(|name| self.tasks.get(name))
            .filter_map(|task| task.binding.as_ref())
    }
}

fn insert_unique(map: &mut BTreeMap<TaskName, Arc<Task>>, task: Task) -> Result<()> {
    if map.contains_key(&task.name) {
        return Err(AssetflowError::ConfigError(format!(
            "task '{}' is defined more than once",
            task.name
        )));
    }
    map.insert(task.name.clone(), Arc::new(task));
    Ok(())
}
