// src/dag/validate.rs

use std::collections::BTreeMap;
use std::sync::Arc;

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::dag::task::Task;
use crate::engine::TaskName;
use crate::errors::{AssetflowError, Result};

pub(crate) fn validate_tasks(tasks: &BTreeMap<TaskName, Arc<Task>>) -> Result<()> {
    validate_references(tasks)?;
    validate_acyclic(tasks)?;
    Ok(())
}

fn validate_references(tasks: &BTreeMap<TaskName, Arc<Task>>) -> Result<()> {
    for (name, task) in tasks {
        let referenced = task
            .deps
            .iter()
            .chain(task.binding.as_ref().map(|b| &b.task));

        for dep in referenced {
            if !tasks.contains_key(dep) {
                return Err(AssetflowError::UnknownTask {
                    name: dep.clone(),
                    referenced_by: Some(name.clone()),
                });
            }
        }
    }
    Ok(())
}

fn validate_acyclic(tasks: &BTreeMap<TaskName, Arc<Task>>) -> Result<()> {
    // Edge direction: dep -> task.
    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();

    for name in tasks.keys() {
        graph.add_node(name.as_str());
    }
    for (name, task) in tasks {
        for dep in &task.deps {
            graph.add_edge(dep.as_str(), name.as_str(), ());
        }
    }

    match toposort(&graph, None) {
        Ok(_order) => Ok(()),
        Err(cycle) => {
            let start = cycle.node_id();
            let path = cycle_path(tasks, start).unwrap_or_else(|| vec![start.to_string()]);
            Err(AssetflowError::Cycle { path })
        }
    }
}

/// Follow dependencies from `start` until it is reached again.
///
/// The returned path starts and ends with `start`.
fn cycle_path(tasks: &BTreeMap<TaskName, Arc<Task>>, start: &str) -> Option<Vec<TaskName>> {
    fn dfs<'a>(
        tasks: &'a BTreeMap<TaskName, Arc<Task>>,
        start: &str,
        current: &'a str,
        path: &mut Vec<&'a str>,
        seen: &mut Vec<&'a str>,
    ) -> bool {
        let Some(task) = tasks.get(current) else {
            return false;
        };
        for dep in &task.deps {
            if dep == start {
                path.push(dep);
                return true;
            }
            if seen.contains(&dep.as_str()) {
                continue;
            }
            seen.push(dep);
            path.push(dep);
            if dfs(tasks, start, dep, path, seen) {
                return true;
            }
            path.pop();
        }
        false
    }

    let (key, _) = tasks.get_key_value(start)?;
    let mut path = vec![key.as_str()];
    let mut seen = Vec::new();
    if dfs(tasks, start, key, &mut path, &mut seen) {
        Some(path.into_iter().map(str::to_string).collect())
    } else {
        None
    }
}
