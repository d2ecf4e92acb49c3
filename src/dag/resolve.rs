// src/dag/resolve.rs

//! Depth-first resolution of a target into an invocation order.

use std::collections::HashSet;

use tracing::debug;

use crate::dag::graph::TaskGraph;
use crate::dag::task::TaskAction;
use crate::engine::TaskName;
use crate::errors::{AssetflowError, Result};
use crate::types::BuildMode;
use crate::watch::WatchBinding;

/// Every task a target needs, in invocation order.
///
/// Each task appears exactly once, after all of its dependencies, and
/// siblings keep their declared order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunPlan {
    target: TaskName,
    order: Vec<TaskName>,
}

impl RunPlan {
    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn order(&self) -> &[TaskName] {
        &self.order
    }

    pub fn contains(&self, name: &str) -> bool {
        self.order.iter().any(|n| n == name)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Build mode implied by the `mode:*` tasks in the plan.
    pub fn mode(&self, graph: &TaskGraph) -> BuildMode {
        BuildMode::from_flags(self.order.iter().filter_map(|name| {
            match graph.get(name).map(|task| &task.action) {
                Some(TaskAction::SetMode(flag)) => Some(*flag),
                _ => None,
            }
        }))
    }

    /// Watch bindings declared by tasks in the plan.
    pub fn bindings(&self, graph: &TaskGraph) -> Vec<WatchBinding> {
        graph.bindings_of(&self.order).cloned().collect()
    }
}

/// Resolve `target` against `graph`.
///
/// The whole plan is resolved before returning, so an unknown dependency or
/// a cycle anywhere below the target is reported before any task runs.
pub fn resolve(graph: &TaskGraph, target: &str) -> Result<RunPlan> {
    let mut resolver = Resolver {
        graph,
        resolving: Vec::new(),
        done: HashSet::new(),
        order: Vec::new(),
    };
    resolver.visit(target, None)?;

    debug!(target, order = ?resolver.order, "resolved run plan");

    Ok(RunPlan {
        target: target.to_string(),
        order: resolver.order,
    })
}

struct Resolver<'g> {
    graph: &'g TaskGraph,
    /// Tasks whose dependencies are being resolved, outermost first.
    resolving: Vec<TaskName>,
    done: HashSet<TaskName>,
    order: Vec<TaskName>,
}

impl Resolver<'_> {
    fn visit(&mut self, name: &str, referenced_by: Option<&str>) -> Result<()> {
        if self.done.contains(name) {
            return Ok(());
        }

        if let Some(pos) = self.resolving.iter().position(|n| n == name) {
            let mut path = self.resolving[pos..].to_vec();
            path.push(name.to_string());
            return Err(AssetflowError::Cycle { path });
        }

        let task = self
            .graph
            .get(name)
            .ok_or_else(|| AssetflowError::UnknownTask {
                name: name.to_string(),
                referenced_by: referenced_by.map(str::to_string),
            })?
            .clone();

        self.resolving.push(name.to_string());
        for dep in &task.deps {
            self.visit(dep, Some(name))?;
        }
        self.resolving.pop();

        self.done.insert(name.to_string());
        self.order.push(name.to_string());
        Ok(())
    }
}
