// src/watch/patterns.rs

use std::fmt;
use std::path::PathBuf;

use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};

use crate::engine::TaskName;

/// Association between path patterns and the task they rebuild.
///
/// Patterns are globs relative to the source root, e.g.
/// `components/**/*.scss`. Many patterns map to one task; several bindings
/// may coexist, including bindings for the same task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchBinding {
    /// Task re-invoked when a matching path changes.
    pub task: TaskName,
    pub patterns: Vec<String>,
    pub excludes: Vec<String>,
}

impl WatchBinding {
    pub fn new<I, S>(task: impl Into<TaskName>, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            task: task.into(),
            patterns: patterns.into_iter().map(Into::into).collect(),
            excludes: Vec::new(),
        }
    }

    pub fn exclude<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.excludes.extend(patterns.into_iter().map(Into::into));
        self
    }

    /// Directories (relative to the root) an observer has to cover so that
    /// every pattern can match, deduplicated and without nested entries.
    pub fn static_bases(&self) -> Vec<PathBuf> {
        let mut bases: Vec<PathBuf> = self.patterns.iter().map(|p| static_base(p)).collect();
        bases.sort();
        bases.dedup();

        let mut out: Vec<PathBuf> = Vec::new();
        for base in bases {
            if !out.iter().any(|kept| base.starts_with(kept)) {
                out.push(base);
            }
        }
        out
    }
}

/// Compiled include/exclude glob patterns for a single binding.
///
/// The watcher passes root-relative paths with forward slashes (e.g.
/// `"components/app.scss"`) into `matches`.
#[derive(Clone)]
pub struct TaskWatchProfile {
    task: TaskName,
    watch_set: GlobSet,
    exclude_set: Option<GlobSet>,
}

impl fmt::Debug for TaskWatchProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskWatchProfile")
            .field("task", &self.task)
            .finish_non_exhaustive()
    }
}

impl TaskWatchProfile {
    pub fn compile(binding: &WatchBinding) -> Result<Self> {
        let watch_set = build_globset(&binding.patterns)
            .with_context(|| format!("building watch globset for task {}", binding.task))?;

        let exclude_set = if binding.excludes.is_empty() {
            None
        } else {
            Some(
                build_globset(&binding.excludes)
                    .with_context(|| format!("building exclude globset for task {}", binding.task))?,
            )
        };

        Ok(Self {
            task: binding.task.clone(),
            watch_set,
            exclude_set,
        })
    }

    /// Task this profile triggers.
    pub fn task(&self) -> &str {
        &self.task
    }

    pub fn matches(&self, rel_path: &str) -> bool {
        if !self.watch_set.is_match(rel_path) {
            return false;
        }
        if let Some(exclude) = &self.exclude_set {
            if exclude.is_match(rel_path) {
                return false;
            }
        }
        true
    }
}

/// Build a GlobSet from simple string patterns.
pub(crate) fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        let glob = Glob::new(pat).with_context(|| format!("invalid glob pattern: {pat}"))?;
        builder.add(glob);
    }
    Ok(builder.build()?)
}

/// Leading path components of `pattern` that contain no glob syntax.
pub fn static_base(pattern: &str) -> PathBuf {
    let parts: Vec<&str> = pattern.split('/').collect();
    let literal = parts
        .iter()
        .take_while(|part| !part.contains(['*', '?', '[', '{']))
        .count();
    // a pattern without glob syntax names a file; watch its directory
    let end = if literal == parts.len() {
        literal.saturating_sub(1)
    } else {
        literal
    };
    parts[..end].iter().filter(|part| !part.is_empty()).collect()
}
