// src/watch/path_utils.rs

//! Path normalisation for watcher events.

use std::path::{Path, PathBuf};

/// Convert `path` into a string relative to `root`, with forward slashes.
///
/// - First try a direct `strip_prefix(root)`.
/// - If that fails (symlinked roots, `/private/var` on macOS), canonicalize
///   the root and the path's parent directory and try again. The parent is
///   used because a removed file can no longer be canonicalized.
///
/// Returns `None` if the path is not below `root`.
pub fn relative_str(root: &Path, path: &Path) -> Option<String> {
    if let Ok(rel) = path.strip_prefix(root) {
        return Some(to_slash(rel));
    }

    let root_canon = root.canonicalize().ok()?;
    let path_canon = canonicalize_lenient(path)?;
    path_canon.strip_prefix(&root_canon).ok().map(to_slash)
}

fn canonicalize_lenient(path: &Path) -> Option<PathBuf> {
    if let Ok(canon) = path.canonicalize() {
        return Some(canon);
    }
    let parent = path.parent()?.canonicalize().ok()?;
    Some(parent.join(path.file_name()?))
}

fn to_slash(rel: &Path) -> String {
    rel.to_string_lossy().replace('\\', "/")
}

/// Whether root-relative `rel` lies inside the directory `dir` (also
/// root-relative, forward slashes).
pub fn is_within(rel: &str, dir: &str) -> bool {
    !dir.is_empty() && (rel == dir || rel.strip_prefix(dir).is_some_and(|rest| rest.starts_with('/')))
}
