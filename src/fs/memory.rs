// src/fs/memory.rs

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::{anyhow, Result};

use super::FileSystem;

/// In-memory filesystem for tests.
///
/// Only files are stored; directories exist implicitly as prefixes of file
/// paths. Every read is recorded so tests can assert what a pipeline touched.
#[derive(Debug, Clone, Default)]
pub struct MemoryFileSystem {
    files: Arc<Mutex<BTreeMap<PathBuf, Vec<u8>>>>,
    reads: Arc<Mutex<Vec<PathBuf>>>,
}

impl MemoryFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_file(&self, path: impl AsRef<Path>, content: impl Into<Vec<u8>>) {
        self.lock_files()
            .insert(path.as_ref().to_path_buf(), content.into());
    }

    /// Contents of a file as UTF-8, if present.
    pub fn contents(&self, path: impl AsRef<Path>) -> Option<String> {
        self.lock_files()
            .get(path.as_ref())
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
    }

    /// All stored file paths, sorted.
    pub fn paths(&self) -> Vec<PathBuf> {
        self.lock_files().keys().cloned().collect()
    }

    /// Paths read since the last [`MemoryFileSystem::clear_reads`].
    pub fn reads(&self) -> Vec<PathBuf> {
        self.lock_reads().clone()
    }

    pub fn clear_reads(&self) {
        self.lock_reads().clear();
    }

    fn lock_files(&self) -> MutexGuard<'_, BTreeMap<PathBuf, Vec<u8>>> {
        self.files.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn lock_reads(&self) -> MutexGuard<'_, Vec<PathBuf>> {
        self.reads.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl FileSystem for MemoryFileSystem {
    fn read(&self, path: &Path) -> Result<Vec<u8>> {
        let content = self
            .lock_files()
            .get(path)
            .cloned()
            .ok_or_else(|| anyhow!("File not found: {:?}", path))?;
        self.lock_reads().push(path.to_path_buf());
        Ok(content)
    }

    fn read_to_string(&self, path: &Path) -> Result<String> {
        let bytes = self.read(path)?;
        String::from_utf8(bytes).map_err(|e| anyhow!("Invalid UTF-8 in {:?}: {}", path, e))
    }

    fn write(&self, path: &Path, contents: &[u8]) -> Result<()> {
        self.add_file(path, contents);
        Ok(())
    }

    fn remove(&self, path: &Path) -> Result<()> {
        self.lock_files()
            .retain(|stored, _| stored != path && !stored.starts_with(path));
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        self.is_file(path) || self.is_dir(path)
    }

    fn is_file(&self, path: &Path) -> bool {
        self.lock_files().contains_key(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.lock_files()
            .keys()
            .any(|stored| stored != path && stored.starts_with(path))
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>> {
        let files = self.lock_files();
        let mut children = BTreeSet::new();

        for stored in files.keys() {
            if let Ok(rest) = stored.strip_prefix(path) {
                if let Some(first) = rest.components().next() {
                    children.insert(path.join(first));
                }
            }
        }

        if children.is_empty() {
            return Err(anyhow!("Not a directory or not found: {:?}", path));
        }
        Ok(children.into_iter().collect())
    }
}
