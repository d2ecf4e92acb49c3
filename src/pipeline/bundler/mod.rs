// src/pipeline/bundler/mod.rs

//! Incremental script bundling.
//!
//! [`BundleInput`] is the input source of the script pipeline. It owns a
//! [`BundlerCache`] that lives across invocations while the build is in watch
//! mode, so a rebuild triggered by a change only re-reads the changed modules.

pub mod cache;
pub mod module;

use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

use tracing::debug;

use crate::pipeline::error::TransformError;
use crate::pipeline::file::AssetFile;
use crate::pipeline::input::{InputContext, InputSource};

pub use cache::{Bundle, BundlerCache, CacheStats};

pub struct BundleInput {
    entry: String,
    output_name: PathBuf,
    cache: Mutex<Option<BundlerCache>>,
    last_stats: Mutex<Option<CacheStats>>,
}

impl BundleInput {
    /// `entry` is relative to the source root.
    pub fn new(entry: impl Into<String>, output_name: impl Into<PathBuf>) -> Self {
        Self {
            entry: entry.into(),
            output_name: output_name.into(),
            cache: Mutex::new(None),
            last_stats: Mutex::new(None),
        }
    }

    /// Whether a module graph is being kept for the next invocation.
    pub fn is_cached(&self) -> bool {
        lock(&self.cache).is_some()
    }

    /// Work done by the most recent bundle.
    pub fn last_stats(&self) -> Option<CacheStats> {
        *lock(&self.last_stats)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl std::fmt::Debug for BundleInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BundleInput")
            .field("entry", &self.entry)
            .field("output_name", &self.output_name)
            .field("cached", &self.is_cached())
            .finish()
    }
}

impl InputSource for BundleInput {
    fn describe(&self) -> String {
        format!("bundle({})", self.entry)
    }

    fn collect(&self, ctx: &InputContext<'_>) -> Result<Vec<AssetFile>, TransformError> {
        let mut slot = lock(&self.cache);
        let cache = slot.get_or_insert_with(|| {
            debug!(entry = %self.entry, "creating bundler cache");
            BundlerCache::new(self.entry.clone())
        });

        cache.invalidate(ctx.changed);
        let result = cache.bundle(ctx.fs, ctx.source_root);

        if !ctx.mode.watch() {
            *slot = None;
        }

        let bundle = result?;
        *lock(&self.last_stats) = Some(bundle.stats);

        Ok(vec![
            AssetFile::new(self.output_name.clone(), bundle.text).with_origin(bundle.origin),
        ])
    }
}
