// src/pipeline/bundler/cache.rs

//! The module graph kept between bundles while watching.

use std::collections::{BTreeMap, BTreeSet};
use std::ops::Range;
use std::path::{Path, PathBuf};

use tracing::{debug, trace};

use crate::fs::FileSystem;
use crate::pipeline::bundler::module;
use crate::pipeline::error::TransformError;
use crate::pipeline::file::{line_count, SourceOrigin};

const PRELUDE: &str = "(function (modules, entry) {
  var cache = {};
  function load(id) {
    if (cache[id]) return cache[id].exports;
    var module = cache[id] = { exports: {} };
    var def = modules[id];
    def[0].call(module.exports, function (name) { return load(def[1][name]); }, module, module.exports);
    return module.exports;
  }
  load(entry);
})({
";

#[derive(Debug, Clone)]
struct CachedModule {
    digest: blake3::Hash,
    source: String,
    compiled: String,
    /// specifier -> module id
    resolved: BTreeMap<String, String>,
}

/// Work done by one [`BundlerCache::bundle`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub modules_read: usize,
    pub modules_compiled: usize,
}

/// Output of one bundle.
#[derive(Debug, Clone)]
pub struct Bundle {
    pub text: String,
    pub origin: SourceOrigin,
    /// Byte range of each module's region in `text`.
    pub regions: BTreeMap<String, Range<usize>>,
    pub stats: CacheStats,
}

impl Bundle {
    pub fn region(&self, id: &str) -> Option<&str> {
        self.regions.get(id).map(|range| &self.text[range.clone()])
    }
}

/// Module graph keyed by module id.
///
/// Ids are `/`-separated paths relative to the source root. A module is only
/// re-read when it is missing or was invalidated; a re-read module whose
/// digest did not change keeps its compiled form.
#[derive(Debug)]
pub struct BundlerCache {
    entry: String,
    modules: BTreeMap<String, CachedModule>,
    stale: BTreeSet<String>,
}

impl BundlerCache {
    /// `entry` is relative to the source root; it is stored by its canonical
    /// module id.
    pub fn new(entry: impl Into<String>) -> Self {
        let entry = entry.into();
        Self {
            entry: module::module_id(&entry).unwrap_or(entry),
            modules: BTreeMap::new(),
            stale: BTreeSet::new(),
        }
    }

    pub fn entry(&self) -> &str {
        &self.entry
    }

    pub fn module_ids(&self) -> impl Iterator<Item = &str> {
        self.modules.keys().map(String::as_str)
    }

    /// Mark the modules behind `changed` (source-root-relative) for re-reading.
    pub fn invalidate(&mut self, changed: &[PathBuf]) {
        for path in changed {
            let Some(id) = module::module_id(&path.to_string_lossy()) else {
                continue;
            };
            if self.modules.contains_key(&id) {
                trace!(module = %id, "invalidated");
                self.stale.insert(id);
            }
        }
    }

    pub fn bundle(&mut self, fs: &dyn FileSystem, source_root: &Path) -> Result<Bundle, TransformError> {
        let mut stats = CacheStats::default();
        let mut reachable = BTreeSet::new();
        let mut queue = vec![self.entry.clone()];

        while let Some(id) = queue.pop() {
            if !reachable.insert(id.clone()) {
                continue;
            }
            if !self.modules.contains_key(&id) || self.stale.contains(&id) {
                self.load(fs, source_root, &id, &mut stats)?;
            }
            if let Some(module) = self.modules.get(&id) {
                queue.extend(module.resolved.values().cloned());
            }
        }

        self.modules.retain(|id, _| reachable.contains(id));
        self.stale.clear();

        debug!(
            entry = %self.entry,
            modules = self.modules.len(),
            read = stats.modules_read,
            compiled = stats.modules_compiled,
            "bundled script modules"
        );

        Ok(self.emit(stats))
    }

    fn load(
        &mut self,
        fs: &dyn FileSystem,
        source_root: &Path,
        id: &str,
        stats: &mut CacheStats,
    ) -> Result<(), TransformError> {
        let source = fs
            .read_to_string(&source_root.join(id))
            .map_err(|err| TransformError::Input {
                input: id.to_string(),
                message: format!("{err:#}"),
            })?;
        stats.modules_read += 1;

        let digest = blake3::hash(source.as_bytes());
        if let Some(existing) = self.modules.get(id) {
            if existing.digest == digest {
                self.stale.remove(id);
                return Ok(());
            }
        }

        let compiled = module::compile(&source);
        stats.modules_compiled += 1;

        let mut resolved = BTreeMap::new();
        for specifier in module::requires(&compiled) {
            let target = module::resolve(fs, source_root, id, &specifier).ok_or_else(|| {
                TransformError::UnresolvedModule {
                    specifier: specifier.clone(),
                    from: id.to_string(),
                }
            })?;
            resolved.insert(specifier, target);
        }

        self.stale.remove(id);
        self.modules.insert(
            id.to_string(),
            CachedModule {
                digest,
                source,
                compiled,
                resolved,
            },
        );
        Ok(())
    }

    fn emit(&self, stats: CacheStats) -> Bundle {
        let mut text = String::from(PRELUDE);
        let mut origin = SourceOrigin::default();
        let mut regions = BTreeMap::new();
        let mut line = line_count(PRELUDE);

        for (id, module) in &self.modules {
            let start = text.len();
            let key = quote(id);
            let deps = serde_json::to_string(&module.resolved).unwrap_or_else(|_| "{}".into());

            text.push_str(&format!("{key}: [function (require, module, exports) {{\n"));
            line += 1;

            let mapped = line_count(&module.compiled).min(line_count(&module.source));
            origin.push_source(id.as_str(), module.source.as_str(), line, mapped);

            text.push_str(&module.compiled);
            if !module.compiled.is_empty() && !module.compiled.ends_with('\n') {
                text.push('\n');
            }
            line += line_count(&module.compiled);

            text.push_str(&format!("}}, {deps}],\n"));
            line += 1;

            regions.insert(id.clone(), start..text.len());
        }

        text.push_str(&format!("}}, {});\n", quote(&self.entry)));

        Bundle {
            text,
            origin,
            regions,
            stats,
        }
    }
}

fn quote(id: &str) -> String {
    serde_json::to_string(id).unwrap_or_else(|_| format!("\"{id}\""))
}
