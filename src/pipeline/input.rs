// src/pipeline/input.rs

//! Where a pipeline's files come from.
//!
//! Every pipeline starts from an [`InputSource`]: a glob over the source tree,
//! a programmatic render producing one virtual file, or the script bundler.
//! All of them hand the same `Vec<AssetFile>` shape to the first stage.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use globset::GlobSet;
use tracing::debug;

use crate::fs::{walk_files, FileSystem};
use crate::pipeline::error::TransformError;
use crate::pipeline::file::AssetFile;
use crate::pipeline::render::Renderer;
use crate::types::BuildMode;
use crate::watch::patterns::build_globset;

/// What an input source may look at while collecting.
pub struct InputContext<'a> {
    pub fs: &'a dyn FileSystem,
    pub source_root: &'a Path,
    pub mode: BuildMode,
    /// Source-root-relative paths that changed since the previous
    /// invocation (empty for a full build).
    pub changed: &'a [PathBuf],
}

pub trait InputSource: Send + Sync {
    /// Short human-readable description for logs and dry runs.
    fn describe(&self) -> String;

    fn collect(&self, ctx: &InputContext<'_>) -> Result<Vec<AssetFile>, TransformError>;
}

/// Files below `base` (relative to the source root) matching `patterns`.
///
/// Output paths keep the sub-path below `base`, so `components/a/b.png`
/// with base `components` becomes `a/b.png`.
pub struct GlobInput {
    base: PathBuf,
    patterns: Vec<String>,
    matcher: GlobSet,
    required: bool,
}

impl GlobInput {
    pub fn new(base: impl Into<PathBuf>, patterns: Vec<String>) -> anyhow::Result<Self> {
        let matcher = build_globset(&patterns)?;
        Ok(Self {
            base: base.into(),
            patterns,
            matcher,
            required: false,
        })
    }

    /// Make an empty match an error instead of an empty file set.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }
}

impl fmt::Debug for GlobInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GlobInput")
            .field("base", &self.base)
            .field("patterns", &self.patterns)
            .field("required", &self.required)
            .finish()
    }
}

impl InputSource for GlobInput {
    fn describe(&self) -> String {
        format!("{}/{{{}}}", self.base.display(), self.patterns.join(","))
    }

    fn collect(&self, ctx: &InputContext<'_>) -> Result<Vec<AssetFile>, TransformError> {
        let root = ctx.source_root.join(&self.base);
        let mut files = Vec::new();

        for path in walk_files(ctx.fs, &root)? {
            let Ok(rel) = path.strip_prefix(&root) else {
                continue;
            };
            let rel_str = rel.to_string_lossy().replace('\\', "/");
            if !self.matcher.is_match(&rel_str) {
                continue;
            }
            let contents = ctx.fs.read(&path)?;
            files.push(AssetFile::new(rel, contents));
        }

        debug!(input = %self.describe(), matched = files.len(), "collected glob input");

        if files.is_empty() && self.required {
            return Err(TransformError::MissingInput {
                pipeline: self.describe(),
                patterns: self.patterns.clone(),
            });
        }

        Ok(files)
    }
}

/// A single virtual file produced by a [`Renderer`].
pub struct RenderedInput {
    file_name: PathBuf,
    prefix: &'static str,
    renderer: Arc<dyn Renderer>,
}

impl RenderedInput {
    pub fn new(file_name: impl Into<PathBuf>, renderer: Arc<dyn Renderer>) -> Self {
        Self {
            file_name: file_name.into(),
            prefix: "",
            renderer,
        }
    }

    /// An HTML document: the render is prefixed with `<!DOCTYPE html>`.
    pub fn html(file_name: impl Into<PathBuf>, renderer: Arc<dyn Renderer>) -> Self {
        Self {
            prefix: "<!DOCTYPE html>",
            ..Self::new(file_name, renderer)
        }
    }
}

impl InputSource for RenderedInput {
    fn describe(&self) -> String {
        format!("render({})", self.renderer.describe())
    }

    fn collect(&self, ctx: &InputContext<'_>) -> Result<Vec<AssetFile>, TransformError> {
        let body = self
            .renderer
            .render(ctx)
            .map_err(|err| TransformError::Input {
                input: self.describe(),
                message: format!("{err:#}"),
            })?;

        let text = format!("{}{}", self.prefix, body);
        Ok(vec![AssetFile::new(self.file_name.clone(), text)])
    }
}
