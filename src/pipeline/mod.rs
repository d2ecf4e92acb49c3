// src/pipeline/mod.rs

//! Asset pipelines.
//!
//! A [`Pipeline`] is an input source followed by a fixed list of stages.
//! Executing it collects the input, threads the file set through every stage
//! that applies to the current [`BuildMode`], and writes the result below the
//! output root only once the last stage succeeded.

pub mod bundler;
pub mod error;
pub mod file;
pub mod input;
pub mod render;
pub mod script;
pub mod sourcemap;
pub mod stage;
pub mod transforms;

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::{debug, info};

use crate::fs::FileSystem;
use crate::types::{AssetKind, BuildMode};

pub use bundler::BundleInput;
pub use error::TransformError;
pub use file::AssetFile;
pub use input::{GlobInput, InputContext, InputSource, RenderedInput};
pub use render::{FnRenderer, Renderer, TemplateRenderer};
pub use stage::{Stage, StageCondition, Transform};

/// Everything an invocation needs besides the pipeline itself.
pub struct PipelineContext<'a> {
    pub fs: &'a dyn FileSystem,
    pub source_root: &'a Path,
    pub output_root: &'a Path,
    pub mode: BuildMode,
    pub changed: &'a [PathBuf],
}

/// What a successful invocation wrote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineReport {
    pub pipeline: String,
    pub written: Vec<PathBuf>,
}

pub struct Pipeline {
    name: String,
    kind: AssetKind,
    input: Box<dyn InputSource>,
    stages: Vec<Stage>,
    output_dir: PathBuf,
}

impl Pipeline {
    /// `output_dir` is relative to the output root (empty for the root
    /// itself).
    pub fn new(
        name: impl Into<String>,
        kind: AssetKind,
        input: impl InputSource + 'static,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            input: Box::new(input),
            stages: Vec::new(),
            output_dir: output_dir.into(),
        }
    }

    /// Append a stage. Order is fixed once the pipeline is built.
    pub fn stage(mut self, stage: Stage) -> Self {
        self.stages.push(stage);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> AssetKind {
        self.kind
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn describe_input(&self) -> String {
        self.input.describe()
    }

    pub fn execute(&self, ctx: &PipelineContext<'_>) -> Result<PipelineReport, TransformError> {
        let input_ctx = InputContext {
            fs: ctx.fs,
            source_root: ctx.source_root,
            mode: ctx.mode,
            changed: ctx.changed,
        };
        let mut files = self.input.collect(&input_ctx)?;
        debug!(pipeline = %self.name, files = files.len(), mode = %ctx.mode, "pipeline input collected");

        for stage in &self.stages {
            if !stage.condition().applies(ctx.mode) {
                debug!(pipeline = %self.name, stage = stage.name(), "stage skipped");
                continue;
            }
            files = stage.transform().apply(files, ctx.mode)?;
        }

        let dest = ctx.output_root.join(&self.output_dir);
        let mut written = Vec::with_capacity(files.len());
        for file in &files {
            let path = dest.join(&file.path);
            ctx.fs
                .write(&path, &file.contents)
                .with_context(|| format!("writing {:?}", path))?;
            written.push(path);
        }

        info!(
            pipeline = %self.name,
            files = written.len(),
            "{} written to {}",
            self.kind,
            dest.display()
        );

        Ok(PipelineReport {
            pipeline: self.name.clone(),
            written,
        })
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("input", &self.input.describe())
            .field("stages", &self.stages)
            .field("output_dir", &self.output_dir)
            .finish()
    }
}
