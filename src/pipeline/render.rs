// src/pipeline/render.rs

//! Markup rendering collaborators.

use std::path::PathBuf;

use anyhow::{Context, Result};
use minijinja::{context, Environment};

use crate::pipeline::input::InputContext;

/// Produces the body of a generated document.
pub trait Renderer: Send + Sync {
    fn describe(&self) -> String;

    fn render(&self, ctx: &InputContext<'_>) -> Result<String>;
}

/// Renders a `minijinja` template from the source tree.
///
/// The template sees `debug` and `watch` booleans from the build mode.
#[derive(Debug, Clone)]
pub struct TemplateRenderer {
    template: PathBuf,
}

impl TemplateRenderer {
    /// `template` is relative to the source root.
    pub fn new(template: impl Into<PathBuf>) -> Self {
        Self {
            template: template.into(),
        }
    }
}

impl Renderer for TemplateRenderer {
    fn describe(&self) -> String {
        self.template.display().to_string()
    }

    fn render(&self, ctx: &InputContext<'_>) -> Result<String> {
        let path = ctx.source_root.join(&self.template);
        let source = ctx.fs.read_to_string(&path)?;

        let env = Environment::new();
        env.render_str(
            &source,
            context! {
                debug => ctx.mode.debug(),
                watch => ctx.mode.watch(),
            },
        )
        .with_context(|| format!("rendering template {:?}", path))
    }
}

/// Adapts a plain closure into a [`Renderer`].
pub struct FnRenderer<F> {
    func: F,
}

impl<F> FnRenderer<F>
where
    F: Fn() -> String + Send + Sync,
{
    pub fn new(func: F) -> Self {
        Self { func }
    }
}

impl<F> Renderer for FnRenderer<F>
where
    F: Fn() -> String + Send + Sync,
{
    fn describe(&self) -> String {
        "fn".to_string()
    }

    fn render(&self, _ctx: &InputContext<'_>) -> Result<String> {
        Ok((self.func)())
    }
}
