// src/project.rs

//! The standard front-end task graph, plus the user tasks from the config.
//!
//! ```text
//! default -> watch -> mode:debug, mode:watch, compile, css:watch, js:watch
//! compile -> clean, precompile, img:build, js:build, css:build
//! debug   -> mode:debug, compile
//! ```
//!
//! Every `*:build` task first runs its own `clean:*` step. `js:watch` and
//! `css:watch` carry the watch bindings that re-run `js:build` and
//! `css:build` once the session is watching.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::{AssetsSection, ConfigFile, TaskConfig};
use crate::dag::{Task, TaskAction, TaskGraph};
use crate::errors::Result;
use crate::pipeline::transforms::{
    ConcatTransform, CssMinifyTransform, HtmlMinifyTransform, PrefixTransform, SassTransform,
    ScriptMinifyTransform, SourceMapTransform,
};
use crate::pipeline::{BundleInput, GlobInput, Pipeline, RenderedInput, Stage, TemplateRenderer};
use crate::types::{AssetKind, ModeFlag};
use crate::watch::WatchBinding;

/// Names of the built-in tasks. User tasks may not reuse them.
pub const STANDARD_TASKS: &[&str] = &[
    "mode:debug",
    "mode:watch",
    "clean:html",
    "clean:js",
    "clean:css",
    "clean:images",
    "clean",
    "precompile",
    "img:build",
    "js:build",
    "js:watch",
    "css:build",
    "css:watch",
    "watch",
    "compile",
    "debug",
    "default",
];

pub const HTML_FILE: &str = "index.html";
pub const SCRIPT_DIR: &str = "javascripts";
pub const SCRIPT_FILE: &str = "application.js";
pub const STYLE_DIR: &str = "stylesheets";
pub const STYLE_FILE: &str = "application.css";
pub const IMAGE_DIR: &str = "images";

/// Build and validate the full task graph for `cfg`.
pub fn build_graph(cfg: &ConfigFile) -> Result<TaskGraph> {
    let mut tasks = standard_tasks(cfg)?;
    tasks.extend(cfg.task.iter().map(|(name, task)| user_task(name, task)));
    TaskGraph::new(tasks)
}

/// The built-in tasks alone.
pub fn standard_tasks(cfg: &ConfigFile) -> Result<Vec<Task>> {
    let assets = &cfg.assets;
    let components = assets.components_dir.clone();

    let clean = |name: &str, path: &str| {
        Task::new(name).action(TaskAction::Clean(vec![PathBuf::from(path)]))
    };

    Ok(vec![
        Task::new("mode:debug").action(TaskAction::SetMode(ModeFlag::Debug)),
        Task::new("mode:watch").action(TaskAction::SetMode(ModeFlag::Watch)),
        clean("clean:html", HTML_FILE),
        clean("clean:js", SCRIPT_DIR),
        clean("clean:css", STYLE_DIR),
        clean("clean:images", IMAGE_DIR),
        Task::new("clean").after(["clean:html", "clean:js", "clean:css", "clean:images"]),
        Task::new("precompile")
            .after(["clean:html"])
            .pipeline(markup_pipeline(assets)),
        Task::new("img:build")
            .after(["clean:images"])
            .pipeline(image_pipeline(assets)?),
        Task::new("js:build")
            .after(["clean:js"])
            .pipeline(script_pipeline(assets)),
        Task::new("js:watch")
            .after(["mode:debug", "mode:watch", "js:build"])
            .binds(WatchBinding::new("js:build", ["**/*.js"]).exclude(["node_modules/**"])),
        Task::new("css:build")
            .after(["clean:css"])
            .pipeline(style_pipeline(assets, &cfg.source_root().join(&components))?),
        Task::new("css:watch")
            .after(["mode:debug", "mode:watch"])
            .binds(WatchBinding::new(
                "css:build",
                [glob_below(&components, &assets.style_glob())],
            )),
        Task::new("watch").after(["mode:debug", "mode:watch", "compile", "css:watch", "js:watch"]),
        Task::new("compile").after(["clean", "precompile", "img:build", "js:build", "css:build"]),
        Task::new("debug").after(["mode:debug", "compile"]),
        Task::new("default").after(["watch"]),
    ])
}

fn markup_pipeline(assets: &AssetsSection) -> Pipeline {
    let renderer = Arc::new(TemplateRenderer::new(assets.template.clone()));
    Pipeline::new(
        "markup",
        AssetKind::Markup,
        RenderedInput::html(HTML_FILE, renderer),
        "",
    )
    .stage(Stage::release_only(HtmlMinifyTransform))
}

fn image_pipeline(assets: &AssetsSection) -> Result<Pipeline> {
    let input = GlobInput::new(&assets.components_dir, vec![assets.image_glob()])?;
    Ok(Pipeline::new("images", AssetKind::Image, input, IMAGE_DIR))
}

fn script_pipeline(assets: &AssetsSection) -> Pipeline {
    Pipeline::new(
        "scripts",
        AssetKind::Script,
        BundleInput::new(assets.script_entry.clone(), SCRIPT_FILE),
        SCRIPT_DIR,
    )
    .stage(Stage::release_only(ScriptMinifyTransform))
    .stage(Stage::debug_only(SourceMapTransform))
}

fn style_pipeline(assets: &AssetsSection, load_path: &Path) -> Result<Pipeline> {
    let input = GlobInput::new(&assets.components_dir, vec![assets.style_glob()])?;
    Ok(Pipeline::new("styles", AssetKind::Stylesheet, input, STYLE_DIR)
        .stage(Stage::always(PrefixTransform))
        .stage(Stage::always(ConcatTransform::new(STYLE_FILE)))
        .stage(Stage::always(SassTransform::new().load_path(load_path)))
        .stage(Stage::release_only(CssMinifyTransform))
        .stage(Stage::debug_only(SourceMapTransform)))
}

fn user_task(name: &str, cfg: &TaskConfig) -> Task {
    let mut task = Task::new(name).after(cfg.after.iter().cloned());
    if !cfg.clean.is_empty() {
        task = task.action(TaskAction::Clean(cfg.clean.clone()));
    }
    if let Some(target) = &cfg.rebuild {
        task = task.binds(
            WatchBinding::new(target.clone(), cfg.watch.iter().cloned())
                .exclude(cfg.exclude.iter().cloned()),
        );
    }
    task
}

fn glob_below(dir: &Path, glob: &str) -> String {
    let dir = dir.to_string_lossy().replace('\\', "/");
    let dir = dir.trim_end_matches('/');
    if dir.is_empty() || dir == "." {
        glob.to_string()
    } else {
        format!("{dir}/{glob}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RawConfigFile;
    use crate::dag::resolve;
    use crate::types::BuildMode;

    fn graph() -> TaskGraph {
        build_graph(&ConfigFile::default()).unwrap()
    }

    #[test]
    fn every_standard_task_is_registered() {
        let graph = graph();
        for name in STANDARD_TASKS {
            assert!(graph.contains(name), "missing {name}");
        }
        assert_eq!(graph.len(), STANDARD_TASKS.len());
    }

    #[test]
    fn compile_plan_cleans_before_building() {
        let plan = resolve(&graph(), "compile").unwrap();
        assert_eq!(
            plan.order(),
            [
                "clean:html",
                "clean:js",
                "clean:css",
                "clean:images",
                "clean",
                "precompile",
                "img:build",
                "js:build",
                "css:build",
                "compile",
            ]
        );
        assert_eq!(plan.mode(&graph()), BuildMode::release());
    }

    #[test]
    fn default_target_watches_in_debug_mode() {
        let graph = graph();
        let plan = resolve(&graph, "default").unwrap();
        assert_eq!(plan.mode(&graph), BuildMode::new(true, true));

        let targets: Vec<_> = plan
            .bindings(&graph)
            .into_iter()
            .map(|b| b.task.clone())
            .collect();
        assert_eq!(targets, ["css:build", "js:build"]);
    }

    #[test]
    fn stylesheet_chain_prefixes_each_source_before_concat() {
        let graph = graph();
        let TaskAction::Pipeline(pipeline) = &graph.get("css:build").unwrap().action else {
            panic!("css:build should run a pipeline");
        };
        let stages: Vec<_> = pipeline.stages().iter().map(|s| s.name()).collect();
        assert_eq!(stages, ["prefix", "concat", "sass", "css-minify", "sourcemap"]);
    }

    #[test]
    fn style_binding_follows_the_components_dir() {
        assert_eq!(
            glob_below(Path::new("components"), "**/*.{css,scss}"),
            "components/**/*.{css,scss}"
        );
        assert_eq!(glob_below(Path::new("."), "**/*.css"), "**/*.css");
    }

    #[test]
    fn user_tasks_extend_the_standard_graph() {
        let mut raw = RawConfigFile::default();
        raw.task.insert(
            "docs".into(),
            TaskConfig {
                after: vec!["precompile".into()],
                clean: vec!["docs".into()],
                watch: vec!["docs/**/*.md".into()],
                rebuild: Some("precompile".into()),
                ..TaskConfig::default()
            },
        );
        let cfg = ConfigFile::try_from(raw).unwrap();
        let graph = build_graph(&cfg).unwrap();

        let docs = graph.get("docs").unwrap();
        assert_eq!(docs.deps, ["precompile"]);
        assert!(matches!(docs.action, TaskAction::Clean(_)));
        assert_eq!(docs.binding.as_ref().unwrap().task, "precompile");
    }

    #[test]
    fn user_task_with_unknown_dependency_fails_graph_construction() {
        let mut raw = RawConfigFile::default();
        raw.task.insert(
            "deploy".into(),
            TaskConfig {
                after: vec!["upload".into()],
                ..TaskConfig::default()
            },
        );
        let cfg = ConfigFile::try_from(raw).unwrap();
        assert!(matches!(
            build_graph(&cfg),
            Err(crate::errors::AssetflowError::UnknownTask { .. })
        ));
    }
}
