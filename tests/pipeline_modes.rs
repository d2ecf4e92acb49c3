// tests/pipeline_modes.rs

mod common;
use crate::common::{init_tracing, memory_settings, output, sample_site, with_timeout};

use std::error::Error;
use std::sync::Arc;

use assetflow::config::ConfigFile;
use assetflow::errors::AssetflowError;
use assetflow::fs::MemoryFileSystem;
use assetflow::project::build_graph;
use assetflow::run_target;

type TestResult = Result<(), Box<dyn Error>>;

async fn build(fs: &MemoryFileSystem, target: &str) -> assetflow::errors::Result<()> {
    let graph = Arc::new(build_graph(&ConfigFile::default())?);
    with_timeout(run_target(graph, target, memory_settings(fs))).await?;
    Ok(())
}

#[tokio::test]
async fn release_build_is_minified_without_source_maps() -> TestResult {
    init_tracing();
    let fs = sample_site();
    build(&fs, "compile").await?;

    let js = output(&fs, "javascripts/application.js").expect("script bundle");
    assert!(js.contains("hello "));
    assert!(!js.contains("sourceMappingURL"));
    assert!(!js.contains("// entry point"));
    assert!(!js.contains("/* helpers */"));
    assert!(js.lines().all(|line| !line.starts_with(' ')));
    assert!(output(&fs, "javascripts/application.js.map").is_none());

    let css = output(&fs, "stylesheets/application.css").expect("stylesheet");
    assert!(css.contains(".button .label"));
    assert!(!css.contains('$'));
    assert!(!css.contains("sourceMappingURL"));
    assert!(!css.contains("\n  "));
    assert!(output(&fs, "stylesheets/application.css.map").is_none());

    let html = output(&fs, "index.html").expect("markup");
    assert!(html.starts_with("<!DOCTYPE html><html><head><title>demo</title>"));
    assert!(!html.contains("debug build"));
    assert!(!html.contains("\n  "));

    assert_eq!(output(&fs, "images/logo/logo.png").as_deref(), Some("png-bytes"));
    Ok(())
}

#[tokio::test]
async fn debug_build_keeps_whitespace_and_emits_source_maps() -> TestResult {
    init_tracing();
    let fs = sample_site();
    build(&fs, "debug").await?;

    let js = output(&fs, "javascripts/application.js").expect("script bundle");
    assert!(js.trim_end().ends_with("//# sourceMappingURL=application.js.map"));
    assert!(js.contains("// entry point"));

    let map = output(&fs, "javascripts/application.js.map").expect("script map");
    let map: serde_json::Value = serde_json::from_str(&map)?;
    assert_eq!(map["version"], 3);
    assert_eq!(map["file"], "application.js");
    let sources: Vec<&str> = map["sources"]
        .as_array()
        .expect("sources array")
        .iter()
        .filter_map(|s| s.as_str())
        .collect();
    assert_eq!(sources, ["app.js", "util.js"]);

    let css = output(&fs, "stylesheets/application.css").expect("stylesheet");
    assert!(css.trim_end().ends_with("/*# sourceMappingURL=application.css.map */"));
    assert!(output(&fs, "stylesheets/application.css.map").is_some());

    let html = output(&fs, "index.html").expect("markup");
    assert!(html.starts_with("<!DOCTYPE html><html>\n  <head>"));
    assert!(html.contains("<p>debug build</p>"));
    Ok(())
}

#[tokio::test]
async fn two_builds_without_changes_are_byte_identical() -> TestResult {
    init_tracing();
    let fs = sample_site();
    build(&fs, "compile").await?;
    let first: Vec<_> = fs
        .paths()
        .into_iter()
        .map(|p| (p.clone(), fs.contents(&p)))
        .collect();

    build(&fs, "compile").await?;
    let second: Vec<_> = fs
        .paths()
        .into_iter()
        .map(|p| (p.clone(), fs.contents(&p)))
        .collect();

    assert_eq!(first, second);
    Ok(())
}

#[tokio::test]
async fn clean_removes_every_output_and_tolerates_missing_paths() -> TestResult {
    init_tracing();
    let fs = sample_site();

    // Nothing built yet: cleaning is still fine.
    build(&fs, "clean").await?;

    build(&fs, "compile").await?;
    assert!(output(&fs, "index.html").is_some());

    build(&fs, "clean").await?;
    let leftovers: Vec<_> = fs
        .paths()
        .into_iter()
        .filter(|p| p.starts_with(common::OUTPUT_ROOT))
        .collect();
    assert!(leftovers.is_empty(), "left behind: {leftovers:?}");
    Ok(())
}

#[tokio::test]
async fn broken_stylesheet_fails_the_build_and_writes_nothing_for_it() -> TestResult {
    init_tracing();
    let fs = sample_site();
    fs.add_file("site/components/broken.scss", ".oops { color: ; ");

    let err = build(&fs, "compile").await.unwrap_err();
    assert!(
        matches!(err, AssetflowError::TaskExecution { ref task, .. } if task == "css:build"),
        "got {err:?}"
    );
    assert!(output(&fs, "stylesheets/application.css").is_none());
    Ok(())
}

#[tokio::test]
async fn missing_script_entry_fails_js_build() -> TestResult {
    init_tracing();
    let fs = MemoryFileSystem::new();
    fs.add_file("site/components/app.html", "<p>hi</p>");

    let err = build(&fs, "js:build").await.unwrap_err();
    match err {
        AssetflowError::TaskExecution { task, cause } => {
            assert_eq!(task, "js:build");
            assert!(cause.contains("app.js"), "cause: {cause}");
        }
        other => panic!("expected TaskExecution, got {other:?}"),
    }
    Ok(())
}
