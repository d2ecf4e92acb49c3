// tests/incremental_bundle.rs

mod common;
use crate::common::init_tracing;

use std::error::Error;
use std::path::{Path, PathBuf};

use assetflow::fs::MemoryFileSystem;
use assetflow::pipeline::bundler::BundlerCache;
use assetflow::pipeline::transforms::SourceMapTransform;
use assetflow::pipeline::{BundleInput, Pipeline, PipelineContext, Stage};
use assetflow::{AssetKind, BuildMode};

type TestResult = Result<(), Box<dyn Error>>;

fn project() -> MemoryFileSystem {
    let fs = MemoryFileSystem::new();
    fs.add_file(
        "src/app.js",
        "import { a } from './a';\nimport b from './lib/b';\nconsole.log(a, b);\n",
    );
    fs.add_file("src/a.js", "export const a = 'A';\n");
    fs.add_file("src/lib/b.js", "var c = require('./c');\nmodule.exports = c + 1;\n");
    fs.add_file("src/lib/c.js", "module.exports = 41;\n");
    fs
}

#[test]
fn changing_one_module_rereads_and_rewrites_only_that_module() -> TestResult {
    init_tracing();
    let fs = project();
    let root = Path::new("src");

    let mut cache = BundlerCache::new("app.js");
    let first = cache.bundle(&fs, root)?;
    assert_eq!(first.stats.modules_read, 4);
    assert_eq!(
        cache.module_ids().collect::<Vec<_>>(),
        ["a.js", "app.js", "lib/b.js", "lib/c.js"]
    );

    fs.add_file("src/lib/c.js", "module.exports = 99;\n");
    fs.clear_reads();
    cache.invalidate(&[PathBuf::from("lib/c.js")]);
    let second = cache.bundle(&fs, root)?;

    assert_eq!(fs.reads(), [PathBuf::from("src/lib/c.js")]);
    assert_eq!(second.stats.modules_read, 1);
    assert_eq!(second.stats.modules_compiled, 1);

    for id in ["a.js", "app.js", "lib/b.js"] {
        assert_eq!(first.region(id), second.region(id), "region {id} changed");
    }
    assert_ne!(first.region("lib/c.js"), second.region("lib/c.js"));

    // Outside the changed region, the text is identical.
    let c_first = first.regions["lib/c.js"].clone();
    let c_second = second.regions["lib/c.js"].clone();
    assert_eq!(first.text[..c_first.start], second.text[..c_second.start]);
    assert_eq!(first.text[c_first.end..], second.text[c_second.end..]);
    Ok(())
}

#[test]
fn touching_a_module_without_changing_it_skips_recompilation() -> TestResult {
    let fs = project();
    let root = Path::new("src");
    let mut cache = BundlerCache::new("app.js");
    let first = cache.bundle(&fs, root)?;

    cache.invalidate(&[PathBuf::from("a.js")]);
    let second = cache.bundle(&fs, root)?;

    assert_eq!(second.stats.modules_read, 1);
    assert_eq!(second.stats.modules_compiled, 0);
    assert_eq!(first.text, second.text);
    Ok(())
}

#[test]
fn watch_mode_pipeline_reuses_the_cache_across_invocations() -> TestResult {
    init_tracing();
    let fs = project();
    let pipeline = Pipeline::new(
        "scripts",
        AssetKind::Script,
        BundleInput::new("app.js", "application.js"),
        "javascripts",
    )
    .stage(Stage::debug_only(SourceMapTransform));

    let mode = BuildMode::new(true, true);
    let run = |changed: &[PathBuf]| {
        pipeline.execute(&PipelineContext {
            fs: &fs,
            source_root: Path::new("src"),
            output_root: Path::new("out"),
            mode,
            changed,
        })
    };

    run(&[])?;
    let before = fs.contents("out/javascripts/application.js").unwrap_or_default();

    fs.add_file("src/a.js", "export const a = 'changed';\n");
    fs.clear_reads();
    let report = run(&[PathBuf::from("a.js")])?;

    assert_eq!(fs.reads(), [PathBuf::from("src/a.js")]);
    assert_eq!(
        report.written,
        [
            PathBuf::from("out/javascripts/application.js"),
            PathBuf::from("out/javascripts/application.js.map"),
        ]
    );
    let after = fs.contents("out/javascripts/application.js").unwrap_or_default();
    assert_ne!(before, after);
    assert!(after.contains("'changed'"));
    Ok(())
}
