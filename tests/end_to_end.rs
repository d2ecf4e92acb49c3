// tests/end_to_end.rs

mod common;
use crate::common::{init_tracing, with_timeout, TEMPLATE};

use std::error::Error;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use assetflow::config::load_and_validate;
use assetflow::project::build_graph;
use assetflow::{run_target, BuildSettings};

type TestResult = Result<(), Box<dyn Error>>;

fn write(root: &Path, rel: &str, contents: &str) -> std::io::Result<()> {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, contents)
}

fn scaffold(root: &Path) -> std::io::Result<()> {
    write(root, "Assetflow.toml", "[config]\noutput_root = \"public\"\n")?;
    write(root, "components/app.html", TEMPLATE)?;
    write(root, "components/site.css", "body { margin: 0; }\n")?;
    write(root, "components/img/dot.svg", "<svg/>")?;
    write(root, "app.js", "var util = require('./util');\nutil.run();\n")?;
    write(root, "util.js", "exports.run = function () { return 'v1'; };\n")
}

async fn compile(root: &Path) -> Result<String, Box<dyn Error>> {
    let cfg = load_and_validate(root.join("Assetflow.toml"))?;
    let graph = Arc::new(build_graph(&cfg)?);
    let settings = BuildSettings::new(cfg.source_root(), cfg.output_root());

    with_timeout(run_target(graph, "compile", settings)).await?;
    Ok(fs::read_to_string(root.join("public/javascripts/application.js"))?)
}

#[tokio::test]
async fn compile_bundles_required_modules_in_release_mode() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    scaffold(dir.path())?;

    let first = compile(dir.path()).await?;
    assert!(!first.trim().is_empty());
    assert!(first.contains("'v1'"));
    assert!(!first.contains("sourceMappingURL"));
    assert!(!dir.path().join("public/javascripts/application.js.map").exists());

    let public = dir.path().join("public");
    assert!(public.join("index.html").is_file());
    assert!(public.join("stylesheets/application.css").is_file());
    assert_eq!(fs::read_to_string(public.join("images/img/dot.svg"))?, "<svg/>");

    write(dir.path(), "util.js", "exports.run = function () { return 'v2'; };\n")?;
    let second = compile(dir.path()).await?;
    assert_ne!(first, second);
    assert!(second.contains("'v2'"));
    Ok(())
}

#[tokio::test]
async fn rebuilding_unchanged_sources_is_byte_identical() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    scaffold(dir.path())?;

    let first = compile(dir.path()).await?;
    let css_first = fs::read(dir.path().join("public/stylesheets/application.css"))?;
    let second = compile(dir.path()).await?;
    let css_second = fs::read(dir.path().join("public/stylesheets/application.css"))?;

    assert_eq!(first, second);
    assert_eq!(css_first, css_second);
    Ok(())
}
