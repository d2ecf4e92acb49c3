// tests/watcher.rs

mod common;
use crate::common::{init_tracing, with_timeout};

use std::error::Error;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use tokio::sync::mpsc;

use assetflow::engine::{RuntimeEvent, TriggerReason};
use assetflow::errors::AssetflowError;
use assetflow::watch::{spawn_watchers, WatchBinding};

type TestResult = Result<(), Box<dyn Error>>;

async fn next_trigger(rx: &mut mpsc::Receiver<RuntimeEvent>) -> (String, Vec<PathBuf>) {
    loop {
        match with_timeout(rx.recv()).await {
            Some(RuntimeEvent::TaskTriggered { task, reason, changed }) => {
                assert_eq!(reason, TriggerReason::FileWatch);
                return (task, changed);
            }
            Some(_) => continue,
            None => panic!("watcher channel closed"),
        }
    }
}

#[tokio::test]
async fn matching_change_triggers_the_bound_task_with_its_path() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let root = dir.path().canonicalize()?;
    fs::create_dir_all(root.join("components/button"))?;

    let (tx, mut rx) = mpsc::channel(64);
    let binding = WatchBinding::new("css:build", ["components/**/*.{css,scss}"]);
    let (handle, errors) = spawn_watchers(&root, &root.join("public"), vec![binding], tx);

    assert!(errors.is_empty(), "errors: {errors:?}");
    assert_eq!(handle.tasks(), ["css:build"]);

    // Give the backend a moment to register before touching files.
    tokio::time::sleep(Duration::from_millis(100)).await;
    fs::write(root.join("components/button/notes.txt"), "ignored")?;
    fs::write(root.join("components/button/button.scss"), ".b { color: red; }")?;

    let (task, changed) = next_trigger(&mut rx).await;
    assert_eq!(task, "css:build");
    assert_eq!(changed, [PathBuf::from("components/button/button.scss")]);

    drop(handle);
    Ok(())
}

#[tokio::test]
async fn changes_in_the_output_directory_never_trigger() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let root = dir.path().canonicalize()?;
    fs::create_dir_all(root.join("public/javascripts"))?;

    let (tx, mut rx) = mpsc::channel(64);
    let binding = WatchBinding::new("js:build", ["**/*.js"]).exclude(["node_modules/**"]);
    let (handle, errors) = spawn_watchers(&root, &root.join("public"), vec![binding], tx);
    assert!(errors.is_empty(), "errors: {errors:?}");

    tokio::time::sleep(Duration::from_millis(100)).await;
    fs::write(root.join("public/javascripts/application.js"), "bundle")?;
    fs::create_dir_all(root.join("node_modules/dep"))?;
    fs::write(root.join("node_modules/dep/index.js"), "dep")?;
    tokio::time::sleep(Duration::from_millis(50)).await;
    fs::write(root.join("app.js"), "source")?;

    let (task, changed) = next_trigger(&mut rx).await;
    assert_eq!(task, "js:build");
    assert_eq!(changed, [PathBuf::from("app.js")]);

    drop(handle);
    Ok(())
}

#[tokio::test]
async fn a_binding_that_cannot_attach_degrades_without_affecting_others() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let root = dir.path().canonicalize()?;
    fs::create_dir_all(root.join("components"))?;

    let (tx, _rx) = mpsc::channel(64);
    let bindings = vec![
        WatchBinding::new("docs", ["missing-dir/**/*.md"]),
        WatchBinding::new("css:build", ["components/**/*.css"]),
    ];
    let (handle, errors) = spawn_watchers(&root, &root.join("public"), bindings, tx);

    assert_eq!(handle.tasks(), ["css:build"]);
    assert_eq!(errors.len(), 1);
    assert!(matches!(
        &errors[0],
        AssetflowError::WatchObserver { task, .. } if task == "docs"
    ));
    Ok(())
}
