// tests/graph_validation.rs

mod common;
use crate::common::{init_tracing, with_timeout};

use std::sync::Arc;

use assetflow::dag::{resolve, Task, TaskGraph};
use assetflow::errors::AssetflowError;
use assetflow::fs::MemoryFileSystem;
use assetflow::{run_target, BuildSettings};
use assetflow_test_utils::GraphBuilder;

fn settings() -> BuildSettings {
    BuildSettings::new("src", "out").with_fs(Arc::new(MemoryFileSystem::new()))
}

#[test]
fn construction_rejects_cycles_with_the_full_path() {
    let err = GraphBuilder::new()
        .task("a", &["b"])
        .task("b", &["c"])
        .task("c", &["a"])
        .try_build()
        .unwrap_err();

    match err {
        AssetflowError::Cycle { path } => {
            assert_eq!(path.first(), path.last());
            assert_eq!(path.len(), 4);
            for name in ["a", "b", "c"] {
                assert!(path.iter().any(|t| t == name), "{name} missing from {path:?}");
            }
        }
        other => panic!("expected Cycle, got {other:?}"),
    }
}

#[test]
fn construction_rejects_unknown_dependencies() {
    let err = TaskGraph::new([Task::new("build").after(["missing"])]).unwrap_err();
    assert!(matches!(
        err,
        AssetflowError::UnknownTask { ref name, ref referenced_by }
            if name == "missing" && referenced_by.as_deref() == Some("build")
    ));
}

#[test]
fn extending_a_graph_revalidates_it() {
    let graph = GraphBuilder::new().task("a", &[]).build();

    let extended = graph.extend([Task::new("b").after(["a"])]).unwrap();
    assert_eq!(extended.len(), 2);
    assert_eq!(graph.len(), 1);

    assert!(graph.extend([Task::new("c").after(["nope"])]).is_err());
}

#[tokio::test]
async fn reachable_cycle_fails_before_any_body_runs() {
    init_tracing();

    let builder = GraphBuilder::new()
        .task("setup", &[])
        .task("x", &["setup", "y"])
        .task("y", &["x"])
        .task("top", &["x"]);
    let log = builder.log();
    let graph = Arc::new(builder.build_unchecked());

    let err = with_timeout(run_target(graph, "top", settings()))
        .await
        .unwrap_err();

    assert!(matches!(err, AssetflowError::Cycle { .. }), "got {err:?}");
    assert!(log.started().is_empty());
}

#[tokio::test]
async fn undeclared_dependency_fails_before_any_body_runs() {
    init_tracing();

    let builder = GraphBuilder::new()
        .task("first", &[])
        .task("second", &["first", "ghost"]);
    let log = builder.log();
    let graph = Arc::new(builder.build_unchecked());

    let err = with_timeout(run_target(graph, "second", settings()))
        .await
        .unwrap_err();

    assert!(
        matches!(err, AssetflowError::UnknownTask { ref name, .. } if name == "ghost"),
        "got {err:?}"
    );
    assert!(log.started().is_empty());
}

#[test]
fn unknown_target_is_reported_without_a_referrer() {
    let graph = GraphBuilder::new().task("a", &[]).build();
    let err = resolve(&graph, "b").unwrap_err();
    assert!(matches!(
        err,
        AssetflowError::UnknownTask { ref name, referenced_by: None } if name == "b"
    ));
}
