// tests/runtime_execution.rs

mod common;
use crate::common::{init_tracing, with_timeout};

use std::error::Error;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;

use assetflow::dag::{DispatchOrigin, ScheduledTask, Scheduler, Task, TaskGraph};
use assetflow::engine::{CoreRuntime, Runtime, RuntimeEvent, RuntimeOptions, TriggerReason};
use assetflow::errors::AssetflowError;
use assetflow_test_utils::FakeExecutor;

type TestResult = Result<(), Box<dyn Error>>;

/// build -> clean
fn simple_chain() -> Arc<TaskGraph> {
    Arc::new(
        TaskGraph::new([Task::new("clean"), Task::new("build").after(["clean"])])
            .expect("valid graph"),
    )
}

fn names(executed: &Arc<Mutex<Vec<ScheduledTask>>>) -> Vec<String> {
    executed.lock().unwrap().iter().map(|t| t.name.clone()).collect()
}

#[tokio::test]
async fn one_shot_runtime_runs_the_plan_and_exits() -> TestResult {
    init_tracing();

    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(16);
    let executed = Arc::new(Mutex::new(Vec::new()));
    let executor = FakeExecutor::new(rt_tx.clone(), Arc::clone(&executed));

    rt_tx
        .send(RuntimeEvent::RunRequested { target: "build".into() })
        .await?;

    let core = CoreRuntime::new(Scheduler::new(simple_chain()), RuntimeOptions::one_shot());
    let state = with_timeout(Runtime::new(core, rt_rx, executor).run()).await?;

    assert_eq!(names(&executed), ["clean", "build"]);
    assert_eq!(state.completed, ["clean", "build"]);
    assert!(executed
        .lock()
        .unwrap()
        .iter()
        .all(|t| matches!(t.origin, DispatchOrigin::Run(1))));
    Ok(())
}

#[tokio::test]
async fn one_shot_failure_is_a_task_execution_error() -> TestResult {
    init_tracing();

    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(16);
    let executed = Arc::new(Mutex::new(Vec::new()));
    let executor = FakeExecutor::new(rt_tx.clone(), Arc::clone(&executed)).fail("clean");

    rt_tx
        .send(RuntimeEvent::RunRequested { target: "build".into() })
        .await?;

    let core = CoreRuntime::new(Scheduler::new(simple_chain()), RuntimeOptions::one_shot());
    let err = with_timeout(Runtime::new(core, rt_rx, executor).run())
        .await
        .unwrap_err();

    assert!(
        matches!(err, AssetflowError::TaskExecution { ref task, .. } if task == "clean"),
        "got {err:?}"
    );
    assert_eq!(names(&executed), ["clean"]);
    Ok(())
}

#[tokio::test]
async fn unknown_target_is_fatal_and_runs_nothing() -> TestResult {
    init_tracing();

    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(16);
    let executed = Arc::new(Mutex::new(Vec::new()));
    let executor = FakeExecutor::new(rt_tx.clone(), Arc::clone(&executed));

    rt_tx
        .send(RuntimeEvent::RunRequested { target: "deploy".into() })
        .await?;

    let core = CoreRuntime::new(Scheduler::new(simple_chain()), RuntimeOptions::one_shot());
    let err = with_timeout(Runtime::new(core, rt_rx, executor).run())
        .await
        .unwrap_err();

    assert!(matches!(err, AssetflowError::UnknownTask { .. }));
    assert!(names(&executed).is_empty());
    Ok(())
}

#[tokio::test]
async fn watching_runtime_rebuilds_single_tasks_until_shutdown() -> TestResult {
    init_tracing();

    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(16);
    let executed = Arc::new(Mutex::new(Vec::new()));
    let executor = FakeExecutor::new(rt_tx.clone(), Arc::clone(&executed));

    let core = CoreRuntime::new(Scheduler::new(simple_chain()), RuntimeOptions::watching());
    let runtime = tokio::spawn(Runtime::new(core, rt_rx, executor).run());

    rt_tx
        .send(RuntimeEvent::RunRequested { target: "build".into() })
        .await?;

    // Wait for the initial run to go through.
    with_timeout(async {
        while names(&executed).len() < 2 {
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }
    })
    .await;

    rt_tx
        .send(RuntimeEvent::TaskTriggered {
            task: "build".into(),
            reason: TriggerReason::FileWatch,
            changed: vec![PathBuf::from("app.js")],
        })
        .await?;

    with_timeout(async {
        while names(&executed).len() < 3 {
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }
    })
    .await;

    rt_tx.send(RuntimeEvent::ShutdownRequested).await?;
    let state = with_timeout(runtime).await??;

    let executed = executed.lock().unwrap().clone();
    assert_eq!(executed.len(), 3);
    let rebuild = &executed[2];
    assert_eq!(rebuild.name, "build");
    assert_eq!(rebuild.origin, DispatchOrigin::Rebuild);
    assert_eq!(rebuild.changed, [PathBuf::from("app.js")]);
    assert_eq!(state.completed, ["clean", "build"]);
    Ok(())
}

#[tokio::test]
async fn watch_session_survives_a_failed_initial_build() -> TestResult {
    init_tracing();

    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(16);
    let executed = Arc::new(Mutex::new(Vec::new()));
    let executor = FakeExecutor::new(rt_tx.clone(), Arc::clone(&executed)).fail("build");

    let core = CoreRuntime::new(Scheduler::new(simple_chain()), RuntimeOptions::watching());
    let runtime = tokio::spawn(Runtime::new(core, rt_rx, executor).run());

    rt_tx
        .send(RuntimeEvent::RunRequested { target: "build".into() })
        .await?;
    with_timeout(async {
        while names(&executed).len() < 2 {
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }
    })
    .await;

    rt_tx.send(RuntimeEvent::ShutdownRequested).await?;
    let state = with_timeout(runtime).await??;

    assert_eq!(state.completed, ["clean"]);
    Ok(())
}
