// tests/live_reload.rs

mod common;
use crate::common::{init_tracing, output, sample_site, with_timeout};

use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc};

use assetflow::config::ConfigFile;
use assetflow::dag::Scheduler;
use assetflow::engine::{CoreRuntime, Runtime, RuntimeEvent, RuntimeOptions, TriggerReason};
use assetflow::exec::{ExecContext, RealExecutorBackend};
use assetflow::project::build_graph;
use assetflow::reload::{LiveAction, LiveEvent, NotificationChannel, NotifyError};
use assetflow::{AssetKind, BuildMode};

type TestResult = Result<(), Box<dyn Error>>;

async fn next_event(rx: &mut broadcast::Receiver<LiveEvent>) -> LiveEvent {
    with_timeout(rx.recv()).await.expect("live event")
}

#[tokio::test]
async fn stylesheets_are_injected_and_everything_else_reloads() {
    let channel = NotificationChannel::new();
    let mut rx = channel.subscribe();

    assert_eq!(channel.publish(AssetKind::Stylesheet), Ok(1));
    assert_eq!(channel.publish(AssetKind::Script), Ok(1));

    assert_eq!(
        next_event(&mut rx).await,
        LiveEvent {
            kind: AssetKind::Stylesheet,
            action: LiveAction::Inject
        }
    );
    assert_eq!(next_event(&mut rx).await.action, LiveAction::Reload);
}

#[tokio::test]
async fn publishing_without_subscribers_is_a_no_op_and_closing_rejects_later_publishes() {
    let channel = NotificationChannel::new();
    assert_eq!(channel.publish(AssetKind::Markup), Ok(0));

    let mut rx = channel.subscribe();
    channel.close();
    assert!(channel.is_closed());
    assert_eq!(channel.publish(AssetKind::Image), Err(NotifyError::Closed));
    assert!(matches!(
        with_timeout(rx.recv()).await,
        Err(broadcast::error::RecvError::Closed)
    ));
}

#[tokio::test]
async fn watch_session_publishes_after_each_successful_pipeline_run() -> TestResult {
    init_tracing();

    let fs = sample_site();
    let graph = Arc::new(build_graph(&ConfigFile::default())?);
    let channel = NotificationChannel::new();
    let mut rx = channel.subscribe();

    let ctx = ExecContext {
        mode: BuildMode::new(true, true),
        fs: Arc::new(fs.clone()),
        source_root: PathBuf::from(common::SOURCE_ROOT),
        output_root: PathBuf::from(common::OUTPUT_ROOT),
        notifier: Some(channel.clone()),
    };

    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(64);
    let executor = RealExecutorBackend::new(Arc::clone(&graph), ctx, rt_tx.clone());
    let core = CoreRuntime::new(Scheduler::new(Arc::clone(&graph)), RuntimeOptions::watching());
    let runtime = Runtime::new(core, rt_rx, executor).with_notifier(channel.clone());
    let handle = tokio::spawn(runtime.run());

    rt_tx
        .send(RuntimeEvent::RunRequested { target: "watch".into() })
        .await?;

    // Initial run: one event per pipeline (markup, images, script, styles).
    let mut initial = Vec::new();
    for _ in 0..4 {
        initial.push(next_event(&mut rx).await.kind);
    }
    for kind in [AssetKind::Markup, AssetKind::Image, AssetKind::Script, AssetKind::Stylesheet] {
        assert!(initial.contains(&kind), "{kind} missing from {initial:?}");
    }

    fs.add_file(
        "site/components/button/button.scss",
        ".button { color: blue; }\n",
    );
    rt_tx
        .send(RuntimeEvent::TaskTriggered {
            task: "css:build".into(),
            reason: TriggerReason::FileWatch,
            changed: vec![PathBuf::from("components/button/button.scss")],
        })
        .await?;

    let event = next_event(&mut rx).await;
    assert_eq!(event.kind, AssetKind::Stylesheet);
    assert_eq!(event.action, LiveAction::Inject);
    assert!(output(&fs, "stylesheets/application.css").is_some_and(|css| css.contains("blue")));

    rt_tx.send(RuntimeEvent::ShutdownRequested).await?;
    with_timeout(handle).await??;

    assert!(channel.is_closed());
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert!(matches!(
        rx.try_recv(),
        Err(broadcast::error::TryRecvError::Closed)
    ));
    Ok(())
}

#[tokio::test]
async fn one_shot_builds_publish_nothing() -> TestResult {
    init_tracing();

    let fs = sample_site();
    let graph = Arc::new(build_graph(&ConfigFile::default())?);
    let channel = NotificationChannel::new();
    let mut rx = channel.subscribe();

    let ctx = ExecContext {
        mode: BuildMode::new(true, false),
        fs: Arc::new(fs.clone()),
        source_root: PathBuf::from(common::SOURCE_ROOT),
        output_root: PathBuf::from(common::OUTPUT_ROOT),
        notifier: Some(channel.clone()),
    };
    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(64);
    let executor = RealExecutorBackend::new(Arc::clone(&graph), ctx, rt_tx.clone());
    let core = CoreRuntime::new(Scheduler::new(Arc::clone(&graph)), RuntimeOptions::one_shot());

    rt_tx
        .send(RuntimeEvent::RunRequested { target: "debug".into() })
        .await?;
    with_timeout(Runtime::new(core, rt_rx, executor).run()).await?;

    assert!(matches!(
        rx.try_recv(),
        Err(broadcast::error::TryRecvError::Empty)
    ));
    Ok(())
}
