// src/lib.rs

pub mod cli;
pub mod config;
pub mod dag;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod pipeline;
pub mod project;
pub mod reload;
pub mod types;
pub mod watch;

pub use types::{AssetKind, BuildMode, ModeFlag};

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::load_or_default;
use crate::dag::{resolve, RunPlan, RunState, Scheduler, TaskGraph};
use crate::engine::{CoreRuntime, Runtime, RuntimeEvent, RuntimeOptions, WatchSetup};
use crate::exec::{ExecContext, RealExecutorBackend};
use crate::fs::{FileSystem, RealFileSystem};
use crate::reload::NotificationChannel;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading and the task graph
/// - target resolution and the build mode
/// - the runtime, executor and (in watch mode) watchers and live reload
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let cfg = load_or_default(&args.config)?;
    let graph = Arc::new(project::build_graph(&cfg)?);

    let target = args
        .target
        .clone()
        .unwrap_or_else(|| cfg.config.default_target.clone());

    if args.dry_run {
        let plan = resolve(&graph, &target)?;
        print_dry_run(&graph, &plan, effective_mode(&plan, &graph, args.debug));
        return Ok(());
    }

    let settings = BuildSettings {
        source_root: cfg.source_root(),
        output_root: cfg.output_root(),
        fs: Arc::new(RealFileSystem),
        force_debug: args.debug,
    };

    let state = run_target(graph, &target, settings).await?;
    info!(
        target = %target,
        tasks = state.completed.len(),
        "build finished"
    );
    Ok(())
}

/// Where and how [`run_target`] builds.
#[derive(Debug, Clone)]
pub struct BuildSettings {
    pub source_root: PathBuf,
    pub output_root: PathBuf,
    pub fs: Arc<dyn FileSystem>,
    /// Debug output even if the plan does not include `mode:debug`.
    pub force_debug: bool,
}

impl BuildSettings {
    pub fn new(source_root: impl Into<PathBuf>, output_root: impl Into<PathBuf>) -> Self {
        Self {
            source_root: source_root.into(),
            output_root: output_root.into(),
            fs: Arc::new(RealFileSystem),
            force_debug: false,
        }
    }

    pub fn with_fs(mut self, fs: Arc<dyn FileSystem>) -> Self {
        self.fs = fs;
        self
    }

    pub fn force_debug(mut self, force: bool) -> Self {
        self.force_debug = force;
        self
    }
}

/// Resolve `target`, run its plan and return the record of the run.
///
/// Resolution errors (`UnknownTask`, `Cycle`) are returned before any task
/// executes. In one-shot mode a failing task yields `TaskExecution`. If the
/// plan includes `mode:watch` the session keeps running (rebuilding on
/// changes) until Ctrl-C.
pub async fn run_target(
    graph: Arc<TaskGraph>,
    target: &str,
    settings: BuildSettings,
) -> errors::Result<RunState> {
    let plan = resolve(&graph, target)?;
    let mode = effective_mode(&plan, &graph, settings.force_debug);
    info!(%target, %mode, tasks = plan.len(), "starting build");

    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(64);

    let notifier = mode.watch().then(NotificationChannel::new);
    if let Some(channel) = &notifier {
        spawn_reload_logger(channel.subscribe());
    }

    let ctx = ExecContext {
        mode,
        fs: settings.fs,
        source_root: settings.source_root.clone(),
        output_root: settings.output_root.clone(),
        notifier: notifier.clone(),
    };
    let executor = RealExecutorBackend::new(Arc::clone(&graph), ctx, rt_tx.clone());

    let options = if mode.watch() {
        RuntimeOptions::watching()
    } else {
        RuntimeOptions::one_shot()
    };
    let core = CoreRuntime::new(Scheduler::new(graph), options);
    let mut runtime = Runtime::new(core, rt_rx, executor);

    if let Some(channel) = notifier {
        runtime = runtime
            .with_watch(WatchSetup {
                root: settings.source_root,
                output_root: settings.output_root,
                runtime_tx: rt_tx.clone(),
            })
            .with_notifier(channel);
    }

    // Ctrl-C → graceful shutdown.
    {
        let tx = rt_tx.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("failed to listen for Ctrl+C: {e}");
                return;
            }
            let _ = tx.send(RuntimeEvent::ShutdownRequested).await;
        });
    }

    rt_tx
        .send(RuntimeEvent::RunRequested {
            target: target.to_string(),
        })
        .await
        .map_err(|err| anyhow!("runtime stopped before the run started: {err}"))?;

    runtime.run().await
}

fn effective_mode(plan: &RunPlan, graph: &TaskGraph, force_debug: bool) -> BuildMode {
    let mode = plan.mode(graph);
    if force_debug {
        BuildMode::new(true, mode.watch())
    } else {
        mode
    }
}

/// Stand-in for a live-reload transport: log every event.
fn spawn_reload_logger(mut rx: broadcast::Receiver<reload::LiveEvent>) {
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => info!(kind = %event.kind, action = ?event.action, "live reload"),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    debug!(skipped, "live reload logger lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });
}

/// Dry-run output: plan, mode and watch bindings.
fn print_dry_run(graph: &TaskGraph, plan: &RunPlan, mode: BuildMode) {
    println!("assetflow dry-run");
    println!("  target = {}", plan.target());
    println!("  mode   = {mode}");
    println!();

    println!("plan ({} tasks):", plan.len());
    for (idx, name) in plan.order().iter().enumerate() {
        match graph.get(name) {
            Some(task) => println!("  {:>2}. {name}  [{}]", idx + 1, task.action),
            None => println!("  {:>2}. {name}", idx + 1),
        }
    }

    let bindings = plan.bindings(graph);
    if mode.watch() && !bindings.is_empty() {
        println!();
        println!("watch bindings:");
        for binding in bindings {
            println!("  - {:?} -> {}", binding.patterns, binding.task);
            if !binding.excludes.is_empty() {
                println!("      exclude: {:?}", binding.excludes);
            }
        }
    }

    debug!("dry-run complete (no execution)");
}
