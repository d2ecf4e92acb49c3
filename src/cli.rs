// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `assetflow`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "assetflow",
    version,
    about = "Build front-end assets through a task graph, or watch and rebuild incrementally.",
    long_about = None
)]
pub struct CliArgs {
    /// Build target to run: `compile`, `debug`, `watch`, `clean`, ...
    ///
    /// Defaults to `[config].default_target` (itself `default`, i.e. watch).
    #[arg(value_name = "TARGET")]
    pub target: Option<String>,

    /// Path to the config file (TOML). A missing default file means
    /// "use built-in defaults".
    #[arg(long, value_name = "PATH", default_value = crate::config::DEFAULT_CONFIG_FILE)]
    pub config: String,

    /// Force debug mode (source maps, no minification) for any target.
    #[arg(long)]
    pub debug: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `ASSETFLOW_LOG` or `info` is used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Resolve and print the plan for TARGET without running anything.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
