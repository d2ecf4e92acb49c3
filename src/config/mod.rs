// src/config/mod.rs

//! Configuration loading and validation for assetflow.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate basic invariants like non-empty roots (`validate.rs`).
//!
//! Graph-level checks (unknown `after` references, cycles) happen when the
//! task graph is built from a validated config, see [`crate::project`].

pub mod loader;
pub mod model;
pub mod validate;

/// Config file looked up when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "Assetflow.toml";

pub use loader::{load_and_validate, load_from_path, load_or_default};
pub use model::{AssetsSection, ConfigFile, ConfigSection, RawConfigFile, TaskConfig};
