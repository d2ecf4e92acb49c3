// src/watch/mod.rs

//! File watching and change detection.
//!
//! This module is responsible for:
//! - Compiling the patterns of each [`WatchBinding`].
//! - Wiring up a cross-platform filesystem observer (`notify`) per binding.
//! - Turning changes into `RuntimeEvent::TaskTriggered` for the bound task.
//!
//! It does **not** know about the task graph; a binding names the task it
//! rebuilds and the engine re-executes exactly that task.

pub mod event_handler;
pub mod path_utils;
pub mod patterns;
pub mod watcher;

pub use patterns::{static_base, TaskWatchProfile, WatchBinding};
pub use watcher::{spawn_watchers, WatcherHandle};
