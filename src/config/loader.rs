// src/config/loader.rs

use std::fs;
use std::path::Path;

use tracing::info;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::config::DEFAULT_CONFIG_FILE;
use crate::errors::Result;

/// Load a configuration file from a given path and return the raw `RawConfigFile`.
///
/// This only performs TOML deserialization; it does **not** perform semantic
/// validation. Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: RawConfigFile = toml::from_str(&contents)?;

    Ok(config)
}

/// Load a configuration file from path and run basic validation.
///
/// Relative roots in the file are resolved against the file's directory.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let path = path.as_ref();
    let raw_config = load_from_path(path)?;
    let config = ConfigFile::try_from(raw_config)?;

    let base_dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => Path::new(".").to_path_buf(),
    };
    Ok(config.with_base_dir(base_dir))
}

/// Like [`load_and_validate`], except that a missing *default* config file
/// yields the built-in defaults. An explicitly named file must exist.
pub fn load_or_default(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let path = path.as_ref();
    if path == Path::new(DEFAULT_CONFIG_FILE) && !path.exists() {
        info!("no {DEFAULT_CONFIG_FILE} found; using built-in defaults");
        return Ok(ConfigFile::default());
    }
    load_and_validate(path)
}
