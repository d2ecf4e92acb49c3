// src/config/validate.rs

use crate::config::model::{AssetsSection, ConfigFile, ConfigSection, RawConfigFile, TaskConfig};
use crate::errors::{AssetflowError, Result};
use crate::project::STANDARD_TASKS;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = AssetflowError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_global_config(&cfg.config)?;
    validate_assets(&cfg.assets)?;
    for (name, task) in cfg.task.iter() {
        validate_task(name, task)?;
    }
    Ok(())
}

fn config_error(message: impl Into<String>) -> AssetflowError {
    AssetflowError::ConfigError(message.into())
}

fn validate_global_config(cfg: &ConfigSection) -> Result<()> {
    if cfg.source_root.as_os_str().is_empty() {
        return Err(config_error("[config].source_root must not be empty"));
    }
    if cfg.output_root.as_os_str().is_empty() {
        return Err(config_error("[config].output_root must not be empty"));
    }
    if cfg.default_target.trim().is_empty() {
        return Err(config_error("[config].default_target must not be empty"));
    }
    Ok(())
}

fn validate_assets(assets: &AssetsSection) -> Result<()> {
    if assets.script_entry.trim().is_empty() {
        return Err(config_error("[assets].script_entry must not be empty"));
    }
    if assets.template.as_os_str().is_empty() {
        return Err(config_error("[assets].template must not be empty"));
    }
    validate_extensions("image_extensions", &assets.image_extensions)?;
    validate_extensions("style_extensions", &assets.style_extensions)?;
    Ok(())
}

fn validate_extensions(field: &str, extensions: &[String]) -> Result<()> {
    if extensions.is_empty() {
        return Err(config_error(format!("[assets].{field} must not be empty")));
    }
    for ext in extensions {
        if ext.is_empty() || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(config_error(format!(
                "[assets].{field} contains invalid extension '{ext}' (expected e.g. \"png\")"
            )));
        }
    }
    Ok(())
}

fn validate_task(name: &str, task: &TaskConfig) -> Result<()> {
    if name.trim().is_empty() {
        return Err(config_error("task names must not be empty"));
    }
    if STANDARD_TASKS.contains(&name) {
        return Err(config_error(format!(
            "task '{name}' shadows a built-in task; pick another name"
        )));
    }
    match (task.watch.is_empty(), &task.rebuild) {
        (false, None) => Err(config_error(format!(
            "task '{name}' has `watch` patterns but no `rebuild` target"
        ))),
        (true, Some(target)) => Err(config_error(format!(
            "task '{name}' rebuilds '{target}' but has no `watch` patterns"
        ))),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_with_task(name: &str, task: TaskConfig) -> RawConfigFile {
        let mut raw = RawConfigFile::default();
        raw.task.insert(name.to_string(), task);
        raw
    }

    #[test]
    fn defaults_are_valid() {
        assert!(ConfigFile::try_from(RawConfigFile::default()).is_ok());
    }

    #[test]
    fn rejects_shadowing_a_built_in_task() {
        let err = ConfigFile::try_from(raw_with_task("compile", TaskConfig::default()))
            .unwrap_err();
        assert!(matches!(err, AssetflowError::ConfigError(msg) if msg.contains("compile")));
    }

    #[test]
    fn watch_and_rebuild_come_together() {
        let watch_only = TaskConfig {
            watch: vec!["docs/**/*.md".into()],
            ..TaskConfig::default()
        };
        assert!(ConfigFile::try_from(raw_with_task("docs", watch_only)).is_err());

        let rebuild_only = TaskConfig {
            rebuild: Some("precompile".into()),
            ..TaskConfig::default()
        };
        assert!(ConfigFile::try_from(raw_with_task("docs", rebuild_only)).is_err());
    }

    #[test]
    fn rejects_dotted_or_empty_extensions() {
        let mut raw = RawConfigFile::default();
        raw.assets.image_extensions = vec![".png".into()];
        assert!(ConfigFile::try_from(raw).is_err());

        let mut raw = RawConfigFile::default();
        raw.assets.style_extensions.clear();
        assert!(ConfigFile::try_from(raw).is_err());
    }
}
