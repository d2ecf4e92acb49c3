// src/config/model.rs

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Top-level configuration exactly as read from a TOML file.
///
/// ```toml
/// [config]
/// source_root = "."
/// output_root = "public"
///
/// [assets]
/// script_entry = "app.js"
///
/// [task.deploy]
/// after = ["compile"]
/// ```
///
/// All sections are optional and have reasonable defaults. Turn it into a
/// [`ConfigFile`] with `ConfigFile::try_from`, which validates it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub config: ConfigSection,

    #[serde(default)]
    pub assets: AssetsSection,

    /// User tasks from `[task.<name>]`, added to the standard graph.
    #[serde(default)]
    pub task: BTreeMap<String, TaskConfig>,
}

/// A validated configuration.
///
/// Relative roots are resolved against `base_dir`, the directory of the
/// config file (the current directory for built-in defaults).
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub config: ConfigSection,
    pub assets: AssetsSection,
    pub task: BTreeMap<String, TaskConfig>,
    base_dir: PathBuf,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(raw: RawConfigFile) -> Self {
        Self {
            config: raw.config,
            assets: raw.assets,
            task: raw.task,
            base_dir: PathBuf::from("."),
        }
    }

    pub fn with_base_dir(mut self, base_dir: impl Into<PathBuf>) -> Self {
        self.base_dir = base_dir.into();
        self
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn source_root(&self) -> PathBuf {
        self.base_dir.join(&self.config.source_root)
    }

    pub fn output_root(&self) -> PathBuf {
        self.base_dir.join(&self.config.output_root)
    }
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self::new_unchecked(RawConfigFile::default())
    }
}

/// `[config]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigSection {
    #[serde(default = "default_source_root")]
    pub source_root: PathBuf,

    #[serde(default = "default_output_root")]
    pub output_root: PathBuf,

    /// Target run when none is given on the command line.
    #[serde(default = "default_target")]
    pub default_target: String,
}

fn default_source_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_output_root() -> PathBuf {
    PathBuf::from("public")
}

fn default_target() -> String {
    "default".to_string()
}

impl Default for ConfigSection {
    fn default() -> Self {
        Self {
            source_root: default_source_root(),
            output_root: default_output_root(),
            default_target: default_target(),
        }
    }
}

/// `[assets]` section: where the standard pipelines find their inputs.
/// Every path is relative to the source root.
#[derive(Debug, Clone, Deserialize)]
pub struct AssetsSection {
    #[serde(default = "default_components_dir")]
    pub components_dir: PathBuf,

    /// Entry module of the script bundle.
    #[serde(default = "default_script_entry")]
    pub script_entry: String,

    /// Template rendered into `index.html`.
    #[serde(default = "default_template")]
    pub template: PathBuf,

    #[serde(default = "default_image_extensions")]
    pub image_extensions: Vec<String>,

    #[serde(default = "default_style_extensions")]
    pub style_extensions: Vec<String>,
}

fn default_components_dir() -> PathBuf {
    PathBuf::from("components")
}

fn default_script_entry() -> String {
    "app.js".to_string()
}

fn default_template() -> PathBuf {
    PathBuf::from("components/app.html")
}

fn default_image_extensions() -> Vec<String> {
    ["jpg", "jpeg", "png", "gif", "svg"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_style_extensions() -> Vec<String> {
    vec!["css".to_string(), "scss".to_string()]
}

impl Default for AssetsSection {
    fn default() -> Self {
        Self {
            components_dir: default_components_dir(),
            script_entry: default_script_entry(),
            template: default_template(),
            image_extensions: default_image_extensions(),
            style_extensions: default_style_extensions(),
        }
    }
}

impl AssetsSection {
    /// Glob (relative to the components dir) matching image files.
    pub fn image_glob(&self) -> String {
        extension_glob(&self.image_extensions)
    }

    /// Glob (relative to the components dir) matching stylesheet sources.
    pub fn style_glob(&self) -> String {
        extension_glob(&self.style_extensions)
    }
}

fn extension_glob(extensions: &[String]) -> String {
    match extensions {
        [single] => format!("**/*.{single}"),
        many => format!("**/*.{{{}}}", many.join(",")),
    }
}

/// `[task.<name>]` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskConfig {
    /// Dependency list: this task waits for all tasks listed here.
    #[serde(default)]
    pub after: Vec<String>,

    /// Paths below the output root removed when the task runs.
    #[serde(default)]
    pub clean: Vec<PathBuf>,

    /// Source-root-relative globs watched once the session is watching.
    #[serde(default)]
    pub watch: Vec<String>,

    #[serde(default)]
    pub exclude: Vec<String>,

    /// Task re-run when a `watch` pattern changes.
    #[serde(default)]
    pub rebuild: Option<String>,
}
