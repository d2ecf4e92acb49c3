// src/types.rs

//! Small value types shared across the crate.

use std::fmt;

/// Process-wide build flags.
///
/// A `BuildMode` is computed once, before the first task of a run starts, and
/// is handed by value to every task and pipeline invocation. It has no
/// setters: stage behaviour may depend on it, nothing may change it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BuildMode {
    debug: bool,
    watch: bool,
}

impl BuildMode {
    pub const fn new(debug: bool, watch: bool) -> Self {
        Self { debug, watch }
    }

    /// Production build: minified, no source maps, one-shot.
    pub const fn release() -> Self {
        Self::new(false, false)
    }

    /// Derive the mode from the mode flags requested by a resolved plan.
    pub fn from_flags<I>(flags: I) -> Self
    where
        I: IntoIterator<Item = ModeFlag>,
    {
        flags
            .into_iter()
            .fold(Self::release(), |mode, flag| match flag {
                ModeFlag::Debug => Self::new(true, mode.watch),
                ModeFlag::Watch => Self::new(mode.debug, true),
            })
    }

    /// Emit source maps and skip minification.
    pub const fn debug(&self) -> bool {
        self.debug
    }

    /// Keep incremental state alive and enable live reload.
    pub const fn watch(&self) -> bool {
        self.watch
    }
}

impl fmt::Display for BuildMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let profile = if self.debug { "debug" } else { "release" };
        let run = if self.watch { "watch" } else { "once" };
        write!(f, "{profile}/{run}")
    }
}

/// Flag set by the `mode:*` pseudo-tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModeFlag {
    Debug,
    Watch,
}

impl fmt::Display for ModeFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModeFlag::Debug => f.write_str("debug"),
            ModeFlag::Watch => f.write_str("watch"),
        }
    }
}

/// Kind of asset a pipeline produces. Live clients use it to decide between a
/// full page reload and a style injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetKind {
    Markup,
    Script,
    Stylesheet,
    Image,
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AssetKind::Markup => "markup",
            AssetKind::Script => "script",
            AssetKind::Stylesheet => "stylesheet",
            AssetKind::Image => "image",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_accumulate_into_mode() {
        assert_eq!(BuildMode::from_flags([]), BuildMode::release());
        assert_eq!(
            BuildMode::from_flags([ModeFlag::Debug]),
            BuildMode::new(true, false)
        );
        let mode = BuildMode::from_flags([ModeFlag::Watch, ModeFlag::Debug]);
        assert!(mode.debug());
        assert!(mode.watch());
        assert_eq!(mode.to_string(), "debug/watch");
    }
}
