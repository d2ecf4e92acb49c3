// src/pipeline/stage.rs

//! Stream transforms and the mode condition that gates them.

use std::fmt;

use crate::pipeline::error::TransformError;
use crate::pipeline::file::AssetFile;
use crate::types::BuildMode;

/// A stream transform: consumes the whole file set produced by the previous
/// stage and returns the next one.
pub trait Transform: Send + Sync {
    fn name(&self) -> &str;

    fn apply(&self, files: Vec<AssetFile>, mode: BuildMode) -> Result<Vec<AssetFile>, TransformError>;
}

/// When a stage runs. A skipped stage passes its input through untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageCondition {
    Always,
    DebugOnly,
    ReleaseOnly,
}

impl StageCondition {
    pub fn applies(self, mode: BuildMode) -> bool {
        match self {
            StageCondition::Always => true,
            StageCondition::DebugOnly => mode.debug(),
            StageCondition::ReleaseOnly => !mode.debug(),
        }
    }
}

/// A transform at a fixed position in a pipeline.
pub struct Stage {
    condition: StageCondition,
    transform: Box<dyn Transform>,
}

impl Stage {
    pub fn new(condition: StageCondition, transform: impl Transform + 'static) -> Self {
        Self {
            condition,
            transform: Box::new(transform),
        }
    }

    pub fn always(transform: impl Transform + 'static) -> Self {
        Self::new(StageCondition::Always, transform)
    }

    pub fn debug_only(transform: impl Transform + 'static) -> Self {
        Self::new(StageCondition::DebugOnly, transform)
    }

    pub fn release_only(transform: impl Transform + 'static) -> Self {
        Self::new(StageCondition::ReleaseOnly, transform)
    }

    pub fn name(&self) -> &str {
        self.transform.name()
    }

    pub fn condition(&self) -> StageCondition {
        self.condition
    }

    pub(crate) fn transform(&self) -> &dyn Transform {
        self.transform.as_ref()
    }
}

impl fmt::Debug for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stage")
            .field("name", &self.name())
            .field("condition", &self.condition)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conditions_follow_debug_flag() {
        let debug = BuildMode::new(true, false);
        let release = BuildMode::release();

        assert!(StageCondition::Always.applies(debug));
        assert!(StageCondition::Always.applies(release));
        assert!(StageCondition::DebugOnly.applies(debug));
        assert!(!StageCondition::DebugOnly.applies(release));
        assert!(StageCondition::ReleaseOnly.applies(release));
        assert!(!StageCondition::ReleaseOnly.applies(debug));
    }
}
