// src/pipeline/file.rs

//! The unit flowing through a pipeline.

use std::path::PathBuf;

use crate::pipeline::error::TransformError;

/// One file in flight: an output-relative path, its bytes, and (for text
/// assets assembled from several sources) where its lines came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetFile {
    pub path: PathBuf,
    pub contents: Vec<u8>,
    pub origin: Option<SourceOrigin>,
}

impl AssetFile {
    pub fn new(path: impl Into<PathBuf>, contents: impl Into<Vec<u8>>) -> Self {
        Self {
            path: path.into(),
            contents: contents.into(),
            origin: None,
        }
    }

    pub fn with_origin(mut self, origin: SourceOrigin) -> Self {
        self.origin = Some(origin);
        self
    }

    /// Borrow the contents as UTF-8.
    pub fn text(&self) -> Result<&str, TransformError> {
        std::str::from_utf8(&self.contents).map_err(|_| TransformError::NotUtf8 {
            path: self.path.display().to_string(),
        })
    }

    /// Replace the contents, keeping path and origin.
    pub fn with_text(mut self, text: String) -> Self {
        self.contents = text.into_bytes();
        self
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    pub fn extension(&self) -> Option<&str> {
        self.path.extension().and_then(|e| e.to_str())
    }

    pub fn has_extension(&self, ext: &str) -> bool {
        self.extension() == Some(ext)
    }
}

/// Original sources of a generated file, for source maps.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SourceOrigin {
    pub sources: Vec<SourceEntry>,
    /// Per generated line, which source line it came from. Empty when a
    /// stage rewrote the file beyond line correspondence.
    pub lines: Vec<LineMapping>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceEntry {
    pub name: String,
    pub content: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineMapping {
    /// Zero-based line in the generated file.
    pub generated_line: u32,
    /// Index into [`SourceOrigin::sources`].
    pub source: u32,
    /// Zero-based line in that source.
    pub original_line: u32,
}

impl SourceOrigin {
    /// Register a source, mapping `line_count` consecutive generated lines
    /// starting at `first_generated_line` one-to-one onto it.
    pub fn push_source(
        &mut self,
        name: impl Into<String>,
        content: impl Into<String>,
        first_generated_line: u32,
        line_count: u32,
    ) {
        let index = self.sources.len() as u32;
        self.sources.push(SourceEntry {
            name: name.into(),
            content: content.into(),
        });
        self.lines.extend((0..line_count).map(|line| LineMapping {
            generated_line: first_generated_line + line,
            source: index,
            original_line: line,
        }));
    }
}

/// Number of lines a text occupies once a newline is appended to it.
pub(crate) fn line_count(text: &str) -> u32 {
    if text.is_empty() {
        return 0;
    }
    let newlines = text.matches('\n').count() as u32;
    if text.ends_with('\n') { newlines } else { newlines + 1 }
}
