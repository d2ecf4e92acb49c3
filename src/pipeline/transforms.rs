// src/pipeline/transforms.rs

//! Default transforms wired into the standard pipelines.
//!
//! These are deliberately simple and can be swapped for any other
//! [`Transform`]; the engine only relies on the `Vec<AssetFile>` contract.

use std::path::PathBuf;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::pipeline::error::TransformError;
use crate::pipeline::file::{line_count, AssetFile, SourceOrigin};
use crate::pipeline::script::{segments, SegmentKind};
use crate::pipeline::sourcemap::SourceMap;
use crate::pipeline::stage::Transform;
use crate::types::BuildMode;

/// Joins every file into one, in input order, recording where each line
/// came from.
#[derive(Debug, Clone)]
pub struct ConcatTransform {
    file_name: PathBuf,
}

impl ConcatTransform {
    pub fn new(file_name: impl Into<PathBuf>) -> Self {
        Self {
            file_name: file_name.into(),
        }
    }
}

impl Transform for ConcatTransform {
    fn name(&self) -> &str {
        "concat"
    }

    fn apply(&self, files: Vec<AssetFile>, _mode: BuildMode) -> Result<Vec<AssetFile>, TransformError> {
        if files.is_empty() {
            return Ok(files);
        }

        let mut text = String::new();
        let mut origin = SourceOrigin::default();
        let mut line = 0;

        for file in &files {
            let body = file.text()?;
            let lines = line_count(body);
            origin.push_source(file.path.to_string_lossy(), body, line, lines);
            text.push_str(body);
            if !body.is_empty() && !body.ends_with('\n') {
                text.push('\n');
            }
            line += lines;
        }

        Ok(vec![
            AssetFile::new(self.file_name.clone(), text).with_origin(origin),
        ])
    }
}

/// Properties that still need vendor-prefixed copies, with their prefixes.
const PREFIXED_PROPERTIES: &[(&str, &[&str])] = &[
    ("appearance", &["-webkit-", "-moz-"]),
    ("backdrop-filter", &["-webkit-"]),
    ("box-decoration-break", &["-webkit-"]),
    ("hyphens", &["-webkit-", "-ms-"]),
    ("mask-image", &["-webkit-"]),
    ("text-size-adjust", &["-webkit-", "-moz-", "-ms-"]),
    ("user-select", &["-webkit-", "-moz-", "-ms-"]),
];

static PREFIXABLE_DECLARATION: LazyLock<Regex> = LazyLock::new(|| {
    let names: Vec<_> = PREFIXED_PROPERTIES.iter().map(|(name, _)| *name).collect();
    Regex::new(&format!(
        r"(?m)^([ \t]*)({})[ \t]*:[ \t]*([^;{{}}\n]+?)[ \t]*;",
        names.join("|")
    ))
    .expect("valid regex")
});

/// Adds vendor-prefixed copies of a few declarations to `.css` and `.scss`
/// sources.
///
/// Only declarations that open a line and end with `;` on it are handled.
/// The copies go on the same line, so line numbers stay valid for source
/// maps. A declaration already preceded by its prefixed form is left alone.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrefixTransform;

impl Transform for PrefixTransform {
    fn name(&self) -> &str {
        "prefix"
    }

    fn apply(&self, files: Vec<AssetFile>, _mode: BuildMode) -> Result<Vec<AssetFile>, TransformError> {
        files
            .into_iter()
            .map(|file| {
                if !(file.has_extension("css") || file.has_extension("scss")) {
                    return Ok(file);
                }
                let text = add_prefixes(file.text()?);
                Ok(file.with_text(text))
            })
            .collect()
    }
}

fn add_prefixes(src: &str) -> String {
    let mut out = String::with_capacity(src.len());
    let mut last = 0;

    for caps in PREFIXABLE_DECLARATION.captures_iter(src) {
        let (Some(whole), Some(indent), Some(name), Some(value)) =
            (caps.get(0), caps.get(1), caps.get(2), caps.get(3))
        else {
            continue;
        };
        let Some((_, prefixes)) = PREFIXED_PROPERTIES
            .iter()
            .find(|(prop, _)| *prop == name.as_str())
        else {
            continue;
        };

        let previous_line = src[..whole.start()]
            .trim_end_matches('\n')
            .rsplit('\n')
            .next()
            .unwrap_or_default();
        if prefixes
            .iter()
            .any(|prefix| previous_line.contains(&format!("{prefix}{}", name.as_str())))
        {
            continue;
        }

        out.push_str(&src[last..whole.start()]);
        out.push_str(indent.as_str());
        for prefix in prefixes.iter() {
            out.push_str(&format!("{prefix}{}: {}; ", name.as_str(), value.as_str()));
        }
        out.push_str(&format!("{}: {};", name.as_str(), value.as_str()));
        last = whole.end();
    }

    out.push_str(&src[last..]);
    out
}

/// Compiles SCSS with `grass`, producing expanded CSS.
#[derive(Debug, Clone, Default)]
pub struct SassTransform {
    load_paths: Vec<PathBuf>,
}

impl SassTransform {
    pub fn new() -> Self {
        Self::default()
    }

    /// Directories searched by `@import` / `@use`.
    pub fn load_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.load_paths.push(path.into());
        self
    }
}

impl Transform for SassTransform {
    fn name(&self) -> &str {
        "sass"
    }

    fn apply(&self, files: Vec<AssetFile>, _mode: BuildMode) -> Result<Vec<AssetFile>, TransformError> {
        let options = grass::Options::default()
            .style(grass::OutputStyle::Expanded)
            .load_paths(&self.load_paths);

        files
            .into_iter()
            .map(|file| {
                let css = grass::from_string(file.text()?.to_string(), &options)
                    .map_err(|err| TransformError::stage(self.name(), file.path.display(), err))?;

                let mut out = file.with_text(css);
                out.path.set_extension("css");
                if let Some(origin) = out.origin.as_mut() {
                    origin.lines.clear();
                }
                Ok(out)
            })
            .collect()
    }
}

/// Re-emits CSS in `grass`'s compressed style.
#[derive(Debug, Clone, Copy, Default)]
pub struct CssMinifyTransform;

impl Transform for CssMinifyTransform {
    fn name(&self) -> &str {
        "css-minify"
    }

    fn apply(&self, files: Vec<AssetFile>, _mode: BuildMode) -> Result<Vec<AssetFile>, TransformError> {
        let options = grass::Options::default().style(grass::OutputStyle::Compressed);

        files
            .into_iter()
            .map(|file| {
                if !file.has_extension("css") {
                    return Ok(file);
                }
                let css = grass::from_string(file.text()?.to_string(), &options)
                    .map_err(|err| TransformError::stage(self.name(), file.path.display(), err))?;
                let mut out = file.with_text(css);
                out.origin = None;
                Ok(out)
            })
            .collect()
    }
}

/// Strips comments, indentation and blank lines from script files.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScriptMinifyTransform;

impl Transform for ScriptMinifyTransform {
    fn name(&self) -> &str {
        "js-minify"
    }

    fn apply(&self, files: Vec<AssetFile>, _mode: BuildMode) -> Result<Vec<AssetFile>, TransformError> {
        files
            .into_iter()
            .map(|file| {
                if !file.has_extension("js") {
                    return Ok(file);
                }
                let text = minify_script(file.text()?);
                let mut out = file.with_text(text);
                out.origin = None;
                Ok(out)
            })
            .collect()
    }
}

fn minify_script(src: &str) -> String {
    let mut out = String::with_capacity(src.len());
    let mut line_start = 0;

    for segment in segments(src) {
        match segment.kind {
            SegmentKind::Code => {
                for c in segment.text.chars() {
                    match c {
                        '\n' => end_line(&mut out, &mut line_start),
                        c if c.is_whitespace() && out.len() == line_start => {}
                        c => out.push(c),
                    }
                }
            }
            SegmentKind::Str | SegmentKind::Regex => {
                for c in segment.text.chars() {
                    out.push(c);
                    if c == '\n' {
                        // multi-line template literal: keep its content verbatim
                        line_start = out.len();
                    }
                }
            }
            SegmentKind::LineComment | SegmentKind::BlockComment => {}
        }
    }
    end_line(&mut out, &mut line_start);
    out
}

fn end_line(out: &mut String, line_start: &mut usize) {
    let kept = out[*line_start..].trim_end().len();
    out.truncate(*line_start + kept);
    if kept > 0 {
        out.push('\n');
    }
    *line_start = out.len();
}

static BETWEEN_TAGS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r">\s+<").expect("valid regex"));
static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s{2,}").expect("valid regex"));
static RAW_TEXT_ELEMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?is)<pre\b.*?</pre\s*>|<textarea\b.*?</textarea\s*>|<script\b.*?</script\s*>|<style\b.*?</style\s*>",
    )
    .expect("valid regex")
});

/// Collapses inter-tag whitespace in HTML documents.
///
/// `pre`, `textarea`, `script` and `style` elements are copied verbatim.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlMinifyTransform;

impl Transform for HtmlMinifyTransform {
    fn name(&self) -> &str {
        "html-minify"
    }

    fn apply(&self, files: Vec<AssetFile>, _mode: BuildMode) -> Result<Vec<AssetFile>, TransformError> {
        files
            .into_iter()
            .map(|file| {
                if !file.has_extension("html") {
                    return Ok(file);
                }
                let text = minify_html(file.text()?);
                Ok(file.with_text(text))
            })
            .collect()
    }
}

fn minify_html(src: &str) -> String {
    // Raw-text elements are swapped for tag-shaped placeholders so the
    // whitespace passes treat them like any other tag.
    let mut kept = Vec::new();
    let shielded = RAW_TEXT_ELEMENT.replace_all(src, |c: &regex::Captures| {
        kept.push(c[0].to_string());
        format!("<\u{1}{}>", kept.len() - 1)
    });

    let collapsed = BETWEEN_TAGS.replace_all(&shielded, "><");
    let collapsed = WHITESPACE_RUN.replace_all(&collapsed, " ");
    let mut out = collapsed.trim().to_string();

    for (index, element) in kept.iter().enumerate() {
        out = out.replacen(&format!("<\u{1}{index}>"), element, 1);
    }
    out
}

/// Emits a `.map` file next to every script or stylesheet and appends the
/// `sourceMappingURL` reference.
#[derive(Debug, Clone, Copy, Default)]
pub struct SourceMapTransform;

impl Transform for SourceMapTransform {
    fn name(&self) -> &str {
        "sourcemap"
    }

    fn apply(&self, files: Vec<AssetFile>, _mode: BuildMode) -> Result<Vec<AssetFile>, TransformError> {
        let mut out = Vec::with_capacity(files.len() * 2);

        for file in files {
            let reference = match file.extension() {
                Some("js") => "//# sourceMappingURL={}",
                Some("css") => "/*# sourceMappingURL={} */",
                _ => {
                    out.push(file);
                    continue;
                }
            };

            let name = file.file_name();
            let map_name = format!("{name}.map");
            let text = file.text()?.to_string();

            let origin = file.origin.clone().unwrap_or_else(|| {
                let mut origin = SourceOrigin::default();
                origin.push_source(file.path.to_string_lossy(), text.as_str(), 0, line_count(&text));
                origin
            });

            let map = SourceMap::from_origin(&name, &origin, line_count(&text));
            let json = map
                .to_json()
                .map_err(|err| TransformError::stage(self.name(), file.path.display(), err))?;

            let mut annotated = text;
            if !annotated.is_empty() && !annotated.ends_with('\n') {
                annotated.push('\n');
            }
            annotated.push_str(&reference.replace("{}", &map_name));
            annotated.push('\n');

            let map_path = file.path.with_file_name(&map_name);
            debug!(file = %file.path.display(), map = %map_path.display(), "attached source map");

            out.push(file.with_text(annotated));
            out.push(AssetFile::new(map_path, json));
        }

        Ok(out)
    }
}
