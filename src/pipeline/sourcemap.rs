// src/pipeline/sourcemap.rs

//! Revision 3 source maps with line-granular mappings.

use serde::Serialize;

use crate::pipeline::file::SourceOrigin;

const BASE64: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceMap {
    pub version: u8,
    pub file: String,
    pub sources: Vec<String>,
    pub sources_content: Vec<String>,
    pub names: Vec<String>,
    pub mappings: String,
}

impl SourceMap {
    /// Build a map for `file` whose generated text spans `generated_lines`.
    pub fn from_origin(file: &str, origin: &SourceOrigin, generated_lines: u32) -> Self {
        Self {
            version: 3,
            file: file.to_string(),
            sources: origin.sources.iter().map(|s| s.name.clone()).collect(),
            sources_content: origin.sources.iter().map(|s| s.content.clone()).collect(),
            names: Vec::new(),
            mappings: encode_mappings(origin, generated_lines),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// One segment at column 0 of each mapped line, `;` between lines.
fn encode_mappings(origin: &SourceOrigin, generated_lines: u32) -> String {
    let mut per_line: Vec<Option<(u32, u32)>> = vec![None; generated_lines as usize];
    for mapping in &origin.lines {
        if let Some(slot) = per_line.get_mut(mapping.generated_line as usize) {
            *slot = Some((mapping.source, mapping.original_line));
        }
    }

    let mut out = String::new();
    let (mut prev_source, mut prev_line) = (0i64, 0i64);
    for (index, entry) in per_line.iter().enumerate() {
        if index > 0 {
            out.push(';');
        }
        if let Some((source, line)) = *entry {
            let (source, line) = (i64::from(source), i64::from(line));
            encode_vlq(0, &mut out);
            encode_vlq(source - prev_source, &mut out);
            encode_vlq(line - prev_line, &mut out);
            encode_vlq(0, &mut out);
            prev_source = source;
            prev_line = line;
        }
    }
    out
}

pub(crate) fn encode_vlq(value: i64, out: &mut String) {
    let mut vlq = if value < 0 {
        ((-value) << 1) | 1
    } else {
        value << 1
    };
    loop {
        let mut digit = (vlq & 0b11111) as usize;
        vlq >>= 5;
        if vlq > 0 {
            digit |= 0b100000;
        }
        out.push(BASE64[digit] as char);
        if vlq == 0 {
            break;
        }
    }
}
