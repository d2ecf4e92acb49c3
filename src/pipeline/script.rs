// src/pipeline/script.rs

//! Lexical scanning of script sources.
//!
//! Only separates code from string literals, regex literals and comments,
//! which is what the minifier and the `require` scan need. Delimiters are
//! all ASCII, so the scan works on bytes and every segment boundary is a
//! valid `char` boundary.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentKind {
    Code,
    /// `'...'`, `"..."` or a template literal, quotes included.
    Str,
    /// `/.../`, flags excluded.
    Regex,
    /// `// ...`, up to but excluding the newline.
    LineComment,
    BlockComment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment<'a> {
    pub kind: SegmentKind,
    pub text: &'a str,
}

/// A `/` right after one of these starts a regex literal, not a division.
const REGEX_PRECEDERS: &[u8] = b"(,=:[!&|?{};+-*%<>~^";
const REGEX_KEYWORDS: &[&str] = &[
    "return", "typeof", "instanceof", "in", "of", "new", "delete", "void", "throw", "case", "do",
    "else", "yield", "await",
];

/// Split `src` into consecutive segments. Concatenating every `text` gives
/// back `src`.
pub fn segments(src: &str) -> Vec<Segment<'_>> {
    let bytes = src.as_bytes();
    let len = bytes.len();
    let mut out = Vec::new();
    let mut code_start = 0;
    // Whether a `/` at the very start of the current code chunk would be a
    // regex, judging by what came before the chunk.
    let mut regex_at_start = true;
    let mut i = 0;

    while i < len {
        let next = bytes.get(i + 1).copied();
        let (kind, end) = match bytes[i] {
            b'\\' => {
                i += 2;
                continue;
            }
            quote @ (b'\'' | b'"' | b'`') => (SegmentKind::Str, scan_string(bytes, i, quote)),
            b'/' if next == Some(b'/') => (
                SegmentKind::LineComment,
                find_byte(bytes, i, b'\n').unwrap_or(len),
            ),
            b'/' if next == Some(b'*') => (
                SegmentKind::BlockComment,
                find_block_end(bytes, i + 2).unwrap_or(len),
            ),
            b'/' if regex_allowed(&src[code_start..i], regex_at_start) => {
                (SegmentKind::Regex, scan_regex(bytes, i))
            }
            _ => {
                i += 1;
                continue;
            }
        };

        let code = &src[code_start..i];
        regex_at_start = regex_allowed(code, regex_at_start);
        push_code(&mut out, code);

        out.push(Segment {
            kind,
            text: &src[i..end],
        });
        if matches!(kind, SegmentKind::Str | SegmentKind::Regex) {
            regex_at_start = false;
        }

        i = end;
        code_start = end;
    }

    push_code(&mut out, &src[code_start.min(len)..]);
    out
}

/// A copy of `src` where everything but code and string delimiters is
/// blanked out with spaces (newlines kept). Byte offsets are unchanged, so
/// a match in the mask can be sliced out of `src`.
pub fn mask_non_code(src: &str) -> String {
    let mut out = String::with_capacity(src.len());
    for segment in segments(src) {
        match segment.kind {
            SegmentKind::Code => out.push_str(segment.text),
            SegmentKind::Str => {
                let last = segment.text.len().saturating_sub(1);
                for (idx, c) in segment.text.char_indices() {
                    if idx == 0 || (idx == last && idx > 0) {
                        out.push(c);
                    } else {
                        blank(&mut out, c);
                    }
                }
            }
            SegmentKind::Regex | SegmentKind::LineComment | SegmentKind::BlockComment => {
                segment.text.chars().for_each(|c| blank(&mut out, c));
            }
        }
    }
    out
}

fn blank(out: &mut String, c: char) {
    if c == '\n' {
        out.push('\n');
    } else {
        out.extend(std::iter::repeat_n(' ', c.len_utf8()));
    }
}

fn push_code<'a>(out: &mut Vec<Segment<'a>>, text: &'a str) {
    if !text.is_empty() {
        out.push(Segment {
            kind: SegmentKind::Code,
            text,
        });
    }
}

fn regex_allowed(code_before: &str, at_start: bool) -> bool {
    let trimmed = code_before.trim_end();
    let Some(&last) = trimmed.as_bytes().last() else {
        return at_start;
    };
    if REGEX_PRECEDERS.contains(&last) {
        return true;
    }
    if last.is_ascii_alphanumeric() || last == b'_' || last == b'$' {
        let word_start = trimmed
            .rfind(|c: char| !(c.is_ascii_alphanumeric() || c == '_' || c == '$'))
            .map_or(0, |idx| idx + 1);
        return REGEX_KEYWORDS.contains(&&trimmed[word_start..]);
    }
    false
}

/// End (exclusive) of the string starting at `start`. Single and double
/// quoted strings stop before an unescaped newline.
fn scan_string(bytes: &[u8], start: usize, quote: u8) -> usize {
    let mut j = start + 1;
    while j < bytes.len() {
        match bytes[j] {
            b'\\' => j += 2,
            b'\n' if quote != b'`' => return j,
            c if c == quote => return j + 1,
            _ => j += 1,
        }
    }
    bytes.len()
}

/// End (exclusive) of the regex literal starting at `start`. A `/` inside a
/// character class does not close it; a newline always does.
fn scan_regex(bytes: &[u8], start: usize) -> usize {
    let mut in_class = false;
    let mut j = start + 1;
    while j < bytes.len() {
        match bytes[j] {
            b'\\' => j += 2,
            b'\n' => return j,
            b'[' => {
                in_class = true;
                j += 1;
            }
            b']' => {
                in_class = false;
                j += 1;
            }
            b'/' if !in_class => return j + 1,
            _ => j += 1,
        }
    }
    bytes.len()
}

fn find_byte(bytes: &[u8], from: usize, needle: u8) -> Option<usize> {
    bytes[from..].iter().position(|&b| b == needle).map(|p| from + p)
}

fn find_block_end(bytes: &[u8], from: usize) -> Option<usize> {
    bytes
        .get(from..)?
        .windows(2)
        .position(|w| w == b"*/")
        .map(|p| from + p + 2)
}
