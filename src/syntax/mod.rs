//! Task syntax: scanning, linting, parsing and serialization
//!
//! The syntax is Markdown-embedded: bullets introduce tasks, indentation
//! nests them, continuation lines add `key: value` fields and `|` opens a
//! multi-line block. The linter and parser walk the same physical line
//! stream with the same line classification so they never disagree on
//! what a line is.

pub mod lint;
pub mod parse;
pub mod scan;
pub mod section;
pub mod write;

pub use lint::{lint_lines, Finding, LintReport};
pub use parse::parse_lines;
pub use section::{replace_section, section_lines, section_span};
pub use write::write_tasks;

use serde::{Deserialize, Serialize};

/// Value that introduces a multi-line block on a `key:` line
pub const BLOCK_MARKER: &str = "|";

/// Tunable syntax parameters, loaded from the global config file
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyntaxConfig {
    /// Spaces per indentation level
    pub indent_size: usize,
    /// Hex length of computed task ids
    pub id_length: usize,
    /// Heading that introduces the task section
    pub section_heading: String,
}

impl Default for SyntaxConfig {
    fn default() -> Self {
        Self {
            indent_size: 2,
            id_length: crate::domain::DEFAULT_ID_LENGTH,
            section_heading: "## TODO".to_string(),
        }
    }
}

/// Classification of one physical line
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LineKind<'a> {
    Blank,
    /// Markdown heading or horizontal rule, outside task scope
    Heading,
    /// Bullet line: `- content` at some indentation (in spaces)
    Bullet { indent: usize, content: &'a str },
    /// Continuation line: `key: value` at some indentation (in spaces)
    KeyValue {
        indent: usize,
        key: &'a str,
        value: &'a str,
    },
    /// Anything else
    Other { indent: usize },
}

/// Classifies a physical line without consuming lookahead
pub fn classify(line: &str) -> LineKind<'_> {
    if line.trim().is_empty() {
        return LineKind::Blank;
    }
    let indent = leading_spaces(line);
    let rest = &line[indent..];
    if rest.starts_with('#') {
        return LineKind::Heading;
    }
    let bare = rest.trim_end();
    if bare.len() >= 3 && bare.chars().all(|c| c == '-') {
        return LineKind::Heading;
    }
    if let Some(content) = rest.strip_prefix("- ") {
        return LineKind::Bullet { indent, content };
    }
    if bare == "-" {
        return LineKind::Bullet { indent, content: "" };
    }
    if let Some((key, value)) = split_key_value(rest) {
        return LineKind::KeyValue { indent, key, value };
    }
    LineKind::Other { indent }
}

/// Counts leading space characters
pub fn leading_spaces(line: &str) -> usize {
    line.bytes().take_while(|&b| b == b' ').count()
}

/// Measures a multi-line block opened on `lines[open]` whose key sits at
/// `indent` spaces. Content runs while lines are blank or indented deeper
/// than the key. Returns the content range (trailing blanks included) and
/// the index of the first line after the block.
pub(crate) fn block_extent(
    lines: &[&str],
    open: usize,
    indent: usize,
) -> (std::ops::Range<usize>, usize) {
    let mut j = open + 1;
    while j < lines.len() {
        let line = lines[j];
        if line.trim().is_empty() || leading_spaces(line) > indent {
            j += 1;
        } else {
            break;
        }
    }
    (open + 1..j, j)
}

/// Returns true if `name` is a legal field key: a letter or underscore
/// followed by letters, digits, hyphens or underscores
pub fn is_key(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Splits `key: value` at the first colon. The value comes back trimmed;
/// it may be empty.
fn split_key_value(text: &str) -> Option<(&str, &str)> {
    let colon = text.find(':')?;
    let key = &text[..colon];
    if !is_key(key) {
        return None;
    }
    Some((key, text[colon + 1..].trim()))
}
