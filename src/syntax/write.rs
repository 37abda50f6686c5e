//! Task serializer
//!
//! Renders a task forest back to text lines. Each node picks single-line
//! or multi-line form: multi-line when the original form was multi-line,
//! when any value carries a newline, or when a pair-form field renders
//! longer than the inline limit. The bullet line always carries the
//! prefix tokens, the quoted title and the id; multi-line form moves the
//! remaining fields onto indented `key: value` lines.

use super::{SyntaxConfig, BLOCK_MARKER};
use crate::domain::{is_safe_name, Task, Value, PRIORITIES};

/// Pair-form values longer than this push a task into multi-line form
const INLINE_VALUE_LIMIT: usize = 25;

/// Fields with a reserved spot on the bullet line
const HEAD_FIELDS: [&str; 7] = [
    "id",
    "title",
    "completed",
    "skipped",
    "priority",
    "stakeholders",
    "tags",
];

/// Serializes a forest to text lines, children one indent level deeper
pub fn write_tasks(tasks: &[Task], config: &SyntaxConfig) -> Vec<String> {
    let size = config.indent_size.max(1);
    let mut lines = Vec::new();
    let mut stack: Vec<(&Task, usize)> = tasks.iter().rev().map(|t| (t, 0)).collect();
    while let Some((task, depth)) = stack.pop() {
        write_task(task, depth, size, &mut lines);
        for child in task.children.iter().rev() {
            stack.push((child, depth + 1));
        }
    }
    lines
}

fn write_task(task: &Task, depth: usize, size: usize, lines: &mut Vec<String>) {
    let indent = " ".repeat(depth * size);
    let multi = !task.inline || forced_multi(task);

    let mut head: Vec<String> = Vec::new();
    let mut consumed: Vec<&str> = vec!["id"];

    match task.get("completed") {
        Some(Value::Bool(true)) => {
            head.push("[x]".to_string());
            consumed.push("completed");
        }
        Some(Value::Bool(false)) => {
            head.push("[_]".to_string());
            consumed.push("completed");
        }
        _ => {}
    }
    // there is no marker for an explicit skipped: false
    if task.get("skipped") == Some(&Value::Bool(true)) {
        head.push("[-]".to_string());
        consumed.push("skipped");
    }
    if let Some(Value::Str(p)) = task.get("priority") {
        if PRIORITIES.contains(&p.as_str()) {
            head.push(p.clone());
            consumed.push("priority");
        }
    }
    if !multi {
        for (field, sigil) in [("stakeholders", '@'), ("tags", '#')] {
            if let Some(Value::List(items)) = task.get(field) {
                if !items.is_empty() && items.iter().all(|i| is_safe_name(i)) {
                    for item in items {
                        head.push(format!("{}{}", sigil, item));
                    }
                    consumed.push(field);
                }
            }
        }
    }
    if let Some(Value::Str(title)) = task.get("title") {
        if !title.contains('\n') {
            head.push(quote_str(title));
            consumed.push("title");
        }
    }

    let pairs = task
        .data
        .iter()
        .filter(|(key, _)| !consumed.contains(&key.as_str()));

    if multi {
        let mut parts = head;
        if let Some(id) = task.id() {
            parts.push(format!("id: {}", format_id(id)));
        }
        lines.push(format!("{}- {}", indent, parts.join(" ")));
        for (key, value) in pairs {
            write_pair(key, value, depth, size, lines);
        }
    } else {
        let mut parts = head;
        for (key, value) in pairs {
            parts.push(format!("{}: {}", key, format_value(value)));
        }
        if let Some(id) = task.id() {
            parts.push(format!("id: {}", format_id(id)));
        }
        lines.push(format!("{}- {}", indent, parts.join(" ")));
    }
}

/// True when the task cannot round-trip on one line: some value embeds a
/// newline, or a free-form pair field renders too long
fn forced_multi(task: &Task) -> bool {
    task.data.iter().any(|(key, value)| {
        if value.is_multiline() {
            return true;
        }
        if HEAD_FIELDS.contains(&key.as_str()) {
            return false;
        }
        value.render().chars().count() > INLINE_VALUE_LIMIT
    })
}

/// Writes one field as an indented `key: value` line, switching to block
/// form for long or multi-line strings
fn write_pair(key: &str, value: &Value, depth: usize, size: usize, lines: &mut Vec<String>) {
    let indent = " ".repeat((depth + 1) * size);
    let block = match value {
        Value::Str(s) => s.contains('\n') || s.chars().count() > INLINE_VALUE_LIMIT,
        _ => false,
    };
    if !block {
        lines.push(format!("{}{}: {}", indent, key, format_value(value)));
        return;
    }
    lines.push(format!("{}{}: {}", indent, key, BLOCK_MARKER));
    let content_indent = " ".repeat((depth + 3) * size);
    if let Value::Str(text) = value {
        for line in text.split('\n') {
            if line.is_empty() {
                lines.push(String::new());
            } else {
                lines.push(format!("{}{}", content_indent, line));
            }
        }
    }
}

/// Renders a value for pair position
fn format_value(value: &Value) -> String {
    match value {
        Value::Str(s) if needs_quoting(s) => quote_str(s),
        Value::Str(s) => s.clone(),
        Value::Num(_) | Value::Bool(_) => value.render(),
        Value::List(items) => quote_str(&items.join(", ")),
    }
}

/// True when a bare rendering would not survive re-scanning: separators,
/// quote characters, escapes, pair-shaped text, or text that would
/// re-coerce to another type
fn needs_quoting(s: &str) -> bool {
    s.is_empty()
        || s == BLOCK_MARKER
        || s.chars().any(|c| {
            c.is_whitespace() || c == ',' || c == ':' || c == '"' || c == '\'' || c == '`' || c == '\\'
        })
        || !matches!(Value::coerce(s), Value::Str(_))
}

/// Quotes a string: double quotes preferred, backtick when the text
/// contains a double quote but no backtick. The active quote character
/// and backslashes are escaped.
fn quote_str(text: &str) -> String {
    if text.contains('"') && !text.contains('`') {
        format!("`{}`", escape_for(text, '`'))
    } else {
        format!("\"{}\"", escape_for(text, '"'))
    }
}

fn escape_for(text: &str, quote: char) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if c == '\\' || c == quote {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Ids render bare unless they contain separators or quote characters
fn format_id(id: &str) -> String {
    let plain = !id.is_empty()
        && !id
            .chars()
            .any(|c| c.is_whitespace() || c == ',' || c == '"' || c == '\'' || c == '`' || c == '\\');
    if plain {
        id.to_string()
    } else {
        quote_str(id)
    }
}
