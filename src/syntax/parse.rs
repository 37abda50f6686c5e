//! Lenient task parser
//!
//! Builds the task tree from the same line stream the linter checks. The
//! parser never fails: malformed structure degrades to a best-effort
//! reading, and callers gate on the linter when they need a guarantee.
//! After the forest is built every task gets an id (computed when absent)
//! and a resolved parent back-reference.

use super::scan::{is_prefix_token, scan_tokens, split_pair, QuoteKind};
use super::{block_extent, classify, leading_spaces, LineKind, SyntaxConfig, BLOCK_MARKER};
use crate::domain::{
    assign_parents, compute_id, is_array_field, split_list, Task, Value, PRIORITIES,
};

/// Parses the task lines of one document section into a forest
pub fn parse_lines(lines: &[&str], config: &SyntaxConfig) -> Vec<Task> {
    let size = config.indent_size.max(1);
    let mut roots: Vec<Task> = Vec::new();
    let mut stack: Vec<(usize, Task)> = Vec::new();

    let mut i = 0;
    while i < lines.len() {
        match classify(lines[i]) {
            LineKind::Blank | LineKind::Other { .. } => i += 1,
            LineKind::Heading => {
                close_to(0, &mut stack, &mut roots);
                i += 1;
            }
            LineKind::Bullet { indent, content } => {
                let unit = indent / size;
                close_to(unit, &mut stack, &mut roots);
                let mut task = parse_bullet(content);
                task.indent = unit;
                stack.push((unit, task));
                i += 1;
            }
            LineKind::KeyValue { indent, key, value } => {
                i = match stack.last_mut() {
                    Some((_, task)) => consume_field(lines, i, indent, key, value, task, size),
                    None => i + 1,
                };
            }
        }
    }
    close_to(0, &mut stack, &mut roots);

    ensure_ids(&mut roots, config.id_length);
    assign_parents(&mut roots);
    roots
}

/// Pops every open task at `unit` or deeper, attaching each to its parent
fn close_to(unit: usize, stack: &mut Vec<(usize, Task)>, roots: &mut Vec<Task>) {
    while stack.last().is_some_and(|(u, _)| *u >= unit) {
        if let Some((_, task)) = stack.pop() {
            attach(task, stack, roots);
        }
    }
}

fn attach(task: Task, stack: &mut [(usize, Task)], roots: &mut Vec<Task>) {
    match stack.last_mut() {
        Some((_, parent)) => parent.children.push(task),
        None => roots.push(task),
    }
}

/// Parses one bullet line's content into a task
fn parse_bullet(content: &str) -> Task {
    // an unclosed quote closes implicitly at end of line
    let (tokens, _) = scan_tokens(content);
    let mut task = Task::new();
    task.inline = true;

    let mut idx = 0;
    while idx < tokens.len() && is_prefix_token(&tokens[idx]) {
        apply_prefix(&mut task, &tokens[idx].text);
        idx += 1;
    }

    let mut title_words: Vec<String> = Vec::new();
    while idx < tokens.len() {
        let tok = &tokens[idx];
        if tok.is_bare() {
            if let Some((key, inline)) = split_pair(&tok.text) {
                let key = key.to_string();
                match inline {
                    Some(v) => {
                        set_field(&mut task, &key, v, false);
                        idx += 1;
                    }
                    None => match tokens.get(idx + 1) {
                        Some(v) => {
                            set_field(&mut task, &key, &v.text, v.quoted.is_some());
                            idx += 2;
                        }
                        None => {
                            task.set(key, Value::Str(String::new()));
                            idx += 1;
                        }
                    },
                }
                continue;
            }
            title_words.push(tok.text.clone());
            idx += 1;
            continue;
        }
        // the first quoted string becomes the title; later ones are strays
        if task.get("title").is_none() {
            task.set("title", Value::Str(tok.text.clone()));
        }
        idx += 1;
    }
    if task.get("title").is_none() && !title_words.is_empty() {
        task.set("title", Value::Str(title_words.join(" ")));
    }
    task
}

fn apply_prefix(task: &mut Task, text: &str) {
    match text {
        "x" | "[x]" => task.set("completed", Value::Bool(true)),
        "-" | "[-]" => task.set("skipped", Value::Bool(true)),
        "[_]" => task.set("completed", Value::Bool(false)),
        t if PRIORITIES.contains(&t) => task.set("priority", Value::Str(t.to_string())),
        t if t.starts_with('@') => push_item(task, "stakeholders", &t[1..]),
        t if t.starts_with('#') => push_item(task, "tags", &t[1..]),
        _ => {}
    }
}

fn push_item(task: &mut Task, field: &str, item: &str) {
    match task.data.get_mut(field) {
        Some(Value::List(items)) => items.push(item.to_string()),
        _ => task.set(field, Value::List(vec![item.to_string()])),
    }
}

/// Merges one continuation line (and any block it opens) into the task.
/// Returns the index of the next unconsumed line.
fn consume_field(
    lines: &[&str],
    i: usize,
    indent: usize,
    key: &str,
    value: &str,
    task: &mut Task,
    size: usize,
) -> usize {
    task.inline = false;
    if value == BLOCK_MARKER || value.is_empty() {
        let (range, next) = block_extent(lines, i, indent);
        let strip = indent + 2 * size;
        let mut collected: Vec<&str> = range.map(|k| strip_indent(lines[k], strip)).collect();
        while collected.last().is_some_and(|l| l.trim().is_empty()) {
            collected.pop();
        }
        task.set(key.to_string(), Value::Str(collected.join("\n")));
        return next;
    }

    let (text, quoted) = decode_value(value);
    set_field(task, key, &text, quoted);
    i + 1
}

/// Decodes a scalar continuation value: a remainder that is exactly one
/// quoted string takes the quoted reading, anything else stays verbatim
fn decode_value(value: &str) -> (String, bool) {
    if value.chars().next().and_then(QuoteKind::from_char).is_some() {
        let (mut tokens, _) = scan_tokens(value);
        if tokens.len() == 1 {
            if let Some(tok) = tokens.pop() {
                return (tok.text, true);
            }
        }
    }
    (value.to_string(), false)
}

fn set_field(task: &mut Task, key: &str, text: &str, quoted: bool) {
    let value = if key == "id" {
        // ids are adopted verbatim, never typed
        Value::Str(text.to_string())
    } else if is_array_field(key) {
        Value::List(split_list(text))
    } else if quoted {
        Value::Str(text.to_string())
    } else {
        Value::coerce(text)
    };
    task.set(key.to_string(), value);
}

/// Removes up to `strip` leading spaces, keeping any deeper indentation
/// as value content
fn strip_indent(line: &str, strip: usize) -> &str {
    &line[leading_spaces(line).min(strip)..]
}

/// Computes ids for every task that lacks one. Explicit ids are left
/// untouched.
fn ensure_ids(roots: &mut [Task], id_length: usize) {
    let mut stack: Vec<&mut Task> = roots.iter_mut().collect();
    while let Some(task) = stack.pop() {
        let missing = task.id().map_or(true, str::is_empty);
        if missing {
            let id = compute_id(&task.data, id_length);
            task.set("id", Value::Str(id));
        }
        stack.extend(task.children.iter_mut());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Vec<Task> {
        let lines: Vec<&str> = text.lines().collect();
        parse_lines(&lines, &SyntaxConfig::default())
    }

    #[test]
    fn full_single_line_task() {
        let tasks = parse("- A @Alice #planning `Prepare roadmap` due: 2025-10-05 weight: 10");
        assert_eq!(tasks.len(), 1);
        let t = &tasks[0];
        assert_eq!(t.get("priority"), Some(&Value::Str("A".to_string())));
        assert_eq!(
            t.get("stakeholders"),
            Some(&Value::List(vec!["Alice".to_string()]))
        );
        assert_eq!(
            t.get("tags"),
            Some(&Value::List(vec!["planning".to_string()]))
        );
        assert_eq!(t.title(), Some("Prepare roadmap"));
        assert_eq!(t.get("due"), Some(&Value::Str("2025-10-05".to_string())));
        assert_eq!(t.get("weight"), Some(&Value::Num(10.0)));
        assert_eq!(t.id().map(str::len), Some(8));
    }

    #[test]
    fn completion_markers() {
        assert_eq!(parse("- x \"a\"")[0].get("completed"), Some(&Value::Bool(true)));
        assert_eq!(parse("- [x] \"a\"")[0].get("completed"), Some(&Value::Bool(true)));
        assert_eq!(parse("- [-] \"a\"")[0].get("skipped"), Some(&Value::Bool(true)));
        assert_eq!(parse("- - \"a\"")[0].get("skipped"), Some(&Value::Bool(true)));
        assert_eq!(parse("- [_] \"a\"")[0].get("completed"), Some(&Value::Bool(false)));
        assert_eq!(parse("- \"a\"")[0].get("completed"), None);
    }

    #[test]
    fn priority_conflicts_resolve_to_the_last_token() {
        let tasks = parse("- A B \"t\"");
        assert_eq!(tasks[0].get("priority"), Some(&Value::Str("B".to_string())));
    }

    #[test]
    fn repeated_stakeholders_and_tags_accumulate() {
        let tasks = parse("- @a @b #x #y \"t\"");
        assert_eq!(
            tasks[0].get("stakeholders"),
            Some(&Value::List(vec!["a".to_string(), "b".to_string()]))
        );
        assert_eq!(
            tasks[0].get("tags"),
            Some(&Value::List(vec!["x".to_string(), "y".to_string()]))
        );
    }

    #[test]
    fn implicit_title_from_trailing_words() {
        let tasks = parse("- A Prepare roadmap");
        assert_eq!(tasks[0].title(), Some("Prepare roadmap"));
    }

    #[test]
    fn bare_values_coerce_and_quoted_values_stay_strings() {
        let tasks = parse("- \"t\" done: true count: 3 label: \"true\" code: \"10\"");
        let t = &tasks[0];
        assert_eq!(t.get("done"), Some(&Value::Bool(true)));
        assert_eq!(t.get("count"), Some(&Value::Num(3.0)));
        assert_eq!(t.get("label"), Some(&Value::Str("true".to_string())));
        assert_eq!(t.get("code"), Some(&Value::Str("10".to_string())));
    }

    #[test]
    fn array_fields_split_on_commas_in_pair_form() {
        let tasks = parse("- \"t\" tags: \"alpha, beta\"");
        assert_eq!(
            tasks[0].get("tags"),
            Some(&Value::List(vec!["alpha".to_string(), "beta".to_string()]))
        );
    }

    #[test]
    fn nesting_by_indentation() {
        let tasks = parse("- A \"Parent\"\n  - B \"Child\"");
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].children.len(), 1);
        let child = &tasks[0].children[0];
        assert_eq!(child.title(), Some("Child"));
        assert_eq!(child.parent.as_deref(), tasks[0].id());
        assert_eq!(tasks[0].parent, None);
    }

    #[test]
    fn siblings_after_a_child_return_to_the_parent_level() {
        let tasks = parse("- \"a\"\n  - \"a1\"\n- \"b\"");
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].children.len(), 1);
        assert!(tasks[1].children.is_empty());
    }

    #[test]
    fn continuation_lines_merge_fields() {
        let tasks = parse("- \"t\"\n  due: 2025-10-05\n  weight: 10");
        let t = &tasks[0];
        assert_eq!(t.get("due"), Some(&Value::Str("2025-10-05".to_string())));
        assert_eq!(t.get("weight"), Some(&Value::Num(10.0)));
        assert!(!t.inline);
    }

    #[test]
    fn quoted_continuation_value_is_decoded() {
        let tasks = parse("- \"t\"\n  due: \"next week\"");
        assert_eq!(
            tasks[0].get("due"),
            Some(&Value::Str("next week".to_string()))
        );
    }

    #[test]
    fn continuation_with_tokens_after_a_quote_stays_verbatim() {
        let tasks = parse("- \"t\"\n  due: \"next week\" or later");
        assert_eq!(
            tasks[0].get("due"),
            Some(&Value::Str("\"next week\" or later".to_string()))
        );
    }

    #[test]
    fn block_value_joins_lines() {
        let tasks = parse("- \"t\"\n  description: |\n    line one\n    line two");
        assert_eq!(
            tasks[0].get("description"),
            Some(&Value::Str("line one\nline two".to_string()))
        );
    }

    #[test]
    fn block_preserves_deeper_indentation_and_blank_lines() {
        let tasks = parse(
            "- \"t\"\n  code: |\n      fn main() {\n          body\n      }\n\n      done",
        );
        assert_eq!(
            tasks[0].get("code"),
            Some(&Value::Str(
                "fn main() {\n    body\n}\n\ndone".to_string()
            ))
        );
    }

    #[test]
    fn block_without_content_is_an_empty_string() {
        let tasks = parse("- \"t\"\n  description: |");
        assert_eq!(
            tasks[0].get("description"),
            Some(&Value::Str(String::new()))
        );
    }

    #[test]
    fn block_ends_when_indentation_returns() {
        let tasks = parse("- \"t\"\n  note: |\n    inside\n  after: 1");
        assert_eq!(tasks[0].get("note"), Some(&Value::Str("inside".to_string())));
        assert_eq!(tasks[0].get("after"), Some(&Value::Num(1.0)));
    }

    #[test]
    fn missing_marker_still_collects_the_block() {
        let tasks = parse("- \"t\"\n  note:\n    dangling");
        assert_eq!(tasks[0].get("note"), Some(&Value::Str("dangling".to_string())));
    }

    #[test]
    fn explicit_id_is_adopted_verbatim() {
        let tasks = parse("- \"t\" id: my-id-1");
        assert_eq!(tasks[0].id(), Some("my-id-1"));
    }

    #[test]
    fn explicit_id_survives_field_changes() {
        let a = parse("- \"t\" id: fixed00");
        let b = parse("- \"different\" weight: 9 id: fixed00");
        assert_eq!(a[0].id(), b[0].id());
    }

    #[test]
    fn computed_ids_are_deterministic() {
        let a = parse("- A \"t\" due: 2025-10-05");
        let b = parse("- A \"t\" due: 2025-10-05");
        assert_eq!(a[0].id(), b[0].id());

        let c = parse("- B \"t\" due: 2025-10-05");
        assert_ne!(a[0].id(), c[0].id());
    }

    #[test]
    fn unclosed_quote_closes_at_end_of_line() {
        let tasks = parse("- \"oops");
        assert_eq!(tasks[0].title(), Some("oops"));
    }

    #[test]
    fn headings_close_open_tasks() {
        let tasks = parse("- \"a\"\n### note\n  - \"b\"");
        assert_eq!(tasks.len(), 2);
        assert!(tasks[0].children.is_empty());
        assert_eq!(tasks[1].parent, None);
    }

    #[test]
    fn quoted_title_wins_over_stray_words() {
        let tasks = parse("- draft \"Real title\"");
        assert_eq!(tasks[0].title(), Some("Real title"));
    }

    #[test]
    fn deep_jump_still_nests_under_the_nearest_parent() {
        let tasks = parse("- \"a\"\n        - \"deep\"");
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].children.len(), 1);
        assert_eq!(tasks[0].children[0].title(), Some("deep"));
    }
}
