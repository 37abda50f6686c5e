//! Structural linter
//!
//! Validates the task grammar line by line without building a tree.
//! Errors make a document unsafe to rewrite; warnings are advisory. One
//! pass produces both streams, and they are independent: a document can
//! carry warnings and still be clean.

use std::collections::HashMap;

use super::scan::{is_prefix_token, scan_tokens, split_pair, Token};
use super::{block_extent, classify, LineKind, SyntaxConfig, BLOCK_MARKER};

/// A single finding with its 1-based source position
#[derive(Debug, Clone, PartialEq)]
pub struct Finding {
    pub line: usize,
    pub column: Option<usize>,
    pub message: String,
    /// Earlier line involved in the finding, for duplicate reports
    pub related: Option<usize>,
}

impl std::fmt::Display for Finding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.column {
            Some(col) => write!(f, "line {}, col {}: {}", self.line, col, self.message)?,
            None => write!(f, "line {}: {}", self.line, self.message)?,
        }
        if let Some(related) = self.related {
            write!(f, " (see line {})", related)?;
        }
        Ok(())
    }
}

/// Outcome of linting a document section
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LintReport {
    pub errors: Vec<Finding>,
    pub warnings: Vec<Finding>,
}

impl LintReport {
    /// True when no errors were found; warnings never block
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Lints the task lines of one document section
pub fn lint_lines(lines: &[&str], config: &SyntaxConfig) -> LintReport {
    let mut linter = Linter {
        config,
        stack: Vec::new(),
        seen_ids: HashMap::new(),
        report: LintReport::default(),
    };
    linter.run(lines);
    linter.report
}

/// Scanner state threaded through the lint pass
struct Linter<'a> {
    config: &'a SyntaxConfig,
    /// Indent units of each open ancestor bullet, innermost last
    stack: Vec<usize>,
    /// Explicit ids seen so far, keyed to the line that introduced them
    seen_ids: HashMap<String, usize>,
    report: LintReport,
}

impl Linter<'_> {
    fn run(&mut self, lines: &[&str]) {
        let mut i = 0;
        while i < lines.len() {
            match classify(lines[i]) {
                LineKind::Blank => i += 1,
                LineKind::Heading => {
                    self.stack.clear();
                    i += 1;
                }
                LineKind::Bullet { indent, content } => {
                    self.check_bullet(i, indent, content);
                    i += 1;
                }
                LineKind::KeyValue { indent, key, value } => {
                    i = self.check_key_value(lines, i, indent, key, value);
                }
                LineKind::Other { indent } => {
                    self.check_other(i, indent);
                    i += 1;
                }
            }
        }
    }

    fn unit_size(&self) -> usize {
        self.config.indent_size.max(1)
    }

    fn error(&mut self, line: usize, column: Option<usize>, message: String) {
        self.report.errors.push(Finding {
            line: line + 1,
            column,
            message,
            related: None,
        });
    }

    fn warning(&mut self, line: usize, column: Option<usize>, message: String) {
        self.report.warnings.push(Finding {
            line: line + 1,
            column,
            message,
            related: None,
        });
    }

    /// Innermost open bullet's indent in spaces, if any
    fn enclosing_indent(&self) -> Option<usize> {
        self.stack.last().map(|unit| unit * self.unit_size())
    }

    fn check_bullet(&mut self, line_no: usize, indent: usize, content: &str) {
        let size = self.unit_size();
        if indent % size != 0 {
            self.error(
                line_no,
                Some(1),
                format!("indentation must be a multiple of {} spaces", size),
            );
        }
        let unit = indent / size;

        while matches!(self.stack.last(), Some(&top) if top >= unit) {
            self.stack.pop();
        }
        match self.stack.last() {
            None if unit > 0 => {
                self.error(line_no, Some(1), "indented bullet has no parent".to_string());
            }
            Some(&top) if unit > top + 1 => {
                self.warning(
                    line_no,
                    Some(1),
                    "bullet skips indentation levels".to_string(),
                );
            }
            _ => {}
        }
        self.stack.push(unit);

        if content.trim().is_empty() {
            self.error(line_no, Some(indent + 1), "bullet line has no content".to_string());
            return;
        }

        // content starts after the "- " marker
        let base = indent + 2;
        let (tokens, unclosed) = scan_tokens(content);
        if let Some(u) = unclosed {
            self.error(
                line_no,
                Some(base + u.offset + 1),
                format!("unclosed {}", u.kind.label()),
            );
        }
        self.check_token_stream(line_no, base, &tokens);
    }

    /// Checks token ordering on a bullet line: prefix tokens first, then a
    /// quoted title before any key-value pairs, with a trailing bare run
    /// only legal as an implicit title.
    fn check_token_stream(&mut self, line_no: usize, base: usize, tokens: &[Token]) {
        let mut idx = 0;
        while idx < tokens.len() && is_prefix_token(&tokens[idx]) {
            idx += 1;
        }

        let items = group_items(&tokens[idx..]);
        for item in &items {
            if let Item::Misplaced { class, token } = item {
                self.error(
                    line_no,
                    Some(base + token.offset + 1),
                    format!("misplaced {} '{}'", class, token.text),
                );
            }
        }
        let meaningful: Vec<&Item> = items
            .iter()
            .filter(|item| !matches!(item, Item::Misplaced { .. }))
            .collect();
        for (k, item) in meaningful.iter().enumerate() {
            match item {
                Item::Run(run) => {
                    let col = Some(base + run[0].offset + 1);
                    let pair_follows = meaningful[k + 1..]
                        .iter()
                        .any(|later| matches!(later, Item::Pair { .. }));
                    if pair_follows {
                        self.error(
                            line_no,
                            col,
                            "unquoted strings need to be quoted when key-value pairs follow"
                                .to_string(),
                        );
                    } else if k > 0 || meaningful.len() > 1 {
                        self.error(line_no, col, "values without keys are not allowed".to_string());
                    }
                }
                // only the leading item can be a title; a later quoted
                // string has no key to land under
                Item::Quoted(token) if k > 0 => {
                    self.error(
                        line_no,
                        Some(base + token.offset + 1),
                        "values without keys are not allowed".to_string(),
                    );
                }
                _ => {}
            }
        }

        for item in &items {
            if let Item::Pair { key, value, token } = item {
                if key == "id" {
                    if let Some(id) = value {
                        self.record_id(line_no, Some(base + token.offset + 1), id);
                    }
                }
            }
        }
    }

    fn check_key_value(
        &mut self,
        lines: &[&str],
        i: usize,
        indent: usize,
        key: &str,
        value: &str,
    ) -> usize {
        let attached = matches!(self.enclosing_indent(), Some(top) if indent > top);
        if !attached {
            self.error(i, Some(1), "key-value line is not attached to a task".to_string());
        }

        let key_col = Some(indent + 1);
        if value == BLOCK_MARKER {
            let (range, next) = block_extent(lines, i, indent);
            let has_content = range.clone().any(|k| !lines[k].trim().is_empty());
            if !has_content {
                self.error(i, key_col, format!("'{}' has no indented content", key));
            }
            return next;
        }
        if value.is_empty() {
            let (range, next) = block_extent(lines, i, indent);
            let has_content = range.clone().any(|k| !lines[k].trim().is_empty());
            if has_content {
                self.error(
                    i,
                    key_col,
                    format!("'{}' opens a multi-line value without '|'", key),
                );
                return next;
            }
            return i + 1;
        }

        let value_col = value_column(lines[i], indent, key);
        let (tokens, unclosed) = scan_tokens(value);
        // a quoted value keeps its whitespace only when the quotes span
        // the whole remainder
        let fully_quoted = tokens.len() == 1 && !tokens[0].is_bare();
        if let Some(u) = unclosed {
            self.error(
                i,
                Some(value_col + u.offset + 1),
                format!("unclosed {}", u.kind.label()),
            );
        } else if !fully_quoted && value.contains([' ', '\t']) {
            self.warning(
                i,
                Some(value_col + 1),
                "unquoted value contains whitespace, consider quoting".to_string(),
            );
        }

        if key == "id" {
            if let Some(tok) = tokens.first() {
                self.record_id(i, Some(value_col + 1), &tok.text);
            }
        }
        i + 1
    }

    fn check_other(&mut self, i: usize, indent: usize) {
        let deeper = matches!(self.enclosing_indent(), Some(top) if indent > top);
        if deeper {
            self.error(
                i,
                Some(indent + 1),
                "values without keys are not allowed".to_string(),
            );
        } else {
            self.error(i, Some(1), "unexpected content outside of a task".to_string());
        }
    }

    fn record_id(&mut self, line_no: usize, column: Option<usize>, id: &str) {
        if id.is_empty() {
            return;
        }
        match self.seen_ids.get(id) {
            Some(&first) => self.report.errors.push(Finding {
                line: line_no + 1,
                column,
                message: format!("duplicate id '{}'", id),
                related: Some(first),
            }),
            None => {
                self.seen_ids.insert(id.to_string(), line_no + 1);
            }
        }
    }
}

/// Post-prefix content of a bullet line, grouped for ordering checks
enum Item<'t> {
    /// A quoted string (title or stray)
    Quoted(&'t Token),
    /// A `key: value` pair
    Pair {
        key: String,
        value: Option<String>,
        token: &'t Token,
    },
    /// A maximal run of bare word tokens
    Run(Vec<&'t Token>),
    /// A prefix-class token appearing after the prefix run
    Misplaced {
        class: &'static str,
        token: &'t Token,
    },
}

fn group_items<'t>(tokens: &'t [Token]) -> Vec<Item<'t>> {
    let mut items = Vec::new();
    let mut run: Vec<&Token> = Vec::new();
    let mut j = 0;
    while j < tokens.len() {
        let tok = &tokens[j];
        if !tok.is_bare() {
            flush_run(&mut run, &mut items);
            items.push(Item::Quoted(tok));
            j += 1;
            continue;
        }
        if let Some((key, inline)) = split_pair(&tok.text) {
            flush_run(&mut run, &mut items);
            let value = match inline {
                Some(v) => {
                    j += 1;
                    Some(v.to_string())
                }
                None => {
                    let v = tokens.get(j + 1).map(|t| t.text.clone());
                    j += 2;
                    v
                }
            };
            items.push(Item::Pair {
                key: key.to_string(),
                value,
                token: tok,
            });
            continue;
        }
        if let Some(class) = misplaced_class(tok) {
            flush_run(&mut run, &mut items);
            items.push(Item::Misplaced { class, token: tok });
            j += 1;
            continue;
        }
        run.push(tok);
        j += 1;
    }
    flush_run(&mut run, &mut items);
    items
}

fn flush_run<'t>(run: &mut Vec<&'t Token>, items: &mut Vec<Item<'t>>) {
    if !run.is_empty() {
        items.push(Item::Run(std::mem::take(run)));
    }
}

/// Class of an unambiguous prefix token found after the prefix run.
/// Bare `x`, `-` and priority letters are ordinary words elsewhere on the
/// line, so only sigil and bracket forms are flagged.
fn misplaced_class(tok: &Token) -> Option<&'static str> {
    let t = tok.text.as_str();
    if t.len() > 1 && t.starts_with('@') {
        return Some("stakeholder");
    }
    if t.len() > 1 && t.starts_with('#') {
        return Some("tag");
    }
    if matches!(t, "[x]" | "[-]" | "[_]") {
        return Some("completion marker");
    }
    None
}

/// 0-based column where a key-value line's value begins
fn value_column(line: &str, indent: usize, key: &str) -> usize {
    let after = indent + key.len() + 1;
    let rest = &line[after..];
    after + (rest.len() - rest.trim_start().len())
}
