//! Query command
//!
//! Parses the statement, loads the target file, refuses to touch files
//! with lint errors, executes, and prints rows or a summary. Mutations
//! rewrite the task section in place and save atomically.

use anyhow::{Context, Result};

use super::output::Output;
use crate::domain::Task;
use crate::query::{self, Delete, Insert, Select, Statement, Update};
use crate::storage::TaskDocument;
use crate::syntax::SyntaxConfig;

pub fn run(output: &Output, statement: &str, syntax: &SyntaxConfig) -> Result<()> {
    let statement = query::parse_query(statement).context("Failed to parse query")?;
    output.verbose_ctx("query", &format!("Target file: {}", statement.file()));

    match statement {
        Statement::Select(select) => run_select(output, &select, syntax),
        Statement::Update(update) => run_update(output, &update, syntax),
        Statement::Delete(delete) => run_delete(output, &delete, syntax),
        Statement::Insert(insert) => run_insert(output, &insert, syntax),
    }
}

fn run_select(output: &Output, select: &Select, syntax: &SyntaxConfig) -> Result<()> {
    let doc = load_clean(&select.file, syntax)?;
    let tasks = doc.parse();
    let rows = query::select(&tasks, select);
    output.verbose_ctx("query", &format!("{} row(s) selected", rows.len()));

    if let Some(target) = &select.into {
        let mut dest = TaskDocument::load_or_new(target, syntax.clone())?;
        dest.replace_tasks(&rows);
        dest.save()?;
        if output.is_json() {
            output.data(&serde_json::json!({ "written": rows.len(), "file": target }));
        } else {
            output.success(&format!(
                "Wrote {} task{} to {}",
                rows.len(),
                plural(rows.len()),
                target
            ));
        }
        return Ok(());
    }

    if output.is_json() {
        output.data(&rows_json(&rows));
    } else {
        print_table(&rows);
    }
    Ok(())
}

fn run_update(output: &Output, update: &Update, syntax: &SyntaxConfig) -> Result<()> {
    let mut doc = load_clean(&update.file, syntax)?;
    let mut tasks = doc.parse();
    let changed = query::update(&mut tasks, &update.assignments, update.filter.as_ref())
        .context("Failed to run UPDATE")?;
    if changed > 0 {
        doc.replace_tasks(&tasks);
        doc.save()?;
    }
    if output.is_json() {
        output.data(&serde_json::json!({ "updated": changed }));
    } else {
        output.success(&format!("Updated {} task{}", changed, plural(changed)));
    }
    Ok(())
}

fn run_delete(output: &Output, delete: &Delete, syntax: &SyntaxConfig) -> Result<()> {
    let mut doc = load_clean(&delete.file, syntax)?;
    let mut tasks = doc.parse();
    let removed = query::delete(&mut tasks, delete.filter.as_ref());
    if removed > 0 {
        doc.replace_tasks(&tasks);
        doc.save()?;
    }
    if output.is_json() {
        output.data(&serde_json::json!({ "deleted": removed }));
    } else {
        output.success(&format!("Deleted {} task{}", removed, plural(removed)));
    }
    Ok(())
}

fn run_insert(output: &Output, insert: &Insert, syntax: &SyntaxConfig) -> Result<()> {
    let mut doc = TaskDocument::load_or_new(&insert.file, syntax.clone())?;
    ensure_clean(&doc)?;
    let mut tasks = doc.parse();
    let id = query::insert(&mut tasks, &insert.assignments, syntax.id_length)
        .context("Failed to run INSERT")?;
    doc.replace_tasks(&tasks);
    doc.save()?;
    if output.is_json() {
        output.data(&serde_json::json!({ "inserted": id }));
    } else {
        output.success(&format!("Inserted task {}", id));
    }
    Ok(())
}

/// Loads a file and refuses to proceed when its task section has lint
/// errors, so queries never run over half-parsed data
fn load_clean(path: &str, syntax: &SyntaxConfig) -> Result<TaskDocument> {
    let doc = TaskDocument::load(path, syntax.clone())?;
    ensure_clean(&doc)?;
    Ok(doc)
}

fn ensure_clean(doc: &TaskDocument) -> Result<()> {
    let report = doc.lint();
    if !report.is_clean() {
        anyhow::bail!(
            "{} has {} syntax error{}, first: {} (run 'taskdown lint' for the full list)",
            doc.path().display(),
            report.errors.len(),
            plural(report.errors.len()),
            report.errors[0]
        );
    }
    Ok(())
}

fn plural(n: usize) -> &'static str {
    if n == 1 {
        ""
    } else {
        "s"
    }
}

/// JSON rows: id first, then parent, then the remaining fields in
/// document order
fn rows_json(rows: &[Task]) -> Vec<serde_json::Value> {
    rows.iter()
        .map(|row| {
            let mut object = serde_json::Map::new();
            if let Some(id) = row.id() {
                object.insert("id".to_string(), serde_json::Value::String(id.to_string()));
            }
            object.insert(
                "parent".to_string(),
                match &row.parent {
                    Some(parent) => serde_json::Value::String(parent.clone()),
                    None => serde_json::Value::Null,
                },
            );
            for (key, value) in &row.data {
                if key == "id" {
                    continue;
                }
                object.insert(key.clone(), value.to_json());
            }
            serde_json::Value::Object(object)
        })
        .collect()
}

fn print_table(rows: &[Task]) {
    if rows.is_empty() {
        println!("No tasks matched.");
        return;
    }

    let columns = table_columns(rows);
    let mut widths: Vec<usize> = columns.iter().map(|c| c.len()).collect();
    let mut grid: Vec<Vec<String>> = Vec::with_capacity(rows.len());
    for row in rows {
        let mut line = Vec::with_capacity(columns.len());
        for (i, column) in columns.iter().enumerate() {
            let text = cell_text(row, column);
            widths[i] = widths[i].max(text.len());
            line.push(text);
        }
        grid.push(line);
    }

    let header: Vec<String> = columns
        .iter()
        .zip(&widths)
        .map(|(column, width)| format!("{:<1$}", column.to_uppercase(), width))
        .collect();
    println!("{}", header.join("  ").trim_end());
    println!("{}", "-".repeat(widths.iter().sum::<usize>() + 2 * (widths.len() - 1)));
    for line in &grid {
        let cells: Vec<String> = line
            .iter()
            .zip(&widths)
            .map(|(text, width)| format!("{:<1$}", text, width))
            .collect();
        println!("{}", cells.join("  ").trim_end());
    }
    println!();
    println!("{} task{}", rows.len(), plural(rows.len()));
}

/// Column order: id, parent, then every other field in first-seen
/// document order across the rows
fn table_columns(rows: &[Task]) -> Vec<String> {
    let mut columns = vec!["id".to_string(), "parent".to_string()];
    for row in rows {
        for key in row.data.keys() {
            if key != "id" && !columns.contains(key) {
                columns.push(key.clone());
            }
        }
    }
    columns
}

fn cell_text(row: &Task, column: &str) -> String {
    if column == "parent" {
        return row.parent.clone().unwrap_or_default();
    }
    row.get(column)
        .map(|value| value.render().replace('\n', " "))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Value;

    fn row(fields: &[(&str, Value)], parent: Option<&str>) -> Task {
        let mut task = Task::new();
        for (key, value) in fields {
            task.set(key.to_string(), value.clone());
        }
        task.parent = parent.map(str::to_string);
        task
    }

    #[test]
    fn json_rows_put_id_and_parent_first() {
        let rows = vec![row(
            &[
                ("id", Value::Str("abcd1234".into())),
                ("title", Value::Str("Fix".into())),
                ("estimate", Value::Num(3.0)),
            ],
            Some("ffff0000"),
        )];
        let json = rows_json(&rows);
        let object = json[0].as_object().unwrap();
        let keys: Vec<&str> = object.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["id", "parent", "title", "estimate"]);
        assert_eq!(object["parent"], serde_json::json!("ffff0000"));
        assert_eq!(object["estimate"], serde_json::json!(3.0));
    }

    #[test]
    fn json_parent_is_null_for_roots() {
        let rows = vec![row(&[("id", Value::Str("abcd1234".into()))], None)];
        let json = rows_json(&rows);
        assert_eq!(json[0]["parent"], serde_json::Value::Null);
    }

    #[test]
    fn table_columns_follow_first_seen_order() {
        let rows = vec![
            row(
                &[
                    ("id", Value::Str("a".into())),
                    ("title", Value::Str("One".into())),
                    ("due", Value::Str("2024-06-01".into())),
                ],
                None,
            ),
            row(
                &[
                    ("id", Value::Str("b".into())),
                    ("title", Value::Str("Two".into())),
                    ("priority", Value::Str("A".into())),
                ],
                None,
            ),
        ];
        assert_eq!(
            table_columns(&rows),
            vec!["id", "parent", "title", "due", "priority"]
        );
    }

    #[test]
    fn cell_text_flattens_newlines() {
        let task = row(
            &[("notes", Value::Str("first\nsecond".into()))],
            None,
        );
        assert_eq!(cell_text(&task, "notes"), "first second");
        assert_eq!(cell_text(&task, "parent"), "");
        assert_eq!(cell_text(&task, "missing"), "");
    }
}
