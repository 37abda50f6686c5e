//! SELECT evaluation: filter, sort, limit, project
//!
//! Results are flat. Every node in the tree is a candidate row, and a
//! projected row keeps the id of the task's direct parent so callers
//! can still show where it came from.

use std::cmp::Ordering;

use super::ast::{Condition, Filter, Literal, OrderKey, Projection, Select, Test};
use crate::domain::{flatten, Task, Value};

/// Runs a SELECT over a parsed forest, producing projected rows in
/// result order.
pub fn select(tasks: &[Task], query: &Select) -> Vec<Task> {
    let mut rows: Vec<&Task> = flatten(tasks)
        .into_iter()
        .filter(|task| query.filter.as_ref().map_or(true, |f| matches(task, f)))
        .collect();
    if !query.order.is_empty() {
        rows.sort_by(|a, b| compare_tasks(a, b, &query.order));
    }
    if let Some(limit) = query.limit {
        rows.truncate(limit);
    }
    rows.into_iter()
        .map(|task| project(task, &query.projection))
        .collect()
}

/// True when the task passes the WHERE clause
pub fn matches(task: &Task, filter: &Filter) -> bool {
    match filter {
        Filter::Single(cond) => test(task, cond),
        Filter::And(a, b) => test(task, a) && test(task, b),
        Filter::Or(a, b) => test(task, a) || test(task, b),
    }
}

fn test(task: &Task, cond: &Condition) -> bool {
    match &cond.test {
        Test::IsNull => lookup(task, &cond.field).is_none(),
        Test::IsNotNull => lookup(task, &cond.field).is_some(),
        Test::Eq(lit) => comparison_value(task, &cond.field)
            .map(|v| literal_eq(&v, lit))
            .unwrap_or(false),
        Test::Gt(lit) => comparison_value(task, &cond.field)
            .and_then(|v| literal_ordering(&v, lit))
            .map(|o| o == Ordering::Greater)
            .unwrap_or(false),
        Test::Lt(lit) => comparison_value(task, &cond.field)
            .and_then(|v| literal_ordering(&v, lit))
            .map(|o| o == Ordering::Less)
            .unwrap_or(false),
        Test::Contains(lit) => comparison_value(task, &cond.field)
            .map(|v| contains(&v, lit))
            .unwrap_or(false),
    }
}

/// Field resolution for WHERE. `parent` reads the tree position and is
/// absent on roots, which is what makes `parent IS NULL` select them.
fn lookup(task: &Task, field: &str) -> Option<Value> {
    if field == "parent" {
        return task.parent.clone().map(Value::Str);
    }
    task.get(field).cloned()
}

/// Like `lookup`, but the completion flags read as false when unset so
/// `completed = false` matches tasks that never mention the field.
fn comparison_value(task: &Task, field: &str) -> Option<Value> {
    lookup(task, field)
        .or_else(|| matches!(field, "completed" | "skipped").then(|| Value::Bool(false)))
}

fn literal_eq(value: &Value, lit: &Literal) -> bool {
    match (value, lit) {
        (_, Literal::Null) => false,
        (Value::Bool(b), Literal::Bool(l)) => b == l,
        (Value::Num(n), Literal::Num(l)) => n == l,
        _ => value.render() == lit.render(),
    }
}

/// Numeric ordering when both sides are numbers, lexicographic on the
/// rendered strings otherwise. NULL never orders against anything.
fn literal_ordering(value: &Value, lit: &Literal) -> Option<Ordering> {
    if let Literal::Null = lit {
        return None;
    }
    if let (Some(n), Literal::Num(l)) = (value.as_num(), lit) {
        return n.partial_cmp(l);
    }
    Some(value.render().cmp(&lit.render()))
}

/// CONTAINS: exact membership on arrays, substring on strings
fn contains(value: &Value, lit: &Literal) -> bool {
    let needle = match lit {
        Literal::Null => return false,
        other => other.render(),
    };
    match value {
        Value::List(items) => items.iter().any(|item| item == &needle),
        Value::Str(s) => s.contains(&needle),
        _ => false,
    }
}

/// Multi-key comparison for ORDER BY. Tasks missing a sort field come
/// first regardless of direction; present values compare numerically
/// when both are numbers and lexicographically otherwise.
pub fn compare_tasks(a: &Task, b: &Task, keys: &[OrderKey]) -> Ordering {
    for key in keys {
        let va = sort_value(a, &key.field);
        let vb = sort_value(b, &key.field);
        let ord = match (va, vb) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (Some(x), Some(y)) => {
                let ord = value_ordering(&x, &y);
                if key.descending {
                    ord.reverse()
                } else {
                    ord
                }
            }
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    Ordering::Equal
}

/// Sort resolution differs from WHERE on one point: `parent` sorts as
/// the empty string for roots instead of being absent.
fn sort_value(task: &Task, field: &str) -> Option<Value> {
    if field == "parent" {
        return Some(Value::Str(task.parent.clone().unwrap_or_default()));
    }
    task.get(field).cloned()
}

fn value_ordering(a: &Value, b: &Value) -> Ordering {
    if let (Some(x), Some(y)) = (a.as_num(), b.as_num()) {
        return x.partial_cmp(&y).unwrap_or(Ordering::Equal);
    }
    a.render().cmp(&b.render())
}

fn project(task: &Task, projection: &Projection) -> Task {
    let mut row = Task::new();
    row.parent = task.parent.clone();
    row.inline = task.inline;
    match projection {
        Projection::All => row.data = task.data.clone(),
        Projection::Fields(fields) => {
            if let Some(id) = task.get("id") {
                row.set("id".to_string(), id.clone());
            }
            for field in fields {
                if field == "id" || field == "parent" {
                    continue;
                }
                if let Some(value) = task.get(field) {
                    row.set(field.clone(), value.clone());
                }
            }
        }
    }
    row
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::parse::parse_query;
    use crate::query::Statement;
    use crate::syntax::{parse_lines, SyntaxConfig};

    fn forest(text: &str) -> Vec<Task> {
        let lines: Vec<&str> = text.lines().collect();
        parse_lines(&lines, &SyntaxConfig::default())
    }

    fn run(tasks: &[Task], sql: &str) -> Vec<Task> {
        match parse_query(sql).unwrap() {
            Statement::Select(query) => select(tasks, &query),
            other => panic!("expected SELECT, got {:?}", other),
        }
    }

    fn titles(rows: &[Task]) -> Vec<&str> {
        rows.iter().map(|r| r.title().unwrap_or("")).collect()
    }

    #[test]
    fn filter_orders_and_limits_by_priority() {
        let tasks = forest(
            "- B #urgent \"Fix login bug\"\n\
             - A #urgent \"Patch CVE\"\n\
             - C #urgent \"Tidy docs\"\n\
             - A \"Unrelated\"\n",
        );
        let rows = run(
            &tasks,
            "SELECT * FROM t.md WHERE tags CONTAINS 'urgent' ORDER BY priority ASC LIMIT 1",
        );
        assert_eq!(titles(&rows), vec!["Patch CVE"]);
    }

    #[test]
    fn contains_is_membership_on_arrays_not_substring() {
        let tasks = forest("- \"One\" tags: \"urgently\"\n- \"Two\" tags: \"urgent\"\n");
        let rows = run(&tasks, "SELECT * FROM t.md WHERE tags CONTAINS 'urgent'");
        assert_eq!(titles(&rows), vec!["Two"]);
    }

    #[test]
    fn contains_is_substring_on_strings() {
        let tasks = forest("- \"Fix the login page\"\n- \"Write docs\"\n");
        let rows = run(&tasks, "SELECT * FROM t.md WHERE title CONTAINS 'login'");
        assert_eq!(titles(&rows), vec!["Fix the login page"]);
    }

    #[test]
    fn completed_defaults_to_false_in_comparisons() {
        let tasks = forest("- x \"Done\"\n- \"Open\"\n");
        let rows = run(&tasks, "SELECT * FROM t.md WHERE completed = false");
        assert_eq!(titles(&rows), vec!["Open"]);
        // but the field is still absent for IS NULL purposes
        let rows = run(&tasks, "SELECT * FROM t.md WHERE completed IS NULL");
        assert_eq!(titles(&rows), vec!["Open"]);
    }

    #[test]
    fn equals_null_matches_nothing() {
        let tasks = forest("- \"A\"\n- \"B\" due: 2024-06-01\n");
        let rows = run(&tasks, "SELECT * FROM t.md WHERE due = NULL");
        assert!(rows.is_empty());
    }

    #[test]
    fn is_null_selects_tasks_missing_the_field() {
        let tasks = forest("- \"A\"\n- \"B\" due: 2024-06-01\n");
        let rows = run(&tasks, "SELECT * FROM t.md WHERE due IS NULL");
        assert_eq!(titles(&rows), vec!["A"]);
        let rows = run(&tasks, "SELECT * FROM t.md WHERE due IS NOT NULL");
        assert_eq!(titles(&rows), vec!["B"]);
    }

    #[test]
    fn parent_is_null_selects_roots() {
        let tasks = forest("- \"Root\"\n  - \"Child\"\n    - \"Grandchild\"\n");
        let rows = run(&tasks, "SELECT * FROM t.md WHERE parent IS NULL");
        assert_eq!(titles(&rows), vec!["Root"]);
        let rows = run(&tasks, "SELECT * FROM t.md WHERE parent IS NOT NULL");
        assert_eq!(titles(&rows), vec!["Child", "Grandchild"]);
    }

    #[test]
    fn parent_equals_an_id_selects_direct_children() {
        let tasks = forest("- \"Root\"\n  - \"Child one\"\n  - \"Child two\"\n    - \"Deeper\"\n");
        let root_id = tasks[0].id().unwrap().to_string();
        let rows = run(
            &tasks,
            &format!("SELECT * FROM t.md WHERE parent = '{}'", root_id),
        );
        assert_eq!(titles(&rows), vec!["Child one", "Child two"]);
    }

    #[test]
    fn rows_are_flat_and_document_ordered_without_order_by() {
        let tasks = forest("- \"A\"\n  - \"A1\"\n- \"B\"\n");
        let rows = run(&tasks, "SELECT * FROM t.md");
        assert_eq!(titles(&rows), vec!["A", "A1", "B"]);
        assert!(rows.iter().all(|r| r.children.is_empty()));
    }

    #[test]
    fn missing_sort_fields_come_first_in_both_directions() {
        let tasks = forest("- \"No due\"\n- \"Early\" due: 2024-01-01\n- \"Late\" due: 2024-12-01\n");
        let rows = run(&tasks, "SELECT * FROM t.md ORDER BY due ASC");
        assert_eq!(titles(&rows), vec!["No due", "Early", "Late"]);
        let rows = run(&tasks, "SELECT * FROM t.md ORDER BY due DESC");
        assert_eq!(titles(&rows), vec!["No due", "Late", "Early"]);
    }

    #[test]
    fn equal_keys_keep_document_order() {
        let tasks = forest("- B \"First\"\n- B \"Second\"\n- A \"Third\"\n");
        let rows = run(&tasks, "SELECT * FROM t.md ORDER BY priority ASC");
        assert_eq!(titles(&rows), vec!["Third", "First", "Second"]);
    }

    #[test]
    fn numbers_sort_numerically_not_lexicographically() {
        let tasks = forest("- \"Ten\" estimate: 10\n- \"Two\" estimate: 2\n");
        let rows = run(&tasks, "SELECT * FROM t.md ORDER BY estimate ASC");
        assert_eq!(titles(&rows), vec!["Two", "Ten"]);
        let rows = run(&tasks, "SELECT * FROM t.md WHERE estimate > 9");
        assert_eq!(titles(&rows), vec!["Ten"]);
    }

    #[test]
    fn secondary_sort_key_breaks_ties() {
        let tasks = forest(
            "- B \"Beta\" due: 2024-02-01\n\
             - B \"Alpha\" due: 2024-01-01\n\
             - A \"Gamma\" due: 2024-03-01\n",
        );
        let rows = run(&tasks, "SELECT * FROM t.md ORDER BY priority ASC, due ASC");
        assert_eq!(titles(&rows), vec!["Gamma", "Alpha", "Beta"]);
    }

    #[test]
    fn or_filter_takes_either_side() {
        let tasks = forest("- A \"One\"\n- @sam \"Two\"\n- \"Three\"\n");
        let rows = run(
            &tasks,
            "SELECT * FROM t.md WHERE priority = 'A' OR stakeholders CONTAINS 'sam'",
        );
        assert_eq!(titles(&rows), vec!["One", "Two"]);
    }

    #[test]
    fn projection_keeps_id_and_requested_fields_only() {
        let tasks = forest("- \"Task\" due: 2024-06-01 estimate: 3\n");
        let rows = run(&tasks, "SELECT title, due FROM t.md");
        assert_eq!(rows.len(), 1);
        let fields: Vec<&str> = rows[0].data.keys().map(String::as_str).collect();
        assert_eq!(fields, vec!["id", "title", "due"]);
        assert!(rows[0].get("estimate").is_none());
    }

    #[test]
    fn projected_rows_keep_their_parent_id() {
        let tasks = forest("- \"Root\"\n  - \"Child\"\n");
        let root_id = tasks[0].id().unwrap().to_string();
        let rows = run(&tasks, "SELECT title FROM t.md WHERE parent IS NOT NULL");
        assert_eq!(rows[0].parent.as_deref(), Some(root_id.as_str()));
    }

    #[test]
    fn limit_zero_yields_no_rows() {
        let tasks = forest("- \"A\"\n- \"B\"\n");
        let rows = run(&tasks, "SELECT * FROM t.md LIMIT 0");
        assert!(rows.is_empty());
    }

    #[test]
    fn ordering_by_parent_puts_roots_first_ascending() {
        let tasks = forest("- \"Root\"\n  - \"Child\"\n");
        let rows = run(&tasks, "SELECT * FROM t.md ORDER BY parent ASC");
        assert_eq!(titles(&rows), vec!["Root", "Child"]);
    }
}
