//! UPDATE, DELETE and INSERT over a parsed forest
//!
//! Assignments are validated before any node changes, so a failing
//! statement leaves the tree untouched and nothing is written back.

use thiserror::Error;

use super::ast::{Assignment, Filter, Literal};
use super::eval::matches;
use crate::domain::{compute_id, flatten, is_array_field, is_safe_name, split_list, Task, Value};

#[derive(Debug, Error, PartialEq)]
pub enum MutateError {
    #[error("cannot assign '{0}': the field is managed automatically")]
    ReservedField(String),
    #[error("invalid {field} entry '{item}': use letters, digits, '-' or '_'")]
    InvalidItem { field: String, item: String },
    #[error("duplicate id '{0}'")]
    DuplicateId(String),
}

/// Applies the assignments to every task matching the filter. Returns
/// the number of tasks changed.
pub fn update(
    tasks: &mut [Task],
    assignments: &[Assignment],
    filter: Option<&Filter>,
) -> Result<usize, MutateError> {
    validate(assignments, false)?;
    let mut changed = 0;
    let mut stack: Vec<&mut Task> = tasks.iter_mut().collect();
    while let Some(task) = stack.pop() {
        if filter.map_or(true, |f| matches(task, f)) {
            apply(task, assignments);
            changed += 1;
        }
        stack.extend(task.children.iter_mut());
    }
    Ok(changed)
}

/// Removes every matching task together with its whole subtree.
/// Returns the number of tasks removed, descendants included.
pub fn delete(tasks: &mut Vec<Task>, filter: Option<&Filter>) -> usize {
    let before = flatten(tasks).len();
    tasks.retain(|task| !is_match(task, filter));
    let mut stack: Vec<&mut Task> = tasks.iter_mut().collect();
    while let Some(task) = stack.pop() {
        task.children.retain(|child| !is_match(child, filter));
        stack.extend(task.children.iter_mut());
    }
    before - flatten(tasks).len()
}

/// Builds a new root task from the assignments and appends it to the
/// forest. Returns the new task's id.
pub fn insert(
    tasks: &mut Vec<Task>,
    assignments: &[Assignment],
    id_length: usize,
) -> Result<String, MutateError> {
    validate(assignments, true)?;
    let mut task = Task::new();
    task.inline = true;
    for assignment in assignments {
        if let Some(value) = assignment_value(&assignment.field, &assignment.value) {
            task.set(assignment.field.clone(), value);
        }
    }
    match task.id() {
        Some(id) if !id.is_empty() => {
            let id = id.to_string();
            if flatten(tasks).iter().any(|t| t.id() == Some(id.as_str())) {
                return Err(MutateError::DuplicateId(id));
            }
            tasks.push(task);
            Ok(id)
        }
        _ => {
            let id = compute_id(&task.data, id_length);
            task.set("id".to_string(), Value::Str(id.clone()));
            tasks.push(task);
            Ok(id)
        }
    }
}

fn is_match(task: &Task, filter: Option<&Filter>) -> bool {
    filter.map_or(true, |f| matches(task, f))
}

fn validate(assignments: &[Assignment], allow_id: bool) -> Result<(), MutateError> {
    for assignment in assignments {
        if assignment.field == "parent" || (!allow_id && assignment.field == "id") {
            return Err(MutateError::ReservedField(assignment.field.clone()));
        }
        if is_array_field(&assignment.field) {
            if let Some(value) = assignment.value.to_value() {
                for item in split_list(&value.render()) {
                    if !is_safe_name(&item) {
                        return Err(MutateError::InvalidItem {
                            field: assignment.field.clone(),
                            item,
                        });
                    }
                }
            }
        }
    }
    Ok(())
}

fn apply(task: &mut Task, assignments: &[Assignment]) {
    for assignment in assignments {
        match assignment_value(&assignment.field, &assignment.value) {
            Some(value) => task.set(assignment.field.clone(), value),
            None => {
                task.remove(&assignment.field);
            }
        }
    }
}

/// NULL clears a field. Array fields split their items out of the
/// rendered string, ids always stay strings, and multi-line strings shed
/// their blank tail the way block form keeps them.
fn assignment_value(field: &str, lit: &Literal) -> Option<Value> {
    let value = lit.to_value()?;
    if is_array_field(field) {
        return Some(Value::List(split_list(&value.render())));
    }
    if field == "id" {
        return Some(Value::Str(value.render()));
    }
    match value {
        Value::Str(s) if s.contains('\n') => Some(Value::Str(trim_block_tail(&s).to_string())),
        other => Some(other),
    }
}

/// Block form cannot represent trailing blank lines
fn trim_block_tail(s: &str) -> &str {
    let mut end = s.len();
    while let Some(pos) = s[..end].rfind('\n') {
        if s[pos + 1..end].trim().is_empty() {
            end = pos;
        } else {
            break;
        }
    }
    &s[..end]
}
