//! Task domain model
//!
//! A task is one bullet line plus its continuation lines, holding an ordered
//! schemaless field map and an owned list of child tasks. `parent` and
//! `indent` are parse-time annotations and never reach the serialized text.

use indexmap::IndexMap;

use super::value::Value;

/// Fields that hold arrays of names rather than scalars
pub const ARRAY_FIELDS: [&str; 2] = ["tags", "stakeholders"];

/// Canonical priority letters, highest first
pub const PRIORITIES: [&str; 4] = ["A", "B", "C", "D"];

/// One node of the task tree
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Task {
    /// Ordered field map; `id` lives here under the `"id"` key
    pub data: IndexMap<String, Value>,
    /// Owned children in source order
    pub children: Vec<Task>,
    /// Id of the enclosing task, filled in after parsing
    pub parent: Option<String>,
    /// Nesting depth in indent units at parse time
    pub indent: usize,
    /// True when the source form was a single line
    pub inline: bool,
}

impl Task {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        self.data.insert(key.into(), value);
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.data.shift_remove(key)
    }

    /// Returns the task id, if one has been set or computed
    pub fn id(&self) -> Option<&str> {
        self.data.get("id").and_then(Value::as_str)
    }

    pub fn title(&self) -> Option<&str> {
        self.data.get("title").and_then(Value::as_str)
    }

    /// Reads a boolean field, treating absence as false
    pub fn flag(&self, key: &str) -> bool {
        self.data
            .get(key)
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    /// Structural equality over fields and children, ignoring the
    /// parse-time annotations (`parent`, `indent`, `inline`)
    pub fn content_eq(&self, other: &Task) -> bool {
        let mut stack = vec![(self, other)];
        while let Some((a, b)) = stack.pop() {
            if a.data != b.data || a.children.len() != b.children.len() {
                return false;
            }
            for pair in a.children.iter().zip(b.children.iter()) {
                stack.push(pair);
            }
        }
        true
    }
}

/// Returns true if the field holds an array of names
pub fn is_array_field(key: &str) -> bool {
    ARRAY_FIELDS.contains(&key)
}

/// Checks whether a name is safe as an array item: alphanumerics,
/// hyphens and underscores only
pub fn is_safe_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Flattens a forest into document order (pre-order walk)
pub fn flatten(roots: &[Task]) -> Vec<&Task> {
    let mut rows = Vec::new();
    let mut stack: Vec<&Task> = roots.iter().rev().collect();
    while let Some(task) = stack.pop() {
        rows.push(task);
        for child in task.children.iter().rev() {
            stack.push(child);
        }
    }
    rows
}

/// Fills in `parent` across a forest from each node's enclosing task.
/// Roots keep `None`.
pub fn assign_parents(roots: &mut [Task]) {
    let mut stack: Vec<&mut Task> = roots.iter_mut().collect();
    while let Some(task) = stack.pop() {
        let parent_id = task.id().map(str::to_string);
        for child in task.children.iter_mut() {
            child.parent = parent_id.clone();
            stack.push(child);
        }
    }
}
