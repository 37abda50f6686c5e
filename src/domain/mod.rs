//! Domain models for Taskdown CLI
//!
//! Contains the task tree and value types without any I/O concerns.

mod id;
mod task;
mod value;

pub use id::{compute_id, DEFAULT_ID_LENGTH};
pub use task::{assign_parents, flatten, is_array_field, is_safe_name, Task, ARRAY_FIELDS, PRIORITIES};
pub use value::{split_list, Value};
