//! Taskdown - query and lint Markdown task lists
//!
//! Tasks live inside ordinary Markdown files as an indented bullet
//! syntax with key-value fields. This crate parses that syntax into a
//! tree, lints it, answers SQL-flavored queries over it, and writes
//! edits back without disturbing the rest of the document.

pub mod cli;
pub mod domain;
pub mod query;
pub mod storage;
pub mod syntax;

pub use domain::{Task, Value};
