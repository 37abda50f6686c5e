//! # Storage Layer
//!
//! Task files are plain Markdown edited in place. Only the configured
//! task section of a document is ever rewritten; the rest of the file
//! passes through byte for byte, and every write is atomic (temp file
//! + rename).
//!
//! - [`TaskDocument`] - Read, lint, parse and rewrite one task file
//! - [`GlobalConfig`] - User-wide defaults from `config.toml`

mod config;
mod document;

pub use config::{ConfigError, GlobalConfig, OutputFormat};
pub use document::TaskDocument;
