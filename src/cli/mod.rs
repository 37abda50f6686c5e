//! # Command-Line Interface
//!
//! Two commands, both operating on plain Markdown files:
//!
//! | Command | Purpose |
//! |---------|---------|
//! | `query` | Run a SELECT / UPDATE / DELETE / INSERT statement |
//! | `lint`  | Report syntax problems without changing anything |
//!
//! ## Output Formats
//!
//! All commands support the `--format` (`-o`) flag:
//! - `table` (default) - Human-readable output
//! - `json` - Machine-parseable JSON
//!
//! ## Verbose Mode
//!
//! Use `--verbose` (or `-v`) for debug output on stderr:
//! ```bash
//! taskdown --verbose query "SELECT * FROM tasks.md"
//! ```
//!
//! ## Entry Point
//!
//! Call [`run()`] to parse arguments and execute the appropriate command.

mod app;
mod lint;
mod output;
mod query;

pub use app::{run, Cli, Commands};
pub use output::{Output, OutputFormat};
