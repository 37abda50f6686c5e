//! Main CLI application structure

use anyhow::Result;
use clap::{Parser, Subcommand};

use super::output::{Output, OutputFormat};
use super::{lint, query};
use crate::storage::{self, GlobalConfig};

#[derive(Parser)]
#[command(name = "taskdown")]
#[command(author, version, about = "Query and lint Markdown task lists")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format (defaults to the config file, then table)
    #[arg(long = "format", short = 'o', global = true)]
    pub format: Option<OutputFormat>,

    /// Enable verbose output for debugging
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a statement against a task file
    Query {
        /// Statement, e.g. "SELECT * FROM tasks.md WHERE completed = false"
        statement: String,
    },

    /// Check a task file and report syntax problems
    Lint {
        /// Path to the Markdown file
        file: String,
    },
}

/// Main entry point for the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = GlobalConfig::load()?;
    let format = cli.format.unwrap_or(match config.default_format {
        storage::OutputFormat::Table => OutputFormat::Table,
        storage::OutputFormat::Json => OutputFormat::Json,
    });
    let output = Output::new(format, cli.verbose);

    match cli.command {
        Commands::Query { statement } => {
            output.verbose_ctx("query", &format!("Running: {}", statement));
            query::run(&output, &statement, &config.syntax)?
        }
        Commands::Lint { file } => {
            output.verbose_ctx("lint", &format!("Checking: {}", file));
            lint::run(&output, &file, &config.syntax)?
        }
    }

    output.verbose("Command completed successfully");
    Ok(())
}
