//! Task document I/O
//!
//! Documents are ordinary Markdown files. Only the configured task
//! section is linted, parsed and rewritten; every byte outside it
//! passes through untouched.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::domain::Task;
use crate::syntax::{
    lint_lines, parse_lines, replace_section, section_lines, section_span, write_tasks,
    LintReport, SyntaxConfig,
};

/// One task file on disk
pub struct TaskDocument {
    path: PathBuf,
    text: String,
    config: SyntaxConfig,
}

impl TaskDocument {
    /// Reads the document from disk
    pub fn load(path: impl Into<PathBuf>, config: SyntaxConfig) -> Result<Self> {
        let path = path.into();
        let text = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Ok(Self { path, text, config })
    }

    /// Reads the document, or starts an empty one when the file does
    /// not exist yet
    pub fn load_or_new(path: impl Into<PathBuf>, config: SyntaxConfig) -> Result<Self> {
        let path = path.into();
        if !path.exists() {
            return Ok(Self {
                path,
                text: String::new(),
                config,
            });
        }
        Self::load(path, config)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Lints the task section. Line numbers in the findings refer to
    /// the whole file, not the section.
    pub fn lint(&self) -> LintReport {
        let lines: Vec<&str> = self.text.lines().collect();
        match section_span(&lines, &self.config.section_heading) {
            Some(span) => {
                let offset = span.start;
                let mut report = lint_lines(&lines[span], &self.config);
                for finding in report.errors.iter_mut().chain(report.warnings.iter_mut()) {
                    finding.line += offset;
                    if let Some(related) = finding.related.as_mut() {
                        *related += offset;
                    }
                }
                report
            }
            None => LintReport::default(),
        }
    }

    /// Parses the task section into a forest. A missing section means
    /// zero tasks.
    pub fn parse(&self) -> Vec<Task> {
        let lines: Vec<&str> = self.text.lines().collect();
        let section = section_lines(&lines, &self.config.section_heading);
        parse_lines(section, &self.config)
    }

    /// Replaces the task section with a fresh serialization of the
    /// forest, appending the section if the document lacks one.
    pub fn replace_tasks(&mut self, tasks: &[Task]) {
        let body = write_tasks(tasks, &self.config);
        self.text = replace_section(&self.text, &self.config.section_heading, &body);
    }

    /// Writes the document back atomically (temp file + rename)
    pub fn save(&self) -> Result<()> {
        let temp_path = self.path.with_extension("md.tmp");

        fs::write(&temp_path, &self.text)
            .with_context(|| format!("Failed to write temp file: {}", temp_path.display()))?;

        fs::rename(&temp_path, &self.path).with_context(|| {
            format!(
                "Failed to rename {} to {}",
                temp_path.display(),
                self.path.display()
            )
        })?;

        Ok(())
    }
}
