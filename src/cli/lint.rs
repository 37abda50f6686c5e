//! Lint command
//!
//! Prints every finding for one file. Errors fail the command so the
//! exit code reflects them; warnings never do.

use anyhow::Result;

use super::output::Output;
use crate::storage::TaskDocument;
use crate::syntax::{Finding, SyntaxConfig};

pub fn run(output: &Output, file: &str, syntax: &SyntaxConfig) -> Result<()> {
    let doc = TaskDocument::load(file, syntax.clone())?;
    let report = doc.lint();
    output.verbose_ctx(
        "lint",
        &format!(
            "{} error(s), {} warning(s)",
            report.errors.len(),
            report.warnings.len()
        ),
    );

    if output.is_json() {
        output.data(&serde_json::json!({
            "file": file,
            "errors": findings_json(&report.errors),
            "warnings": findings_json(&report.warnings),
        }));
    } else {
        print_findings(file, "error", &report.errors);
        print_findings(file, "warning", &report.warnings);
        if report.is_clean() && report.warnings.is_empty() {
            output.success("No problems found");
        }
    }

    if !report.is_clean() {
        anyhow::bail!(
            "{} error{} in {}",
            report.errors.len(),
            if report.errors.len() == 1 { "" } else { "s" },
            file
        );
    }
    Ok(())
}

fn print_findings(file: &str, severity: &str, findings: &[Finding]) {
    for finding in findings {
        println!("{}: {}: {}", file, severity, finding);
    }
}

fn findings_json(findings: &[Finding]) -> Vec<serde_json::Value> {
    findings
        .iter()
        .map(|finding| {
            serde_json::json!({
                "line": finding.line,
                "column": finding.column,
                "message": finding.message,
                "related": finding.related,
            })
        })
        .collect()
}
