use crate::analysis::{Leftover, LeftoverReport};
use miette::{IntoDiagnostic, Result, WrapErr};
use serde::Serialize;
use std::path::PathBuf;

/// JSON reporter for programmatic output
pub struct JsonReporter {
    output_path: Option<PathBuf>,
}

impl JsonReporter {
    pub fn new(output_path: Option<PathBuf>) -> Self {
        Self { output_path }
    }

    pub fn report(&self, report: &LeftoverReport) -> Result<()> {
        let json = self.render(report)?;

        if let Some(path) = &self.output_path {
            std::fs::write(path, &json)
                .into_diagnostic()
                .wrap_err_with(|| format!("Failed to write {}", path.display()))?;
            println!("Report written to: {}", path.display());
        } else {
            println!("{}", json);
        }

        Ok(())
    }

    pub fn render(&self, report: &LeftoverReport) -> Result<String> {
        serde_json::to_string_pretty(&JsonReport::from_report(report)).into_diagnostic()
    }
}

#[derive(Serialize)]
struct JsonReport {
    version: &'static str,
    total_issues: usize,
    issues: Vec<JsonIssue>,
    summary: JsonSummary,
}

#[derive(Serialize)]
struct JsonIssue {
    code: &'static str,
    issue: &'static str,
    message: String,
    file: String,
    line: usize,
    column: usize,
    source: String,
    definition: JsonDefinition,
}

#[derive(Serialize)]
struct JsonDefinition {
    names: Vec<String>,
    kind: &'static str,
    visibility: &'static str,
    test: bool,
}

#[derive(Serialize)]
struct JsonSummary {
    files: usize,
    definitions: usize,
    test_only: usize,
    never_called: usize,
}

impl JsonIssue {
    fn from_leftover(leftover: &Leftover, issue: &'static str) -> Self {
        let definition = &leftover.definition;
        Self {
            code: leftover.issue.code(),
            issue,
            message: leftover.message.clone(),
            file: definition.location.file.to_string_lossy().to_string(),
            line: definition.location.line,
            column: definition.location.column,
            source: definition.source_line.clone(),
            definition: JsonDefinition {
                names: definition.names.clone(),
                kind: definition.kind.display_name(),
                visibility: definition.visibility.as_str(),
                test: definition.test,
            },
        }
    }
}

impl JsonReport {
    fn from_report(report: &LeftoverReport) -> Self {
        let issues: Vec<JsonIssue> = report
            .test_only
            .iter()
            .map(|l| JsonIssue::from_leftover(l, "test_only"))
            .chain(report.never_called.iter().map(|l| JsonIssue::from_leftover(l, "never_called")))
            .collect();

        Self {
            version: "1.0",
            total_issues: issues.len(),
            issues,
            summary: JsonSummary {
                files: report.files,
                definitions: report.definitions,
                test_only: report.test_only.len(),
                never_called: report.never_called.len(),
            },
        }
    }
}
