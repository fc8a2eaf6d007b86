//! Todo file support
//!
//! The todo file records the current leftovers as `keep` and `test_only`
//! patterns, so an existing project can adopt the tool and only see
//! leftovers introduced afterwards.

use crate::analysis::{Leftover, LeftoverIssue, LeftoverReport};
use colored::Colorize;
use miette::{IntoDiagnostic, Result, WrapErr};
use std::fmt::Write;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// File name of the todo file at the project root
pub const TODO_FILE: &str = ".leftovers_todo.yml";

/// Writer for the todo file of one project
pub struct TodoFile {
    path: PathBuf,
}

impl TodoFile {
    pub fn new(root: &Path) -> Self {
        Self {
            path: root.join(TODO_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Remove a previous todo file so it doesn't hide the current leftovers
    pub fn prepare(&self) -> Result<()> {
        if self.path.exists() {
            fs::remove_file(&self.path)
                .into_diagnostic()
                .wrap_err_with(|| format!("Failed to remove {}", self.path.display()))?;
            println!("Removed previous {}", TODO_FILE);
        }
        Ok(())
    }

    /// Write the todo file, returning its path when anything was written
    pub fn write(&self, report: &LeftoverReport) -> Result<Option<PathBuf>> {
        if report.is_empty() {
            println!("{}", "No leftovers, no todo file needed".green().bold());
            return Ok(None);
        }

        let contents = render(report, generated_at());
        fs::write(&self.path, contents)
            .into_diagnostic()
            .wrap_err_with(|| format!("Failed to write {}", self.path.display()))?;
        debug!("Wrote {} entries to {}", report.total(), self.path.display());
        println!(
            "Todo file written to: {} ({} leftovers)",
            self.path.display(),
            report.total()
        );
        Ok(Some(self.path.clone()))
    }
}

/// Render the todo file contents
pub fn render(report: &LeftoverReport, generated_at: String) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# This file was generated by `leftovers --write-todo`");
    let _ = writeln!(out, "# Generated at: {}", generated_at);
    let _ = writeln!(out, "#");
    let _ = writeln!(out, "# for instructions on how to address these");
    let _ = writeln!(out, "# see the keep and test_only sections of .leftovers.yml");

    for (key, issue, leftovers) in [
        ("test_only", LeftoverIssue::TestOnly, &report.test_only),
        ("keep", LeftoverIssue::NeverCalled, &report.never_called),
    ] {
        if leftovers.is_empty() {
            continue;
        }
        let _ = writeln!(out);
        let _ = writeln!(out, "{}:", key);
        let _ = writeln!(out, "  # {}:", issue.title());
        for line in entries(leftovers) {
            let _ = writeln!(out, "{}", line);
        }
    }
    out
}

fn entries(leftovers: &[Leftover]) -> Vec<String> {
    let mut named: Vec<(&str, &Leftover)> = leftovers
        .iter()
        .flat_map(|leftover| {
            leftover
                .definition
                .names
                .iter()
                .map(move |name| (name.as_str(), leftover))
        })
        .collect();
    named.sort_by(|a, b| {
        a.0.cmp(b.0)
            .then_with(|| a.1.definition.location.cmp(&b.1.definition.location))
    });

    named
        .into_iter()
        .map(|(name, leftover)| {
            let definition = &leftover.definition;
            let mut line = format!("  - {} # {}", quote(name), definition.location);
            if !definition.source_line.is_empty() {
                line.push(' ');
                line.push_str(&definition.source_line);
            }
            line
        })
        .collect()
}

/// Double-quoted scalar; JSON string escapes are valid YAML
fn quote(name: &str) -> String {
    serde_json::to_string(name).unwrap_or_else(|_| format!("\"{}\"", name))
}

fn generated_at() -> String {
    use std::time::SystemTime;

    let secs = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default();
    format!("{} (unix time)", secs)
}
