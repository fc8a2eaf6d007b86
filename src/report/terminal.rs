use crate::analysis::{Leftover, LeftoverIssue, LeftoverReport};
use colored::Colorize;
use miette::Result;
use std::fmt::Write;

/// Terminal reporter with colored output
pub struct TerminalReporter {
    /// Print the defining line after each leftover
    show_source: bool,
}

impl Default for TerminalReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl TerminalReporter {
    pub fn new() -> Self {
        Self { show_source: true }
    }

    pub fn with_source(mut self, show: bool) -> Self {
        self.show_source = show;
        self
    }

    pub fn report(&self, report: &LeftoverReport) -> Result<()> {
        print!("{}", self.render(report));
        Ok(())
    }

    pub fn render(&self, report: &LeftoverReport) -> String {
        let mut out = String::new();
        if report.is_empty() {
            let _ = writeln!(out, "{}", "Everything is used".green().bold());
            return out;
        }

        for (issue, items) in [
            (LeftoverIssue::TestOnly, &report.test_only),
            (LeftoverIssue::NeverCalled, &report.never_called),
        ] {
            if items.is_empty() {
                continue;
            }
            let _ = writeln!(out, "{}", format!("{}:", issue.title()).yellow().bold());
            for item in items {
                self.render_item(&mut out, item);
            }
            out.push('\n');
        }

        self.render_summary(&mut out, report);
        out
    }

    fn render_item(&self, out: &mut String, item: &Leftover) {
        let definition = &item.definition;
        let _ = write!(
            out,
            "{} {}",
            definition.location.to_string().cyan(),
            definition.name().bold()
        );
        if self.show_source && !definition.source_line.is_empty() {
            let _ = write!(out, " {}", definition.source_line.dimmed());
        }
        out.push('\n');
    }

    fn render_summary(&self, out: &mut String, report: &LeftoverReport) {
        let _ = writeln!(out, "{}", "─".repeat(60).dimmed());
        let _ = writeln!(
            out,
            "Summary: {} leftovers in {} files ({} only called in tests, {} never called)",
            report.total().to_string().red().bold(),
            report.files,
            report.test_only.len(),
            report.never_called.len()
        );
        let _ = writeln!(
            out,
            "{}",
            "Remove them, or add them to keep: in .leftovers.yml, or run `leftovers --write-todo`".dimmed()
        );
    }
}
