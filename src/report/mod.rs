mod json;
mod terminal;

pub use json::JsonReporter;
pub use terminal::TerminalReporter;

use crate::analysis::LeftoverReport;
use miette::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Output format for reports
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Terminal,
    Json,
}

/// Reporter for outputting leftover analysis results
pub struct Reporter {
    format: ReportFormat,
    output_path: Option<PathBuf>,
    show_source: bool,
}

impl Reporter {
    pub fn new(format: ReportFormat, output_path: Option<PathBuf>) -> Self {
        Self {
            format,
            output_path,
            show_source: true,
        }
    }

    pub fn with_source(mut self, show: bool) -> Self {
        self.show_source = show;
        self
    }

    /// Report the leftovers
    pub fn report(&self, report: &LeftoverReport) -> Result<()> {
        match self.format {
            ReportFormat::Terminal => {
                let reporter = TerminalReporter::new().with_source(self.show_source);
                reporter.report(report)
            }
            ReportFormat::Json => {
                let reporter = JsonReporter::new(self.output_path.clone());
                reporter.report(report)
            }
        }
    }
}
