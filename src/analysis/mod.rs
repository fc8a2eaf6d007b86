//! Reachability over the merged facts.

mod reachability;

pub use reachability::ReachabilityAnalyzer;

use crate::collection::{Definition, DefinitionKind, Visibility};
use crate::matcher::{NodeKind, Subject};
use serde::Serialize;
use std::borrow::Cow;
use std::path::Path;

/// Represents a definition nothing uses
#[derive(Debug, Clone, Serialize)]
pub struct Leftover {
    /// The unused definition
    pub definition: Definition,

    /// Why it is reported
    pub issue: LeftoverIssue,

    /// Human-readable summary
    pub message: String,
}

impl Leftover {
    pub fn new(definition: Definition, issue: LeftoverIssue) -> Self {
        let message = issue.default_message(&definition);
        Self {
            definition,
            issue,
            message,
        }
    }
}

/// Types of leftover issues
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LeftoverIssue {
    /// Only called from test files
    TestOnly,

    /// Never called at all
    NeverCalled,
}

impl LeftoverIssue {
    pub fn default_message(&self, definition: &Definition) -> String {
        match self {
            LeftoverIssue::TestOnly => format!(
                "{} '{}' is only directly called in tests",
                definition.kind.display_name(),
                definition.name()
            ),
            LeftoverIssue::NeverCalled => format!(
                "{} '{}' is never called",
                definition.kind.display_name(),
                definition.name()
            ),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            LeftoverIssue::TestOnly => "LO001",
            LeftoverIssue::NeverCalled => "LO002",
        }
    }

    /// Section title used by reporters and the todo file
    pub fn title(&self) -> &'static str {
        match self {
            LeftoverIssue::TestOnly => "Only directly called in tests",
            LeftoverIssue::NeverCalled => "Not directly called at all",
        }
    }
}

/// Result of a run: every leftover, split by issue and sorted by location
#[derive(Debug, Clone, Default, Serialize)]
pub struct LeftoverReport {
    pub test_only: Vec<Leftover>,
    pub never_called: Vec<Leftover>,
    /// Files collected
    pub files: usize,
    /// Definitions considered
    pub definitions: usize,
}

impl LeftoverReport {
    pub fn is_empty(&self) -> bool {
        self.test_only.is_empty() && self.never_called.is_empty()
    }

    pub fn total(&self) -> usize {
        self.test_only.len() + self.never_called.len()
    }

    /// Both sections in report order
    pub fn iter(&self) -> impl Iterator<Item = &Leftover> {
        self.test_only.iter().chain(self.never_called.iter())
    }
}

/// One name of a definition, as seen by `keep` and `test_only` patterns
pub struct DefinitionName<'d> {
    pub name: &'d str,
    pub definition: &'d Definition,
}

impl Subject for DefinitionName<'_> {
    fn name(&self) -> Option<Cow<'_, str>> {
        Some(Cow::Borrowed(self.name))
    }

    fn kind(&self) -> Option<NodeKind> {
        Some(match self.definition.kind {
            DefinitionKind::Method => NodeKind::Method,
            DefinitionKind::Constant => NodeKind::Constant,
            DefinitionKind::InstanceVariable => NodeKind::InstanceVariable,
            DefinitionKind::ClassVariable => NodeKind::ClassVariable,
            DefinitionKind::GlobalVariable => NodeKind::GlobalVariable,
        })
    }

    fn path(&self) -> Option<&Path> {
        Some(&self.definition.location.file)
    }

    fn visibility(&self) -> Option<Visibility> {
        Some(self.definition.visibility)
    }
}
