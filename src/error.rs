//! Error types shared by the rule builders and the collector.

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// Configuration could not be compiled into a rule set
#[derive(Error, Debug, Diagnostic)]
pub enum RuleError {
    #[error("Invalid {context}: {message}")]
    #[diagnostic(code(leftovers::config::invalid))]
    Invalid {
        context: &'static str,
        message: String,
        /// Offending configuration fragment, rendered as YAML
        #[help]
        fragment: String,
    },

    #[error("Invalid regular expression {pattern:?}")]
    #[diagnostic(code(leftovers::config::regex))]
    Regex {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Invalid path pattern {pattern:?}")]
    #[diagnostic(code(leftovers::config::path))]
    PathPattern {
        pattern: String,
        #[source]
        source: ignore::Error,
    },

    #[error("A processor pipeline was built from zero processors")]
    #[diagnostic(
        code(leftovers::internal::empty_pipeline),
        help("this is a bug in leftovers, please report it along with your configuration")
    )]
    EmptyPipeline,
}

impl RuleError {
    /// Build an `Invalid` error, rendering the fragment as YAML
    pub fn invalid(context: &'static str, message: impl Into<String>, fragment: &serde_yaml::Value) -> Self {
        let fragment = serde_yaml::to_string(fragment)
            .map(|yaml| format!("in:\n{}", yaml.trim_end()))
            .unwrap_or_else(|_| format!("in: {:?}", fragment));
        RuleError::Invalid {
            context,
            message: message.into(),
            fragment,
        }
    }
}

/// Failure while collecting facts from a file
#[derive(Error, Debug, Diagnostic)]
pub enum CollectError {
    #[error(
        "Tried using the {transform} transform, but the inflection capability was not available and/or not required"
    )]
    #[diagnostic(
        code(leftovers::capability::inflections),
        help(
            "build leftovers with the `inflections` feature, and/or add `requires: ['active_support', 'active_support/core_ext/string']` to your .leftovers.yml"
        )
    )]
    MissingInflections { transform: &'static str },

    #[error("Failed to parse {} near line {line}", .path.display())]
    #[diagnostic(
        code(leftovers::parse),
        help("fix the syntax error, add the file to exclude_paths, or run with `--parse-errors skip`")
    )]
    Parse { path: PathBuf, line: usize },

    #[error("Failed to precompile {}: {message}", .path.display())]
    #[diagnostic(code(leftovers::precompile))]
    Precompile { path: PathBuf, message: String },

    #[error("Failed to load the Ruby grammar")]
    #[diagnostic(code(leftovers::grammar))]
    Grammar(#[from] tree_sitter::LanguageError),

    #[error("Failed to read {}", .path.display())]
    #[diagnostic(code(leftovers::io))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl CollectError {
    /// Whether the parse-error policy may skip this error
    pub fn is_parse_failure(&self) -> bool {
        matches!(self, CollectError::Parse { .. } | CollectError::Precompile { .. })
    }
}
