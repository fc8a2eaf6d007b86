//! Configuration: the built-in Ruby profile, the project's own file and the
//! todo file, merged into one [`Config`].

mod loader;

pub use loader::{ConfigLoader, CONFIG_NAMES, DEFAULT_PROFILE, GEM_PROFILES};

use crate::parser::PrecompileFormat;
use crate::report::ReportFormat;
use serde::{Deserialize, Deserializer, Serialize};
use serde_yaml::Value;

/// What to do with a file that does not parse
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ParseErrorPolicy {
    /// Warn and leave the file out
    #[default]
    Skip,
    /// Stop the run
    Abort,
}

/// One layer of configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Gitignore-style patterns of Ruby files to analyze
    #[serde(deserialize_with = "one_or_many")]
    pub include_paths: Vec<String>,

    #[serde(deserialize_with = "one_or_many")]
    pub exclude_paths: Vec<String>,

    /// Files whose calls only count for test-tolerant definitions
    #[serde(deserialize_with = "one_or_many")]
    pub test_paths: Vec<String>,

    #[serde(alias = "require", deserialize_with = "one_or_many")]
    pub requires: Vec<String>,

    /// Built-in gem profiles layered between the Ruby profile and this file
    #[serde(deserialize_with = "one_or_many")]
    pub gems: Vec<String>,

    /// Definitions that are never reported
    pub keep: Option<Value>,

    /// Definitions that may be used from tests only
    pub test_only: Option<Value>,

    /// Rules describing calls and definitions made by metaprogramming
    pub dynamic: Option<Value>,

    #[serde(deserialize_with = "one_or_many")]
    pub precompile: Vec<PrecompileConfig>,

    pub parse_errors: Option<ParseErrorPolicy>,

    pub report: ReportConfig,
}

/// Data files converted to Ruby before collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrecompileConfig {
    #[serde(deserialize_with = "one_or_many")]
    pub paths: Vec<String>,
    pub format: PrecompileFormat,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Output format: terminal or json
    pub format: Option<ReportFormat>,

    /// Print the defining line next to each leftover
    pub show_source: Option<bool>,
}

impl Config {
    /// Layer `other` on top of this configuration
    pub fn merge(&mut self, other: Config) {
        self.include_paths.extend(other.include_paths);
        self.exclude_paths.extend(other.exclude_paths);
        self.test_paths.extend(other.test_paths);
        self.requires.extend(other.requires);
        for gem in other.gems {
            if !self.gems.contains(&gem) {
                self.gems.push(gem);
            }
        }
        self.precompile.extend(other.precompile);

        self.keep = any_of(self.keep.take(), other.keep);
        self.test_only = any_of(self.test_only.take(), other.test_only);
        self.dynamic = any_of(self.dynamic.take(), other.dynamic);

        if other.parse_errors.is_some() {
            self.parse_errors = other.parse_errors;
        }
        if other.report.format.is_some() {
            self.report.format = other.report.format;
        }
        if other.report.show_source.is_some() {
            self.report.show_source = other.report.show_source;
        }
    }

    pub fn parse_errors(&self) -> ParseErrorPolicy {
        self.parse_errors.unwrap_or_default()
    }

    pub fn show_source(&self) -> bool {
        self.report.show_source.unwrap_or(true)
    }
}

/// Combine two pattern trees so that either may match
fn any_of(base: Option<Value>, layer: Option<Value>) -> Option<Value> {
    match (base, layer) {
        (None, other) | (other, None) => other,
        (Some(Value::Null), other) => other,
        (base, Some(Value::Null)) => base,
        (Some(base), Some(layer)) => Some(Value::Sequence(vec![base, layer])),
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

/// Accept a single value, a list, or nothing for list-valued keys
fn one_or_many<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(match Option::<OneOrMany<T>>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(OneOrMany::One(value)) => vec![value],
        Some(OneOrMany::Many(values)) => values,
    })
}
