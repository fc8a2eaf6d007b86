//! The compiled, immutable rule set shared by every collection thread.

use crate::config::{Config, ParseErrorPolicy};
use crate::discovery::FileKind;
use crate::error::RuleError;
use crate::matcher::{Matcher, MatcherBuilder, PathGlob};
use crate::parser::PrecompileFormat;
use crate::processor::{capability, Inflect, Processor, ProcessorBuilder};
use serde_yaml::Value;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Everything the configuration compiles into
///
/// Built once before any file is read; a build error aborts the run.
#[derive(Debug)]
pub struct RuleSet {
    root: PathBuf,
    dynamic: Option<Processor>,
    keep: Option<Matcher>,
    test_only: Option<Matcher>,
    include: Option<PathGlob>,
    exclude: Option<PathGlob>,
    tests: Option<PathGlob>,
    precompile: Vec<(PathGlob, PrecompileFormat)>,
    inflect: Option<Box<dyn Inflect>>,
    parse_errors: ParseErrorPolicy,
}

impl RuleSet {
    pub fn build(config: &Config, root: &Path) -> Result<Self, RuleError> {
        let matchers = MatcherBuilder::new(root);
        let processors = ProcessorBuilder::new(&matchers);
        let pattern = |value: &Option<Value>| value.clone().unwrap_or(Value::Null);

        let dynamic = processors.rules(&pattern(&config.dynamic))?;
        let keep = matchers.node(&pattern(&config.keep))?;
        let test_only = matchers.node(&pattern(&config.test_only))?;

        let include = PathGlob::new(root, &config.include_paths)?;
        let exclude = PathGlob::new(root, &config.exclude_paths)?;
        let tests = PathGlob::new(root, &config.test_paths)?;

        let mut precompile = Vec::new();
        for entry in &config.precompile {
            if let Some(glob) = PathGlob::new(root, &entry.paths)? {
                precompile.push((glob, entry.format));
            }
        }

        debug!(
            "Compiled rules: dynamic={}, keep={}, test_only={}, {} precompile patterns",
            dynamic.is_some(),
            keep.is_some(),
            test_only.is_some(),
            precompile.len()
        );

        Ok(Self {
            root: root.to_path_buf(),
            dynamic,
            keep,
            test_only,
            include,
            exclude,
            tests,
            precompile,
            inflect: capability(&config.requires),
            parse_errors: config.parse_errors(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// How to collect `path`, or `None` when it is not analyzed
    pub fn classify(&self, path: &Path) -> Option<FileKind> {
        if self.exclude.as_ref().is_some_and(|glob| glob.matches(path)) {
            return None;
        }
        if let Some((_, format)) = self.precompile.iter().find(|(glob, _)| glob.matches(path)) {
            return Some(FileKind::Precompiled(*format));
        }
        if self.include.as_ref().is_some_and(|glob| glob.matches(path)) {
            return Some(FileKind::Ruby);
        }
        None
    }

    pub fn is_test_path(&self, path: &Path) -> bool {
        self.tests.as_ref().is_some_and(|glob| glob.matches(path))
    }

    pub fn dynamic(&self) -> Option<&Processor> {
        self.dynamic.as_ref()
    }

    pub fn keep(&self) -> Option<&Matcher> {
        self.keep.as_ref()
    }

    pub fn test_only(&self) -> Option<&Matcher> {
        self.test_only.as_ref()
    }

    pub fn inflections(&self) -> Option<&dyn Inflect> {
        self.inflect.as_deref()
    }

    pub fn parse_errors(&self) -> ParseErrorPolicy {
        self.parse_errors
    }

    pub fn with_parse_errors(mut self, policy: ParseErrorPolicy) -> Self {
        self.parse_errors = policy;
        self
    }
}
