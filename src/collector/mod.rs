//! Per-file fact collection.
//!
//! [`FileCollector`] parses one source, scans its magic comments, walks the
//! tree with a [`Walker`] and collects any `eval`ed source as a subfile.
//! [`ParallelCollector`] runs it over every discovered file on the rayon pool.

mod comments;
mod facts;
mod node;
mod parallel;
mod scope;
mod visibility;
mod walker;

pub use comments::Annotations;
pub use node::{ArgKey, NodeRef};
pub use parallel::ParallelCollector;
pub use scope::Scope;

use crate::collection::{FileFacts, Span};
use crate::error::CollectError;
use crate::parser::RubyParser;
use crate::rules::RuleSet;
use facts::Facts;
use std::path::{Path, PathBuf};
use tracing::debug;
use walker::Walker;

/// How deeply `eval`ed source may itself `eval` more source
const MAX_EVAL_DEPTH: usize = 8;

/// The file being collected
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileContext {
    /// Path relative to the project root
    pub path: PathBuf,
    pub test: bool,
}

/// Collects the facts of single files against a compiled rule set
pub struct FileCollector<'r> {
    rules: &'r RuleSet,
}

impl<'r> FileCollector<'r> {
    pub fn new(rules: &'r RuleSet) -> Self {
        Self { rules }
    }

    pub fn collect(&self, path: &Path, test: bool, source: &str) -> Result<FileFacts, CollectError> {
        let file = FileContext {
            path: path.to_path_buf(),
            test,
        };
        let mut parser = RubyParser::new()?;
        let facts = self.collect_source(&mut parser, &file, source, None, 0)?;
        Ok(facts.into_file_facts())
    }

    fn collect_source(
        &self,
        parser: &mut RubyParser,
        file: &FileContext,
        source: &str,
        origin: Option<(Span, String)>,
        depth: usize,
    ) -> Result<Facts, CollectError> {
        let tree = parser.parse(&file.path, source)?;
        let root = tree.root_node();
        let annotations = Annotations::scan(root, source);

        let mut walker = Walker::new(
            self.rules,
            source,
            file,
            annotations,
            Facts::new(file.path.clone(), file.test, origin),
        );
        walker.visit(root)?;
        let mut facts = walker.finish();

        for subfile in facts.take_subfiles() {
            if depth >= MAX_EVAL_DEPTH {
                debug!("{}:{}: eval nested too deeply, skipping", file.path.display(), subfile.span.line);
                continue;
            }
            let origin = Some((subfile.span, subfile.line.clone()));
            match self.collect_source(parser, file, &subfile.source, origin, depth + 1) {
                Ok(inner) => facts.absorb(inner),
                Err(e) if e.is_parse_failure() => {
                    debug!("{}:{}: eval source does not parse: {}", file.path.display(), subfile.span.line, e);
                }
                Err(e) => return Err(e),
            }
        }
        Ok(facts)
    }
}
