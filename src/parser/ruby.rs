use super::common::descendants;
use crate::error::CollectError;
use std::path::Path;
use tree_sitter::{Parser as TsParser, Tree};
use tracing::trace;

/// Ruby source parser using tree-sitter
///
/// A parser holds mutable state, so each worker builds its own.
pub struct RubyParser {
    parser: TsParser,
}

impl RubyParser {
    pub fn new() -> Result<Self, CollectError> {
        let mut parser = TsParser::new();
        parser.set_language(&tree_sitter_ruby::language())?;
        Ok(Self { parser })
    }

    /// Parse a whole file; a tree containing error nodes is a parse failure
    pub fn parse(&mut self, path: &Path, contents: &str) -> Result<Tree, CollectError> {
        let tree = self
            .parser
            .parse(contents, None)
            .ok_or_else(|| CollectError::Parse {
                path: path.to_path_buf(),
                line: 1,
            })?;

        let root = tree.root_node();
        if root.has_error() {
            let line = descendants(root)
                .find(|node| node.is_error() || node.is_missing())
                .map(|node| node.start_position().row + 1)
                .unwrap_or(1);
            trace!("{}: syntax error near line {}", path.display(), line);
            return Err(CollectError::Parse {
                path: path.to_path_buf(),
                line,
            });
        }

        Ok(tree)
    }
}
