//! `leftovers:` magic comments, gathered before the main walk.
//!
//! `keep` and `test_only` apply to definitions starting on the comment's
//! line, `call`/`calls` record calls at the comment, and `dynamic:NAME`
//! attaches to the smallest call, array or hash spanning the comment's line
//! (or, for a comment on its own line, the outermost one starting on the
//! next line).

use crate::collection::Span;
use crate::parser::{descendants, node_text, span_of};
use std::collections::{HashMap, HashSet};
use tree_sitter::Node;

const DIRECTIVE: &str = "leftovers:";

#[derive(Debug, Default)]
pub struct Annotations {
    keep: HashSet<usize>,
    test_only: HashSet<usize>,
    pub calls: Vec<(String, Span)>,
    /// Annotated node id to the name it is matched as
    dynamic: HashMap<usize, String>,
}

impl Annotations {
    pub fn scan(root: Node, src: &str) -> Self {
        let mut annotations = Annotations::default();
        let mut dynamic: Vec<(Node, String)> = Vec::new();
        for node in descendants(root) {
            if node.kind() != "comment" {
                continue;
            }
            let text = node_text(node, src);
            let line = node.start_position().row + 1;
            let mut rest = text;
            while let Some(at) = rest.find(DIRECTIVE) {
                rest = &rest[at + DIRECTIVE.len()..];
                let directive = rest.split(DIRECTIVE).next().unwrap_or(rest);
                annotations.directive(directive, node, line, &mut dynamic);
            }
        }

        for (comment, name) in dynamic {
            if let Some(target) = attach(root, comment, src) {
                annotations.dynamic.insert(target.id(), name);
            }
        }
        annotations
    }

    fn directive<'t>(&mut self, directive: &str, comment: Node<'t>, line: usize, dynamic: &mut Vec<(Node<'t>, String)>) {
        let directive = directive.trim();
        let word_end = directive
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(directive.len());
        let (word, rest) = directive.split_at(word_end);
        match word {
            "keep" | "allow" => {
                self.keep.insert(line);
            }
            "test_only" | "test" => {
                self.test_only.insert(line);
            }
            "call" | "calls" => {
                let span = span_of(comment);
                for name in rest.split(|c: char| c == ',' || c.is_whitespace()) {
                    let name = name.trim_start_matches(':');
                    if !name.is_empty() {
                        self.calls.push((name.to_string(), span));
                    }
                }
            }
            "dynamic" => {
                let name = rest.trim_start_matches(':').split_whitespace().next().unwrap_or("");
                if !name.is_empty() {
                    dynamic.push((comment, name.to_string()));
                }
            }
            _ => {}
        }
    }

    pub fn is_keep(&self, line: usize) -> bool {
        self.keep.contains(&line)
    }

    pub fn is_test_only(&self, line: usize) -> bool {
        self.test_only.contains(&line)
    }

    pub fn dynamic_name(&self, node_id: usize) -> Option<&str> {
        self.dynamic.get(&node_id).map(String::as_str)
    }
}

fn is_target(node: &Node) -> bool {
    matches!(node.kind(), "call" | "array" | "hash")
}

/// Node a `dynamic` annotation applies to
fn attach<'t>(root: Node<'t>, comment: Node<'t>, src: &str) -> Option<Node<'t>> {
    let row = comment.start_position().row;
    let line_start = src
        .lines()
        .nth(row)
        .map(|line| line.len() - line.trim_start().len())
        .unwrap_or(0);
    let own_line = comment.start_position().column <= line_start;

    let spanning = |node: &Node| node.start_position().row <= row && node.end_position().row >= row;
    let smallest_spanning = descendants(root)
        .filter(|node| is_target(node) && spanning(node))
        .min_by_key(|node| node.end_byte() - node.start_byte());

    if own_line {
        // outermost target starting on the next line
        let next = descendants(root)
            .filter(|node| is_target(node) && node.start_position().row == row + 1)
            .max_by_key(|node| node.end_byte() - node.start_byte());
        return next.or(smallest_spanning);
    }
    smallest_spanning
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::RubyParser;
    use std::path::Path;

    fn scan(src: &str) -> (tree_sitter::Tree, Annotations) {
        let mut parser = RubyParser::new().unwrap();
        let tree = parser.parse(Path::new("test.rb"), src).unwrap();
        let annotations = Annotations::scan(tree.root_node(), src);
        (tree, annotations)
    }

    #[test]
    fn test_keep_and_test_only_lines() {
        let (_, annotations) = scan("def a; end # leftovers:keep\n\ndef b; end # leftovers:test_only\n");
        assert!(annotations.is_keep(1));
        assert!(!annotations.is_keep(3));
        assert!(annotations.is_test_only(3));
    }

    #[test]
    fn test_call_directive_lists_names() {
        let (_, annotations) = scan("# leftovers:call foo, bar baz\n");
        let names: Vec<_> = annotations.calls.iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(names, vec!["foo", "bar", "baz"]);
        assert_eq!(annotations.calls[0].1.line, 1);
    }

    #[test]
    fn test_dynamic_trailing_comment_attaches_to_call() {
        let src = "x = 1\nbuild(:thing) # leftovers:dynamic:my_method\n";
        let (tree, annotations) = scan(src);
        let call = descendants(tree.root_node())
            .find(|node| node.kind() == "call")
            .unwrap();
        assert_eq!(annotations.dynamic_name(call.id()), Some("my_method"));
    }

    #[test]
    fn test_dynamic_own_line_comment_attaches_to_next_line() {
        let src = "# leftovers:dynamic:handler\nregister(:a, [:b])\n";
        let (tree, annotations) = scan(src);
        let call = descendants(tree.root_node())
            .find(|node| node.kind() == "call")
            .unwrap();
        assert_eq!(annotations.dynamic_name(call.id()), Some("handler"));
        let array = descendants(tree.root_node())
            .find(|node| node.kind() == "array")
            .unwrap();
        assert_eq!(annotations.dynamic_name(array.id()), None);
    }

    #[test]
    fn test_unrelated_comments_ignored() {
        let (_, annotations) = scan("# just a comment\n# leftovers:unknown\n");
        assert!(annotations.calls.is_empty());
        assert!(!annotations.is_keep(1));
    }
}
