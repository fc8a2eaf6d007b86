use crate::collection::Span;
use tree_sitter::Node;

/// Convert a node's start position to a 1-indexed span
pub fn span_of(node: Node) -> Span {
    let start = node.start_position();
    Span::new(
        start.row + 1,    // tree-sitter uses 0-indexed lines
        start.column + 1, // and 0-indexed columns
        node.start_byte(),
        node.end_byte(),
    )
}

/// Extract text from a node
pub fn node_text<'a>(node: Node<'_>, source: &'a str) -> &'a str {
    source.get(node.start_byte()..node.end_byte()).unwrap_or("")
}

/// Named children, skipping comments
pub fn named_children<'t>(node: Node<'t>) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor)
        .filter(|child| child.kind() != "comment")
        .collect()
}

/// Trimmed text of a 1-indexed line
pub fn line_text(source: &str, line: usize) -> &str {
    line.checked_sub(1)
        .and_then(|index| source.lines().nth(index))
        .map(str::trim)
        .unwrap_or("")
}

/// Iterator over a node and all of its descendants, in document order
pub fn descendants(node: Node) -> impl Iterator<Item = Node> {
    DescendantIterator::new(node)
}

struct DescendantIterator<'a> {
    cursor: tree_sitter::TreeCursor<'a>,
    done: bool,
}

impl<'a> DescendantIterator<'a> {
    fn new(node: Node<'a>) -> Self {
        Self {
            cursor: node.walk(),
            done: false,
        }
    }
}

impl<'a> Iterator for DescendantIterator<'a> {
    type Item = Node<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let node = self.cursor.node();

        if self.cursor.goto_first_child() {
            return Some(node);
        }

        loop {
            if self.cursor.goto_next_sibling() {
                return Some(node);
            }

            // the cursor was created at the start node, so it cannot climb past it
            if !self.cursor.goto_parent() {
                self.done = true;
                return Some(node);
            }
        }
    }
}
