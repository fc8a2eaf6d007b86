//! Lexical scope tracking for local variables and constants.
//!
//! Method, class and module bodies are scope gates: locals declared outside
//! them are invisible inside. Blocks open a frame that still sees the
//! enclosing locals.

use std::collections::HashMap;
use tree_sitter::Node;

#[derive(Debug, Default)]
struct Frame<'t> {
    /// Local name and the node last assigned to it, when known
    locals: HashMap<String, Option<Node<'t>>>,
    gate: bool,
}

#[derive(Debug)]
pub struct Scope<'t> {
    frames: Vec<Frame<'t>>,
    constants: HashMap<String, Node<'t>>,
}

impl Default for Scope<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'t> Scope<'t> {
    pub fn new() -> Self {
        Self {
            frames: vec![Frame {
                gate: true,
                ..Frame::default()
            }],
            constants: HashMap::new(),
        }
    }

    pub fn push_gate(&mut self) {
        self.frames.push(Frame {
            gate: true,
            ..Frame::default()
        });
    }

    pub fn push_block(&mut self) {
        self.frames.push(Frame::default());
    }

    pub fn pop(&mut self) {
        if self.frames.len() > 1 {
            self.frames.pop();
        }
    }

    fn visible(&self) -> &[Frame<'t>] {
        let start = self.frames.iter().rposition(|f| f.gate).unwrap_or(0);
        &self.frames[start..]
    }

    /// Assign a local; an existing visible local is updated in place
    pub fn declare(&mut self, name: &str, value: Option<Node<'t>>) {
        let start = self.frames.iter().rposition(|f| f.gate).unwrap_or(0);
        let index = self.frames[start..]
            .iter()
            .rposition(|frame| frame.locals.contains_key(name))
            .map_or(self.frames.len() - 1, |i| start + i);
        self.frames[index].locals.insert(name.to_string(), value);
    }

    pub fn is_local(&self, name: &str) -> bool {
        self.visible().iter().any(|frame| frame.locals.contains_key(name))
    }

    pub fn local_value(&self, name: &str) -> Option<Node<'t>> {
        self.visible()
            .iter()
            .rev()
            .find_map(|frame| frame.locals.get(name))
            .copied()
            .flatten()
    }

    pub fn define_constant(&mut self, name: &str, value: Option<Node<'t>>) {
        match value {
            Some(node) => {
                self.constants.insert(name.to_string(), node);
            }
            None => {
                self.constants.remove(name);
            }
        }
    }

    pub fn constant_value(&self, name: &str) -> Option<Node<'t>> {
        self.constants.get(name).copied()
    }
}
