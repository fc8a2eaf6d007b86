use super::scope::Scope;
use super::FileContext;
use crate::collection::Span;
use crate::matcher::{NodeKind, PairRule, Scalar, Subject};
use crate::parser::{named_children, node_text, span_of};
use std::borrow::Cow;
use std::path::Path;
use tree_sitter::Node;

/// How many variable/constant indirections a literal lookup follows
const MAX_RESOLVE: usize = 8;

/// A syntax node seen through the lexical scope it was found in
#[derive(Clone, Copy)]
pub struct NodeRef<'a> {
    node: Node<'a>,
    src: &'a str,
    file: &'a FileContext,
    scope: &'a Scope<'a>,
    /// Name forced by a `leftovers:dynamic` annotation
    name: Option<&'a str>,
}

/// Key of a call argument or hash entry
#[derive(Debug, Clone)]
pub enum ArgKey<'a> {
    Position(usize),
    Keyword {
        name: String,
        kind: Option<NodeKind>,
        node: NodeRef<'a>,
    },
}

impl<'a> NodeRef<'a> {
    pub fn new(node: Node<'a>, src: &'a str, file: &'a FileContext, scope: &'a Scope<'a>) -> Self {
        Self {
            node,
            src,
            file,
            scope,
            name: None,
        }
    }

    pub fn with_name(self, name: Option<&'a str>) -> Self {
        Self { name, ..self }
    }

    fn at(&self, node: Node<'a>) -> Self {
        Self {
            node,
            name: None,
            ..*self
        }
    }

    pub fn node(&self) -> Node<'a> {
        self.node
    }

    pub fn source(&self) -> &'a str {
        self.src
    }

    pub fn file(&self) -> &'a FileContext {
        self.file
    }

    pub fn text(&self) -> &'a str {
        node_text(self.node, self.src)
    }

    pub fn span(&self) -> Span {
        span_of(self.node)
    }

    /// Follow locals and constants bound to literals, `.freeze` and parentheses
    pub fn resolved(&self) -> NodeRef<'a> {
        let mut node = self.node;
        for _ in 0..MAX_RESOLVE {
            match self.resolve_once(node) {
                Some(next) => node = next,
                None => break,
            }
        }
        if node == self.node {
            *self
        } else {
            self.at(node)
        }
    }

    fn resolve_once(&self, node: Node<'a>) -> Option<Node<'a>> {
        match node.kind() {
            "identifier" => self.scope.local_value(node_text(node, self.src)),
            "constant" => self.scope.constant_value(node_text(node, self.src)),
            "assignment" => node.child_by_field_name("right"),
            "parenthesized_statements" => {
                let children = named_children(node);
                match children.as_slice() {
                    [only] => Some(*only),
                    _ => None,
                }
            }
            "call" => {
                let method = node.child_by_field_name("method")?;
                if node_text(method, self.src) == "freeze" && node.child_by_field_name("arguments").is_none() {
                    node.child_by_field_name("receiver")
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    pub fn is_assignment(&self) -> bool {
        matches!(self.node.kind(), "assignment" | "operator_assignment")
    }

    /// Name of the variable or constant an assignment writes to
    pub fn assigned_name(&self) -> Option<&'a str> {
        if !self.is_assignment() {
            return None;
        }
        let target = self.node.child_by_field_name("left")?;
        match target.kind() {
            "identifier" | "constant" | "instance_variable" | "class_variable" | "global_variable" => {
                Some(node_text(target, self.src))
            }
            "scope_resolution" => target
                .child_by_field_name("name")
                .map(|name| node_text(name, self.src)),
            _ => None,
        }
    }

    /// Method name of a call node
    pub fn method_name(&self) -> Option<&'a str> {
        match self.node.kind() {
            "call" => Some(
                self.node
                    .child_by_field_name("method")
                    .map_or("call", |m| node_text(m, self.src)),
            ),
            "element_reference" => Some("[]"),
            _ => None,
        }
    }

    /// String projection used by processors: literal strings, symbols and
    /// constant names; anything else has no value
    pub fn value(&self) -> Option<Cow<'a, str>> {
        if let Some(name) = self.name {
            return Some(Cow::Borrowed(name));
        }
        let resolved = self.resolved();
        let node = resolved.node;
        let text = resolved.text();
        match node.kind() {
            "string" | "delimited_symbol" => literal_content(node, self.src).map(Cow::Owned),
            "chained_string" => {
                let mut out = String::new();
                for part in named_children(node) {
                    out.push_str(&literal_content(part, self.src)?);
                }
                Some(Cow::Owned(out))
            }
            "simple_symbol" => Some(Cow::Borrowed(text.strip_prefix(':').unwrap_or(text))),
            "hash_key_symbol" => Some(Cow::Borrowed(text.trim_end_matches(':'))),
            "bare_string" | "bare_symbol" => literal_content(node, self.src).map(Cow::Owned),
            "constant" => Some(Cow::Borrowed(text)),
            "scope_resolution" => node
                .child_by_field_name("name")
                .map(|name| Cow::Borrowed(node_text(name, self.src))),
            _ => None,
        }
    }

    pub fn receiver(&self) -> Option<NodeRef<'a>> {
        let field = match self.node.kind() {
            "call" => "receiver",
            "element_reference" => "object",
            "scope_resolution" => "scope",
            _ => return None,
        };
        self.node.child_by_field_name(field).map(|r| self.at(r))
    }

    /// Whether this is (or resolves to) an array or hash literal
    pub fn is_container(&self) -> bool {
        matches!(
            self.resolved().node.kind(),
            "array" | "hash" | "string_array" | "symbol_array"
        )
    }

    pub fn positional(&self, index: usize) -> Option<NodeRef<'a>> {
        self.arguments()
            .into_iter()
            .find_map(|(key, value)| match key {
                ArgKey::Position(i) if i == index => Some(value),
                _ => None,
            })
    }

    /// Arguments of a call, elements of an array or entries of a hash
    ///
    /// Splats of literals are expanded; a splat that cannot be resolved ends
    /// positional numbering, since later positions are unknown.
    pub fn arguments(&self) -> Vec<(ArgKey<'a>, NodeRef<'a>)> {
        let resolved = self.resolved();
        let node = resolved.node;
        // an assignment only exposes the literal it assigns
        let assigned = self.is_assignment();
        let items: Vec<Node<'a>> = match node.kind() {
            "call" | "element_reference" if assigned => Vec::new(),
            "call" => node
                .child_by_field_name("arguments")
                .map(named_children)
                .unwrap_or_default(),
            "element_reference" => {
                let object = node.child_by_field_name("object");
                named_children(node)
                    .into_iter()
                    .filter(|child| Some(*child) != object)
                    .collect()
            }
            "array" | "hash" | "string_array" | "symbol_array" => named_children(node),
            _ => Vec::new(),
        };

        let mut out = Vec::new();
        let mut position = Some(0);
        resolved.collect_arguments(&items, &mut out, &mut position, 0);
        out
    }

    fn collect_arguments(
        &self,
        items: &[Node<'a>],
        out: &mut Vec<(ArgKey<'a>, NodeRef<'a>)>,
        position: &mut Option<usize>,
        depth: usize,
    ) {
        for &item in items {
            match item.kind() {
                "block_argument" | "forward_argument" => {}
                "pair" => self.push_pair(item, out),
                "splat_argument" => {
                    let target = item.named_child(0).map(|inner| self.at(inner).resolved());
                    match target {
                        Some(target) if depth < MAX_RESOLVE && target.is_container() && target.node.kind() != "hash" => {
                            let elements = named_children(target.node);
                            target.collect_arguments(&elements, out, position, depth + 1);
                        }
                        _ => *position = None,
                    }
                }
                "hash_splat_argument" => {
                    let target = item.named_child(0).map(|inner| self.at(inner).resolved());
                    if let Some(target) = target {
                        if depth < MAX_RESOLVE && target.node.kind() == "hash" {
                            let entries = named_children(target.node);
                            target.collect_arguments(&entries, out, position, depth + 1);
                        }
                    }
                }
                _ => {
                    if let Some(index) = *position {
                        out.push((ArgKey::Position(index), self.at(item)));
                        *position = Some(index + 1);
                    }
                }
            }
        }
    }

    fn push_pair(&self, pair: Node<'a>, out: &mut Vec<(ArgKey<'a>, NodeRef<'a>)>) {
        let Some(key) = pair.child_by_field_name("key") else {
            return;
        };
        let key = self.at(key);
        let Some(name) = key.value() else {
            return;
        };
        let kind = key.kind();
        let value = pair.child_by_field_name("value").map_or(key, |v| self.at(v));
        out.push((
            ArgKey::Keyword {
                name: name.into_owned(),
                kind,
                node: key,
            },
            value,
        ));
    }

    fn literal_kind(&self) -> Option<NodeKind> {
        let resolved = self.resolved();
        let node = resolved.node;
        let kind = match node.kind() {
            "string" | "chained_string" | "bare_string" | "heredoc_beginning" => NodeKind::String,
            "simple_symbol" | "delimited_symbol" | "hash_key_symbol" | "bare_symbol" => NodeKind::Symbol,
            "integer" => NodeKind::Integer,
            "float" => NodeKind::Float,
            "array" | "string_array" | "symbol_array" => NodeKind::Array,
            "hash" => NodeKind::Hash,
            "lambda" => NodeKind::Proc,
            "nil" => NodeKind::Nil,
            "true" => NodeKind::True,
            "false" => NodeKind::False,
            "call" => {
                let method = resolved.method_name()?;
                let receiver = node.child_by_field_name("receiver");
                let is_proc = match receiver {
                    None => matches!(method, "proc" | "lambda"),
                    Some(receiver) => method == "new" && node_text(receiver, self.src) == "Proc",
                };
                if is_proc {
                    NodeKind::Proc
                } else {
                    return None;
                }
            }
            _ => return None,
        };
        Some(kind)
    }
}

impl std::fmt::Debug for NodeRef<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = self.text();
        let text = text.get(..60).unwrap_or(text);
        f.debug_struct("NodeRef")
            .field("kind", &self.node.kind())
            .field("text", &text)
            .field("name", &self.name)
            .finish()
    }
}

impl Subject for NodeRef<'_> {
    fn name(&self) -> Option<Cow<'_, str>> {
        if let Some(name) = self.name {
            return Some(Cow::Borrowed(name));
        }
        match self.node.kind() {
            "call" | "element_reference" => self.method_name().map(Cow::Borrowed),
            "method" | "singleton_method" => self
                .node
                .child_by_field_name("name")
                .map(|name| Cow::Borrowed(node_text(name, self.src))),
            "identifier" | "constant" => {
                let resolved = self.resolved();
                let value = if resolved.node != self.node { resolved.value() } else { None };
                match value {
                    Some(value) => Some(value),
                    // a local with no literal value is only known at runtime
                    None if self.node.kind() == "identifier" && self.scope.is_local(self.text()) => None,
                    None => Some(Cow::Borrowed(self.text())),
                }
            }
            "assignment" | "operator_assignment" => self.assigned_name().map(Cow::Borrowed),
            "instance_variable" | "class_variable" | "global_variable" => Some(Cow::Borrowed(self.text())),
            _ => self.value(),
        }
    }

    fn kind(&self) -> Option<NodeKind> {
        self.literal_kind()
    }

    fn scalar(&self) -> Option<Scalar> {
        let resolved = self.resolved();
        let text = resolved.text();
        match resolved.node.kind() {
            "nil" => Some(Scalar::Nil),
            "true" => Some(Scalar::Bool(true)),
            "false" => Some(Scalar::Bool(false)),
            "integer" => parse_integer(text).map(Scalar::Integer),
            "float" => text.replace('_', "").parse::<f64>().ok().map(Scalar::float),
            _ => resolved.value().map(|v| Scalar::String(v.into_owned())),
        }
    }

    fn path(&self) -> Option<&Path> {
        Some(&self.file.path)
    }

    fn has_block(&self) -> bool {
        if self.node.kind() != "call" {
            return false;
        }
        if self.node.child_by_field_name("block").is_some() {
            return true;
        }
        self.node
            .child_by_field_name("arguments")
            .map(named_children)
            .unwrap_or_default()
            .iter()
            .any(|argument| argument.kind() == "block_argument")
    }

    fn match_receiver(&self, pattern: Option<&crate::matcher::Matcher>) -> bool {
        match self.receiver() {
            Some(receiver) => pattern.map_or(true, |p| p.matches(&receiver)),
            None => false,
        }
    }

    fn match_arguments(&self, rule: &PairRule) -> bool {
        self.arguments()
            .iter()
            .any(|(key, value)| rule.match_pair(key, value))
    }
}

impl Subject for ArgKey<'_> {
    fn name(&self) -> Option<Cow<'_, str>> {
        match self {
            ArgKey::Keyword { name, .. } => Some(Cow::Borrowed(name.as_str())),
            ArgKey::Position(_) => None,
        }
    }

    fn kind(&self) -> Option<NodeKind> {
        match self {
            ArgKey::Keyword { kind, .. } => *kind,
            ArgKey::Position(_) => None,
        }
    }

    fn scalar(&self) -> Option<Scalar> {
        match self {
            ArgKey::Keyword { name, .. } => Some(Scalar::String(name.clone())),
            ArgKey::Position(_) => None,
        }
    }

    fn position(&self) -> Option<usize> {
        match self {
            ArgKey::Position(index) => Some(*index),
            ArgKey::Keyword { .. } => None,
        }
    }

    fn is_keyword(&self) -> bool {
        matches!(self, ArgKey::Keyword { .. })
    }
}

/// Content of a string-like literal without interpolation
fn literal_content(node: Node, src: &str) -> Option<String> {
    match node.kind() {
        "bare_string" | "bare_symbol" if node.named_child_count() == 0 => {
            return Some(node_text(node, src).to_string());
        }
        "string" | "delimited_symbol" | "bare_string" | "bare_symbol" => {}
        _ => return None,
    }
    let mut out = String::new();
    for child in named_children(node) {
        match child.kind() {
            "string_content" => out.push_str(node_text(child, src)),
            "escape_sequence" => out.push_str(&unescape(node_text(child, src))),
            _ => return None,
        }
    }
    Some(out)
}

fn unescape(sequence: &str) -> String {
    match sequence {
        "\\n" => "\n".to_string(),
        "\\t" => "\t".to_string(),
        "\\s" => " ".to_string(),
        "\\0" => "\0".to_string(),
        other => other.strip_prefix('\\').unwrap_or(other).to_string(),
    }
}

fn parse_integer(text: &str) -> Option<i64> {
    let cleaned = text.replace('_', "");
    let (negative, digits) = match cleaned.strip_prefix('-') {
        Some(rest) => (true, rest.to_string()),
        None => (false, cleaned.trim_start_matches('+').to_string()),
    };
    let lower = digits.to_ascii_lowercase();
    let value = if let Some(hex) = lower.strip_prefix("0x") {
        i64::from_str_radix(hex, 16).ok()?
    } else if let Some(binary) = lower.strip_prefix("0b") {
        i64::from_str_radix(binary, 2).ok()?
    } else if let Some(octal) = lower.strip_prefix("0o") {
        i64::from_str_radix(octal, 8).ok()?
    } else if lower.len() > 1 && lower.starts_with('0') {
        i64::from_str_radix(&lower[1..], 8).ok()?
    } else {
        lower.parse().ok()?
    };
    Some(if negative { -value } else { value })
}
