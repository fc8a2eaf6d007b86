use super::comments::Annotations;
use super::node::NodeRef;
use super::visibility::{Target, VisibilityTracker};
use crate::collection::{Call, Definition, DefinitionKind, FileFacts, Span, Visibility};
use crate::parser::line_text;
use crate::processor::Accumulator;
use std::collections::HashSet;
use std::path::PathBuf;

/// Ruby source handed over by an `eval` rule
#[derive(Debug, Clone)]
pub struct Subfile {
    pub source: String,
    pub span: Span,
    pub line: String,
}

#[derive(Debug)]
struct Pending {
    definition: Definition,
    /// Line the definition starts on in the walked source
    line: usize,
    frame: usize,
    target: Target,
}

/// Calls and definitions found while walking one source
///
/// Facts are de-duplicated by name and span, so two rules firing on the same
/// node record it once. Facts from embedded source carry the position of the
/// string they came from.
#[derive(Debug)]
pub struct Facts {
    path: PathBuf,
    test: bool,
    origin: Option<(Span, String)>,
    calls: Vec<Call>,
    seen_calls: HashSet<(String, Span)>,
    pending: Vec<Pending>,
    definitions: Vec<Definition>,
    seen_definitions: HashSet<(Vec<String>, Span)>,
    subfiles: Vec<Subfile>,
    /// Class body the walker is in, for rule-produced definitions
    pub frame: usize,
    /// Default visibility at the walker's position
    pub visibility: Visibility,
}

impl Facts {
    pub fn new(path: PathBuf, test: bool, origin: Option<(Span, String)>) -> Self {
        Self {
            path,
            test,
            origin,
            calls: Vec::new(),
            seen_calls: HashSet::new(),
            pending: Vec::new(),
            definitions: Vec::new(),
            seen_definitions: HashSet::new(),
            subfiles: Vec::new(),
            frame: 0,
            visibility: Visibility::Public,
        }
    }

    fn position(&self, span: Span, line: &str) -> (Span, String) {
        match &self.origin {
            Some((span, line)) => (*span, line.clone()),
            None => (span, line.to_string()),
        }
    }

    pub fn call(&mut self, name: &str, span: Span) {
        let span = self.origin.as_ref().map_or(span, |(origin, _)| *origin);
        if self.seen_calls.insert((name.to_string(), span)) {
            self.calls.push(Call::new(name, span));
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn define(
        &mut self,
        names: Vec<String>,
        kind: DefinitionKind,
        visibility: Visibility,
        span: Span,
        line: &str,
        frame: usize,
        target: Target,
    ) {
        if names.is_empty() {
            return;
        }
        let walked_line = span.line;
        let (span, source_line) = self.position(span, line);
        if !self.seen_definitions.insert((names.clone(), span)) {
            return;
        }
        self.pending.push(Pending {
            definition: Definition {
                names,
                kind,
                visibility,
                location: span.at(&self.path),
                source_line,
                test: self.test,
                keep: false,
                test_only: false,
            },
            line: walked_line,
            frame,
            target,
        });
    }

    pub fn take_subfiles(&mut self) -> Vec<Subfile> {
        std::mem::take(&mut self.subfiles)
    }

    /// Apply explicit privacy calls and magic comments to pending definitions
    pub fn resolve(&mut self, tracker: &VisibilityTracker, annotations: &Annotations) {
        for pending in std::mem::take(&mut self.pending) {
            let mut definition = pending.definition;
            if let Some(name) = definition.names.first() {
                if let Some(visibility) = tracker.resolve(pending.frame, name, pending.target) {
                    definition.visibility = visibility;
                }
            }
            definition.keep |= annotations.is_keep(pending.line);
            definition.test_only |= annotations.is_test_only(pending.line);
            self.definitions.push(definition);
        }
        for (name, span) in &annotations.calls {
            self.call(name, *span);
        }
    }

    /// Take over the resolved facts of an embedded source
    pub fn absorb(&mut self, other: Facts) {
        for call in other.calls {
            if self.seen_calls.insert((call.name.clone(), call.span)) {
                self.calls.push(call);
            }
        }
        for definition in other.definitions {
            let key = (definition.names.clone(), other_span(&definition));
            if self.seen_definitions.insert(key) {
                self.definitions.push(definition);
            }
        }
    }

    pub fn into_file_facts(self) -> FileFacts {
        let mut facts = FileFacts::new(self.path, self.test);
        facts.calls = self.calls;
        facts.definitions = self.definitions;
        facts
    }
}

fn other_span(definition: &Definition) -> Span {
    let location = &definition.location;
    Span::new(location.line, location.column, location.start_byte, location.end_byte)
}

impl Accumulator for Facts {
    fn add_call(&mut self, name: &str, node: &NodeRef<'_>) {
        self.call(name, node.span());
    }

    fn add_definition_set(&mut self, names: Vec<String>, node: &NodeRef<'_>) {
        let Some(first) = names.first() else {
            return;
        };
        let kind = DefinitionKind::from_name(first);
        let target = match kind {
            DefinitionKind::Constant => Target::Constant,
            _ => Target::Instance,
        };
        let span = node.span();
        let line = line_text(node.source(), span.line);
        let (visibility, frame) = (self.visibility, self.frame);
        self.define(names, kind, visibility, span, line, frame, target);
    }

    fn add_subfile(&mut self, source: &str, node: &NodeRef<'_>) {
        let span = node.span();
        let (span, line) = self.position(span, line_text(node.source(), span.line));
        self.subfiles.push(Subfile {
            source: source.to_string(),
            span,
            line,
        });
    }
}
