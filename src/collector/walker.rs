use super::comments::Annotations;
use super::facts::Facts;
use super::node::NodeRef;
use super::scope::Scope;
use super::visibility::{Target, VisibilityTracker};
use super::FileContext;
use crate::collection::{DefinitionKind, Visibility};
use crate::error::CollectError;
use crate::parser::{line_text, named_children, node_text, span_of};
use crate::processor::Step;
use crate::rules::RuleSet;
use tracing::trace;
use tree_sitter::Node;

/// Walks one syntax tree, recording built-in facts and running the rules
pub struct Walker<'r, 't> {
    rules: &'r RuleSet,
    src: &'t str,
    file: &'t FileContext,
    scope: Scope<'t>,
    visibility: VisibilityTracker,
    annotations: Annotations,
    facts: Facts,
}

impl<'r, 't> Walker<'r, 't> {
    pub fn new(
        rules: &'r RuleSet,
        src: &'t str,
        file: &'t FileContext,
        annotations: Annotations,
        facts: Facts,
    ) -> Self {
        Self {
            rules,
            src,
            file,
            scope: Scope::new(),
            visibility: VisibilityTracker::new(),
            annotations,
            facts,
        }
    }

    /// Resolve privacy and annotations, returning the file's facts
    pub fn finish(self) -> Facts {
        let mut facts = self.facts;
        facts.resolve(&self.visibility, &self.annotations);
        facts
    }

    fn text(&self, node: Node<'t>) -> &'t str {
        node_text(node, self.src)
    }

    fn call(&mut self, name: &str, node: Node<'t>) {
        self.facts.call(name, span_of(node));
    }

    fn define(&mut self, name: &str, kind: DefinitionKind, visibility: Visibility, node: Node<'t>, target: Target) {
        let span = span_of(node);
        let line = line_text(self.src, span.line);
        let frame = self.visibility.frame();
        self.facts
            .define(vec![name.to_string()], kind, visibility, span, line, frame, target);
    }

    fn value_of(&self, node: Node<'t>) -> Option<String> {
        NodeRef::new(node, self.src, self.file, &self.scope)
            .value()
            .map(|v| v.into_owned())
    }

    fn run_rules(&mut self, node: Node<'t>) -> Result<(), CollectError> {
        let Some(dynamic) = self.rules.dynamic() else {
            return Ok(());
        };
        let name = self.annotations.dynamic_name(node.id());
        let current = NodeRef::new(node, self.src, self.file, &self.scope).with_name(name);
        self.facts.frame = self.visibility.frame();
        self.facts.visibility = self.visibility.current();
        trace!("running rules at {}:{}", self.file.path.display(), node.start_position().row + 1);
        let step = Step::new(current, self.rules.inflections());
        dynamic.process(None, &current, &step, &mut self.facts)
    }

    fn visit_children(&mut self, node: Node<'t>) -> Result<(), CollectError> {
        for child in named_children(node) {
            self.visit(child)?;
        }
        Ok(())
    }

    /// Visit named children other than the given fields
    fn visit_except(&mut self, node: Node<'t>, fields: &[&str]) -> Result<(), CollectError> {
        let skipped: Vec<Node<'t>> = fields
            .iter()
            .filter_map(|field| node.child_by_field_name(field))
            .collect();
        for child in named_children(node) {
            if !skipped.contains(&child) {
                self.visit(child)?;
            }
        }
        Ok(())
    }

    fn visit_field(&mut self, node: Node<'t>, field: &str) -> Result<(), CollectError> {
        match node.child_by_field_name(field) {
            Some(child) => self.visit(child),
            None => Ok(()),
        }
    }

    pub fn visit(&mut self, node: Node<'t>) -> Result<(), CollectError> {
        match node.kind() {
            "comment" | "undef" => Ok(()),
            "method" => self.visit_method(node, false),
            "singleton_method" => self.visit_method(node, true),
            "class" | "module" => self.visit_namespace(node),
            "singleton_class" => {
                self.visit_field(node, "value")?;
                self.scope.push_gate();
                self.visibility.push();
                let result = self.visit_except(node, &["value"]);
                self.visibility.pop();
                self.scope.pop();
                result
            }
            "call" => self.visit_call(node),
            "identifier" => {
                let name = self.text(node);
                if !self.scope.is_local(name) {
                    self.call(name, node);
                    // a bare `private` is an identifier, not a call
                    self.privacy(name, node);
                    self.run_rules(node)?;
                }
                Ok(())
            }
            "constant" | "instance_variable" | "class_variable" | "global_variable" => {
                let name = self.text(node);
                self.call(name, node);
                Ok(())
            }
            "scope_resolution" => {
                self.visit_field(node, "scope")?;
                if let Some(name) = node.child_by_field_name("name") {
                    let text = self.text(name);
                    self.call(text, name);
                }
                Ok(())
            }
            "assignment" => self.visit_assignment(node, false),
            "operator_assignment" => self.visit_assignment(node, true),
            "element_reference" => {
                self.visit_children(node)?;
                self.call("[]", node);
                self.run_rules(node)
            }
            "binary" => {
                if let Some(operator) = node.child_by_field_name("operator") {
                    let operator = self.text(operator);
                    if !matches!(operator, "and" | "or" | "&&" | "||") {
                        self.call(operator, node);
                    }
                }
                self.visit_children(node)
            }
            "unary" => {
                if let Some(operator) = node.child_by_field_name("operator") {
                    let name = match self.text(operator) {
                        "-" => Some("-@"),
                        "+" => Some("+@"),
                        "!" | "not" => Some("!"),
                        "~" => Some("~"),
                        _ => None,
                    };
                    if let Some(name) = name {
                        self.call(name, node);
                    }
                }
                self.visit_children(node)
            }
            "block" | "do_block" | "lambda" => {
                self.scope.push_block();
                if let Some(parameters) = node.child_by_field_name("parameters") {
                    self.declare_parameters(parameters)?;
                }
                let result = self.visit_except(node, &["parameters"]);
                self.scope.pop();
                result
            }
            "alias" => {
                if let Some(new) = node.child_by_field_name("name") {
                    let name = self.text(new);
                    let visibility = self.visibility.current();
                    self.define(name, DefinitionKind::from_name(name), visibility, new, Target::Instance);
                }
                if let Some(old) = node.child_by_field_name("alias") {
                    let name = self.text(old);
                    self.call(name, old);
                }
                Ok(())
            }
            "exception_variable" => {
                for child in named_children(node) {
                    self.assign_target(child, None, false)?;
                }
                Ok(())
            }
            "for" => {
                if let Some(pattern) = node.child_by_field_name("pattern") {
                    self.assign_target(pattern, None, false)?;
                }
                self.visit_except(node, &["pattern"])
            }
            "pair" => self.visit_pair(node),
            "block_argument" => {
                for child in named_children(node) {
                    if child.kind() == "simple_symbol" {
                        let name = self.text(child).trim_start_matches(':');
                        self.call(name, child);
                    } else {
                        self.visit(child)?;
                    }
                }
                Ok(())
            }
            "array" | "hash" => {
                if self.annotations.dynamic_name(node.id()).is_some() {
                    self.run_rules(node)?;
                }
                self.visit_children(node)
            }
            _ => self.visit_children(node),
        }
    }

    fn visit_method(&mut self, node: Node<'t>, singleton: bool) -> Result<(), CollectError> {
        if singleton {
            self.visit_field(node, "object")?;
        }
        if let Some(name) = node.child_by_field_name("name") {
            let text = self.text(name);
            let (visibility, target) = if singleton {
                (Visibility::Public, Target::Singleton)
            } else {
                (self.visibility.current(), Target::Instance)
            };
            self.define(text, DefinitionKind::Method, visibility, name, target);
        }

        self.scope.push_gate();
        let result = self.visit_method_body(node);
        self.scope.pop();
        result
    }

    fn visit_method_body(&mut self, node: Node<'t>) -> Result<(), CollectError> {
        if let Some(parameters) = node.child_by_field_name("parameters") {
            self.declare_parameters(parameters)?;
        }
        self.visit_except(node, &["name", "parameters", "object"])
    }

    fn visit_namespace(&mut self, node: Node<'t>) -> Result<(), CollectError> {
        if let Some(name) = node.child_by_field_name("name") {
            let defined = if name.kind() == "scope_resolution" {
                self.visit_field(name, "scope")?;
                name.child_by_field_name("name")
            } else {
                Some(name)
            };
            if let Some(defined) = defined {
                let text = self.text(defined);
                self.define(text, DefinitionKind::Constant, Visibility::Public, defined, Target::Constant);
            }
        }
        self.visit_field(node, "superclass")?;

        self.scope.push_gate();
        self.visibility.push();
        let result = self.visit_except(node, &["name", "superclass"]);
        self.visibility.pop();
        self.scope.pop();
        result
    }

    fn visit_call(&mut self, node: Node<'t>) -> Result<(), CollectError> {
        let receiver = node.child_by_field_name("receiver");
        if let Some(receiver) = receiver {
            self.visit(receiver)?;
        }

        let method = node.child_by_field_name("method");
        let name = method.map_or("call", |m| self.text(m));
        self.call(name, method.unwrap_or(node));

        if receiver.is_none() {
            self.privacy(name, node);
        }

        self.visit_field(node, "arguments")?;
        self.run_rules(node)?;
        self.visit_field(node, "block")
    }

    fn visit_pair(&mut self, node: Node<'t>) -> Result<(), CollectError> {
        let key = node.child_by_field_name("key");
        let value = node.child_by_field_name("value");
        match key {
            Some(key) if key.kind() == "hash_key_symbol" => {
                if value.is_none() {
                    // `{name:}` reads `name`
                    let name = self.text(key).trim_end_matches(':');
                    if !self.scope.is_local(name) {
                        self.call(name, key);
                    }
                }
            }
            Some(key) => self.visit(key)?,
            None => {}
        }
        match value {
            Some(value) => self.visit(value),
            None => Ok(()),
        }
    }

    fn visit_assignment(&mut self, node: Node<'t>, operator: bool) -> Result<(), CollectError> {
        let right = node.child_by_field_name("right");
        if let Some(left) = node.child_by_field_name("left") {
            self.assign_target(left, right, operator)?;
        }
        if let Some(right) = right {
            self.visit(right)?;
        }
        self.run_rules(node)
    }

    /// Record the target of an assignment; `value` is the assigned node
    fn assign_target(&mut self, target: Node<'t>, value: Option<Node<'t>>, operator: bool) -> Result<(), CollectError> {
        let bound = if operator { None } else { value };
        match target.kind() {
            "identifier" => {
                let name = self.text(target);
                self.scope.declare(name, bound);
            }
            "constant" => {
                let name = self.text(target);
                if operator {
                    self.call(name, target);
                }
                self.define(name, DefinitionKind::Constant, Visibility::Public, target, Target::Constant);
                self.scope.define_constant(name, bound);
            }
            "scope_resolution" => {
                self.visit_field(target, "scope")?;
                if let Some(name) = target.child_by_field_name("name") {
                    let text = self.text(name);
                    if operator {
                        self.call(text, name);
                    }
                    self.define(text, DefinitionKind::Constant, Visibility::Public, name, Target::Constant);
                }
            }
            "instance_variable" | "class_variable" | "global_variable" => {
                let name = self.text(target);
                if operator {
                    self.call(name, target);
                }
                self.define(name, DefinitionKind::from_name(name), Visibility::Public, target, Target::Instance);
            }
            "call" => {
                self.visit_field(target, "receiver")?;
                if let Some(method) = target.child_by_field_name("method") {
                    let name = self.text(method);
                    self.call(&format!("{name}="), method);
                    if operator {
                        self.call(name, method);
                    }
                }
                self.visit_field(target, "arguments")?;
            }
            "element_reference" => {
                self.visit_children(target)?;
                self.call("[]=", target);
                if operator {
                    self.call("[]", target);
                }
            }
            "left_assignment_list" | "destructured_left_assignment" | "rest_assignment" => {
                for child in named_children(target) {
                    self.assign_target(child, None, false)?;
                }
            }
            _ => self.visit(target)?,
        }
        Ok(())
    }

    fn declare_parameters(&mut self, parameters: Node<'t>) -> Result<(), CollectError> {
        for parameter in named_children(parameters) {
            match parameter.kind() {
                "identifier" => {
                    let name = self.text(parameter);
                    self.scope.declare(name, None);
                }
                "optional_parameter" | "keyword_parameter" => {
                    if let Some(name) = parameter.child_by_field_name("name") {
                        let name = self.text(name);
                        self.scope.declare(name, None);
                    }
                    self.visit_field(parameter, "value")?;
                }
                "splat_parameter" | "hash_splat_parameter" | "block_parameter" => {
                    if let Some(name) = parameter.child_by_field_name("name") {
                        let name = self.text(name);
                        self.scope.declare(name, None);
                    }
                }
                "destructured_parameter" | "block_parameters" => self.declare_parameters(parameter)?,
                _ => {}
            }
        }
        Ok(())
    }

    /// `private`, `private_class_method`, `private_constant` and friends
    fn privacy(&mut self, name: &str, call: Node<'t>) {
        let (target, visibility) = match name {
            "private" | "protected" | "public" => match Visibility::parse(name) {
                Some(visibility) => (Target::Instance, visibility),
                None => return,
            },
            "private_class_method" => (Target::Singleton, Visibility::Private),
            "public_class_method" => (Target::Singleton, Visibility::Public),
            "private_constant" => (Target::Constant, Visibility::Private),
            "public_constant" => (Target::Constant, Visibility::Public),
            _ => return,
        };

        let arguments = call
            .child_by_field_name("arguments")
            .map(named_children)
            .unwrap_or_default();
        if arguments.is_empty() {
            if target == Target::Instance {
                self.visibility.set_default(visibility);
            }
            return;
        }

        let mut names = Vec::new();
        for argument in arguments {
            self.privacy_names(argument, &mut names);
        }
        for name in names {
            self.visibility.declare(&name, target, visibility);
        }
    }

    fn privacy_names(&self, argument: Node<'t>, names: &mut Vec<String>) {
        match argument.kind() {
            "array" => {
                for element in named_children(argument) {
                    self.privacy_names(element, names);
                }
            }
            "method" | "singleton_method" => {
                if let Some(name) = argument.child_by_field_name("name") {
                    names.push(self.text(name).to_string());
                }
            }
            "call" => {
                // `private attr_accessor :a` covers the generated reader and writer
                let inner = argument
                    .child_by_field_name("arguments")
                    .map(named_children)
                    .unwrap_or_default();
                for item in inner {
                    if let Some(name) = self.value_of(item) {
                        names.push(format!("{name}="));
                        names.push(name);
                    }
                }
            }
            _ => names.extend(self.value_of(argument)),
        }
    }
}
