use super::{each, Processor, Transform};
use crate::error::RuleError;
use crate::matcher::builder::{flag, key_name, strings};
use crate::matcher::{Matcher, MatcherBuilder};
use serde_yaml::{Mapping, Value};
use std::collections::BTreeSet;

/// What an action does with the values it extracts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ActionKind {
    Call,
    Define,
    Eval,
    /// Values for an enclosing capture (dynamic affixes)
    Emit,
}

impl ActionKind {
    fn terminal(self) -> Processor {
        match self {
            ActionKind::Call => Processor::CollectCall,
            ActionKind::Define => Processor::CollectDefinition,
            ActionKind::Eval => Processor::CollectSubfile,
            ActionKind::Emit => Processor::Emit,
        }
    }
}

/// Where an action takes its value from
#[derive(Debug, Clone, PartialEq)]
enum Selector {
    Arguments(Matcher),
    Keywords(Matcher),
    Itself,
    Value(String),
    Receiver,
}

impl Selector {
    fn wrap(&self, then: Processor) -> Processor {
        let then = Box::new(then);
        match self {
            Selector::Arguments(Matcher::Position(indexes)) if indexes.len() == 1 => {
                match indexes.iter().next() {
                    Some(&index) => Processor::PositionalArgument(index, then),
                    None => Processor::Arguments(Matcher::Position(BTreeSet::new()), then),
                }
            }
            Selector::Arguments(keys) => Processor::Arguments(keys.clone(), then),
            Selector::Keywords(keys) => Processor::Keywords(keys.clone(), then),
            Selector::Itself => Processor::Itself(then),
            Selector::Value(value) => Processor::Value(value.clone(), then),
            Selector::Receiver => Processor::Receiver(then),
        }
    }

    fn descends(&self) -> bool {
        matches!(self, Selector::Arguments(_) | Selector::Keywords(_))
    }
}

/// One transform in a chain
#[derive(Debug, Clone)]
enum TransformSpec {
    Static(Transform),
    /// Several alternatives, e.g. `add_prefix: [be_, is_]`
    Many(Vec<Transform>),
    DynamicPrefix(Processor),
    DynamicSuffix(Processor),
}

impl TransformSpec {
    fn wrap(&self, then: Processor) -> Result<Processor, RuleError> {
        Ok(match self {
            TransformSpec::Static(transform) => Processor::Transform(transform.clone(), Box::new(then)),
            TransformSpec::Many(transforms) => each(
                transforms
                    .iter()
                    .map(|t| Processor::Transform(t.clone(), Box::new(then.clone())))
                    .collect(),
            )?,
            TransformSpec::DynamicPrefix(affix) => {
                Processor::AddDynamicPrefix(Box::new(affix.clone()), Box::new(then))
            }
            TransformSpec::DynamicSuffix(affix) => {
                Processor::AddDynamicSuffix(Box::new(affix.clone()), Box::new(then))
            }
        })
    }
}

fn chain(specs: &[TransformSpec], then: Processor) -> Result<Processor, RuleError> {
    specs.iter().rev().try_fold(then, |then, spec| spec.wrap(then))
}

/// Compiles `dynamic:` rules into one processor
pub struct ProcessorBuilder<'m> {
    matchers: &'m MatcherBuilder,
}

impl<'m> ProcessorBuilder<'m> {
    pub fn new(matchers: &'m MatcherBuilder) -> Self {
        Self { matchers }
    }

    /// A rule or list of rules; `None` when there are no rules at all
    pub fn rules(&self, value: &Value) -> Result<Option<Processor>, RuleError> {
        let mut processors = Vec::new();
        self.collect_rules(value, &mut processors)?;
        if processors.is_empty() {
            return Ok(None);
        }
        each(processors).map(Some)
    }

    fn collect_rules(&self, value: &Value, out: &mut Vec<Processor>) -> Result<(), RuleError> {
        match value {
            Value::Null => Ok(()),
            Value::Sequence(items) => {
                for item in items {
                    self.collect_rules(item, out)?;
                }
                Ok(())
            }
            Value::Mapping(map) => {
                out.push(self.rule(map, value)?);
                Ok(())
            }
            Value::Tagged(tagged) => self.collect_rules(&tagged.value, out),
            other => Err(RuleError::invalid(
                "dynamic rule",
                "expected a rule or a list of rules",
                other,
            )),
        }
    }

    /// Rule keys other than the actions form the matcher for the call site
    fn rule(&self, map: &Mapping, fragment: &Value) -> Result<Processor, RuleError> {
        let mut pattern = Mapping::new();
        let mut actions = Vec::new();

        for (key, value) in map {
            match key_name(key, fragment)? {
                "calls" | "call" => actions.push(self.actions(value, ActionKind::Call)?),
                "defines" | "define" => actions.push(self.actions(value, ActionKind::Define)?),
                "eval" => actions.push(self.actions(value, ActionKind::Eval)?),
                _ => {
                    pattern.insert(key.clone(), value.clone());
                }
            }
        }

        if actions.is_empty() {
            return Err(RuleError::invalid(
                "dynamic rule",
                "a rule needs at least one of calls, defines or eval",
                fragment,
            ));
        }

        let actions = each(actions)?;
        Ok(match self.matchers.node(&Value::Mapping(pattern))? {
            Some(matcher) => Processor::MatchCurrentNode(matcher, Box::new(actions)),
            None => actions,
        })
    }

    fn actions(&self, value: &Value, kind: ActionKind) -> Result<Processor, RuleError> {
        match value {
            Value::Sequence(items) => each(
                items
                    .iter()
                    .map(|item| self.action(item, kind))
                    .collect::<Result<Vec<_>, _>>()?,
            ),
            other => self.action(other, kind),
        }
    }

    fn action(&self, value: &Value, kind: ActionKind) -> Result<Processor, RuleError> {
        match value {
            Value::Mapping(map) => self.action_map(map, kind, value),
            Value::Tagged(tagged) => self.action(&tagged.value, kind),
            Value::Null => Err(RuleError::invalid("action", "an action cannot be empty", value)),
            scalar => Ok(self.argument_selector(scalar)?.wrap(kind.terminal())),
        }
    }

    fn action_map(&self, map: &Mapping, kind: ActionKind, fragment: &Value) -> Result<Processor, RuleError> {
        let mut selectors = Vec::new();
        let mut nested: Option<Vec<Selector>> = None;
        let mut recursive = false;
        let mut branches: Option<Vec<Vec<TransformSpec>>> = None;
        let mut shorthand = Vec::new();
        let mut conditions = Vec::new();

        for (key, value) in map {
            match key_name(key, fragment)? {
                "argument" | "arguments" => selectors.push(self.argument_selector(value)?),
                "keyword" | "keywords" => selectors.push(Selector::Keywords(self.keys(value)?)),
                "itself" => {
                    if flag(value, "itself")? {
                        selectors.push(Selector::Itself);
                    }
                }
                "value" => selectors.extend(strings(value, "value")?.into_iter().map(Selector::Value)),
                "receiver" => {
                    if flag(value, "receiver")? {
                        selectors.push(Selector::Receiver);
                    }
                }
                "nested" => nested = Some(self.nested(value)?),
                "recursive" => recursive = flag(value, "recursive")?,
                "transforms" => branches = Some(self.branches(value)?),
                "if" => conditions.extend(self.matchers.node(value)?),
                "unless" => conditions.extend(self.matchers.node(value)?.map(Matcher::negate)),
                other => match self.transform(other, value)? {
                    Some(spec) => shorthand.push(spec),
                    None => {
                        return Err(RuleError::invalid(
                            "action",
                            format!("unknown key {other:?}"),
                            fragment,
                        ))
                    }
                },
            }
        }

        if selectors.is_empty() {
            return Err(RuleError::invalid(
                "action",
                "an action needs argument(s), keyword(s), itself, value or receiver",
                fragment,
            ));
        }

        let terminal = kind.terminal();
        let tail = match branches {
            None => terminal,
            Some(branches) if kind == ActionKind::Define && branches.len() > 1 => Processor::DefinitionSet(
                branches
                    .iter()
                    .map(|branch| chain(branch, Processor::Emit))
                    .collect::<Result<Vec<_>, _>>()?,
            ),
            Some(branches) => each(
                branches
                    .iter()
                    .map(|branch| chain(branch, terminal.clone()))
                    .collect::<Result<Vec<_>, _>>()?,
            )?,
        };
        let chained = chain(&shorthand, tail)?;

        let follow = if recursive {
            let mut descend: Vec<Selector> = nested.unwrap_or_else(|| selectors.clone());
            descend.retain(Selector::descends);
            if descend.is_empty() {
                descend.push(Selector::Arguments(Matcher::Or(
                    Box::new(Matcher::PositionFrom(0)),
                    Box::new(Matcher::AnyKeyword),
                )));
            }
            let again = each(vec![chained.clone(), Processor::Recurse])?;
            let body = Processor::Nested(Box::new(each(
                descend.iter().map(|s| s.wrap(again.clone())).collect(),
            )?));
            each(vec![chained, Processor::Recursive(Box::new(body))])?
        } else if let Some(nested) = nested {
            let inner = each(nested.iter().map(|s| s.wrap(chained.clone())).collect())?;
            each(vec![chained, Processor::Nested(Box::new(inner))])?
        } else {
            chained
        };

        let mut action = each(selectors.iter().map(|s| s.wrap(follow.clone())).collect())?;
        for condition in conditions.into_iter().rev() {
            action = Processor::MatchMatchedNode(condition, Box::new(action));
        }
        Ok(action)
    }

    fn argument_selector(&self, value: &Value) -> Result<Selector, RuleError> {
        Ok(Selector::Arguments(self.keys(value)?))
    }

    fn keys(&self, value: &Value) -> Result<Matcher, RuleError> {
        self.matchers
            .argument_keys(value)?
            .ok_or_else(|| RuleError::invalid("argument selector", "selector cannot be empty", value))
    }

    /// `nested:` takes an argument pattern or an object of `argument(s)`/`keyword(s)`
    fn nested(&self, value: &Value) -> Result<Vec<Selector>, RuleError> {
        let Value::Mapping(map) = value else {
            return Ok(vec![self.argument_selector(value)?]);
        };
        let mut selectors = Vec::new();
        for (key, inner) in map {
            match key_name(key, value)? {
                "argument" | "arguments" => selectors.push(self.argument_selector(inner)?),
                "keyword" | "keywords" => selectors.push(Selector::Keywords(self.keys(inner)?)),
                other => {
                    return Err(RuleError::invalid(
                        "nested",
                        format!("unknown key {other:?}, expected argument(s) or keyword(s)"),
                        value,
                    ))
                }
            }
        }
        Ok(selectors)
    }

    fn branches(&self, value: &Value) -> Result<Vec<Vec<TransformSpec>>, RuleError> {
        match value {
            Value::Sequence(items) => items.iter().map(|item| self.branch(item)).collect(),
            other => Ok(vec![self.branch(other)?]),
        }
    }

    fn branch(&self, value: &Value) -> Result<Vec<TransformSpec>, RuleError> {
        match value {
            Value::Null => Ok(Vec::new()),
            Value::String(name) => match Transform::flag(name) {
                Some(transform) => Ok(vec![TransformSpec::Static(transform)]),
                None => Err(RuleError::invalid(
                    "transform",
                    format!("unknown transform {name:?}"),
                    value,
                )),
            },
            Value::Mapping(map) => {
                let mut specs = Vec::new();
                for (key, inner) in map {
                    let key = key_name(key, value)?;
                    match self.transform(key, inner)? {
                        Some(spec) => specs.push(spec),
                        None => {
                            return Err(RuleError::invalid(
                                "transform",
                                format!("unknown transform {key:?}"),
                                value,
                            ))
                        }
                    }
                }
                Ok(specs)
            }
            other => Err(RuleError::invalid("transform", "expected a transform name or object", other)),
        }
    }

    /// A transform key with its value; `None` when `key` is not a transform
    fn transform(&self, key: &str, value: &Value) -> Result<Option<TransformSpec>, RuleError> {
        if let Some(transform) = Transform::flag(key) {
            let enabled = flag(value, "transform")?;
            return Ok(Some(TransformSpec::Static(if enabled {
                transform
            } else {
                Transform::Original
            })));
        }
        if Transform::with_argument(key, "").is_none() {
            return Ok(None);
        }

        if let Value::Mapping(_) = value {
            let affix = self.action(value, ActionKind::Emit)?;
            return match key {
                "add_prefix" => Ok(Some(TransformSpec::DynamicPrefix(affix))),
                "add_suffix" => Ok(Some(TransformSpec::DynamicSuffix(affix))),
                _ => Err(RuleError::invalid(
                    "transform",
                    format!("{key} takes a string or a list of strings"),
                    value,
                )),
            };
        }

        let mut transforms: Vec<Transform> = strings(value, "transform")?
            .iter()
            .filter_map(|argument| Transform::with_argument(key, argument))
            .collect();
        Ok(Some(match transforms.len() {
            0 => TransformSpec::Static(Transform::Original),
            1 => match transforms.pop() {
                Some(transform) => TransformSpec::Static(transform),
                None => TransformSpec::Static(Transform::Original),
            },
            _ => TransformSpec::Many(transforms),
        }))
    }
}
