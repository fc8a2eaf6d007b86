//! Processor pipelines: what happens once a rule matches.
//!
//! A [`Processor`] receives an optional string value plus the node it came
//! from, transforms it, and eventually hands it to an [`Accumulator`] as a
//! call, a definition or an embedded source. An absent or empty value stops
//! the pipeline without error.

mod builder;
mod compact;
mod inflect;
mod transform;

pub use builder::ProcessorBuilder;
pub use compact::each;
#[cfg(feature = "inflections")]
pub use inflect::Inflections;
pub use inflect::{capability, Inflect, INFLECTION_REQUIRES};
pub use transform::{Inflection, Transform};

use crate::collector::{ArgKey, NodeRef};
use crate::error::CollectError;
use crate::matcher::{Matcher, Subject};
use std::borrow::Cow;

/// Limit for `recursive` descent into nested arrays and hashes
pub const MAX_RECURSION: usize = 64;

/// Compiled action step
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Processor {
    /// Name of the current node
    Itself(Box<Processor>),
    /// A fixed value
    Value(String, Box<Processor>),
    /// The receiver of the current call
    Receiver(Box<Processor>),
    PositionalArgument(usize, Box<Processor>),
    /// Values of every argument whose key matches
    Arguments(Matcher, Box<Processor>),
    /// Names of every keyword whose key matches
    Keywords(Matcher, Box<Processor>),
    /// Run each processor on the same input
    Each(Vec<Processor>),
    /// Re-enter with the current array or hash as the node
    Nested(Box<Processor>),
    /// Make the inner processor the target of [`Processor::Recurse`]
    Recursive(Box<Processor>),
    Recurse,
    MatchCurrentNode(Matcher, Box<Processor>),
    MatchMatchedNode(Matcher, Box<Processor>),
    /// Branches whose emitted values form one multi-name definition
    DefinitionSet(Vec<Processor>),
    Transform(Transform, Box<Processor>),
    /// Prefix computed from the matched node
    AddDynamicPrefix(Box<Processor>, Box<Processor>),
    AddDynamicSuffix(Box<Processor>, Box<Processor>),
    CollectCall,
    CollectDefinition,
    CollectSubfile,
    /// Hand the value back to the enclosing capture
    Emit,
}

/// Evaluation context shared down a pipeline
#[derive(Clone, Copy)]
pub struct Step<'s, 'a> {
    /// The node the top-level rule matched
    pub matched: NodeRef<'a>,
    recursive: Option<&'s Processor>,
    inflect: Option<&'s dyn Inflect>,
    depth: usize,
}

impl<'s, 'a> Step<'s, 'a> {
    pub fn new(matched: NodeRef<'a>, inflect: Option<&'s dyn Inflect>) -> Self {
        Self {
            matched,
            recursive: None,
            inflect,
            depth: 0,
        }
    }
}

/// Receiver of the facts a pipeline produces
pub trait Accumulator {
    fn add_call(&mut self, name: &str, node: &NodeRef<'_>);

    fn add_definition_set(&mut self, names: Vec<String>, node: &NodeRef<'_>);

    fn add_definition(&mut self, name: &str, node: &NodeRef<'_>) {
        self.add_definition_set(vec![name.to_string()], node);
    }

    /// Ruby source to collect as if it appeared at `node`
    fn add_subfile(&mut self, source: &str, node: &NodeRef<'_>);

    fn emit(&mut self, _value: &str) {}
}

/// Collects emitted values, dropping any other fact
#[derive(Debug, Default)]
pub struct Capture {
    values: Vec<String>,
}

impl Capture {
    pub fn into_values(self) -> Vec<String> {
        self.values
    }
}

impl Accumulator for Capture {
    fn add_call(&mut self, _name: &str, _node: &NodeRef<'_>) {}

    fn add_definition_set(&mut self, _names: Vec<String>, _node: &NodeRef<'_>) {}

    fn add_subfile(&mut self, _source: &str, _node: &NodeRef<'_>) {}

    fn emit(&mut self, value: &str) {
        if !self.values.iter().any(|v| v == value) {
            self.values.push(value.to_string());
        }
    }
}

fn present(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

impl Processor {
    pub fn process<'s, 'a>(
        &'s self,
        value: Option<&str>,
        current: &NodeRef<'a>,
        step: &Step<'s, 'a>,
        acc: &mut dyn Accumulator,
    ) -> Result<(), CollectError> {
        match self {
            Processor::Itself(then) => {
                // Literals read as their value, calls, assignments and definitions as their name
                let name: Option<Cow<'_, str>> = match current.value() {
                    Some(_) if current.is_assignment() => current.name(),
                    Some(value) => Some(value),
                    None => current.name(),
                };
                then.process(name.as_deref(), current, step, acc)
            }
            Processor::Value(fixed, then) => then.process(Some(fixed.as_str()), current, step, acc),
            Processor::Receiver(then) => match current.receiver() {
                Some(receiver) => {
                    let value = receiver.value();
                    then.process(value.as_deref(), &receiver, step, acc)
                }
                None => Ok(()),
            },
            Processor::PositionalArgument(index, then) => match current.positional(*index) {
                Some(argument) => {
                    let value = argument.value();
                    then.process(value.as_deref(), &argument, step, acc)
                }
                None => Ok(()),
            },
            Processor::Arguments(keys, then) => {
                for (key, argument) in current.arguments() {
                    if keys.matches(&key) {
                        let value = argument.value();
                        then.process(value.as_deref(), &argument, step, acc)?;
                    }
                }
                Ok(())
            }
            Processor::Keywords(keys, then) => {
                for (key, _) in current.arguments() {
                    if let ArgKey::Keyword { name, node, .. } = &key {
                        if keys.matches(&key) {
                            then.process(Some(name.as_str()), node, step, acc)?;
                        }
                    }
                }
                Ok(())
            }
            Processor::Each(processors) => {
                for processor in processors {
                    processor.process(value, current, step, acc)?;
                }
                Ok(())
            }
            Processor::Nested(then) => {
                if current.is_container() {
                    then.process(None, current, step, acc)?;
                }
                Ok(())
            }
            Processor::Recursive(body) => {
                let inner = Step {
                    recursive: Some(body.as_ref()),
                    ..*step
                };
                body.process(value, current, &inner, acc)
            }
            Processor::Recurse => match step.recursive {
                Some(body) if step.depth < MAX_RECURSION => {
                    let deeper = Step {
                        depth: step.depth + 1,
                        ..*step
                    };
                    body.process(value, current, &deeper, acc)
                }
                _ => Ok(()),
            },
            Processor::MatchCurrentNode(matcher, then) => {
                if matcher.matches(current) {
                    then.process(value, current, step, acc)?;
                }
                Ok(())
            }
            Processor::MatchMatchedNode(matcher, then) => {
                if matcher.matches(&step.matched) {
                    then.process(value, current, step, acc)?;
                }
                Ok(())
            }
            Processor::DefinitionSet(branches) => {
                let mut capture = Capture::default();
                for branch in branches {
                    branch.process(value, current, step, &mut capture)?;
                }
                let names = capture.into_values();
                if !names.is_empty() {
                    acc.add_definition_set(names, current);
                }
                Ok(())
            }
            Processor::Transform(transform, then) => {
                let Some(value) = present(value) else {
                    return Ok(());
                };
                for output in transform.apply(value, step.inflect)? {
                    then.process(Some(&output), current, step, acc)?;
                }
                Ok(())
            }
            Processor::AddDynamicPrefix(affix, then) | Processor::AddDynamicSuffix(affix, then) => {
                let Some(value) = present(value) else {
                    return Ok(());
                };
                let mut capture = Capture::default();
                affix.process(None, &step.matched, step, &mut capture)?;
                let prefix = matches!(self, Processor::AddDynamicPrefix(..));
                for piece in capture.into_values() {
                    let output = if prefix {
                        format!("{piece}{value}")
                    } else {
                        format!("{value}{piece}")
                    };
                    then.process(Some(&output), current, step, acc)?;
                }
                Ok(())
            }
            Processor::CollectCall => {
                if let Some(name) = present(value) {
                    acc.add_call(name, current);
                }
                Ok(())
            }
            Processor::CollectDefinition => {
                if let Some(name) = present(value) {
                    acc.add_definition(name, current);
                }
                Ok(())
            }
            Processor::CollectSubfile => {
                if let Some(source) = present(value) {
                    acc.add_subfile(source, current);
                }
                Ok(())
            }
            Processor::Emit => {
                if let Some(value) = present(value) {
                    acc.emit(value);
                }
                Ok(())
            }
        }
    }
}
