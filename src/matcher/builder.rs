use super::{and, or, Matcher, NodeKind, PairRule, PathGlob, Pattern, Scalar};
use crate::collection::Visibility;
use crate::error::RuleError;
use crate::parser::DOCUMENT_METHOD;
use serde_yaml::{Mapping, Value};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// What a pattern is matched against, which decides how scalars read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Context {
    /// A call site or definition: strings are names
    Node,
    /// An argument value: numbers, booleans and nil are literals
    Value,
    /// The receiver of a call
    Receiver,
    /// An argument key: numbers are positions, `*`/`**`/`N+` are wildcards
    Key,
}

impl Context {
    fn describe(self) -> &'static str {
        match self {
            Context::Node => "name pattern",
            Context::Value => "has_value pattern",
            Context::Receiver => "has_receiver pattern",
            Context::Key => "argument pattern",
        }
    }
}

/// Compiles raw configuration values into [`Matcher`]s
///
/// Every method returns `Ok(None)` for an absent or empty pattern, meaning
/// "no constraint".
#[derive(Debug, Clone)]
pub struct MatcherBuilder {
    root: PathBuf,
}

impl MatcherBuilder {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Pattern over call sites and definitions (`keep`, `test_only`, rules)
    pub fn node(&self, value: &Value) -> Result<Option<Matcher>, RuleError> {
        self.build(value, Context::Node)
    }

    /// Pattern over an argument value (`has_value`)
    pub fn value(&self, value: &Value) -> Result<Option<Matcher>, RuleError> {
        self.build(value, Context::Value)
    }

    /// Pattern over argument keys (`at`, `argument`, `keyword`)
    pub fn argument_keys(&self, value: &Value) -> Result<Option<Matcher>, RuleError> {
        self.build(value, Context::Key)
    }

    /// `has_receiver`: `true`, `false` or a pattern the receiver must match
    pub fn receiver(&self, value: &Value) -> Result<Option<Matcher>, RuleError> {
        match value {
            Value::Bool(true) => Ok(Some(Matcher::AnyReceiver)),
            Value::Bool(false) => Ok(Some(Matcher::AnyReceiver.negate())),
            Value::Null => Ok(None),
            _ => Ok(self
                .build(value, Context::Receiver)?
                .map(|m| Matcher::Receiver(Box::new(m)))),
        }
    }

    /// `has_argument`: keys, `{at, has_value}` pairs and `unless` exclusions
    pub fn has_argument(&self, value: &Value) -> Result<Option<Matcher>, RuleError> {
        let items: Vec<&Value> = match value {
            Value::Sequence(items) => items.iter().collect(),
            other => vec![other],
        };

        let mut keys = Vec::new();
        let mut pairs = Vec::new();
        let mut alternatives = Vec::new();

        for item in items {
            match item {
                Value::Mapping(map) if map.contains_key("unless") => {
                    let mut positive = map.clone();
                    let excluded = match positive.remove("unless") {
                        Some(unless) => self.has_argument(&unless)?.map(Matcher::negate),
                        None => None,
                    };
                    let base = if positive.is_empty() {
                        None
                    } else {
                        self.has_argument(&Value::Mapping(positive))?
                    };
                    alternatives.push(and([base, excluded]));
                }
                Value::Mapping(map) => {
                    for key in map.keys() {
                        let key = key_name(key, item)?;
                        if key != "at" && key != "has_value" {
                            return Err(RuleError::invalid(
                                "has_argument pattern",
                                format!("unknown key {key:?}, expected at, has_value or unless"),
                                item,
                            ));
                        }
                    }
                    let key = match map.get("at") {
                        Some(at) => self.build(at, Context::Key)?,
                        None => None,
                    };
                    let value = match map.get("has_value") {
                        Some(has_value) => self.build(has_value, Context::Value)?,
                        None => None,
                    };
                    match value {
                        Some(value) => pairs.push((key, value)),
                        None => keys.push(key.unwrap_or_else(any_argument)),
                    }
                }
                other => {
                    if let Some(key) = self.build(other, Context::Key)? {
                        keys.push(key);
                    }
                }
            }
        }

        let rule = PairRule::new(or(keys.into_iter().map(Some)), pairs);
        if !rule.is_empty() {
            alternatives.insert(0, Some(Matcher::Argument(Box::new(rule))));
        }
        Ok(or(alternatives))
    }

    /// `path`/`paths`: gitignore-style patterns rooted at the project root
    pub fn paths(&self, value: &Value) -> Result<Option<Matcher>, RuleError> {
        Ok(self.path_glob(value)?.map(Matcher::Path))
    }

    pub fn path_glob(&self, value: &Value) -> Result<Option<PathGlob>, RuleError> {
        let patterns = strings(value, "path pattern")?;
        PathGlob::new(&self.root, &patterns)
    }

    fn build(&self, value: &Value, context: Context) -> Result<Option<Matcher>, RuleError> {
        match value {
            Value::Null => Ok(match context {
                Context::Value => Some(Matcher::Literal(BTreeSet::from([Scalar::Nil]))),
                _ => None,
            }),
            Value::Bool(flag) => match context {
                Context::Value => Ok(Some(Matcher::Literal(BTreeSet::from([Scalar::Bool(*flag)])))),
                _ => Err(RuleError::invalid(
                    context.describe(),
                    "a boolean is not a pattern here",
                    value,
                )),
            },
            Value::Number(_) => match context {
                Context::Key => {
                    let index = value.as_u64().ok_or_else(|| {
                        RuleError::invalid(context.describe(), "positions must be non-negative integers", value)
                    })?;
                    Ok(Some(Matcher::Position(BTreeSet::from([index as usize]))))
                }
                _ => Ok(Some(Matcher::Literal(BTreeSet::from([scalar(value)?])))),
            },
            Value::String(text) => match context {
                Context::Key => Ok(Some(key_pattern(text))),
                _ => Ok(Some(Matcher::name(text.as_str()))),
            },
            Value::Sequence(items) => {
                let built = items
                    .iter()
                    .map(|item| self.build(item, context))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(or(built))
            }
            Value::Mapping(map) => self.mapping(map, context, value),
            Value::Tagged(tagged) => self.build(&tagged.value, context),
        }
    }

    fn mapping(&self, map: &Mapping, context: Context, fragment: &Value) -> Result<Option<Matcher>, RuleError> {
        let mut parts = Vec::new();
        let mut nested_argument = Mapping::new();

        for (key, value) in map {
            let key = key_name(key, fragment)?;
            let part = match key {
                "name" | "names" => self.build(value, Context::Node)?,
                "has_prefix" => or(strings(value, "has_prefix")?
                    .into_iter()
                    .map(|p| Some(Matcher::Prefix(p)))),
                "has_suffix" => or(strings(value, "has_suffix")?
                    .into_iter()
                    .map(|s| Some(Matcher::Suffix(s)))),
                "matches" | "match" => {
                    let mut patterns = Vec::new();
                    for source in strings(value, "matches")? {
                        let pattern = Pattern::new(&source).map_err(|source_error| RuleError::Regex {
                            pattern: source.clone(),
                            source: source_error,
                        })?;
                        patterns.push(Some(Matcher::Regex(pattern)));
                    }
                    or(patterns)
                }
                "type" => Some(Matcher::Type(kinds(value)?)),
                "privacy" => Some(Matcher::Privacy(privacy(value)?)),
                "literal" => Some(Matcher::Literal(scalars(value)?)),
                "path" | "paths" => self.paths(value)?,
                "document" => flag(value, "document")?.then(|| Matcher::name(DOCUMENT_METHOD)),
                "has_receiver" => self.receiver(value)?,
                "has_argument" | "has_arguments" => self.has_argument(value)?,
                "has_block" => Some(if flag(value, "has_block")? {
                    Matcher::Block
                } else {
                    Matcher::Block.negate()
                }),
                "at" | "has_value" if context == Context::Value => {
                    nested_argument.insert(Value::String(key.to_string()), value.clone());
                    continue;
                }
                "unless" => self.build(value, context)?.map(Matcher::negate),
                "all" => and(self.each(value, context)?),
                "any" => or(self.each(value, context)?),
                _ => {
                    return Err(RuleError::invalid(
                        context.describe(),
                        format!("unknown key {key:?}"),
                        fragment,
                    ))
                }
            };
            parts.push(part);
        }

        if !nested_argument.is_empty() {
            parts.push(self.has_argument(&Value::Mapping(nested_argument))?);
        }

        Ok(and(parts))
    }

    fn each(&self, value: &Value, context: Context) -> Result<Vec<Option<Matcher>>, RuleError> {
        match value {
            Value::Sequence(items) => items.iter().map(|item| self.build(item, context)).collect(),
            other => Ok(vec![self.build(other, context)?]),
        }
    }
}

/// Any positional or keyword argument
fn any_argument() -> Matcher {
    Matcher::Or(Box::new(Matcher::PositionFrom(0)), Box::new(Matcher::AnyKeyword))
}

fn key_pattern(text: &str) -> Matcher {
    match text {
        "*" => Matcher::PositionFrom(0),
        "**" => Matcher::AnyKeyword,
        _ => {
            if let Some(first) = text.strip_suffix('+').and_then(|n| n.parse::<usize>().ok()) {
                Matcher::PositionFrom(first)
            } else if let Ok(index) = text.parse::<usize>() {
                Matcher::Position(BTreeSet::from([index]))
            } else {
                Matcher::name(text)
            }
        }
    }
}

pub(crate) fn key_name<'v>(key: &'v Value, fragment: &Value) -> Result<&'v str, RuleError> {
    key.as_str()
        .ok_or_else(|| RuleError::invalid("configuration", "keys must be strings", fragment))
}

/// A string or list of strings
pub(crate) fn strings(value: &Value, context: &'static str) -> Result<Vec<String>, RuleError> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::String(text) => Ok(vec![text.clone()]),
        Value::Number(number) => Ok(vec![number.to_string()]),
        Value::Sequence(items) => {
            let mut out = Vec::new();
            for item in items {
                out.extend(strings(item, context)?);
            }
            Ok(out)
        }
        Value::Tagged(tagged) => strings(&tagged.value, context),
        other => Err(RuleError::invalid(context, "expected a string or a list of strings", other)),
    }
}

/// `true`/`false`, also accepting the strings "true" and "false"
pub(crate) fn flag(value: &Value, context: &'static str) -> Result<bool, RuleError> {
    match value {
        Value::Bool(flag) => Ok(*flag),
        Value::Null => Ok(false),
        Value::String(text) if text == "true" => Ok(true),
        Value::String(text) if text == "false" => Ok(false),
        other => Err(RuleError::invalid(context, "expected true or false", other)),
    }
}

fn kinds(value: &Value) -> Result<BTreeSet<NodeKind>, RuleError> {
    let mut kinds = BTreeSet::new();
    for name in strings(value, "type")? {
        let parsed = NodeKind::parse(&name)
            .ok_or_else(|| RuleError::invalid("type", format!("unknown type {name:?}"), value))?;
        kinds.extend(parsed);
    }
    Ok(kinds)
}

fn privacy(value: &Value) -> Result<BTreeSet<Visibility>, RuleError> {
    strings(value, "privacy")?
        .iter()
        .map(|name| {
            Visibility::parse(name)
                .ok_or_else(|| RuleError::invalid("privacy", format!("unknown privacy {name:?}"), value))
        })
        .collect()
}

fn scalars(value: &Value) -> Result<BTreeSet<Scalar>, RuleError> {
    match value {
        Value::Sequence(items) => items.iter().map(scalar).collect(),
        other => Ok(BTreeSet::from([scalar(other)?])),
    }
}

fn scalar(value: &Value) -> Result<Scalar, RuleError> {
    match value {
        Value::Null => Ok(Scalar::Nil),
        Value::Bool(flag) => Ok(Scalar::Bool(*flag)),
        Value::Number(number) => {
            if let Some(integer) = number.as_i64() {
                Ok(Scalar::Integer(integer))
            } else if let Some(float) = number.as_f64() {
                Ok(Scalar::float(float))
            } else {
                Err(RuleError::invalid("literal", "number out of range", value))
            }
        }
        Value::String(text) => Ok(Scalar::String(text.clone())),
        other => Err(RuleError::invalid("literal", "expected a scalar value", other)),
    }
}
