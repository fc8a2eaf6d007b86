//! Boolean predicates over syntax nodes, argument keys and definitions.
//!
//! A [`Matcher`] is an immutable tree built once from configuration by
//! [`MatcherBuilder`]. Anything that can be matched implements [`Subject`];
//! leaves ask the subject for one property (name, literal type, path, ...)
//! and a subject that lacks that property simply does not match.

pub(crate) mod builder;
mod pair_rule;
mod path;

pub use builder::MatcherBuilder;
pub use pair_rule::PairRule;
pub use path::PathGlob;

use crate::collection::Visibility;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::borrow::Cow;
use std::collections::BTreeSet;
use std::hash::{Hash, Hasher};
use std::path::Path;

/// Literal and definition types usable with `type:`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NodeKind {
    String,
    Symbol,
    Integer,
    Float,
    Array,
    Hash,
    Proc,
    Nil,
    True,
    False,
    Method,
    Constant,
    InstanceVariable,
    ClassVariable,
    GlobalVariable,
}

impl NodeKind {
    /// Parse a configured type name; some names stand for several kinds
    pub fn parse(name: &str) -> Option<Vec<NodeKind>> {
        let kinds = match name {
            "String" | "string-literal" => vec![NodeKind::String],
            "Symbol" | "atom-literal" => vec![NodeKind::Symbol],
            "Integer" => vec![NodeKind::Integer],
            "Float" => vec![NodeKind::Float],
            "Numeric" | "numeric-literal" => vec![NodeKind::Integer, NodeKind::Float],
            "Array" => vec![NodeKind::Array],
            "Hash" => vec![NodeKind::Hash],
            "Proc" => vec![NodeKind::Proc],
            "Nil" | "NilClass" => vec![NodeKind::Nil],
            "True" | "TrueClass" => vec![NodeKind::True],
            "False" | "FalseClass" => vec![NodeKind::False],
            "Boolean" => vec![NodeKind::True, NodeKind::False],
            "Method" => vec![NodeKind::Method],
            "Constant" => vec![NodeKind::Constant],
            "InstanceVariable" => vec![NodeKind::InstanceVariable],
            "ClassVariable" => vec![NodeKind::ClassVariable],
            "GlobalVariable" => vec![NodeKind::GlobalVariable],
            _ => return None,
        };
        Some(kinds)
    }
}

/// A literal scalar value usable with `literal:` and `has_value:`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Scalar {
    Nil,
    Bool(bool),
    Integer(i64),
    /// Stored as bits so the value stays hashable
    Float(u64),
    String(String),
}

impl Scalar {
    pub fn float(value: f64) -> Self {
        // -0.0 and 0.0 compare equal in Ruby
        let value = if value == 0.0 { 0.0 } else { value };
        Scalar::Float(value.to_bits())
    }
}

/// Anchored regular expression compared by its source text
#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    regex: Regex,
}

impl Pattern {
    pub fn new(source: &str) -> Result<Self, regex::Error> {
        let regex = Regex::new(&format!("^(?:{})$", source))?;
        Ok(Self {
            source: source.to_string(),
            regex,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl Eq for Pattern {}

impl Hash for Pattern {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.source.hash(state);
    }
}

impl Serialize for Pattern {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.source)
    }
}

impl<'de> Deserialize<'de> for Pattern {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let source = String::deserialize(deserializer)?;
        Pattern::new(&source).map_err(serde::de::Error::custom)
    }
}

/// Something a matcher can be evaluated against
///
/// Every property defaults to "absent", which makes the corresponding leaf
/// matchers fail rather than error.
pub trait Subject {
    fn name(&self) -> Option<Cow<'_, str>>;

    fn kind(&self) -> Option<NodeKind> {
        None
    }

    fn scalar(&self) -> Option<Scalar> {
        None
    }

    fn path(&self) -> Option<&Path> {
        None
    }

    fn visibility(&self) -> Option<Visibility> {
        None
    }

    /// Index of a positional argument key
    fn position(&self) -> Option<usize> {
        None
    }

    /// Whether this is a keyword argument key
    fn is_keyword(&self) -> bool {
        false
    }

    fn has_block(&self) -> bool {
        false
    }

    /// Whether the receiver exists and, if given, matches `pattern`
    fn match_receiver(&self, _pattern: Option<&Matcher>) -> bool {
        false
    }

    /// Whether any argument key/value pair satisfies `rule`
    fn match_arguments(&self, _rule: &PairRule) -> bool {
        false
    }
}

impl Subject for str {
    fn name(&self) -> Option<Cow<'_, str>> {
        Some(Cow::Borrowed(self))
    }
}

impl Subject for String {
    fn name(&self) -> Option<Cow<'_, str>> {
        Some(Cow::Borrowed(self.as_str()))
    }
}

/// Compiled predicate
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Matcher {
    /// Name is one of the set
    Name(BTreeSet<String>),
    Prefix(String),
    Suffix(String),
    Regex(Pattern),
    /// Literal or definition type is one of the set
    Type(BTreeSet<NodeKind>),
    /// Literal scalar value is one of the set
    Literal(BTreeSet<Scalar>),
    Path(PathGlob),
    Privacy(BTreeSet<Visibility>),
    /// Positional argument key at one of these indexes
    Position(BTreeSet<usize>),
    /// Positional argument key at this index or later
    PositionFrom(usize),
    AnyKeyword,
    /// Receiver present and matching
    Receiver(Box<Matcher>),
    AnyReceiver,
    Argument(Box<PairRule>),
    Block,
    And(Box<Matcher>, Box<Matcher>),
    All(Vec<Matcher>),
    Or(Box<Matcher>, Box<Matcher>),
    Any(Vec<Matcher>),
    Not(Box<Matcher>),
}

impl Matcher {
    pub fn name(name: impl Into<String>) -> Self {
        Matcher::Name(BTreeSet::from([name.into()]))
    }

    pub fn matches<S: Subject + ?Sized>(&self, subject: &S) -> bool {
        match self {
            Matcher::Name(names) => subject.name().is_some_and(|n| names.contains(n.as_ref())),
            Matcher::Prefix(prefix) => subject.name().is_some_and(|n| n.starts_with(prefix.as_str())),
            Matcher::Suffix(suffix) => subject.name().is_some_and(|n| n.ends_with(suffix.as_str())),
            Matcher::Regex(pattern) => subject.name().is_some_and(|n| pattern.is_match(&n)),
            Matcher::Type(kinds) => subject.kind().is_some_and(|k| kinds.contains(&k)),
            Matcher::Literal(values) => subject.scalar().is_some_and(|v| values.contains(&v)),
            Matcher::Path(glob) => subject.path().is_some_and(|p| glob.matches(p)),
            Matcher::Privacy(levels) => subject.visibility().is_some_and(|v| levels.contains(&v)),
            Matcher::Position(indexes) => subject.position().is_some_and(|i| indexes.contains(&i)),
            Matcher::PositionFrom(first) => subject.position().is_some_and(|i| i >= *first),
            Matcher::AnyKeyword => subject.is_keyword(),
            Matcher::Receiver(pattern) => subject.match_receiver(Some(pattern)),
            Matcher::AnyReceiver => subject.match_receiver(None),
            Matcher::Argument(rule) => subject.match_arguments(rule),
            Matcher::Block => subject.has_block(),
            Matcher::And(a, b) => a.matches(subject) && b.matches(subject),
            Matcher::All(list) => list.iter().all(|m| m.matches(subject)),
            Matcher::Or(a, b) => a.matches(subject) || b.matches(subject),
            Matcher::Any(list) => list.iter().any(|m| m.matches(subject)),
            Matcher::Not(inner) => !inner.matches(subject),
        }
    }

    pub fn negate(self) -> Matcher {
        match self {
            Matcher::Not(inner) => *inner,
            other => Matcher::Not(Box::new(other)),
        }
    }
}

/// Conjunction of the given matchers; `None` entries are unconstrained
pub fn and(matchers: impl IntoIterator<Item = Option<Matcher>>) -> Option<Matcher> {
    let mut flat: Vec<Matcher> = Vec::new();
    for matcher in matchers.into_iter().flatten() {
        match matcher {
            Matcher::And(a, b) => {
                push_unique(&mut flat, *a);
                push_unique(&mut flat, *b);
            }
            Matcher::All(list) => list.into_iter().for_each(|m| push_unique(&mut flat, m)),
            other => push_unique(&mut flat, other),
        }
    }
    combine(flat, Matcher::And, Matcher::All)
}

/// Disjunction of the given matchers; `None` entries are skipped
///
/// Plain name and position sets are merged into a single set leaf.
pub fn or(matchers: impl IntoIterator<Item = Option<Matcher>>) -> Option<Matcher> {
    let mut names: BTreeSet<String> = BTreeSet::new();
    let mut positions: BTreeSet<usize> = BTreeSet::new();
    let mut rest: Vec<Matcher> = Vec::new();

    let mut pending: Vec<Matcher> = matchers.into_iter().flatten().collect();
    pending.reverse();
    while let Some(matcher) = pending.pop() {
        match matcher {
            Matcher::Or(a, b) => {
                pending.push(*b);
                pending.push(*a);
            }
            Matcher::Any(list) => pending.extend(list.into_iter().rev()),
            Matcher::Name(set) => names.extend(set),
            Matcher::Position(set) => positions.extend(set),
            other => push_unique(&mut rest, other),
        }
    }

    let mut flat = Vec::new();
    if !names.is_empty() {
        flat.push(Matcher::Name(names));
    }
    if !positions.is_empty() {
        flat.push(Matcher::Position(positions));
    }
    flat.extend(rest);
    combine(flat, Matcher::Or, Matcher::Any)
}

fn push_unique(list: &mut Vec<Matcher>, matcher: Matcher) {
    if !list.contains(&matcher) {
        list.push(matcher);
    }
}

fn combine(
    mut flat: Vec<Matcher>,
    pair: fn(Box<Matcher>, Box<Matcher>) -> Matcher,
    many: fn(Vec<Matcher>) -> Matcher,
) -> Option<Matcher> {
    match flat.len() {
        0 => None,
        1 => flat.pop(),
        2 => {
            let b = flat.pop()?;
            let a = flat.pop()?;
            Some(pair(Box::new(a), Box::new(b)))
        }
        _ => Some(many(flat)),
    }
}
