use super::{Matcher, Subject};
use serde::{Deserialize, Serialize};

/// Matcher for key/value pairs: call arguments and hash entries
///
/// Pure key patterns are folded into one combined `keys` matcher that is
/// checked first; `pairs` constrain the value as well and are only tried
/// when the key matcher fails. A pair without a key matcher accepts any key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct PairRule {
    keys: Option<Matcher>,
    pairs: Vec<(Option<Matcher>, Matcher)>,
}

impl PairRule {
    pub fn new(keys: Option<Matcher>, pairs: Vec<(Option<Matcher>, Matcher)>) -> Self {
        Self { keys, pairs }
    }

    /// Rule matching any key accepted by `keys`, whatever the value
    pub fn keys(keys: Matcher) -> Self {
        Self {
            keys: Some(keys),
            pairs: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_none() && self.pairs.is_empty()
    }

    pub fn match_pair<K, V>(&self, key: &K, value: &V) -> bool
    where
        K: Subject + ?Sized,
        V: Subject + ?Sized,
    {
        if self.keys.as_ref().is_some_and(|keys| keys.matches(key)) {
            return true;
        }

        self.pairs.iter().any(|(key_matcher, value_matcher)| {
            key_matcher.as_ref().map_or(true, |m| m.matches(key)) && value_matcher.matches(value)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::borrow::Cow;

    /// Minimal argument key for testing
    enum Key {
        Position(usize),
        Keyword(&'static str),
    }

    impl Subject for Key {
        fn name(&self) -> Option<Cow<'_, str>> {
            match self {
                Key::Keyword(name) => Some(Cow::Borrowed(name)),
                Key::Position(_) => None,
            }
        }

        fn position(&self) -> Option<usize> {
            match self {
                Key::Position(i) => Some(*i),
                Key::Keyword(_) => None,
            }
        }

        fn is_keyword(&self) -> bool {
            matches!(self, Key::Keyword(_))
        }
    }

    #[test]
    fn test_key_only_match_ignores_value() {
        let rule = PairRule::keys(Matcher::name("kw"));
        assert!(rule.match_pair(&Key::Keyword("kw"), "anything"));
        assert!(!rule.match_pair(&Key::Keyword("other"), "anything"));
        assert!(!rule.match_pair(&Key::Position(0), "kw"));
    }

    #[test]
    fn test_pair_matches_when_key_matcher_fails() {
        let rule = PairRule::new(
            Some(Matcher::name("kw")),
            vec![(Some(Matcher::PositionFrom(1)), Matcher::name("foo"))],
        );
        assert!(rule.match_pair(&Key::Position(1), "foo"));
        assert!(rule.match_pair(&Key::Position(3), "foo"));
        assert!(!rule.match_pair(&Key::Position(0), "foo"));
        assert!(!rule.match_pair(&Key::Position(1), "bar"));
    }

    #[test]
    fn test_pair_without_key_accepts_any_key() {
        let rule = PairRule::new(None, vec![(None, Matcher::name("foo"))]);
        assert!(rule.match_pair(&Key::Keyword("kw"), "foo"));
        assert!(rule.match_pair(&Key::Position(7), "foo"));
        assert!(!rule.match_pair(&Key::Position(7), "bar"));
    }

    #[test]
    fn test_empty_rule() {
        assert!(PairRule::default().is_empty());
        assert!(!PairRule::default().match_pair(&Key::Position(0), "x"));
    }
}
