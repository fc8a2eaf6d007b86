//! Facts collected from source files.
//!
//! Each analyzed file yields a [`FileFacts`]; a run merges them into one
//! [`Collection`]. Merging only appends definitions and unions call names,
//! so the order files are merged in never changes the result.

mod definition;

pub use definition::{Call, Definition, DefinitionKind, Location, Span, Visibility};

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;

/// Definitions and calls found in a single file, in discovery order
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileFacts {
    /// Path relative to the project root
    pub path: PathBuf,
    /// Whether the file is under `test_paths`
    pub test: bool,
    pub definitions: Vec<Definition>,
    pub calls: Vec<Call>,
}

impl FileFacts {
    pub fn new(path: PathBuf, test: bool) -> Self {
        Self {
            path,
            test,
            definitions: Vec::new(),
            calls: Vec::new(),
        }
    }

    pub fn call_names(&self) -> impl Iterator<Item = &str> {
        self.calls.iter().map(|c| c.name.as_str())
    }

    pub fn definition_names(&self) -> impl Iterator<Item = &str> {
        self.definitions
            .iter()
            .flat_map(|d| d.names.iter().map(String::as_str))
    }
}

/// Facts merged across the whole project
#[derive(Debug, Clone, Default)]
pub struct Collection {
    pub definitions: Vec<Definition>,
    /// Names called from non-test files
    pub calls: HashSet<String>,
    /// Names called from test files
    pub test_calls: HashSet<String>,
    /// Number of files merged in
    pub files: usize,
}

impl Collection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one file's facts
    pub fn add_file(&mut self, facts: FileFacts) {
        let calls = if facts.test {
            &mut self.test_calls
        } else {
            &mut self.calls
        };
        calls.extend(facts.calls.into_iter().map(|c| c.name));
        self.definitions.extend(facts.definitions);
        self.files += 1;
    }

    /// Merge another partial collection into this one
    pub fn merge(&mut self, other: Collection) {
        self.definitions.extend(other.definitions);
        self.calls.extend(other.calls);
        self.test_calls.extend(other.test_calls);
        self.files += other.files;
    }

    pub fn is_called(&self, name: &str) -> bool {
        self.calls.contains(name)
    }

    pub fn is_test_called(&self, name: &str) -> bool {
        self.test_calls.contains(name)
    }
}

impl FromIterator<FileFacts> for Collection {
    fn from_iter<I: IntoIterator<Item = FileFacts>>(iter: I) -> Self {
        let mut collection = Collection::new();
        for facts in iter {
            collection.add_file(facts);
        }
        collection
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn facts(path: &str, test: bool, calls: &[&str]) -> FileFacts {
        let mut facts = FileFacts::new(PathBuf::from(path), test);
        for (i, name) in calls.iter().enumerate() {
            facts.calls.push(Call::new(*name, Span::new(i + 1, 1, 0, 0)));
        }
        facts
    }

    #[test]
    fn test_calls_split_by_test_flag() {
        let collection: Collection = vec![
            facts("lib/a.rb", false, &["foo"]),
            facts("spec/a_spec.rb", true, &["bar"]),
        ]
        .into_iter()
        .collect();

        assert!(collection.is_called("foo"));
        assert!(!collection.is_called("bar"));
        assert!(collection.is_test_called("bar"));
        assert_eq!(collection.files, 2);
    }

    #[test]
    fn test_merge_matches_sequential_add() {
        let mut left = Collection::new();
        left.add_file(facts("lib/a.rb", false, &["a"]));
        let mut right = Collection::new();
        right.add_file(facts("lib/b.rb", false, &["b"]));
        left.merge(right);

        assert!(left.is_called("a") && left.is_called("b"));
        assert_eq!(left.files, 2);
    }
}
