use crate::error::RuleError;
use ignore::gitignore::{Gitignore, GitignoreBuilder};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Gitignore-style path patterns rooted at the project root
///
/// A path matches when the patterns would "ignore" it, so `!pattern`
/// lines re-exclude paths as they do in `.gitignore`.
#[derive(Clone)]
pub struct PathGlob {
    root: PathBuf,
    patterns: Vec<String>,
    compiled: Arc<Gitignore>,
}

impl PathGlob {
    /// Compile `patterns`; an empty list means "unconstrained" and yields `None`
    pub fn new<S: AsRef<str>>(root: &Path, patterns: &[S]) -> Result<Option<Self>, RuleError> {
        let patterns: Vec<String> = patterns
            .iter()
            .map(|p| p.as_ref().trim().to_string())
            .filter(|p| !p.is_empty())
            .collect();
        if patterns.is_empty() {
            return Ok(None);
        }

        let mut builder = GitignoreBuilder::new(root);
        for pattern in &patterns {
            builder
                .add_line(None, pattern)
                .map_err(|source| RuleError::PathPattern {
                    pattern: pattern.clone(),
                    source,
                })?;
        }
        let compiled = builder.build().map_err(|source| RuleError::PathPattern {
            pattern: patterns.join(", "),
            source,
        })?;

        Ok(Some(Self {
            root: root.to_path_buf(),
            patterns,
            compiled: Arc::new(compiled),
        }))
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    /// Match a file path, absolute or relative to the root
    pub fn matches(&self, path: &Path) -> bool {
        let absolute = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        };
        // the gitignore matcher only accepts paths under its root
        if !absolute.starts_with(&self.root) {
            return false;
        }
        self.compiled
            .matched_path_or_any_parents(&absolute, false)
            .is_ignore()
    }
}

impl std::fmt::Debug for PathGlob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PathGlob")
            .field("root", &self.root)
            .field("patterns", &self.patterns)
            .finish()
    }
}

impl PartialEq for PathGlob {
    fn eq(&self, other: &Self) -> bool {
        self.root == other.root && self.patterns == other.patterns
    }
}

impl Eq for PathGlob {}

impl Hash for PathGlob {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.root.hash(state);
        self.patterns.hash(state);
    }
}

#[derive(Serialize, Deserialize)]
struct PathGlobRepr {
    root: PathBuf,
    patterns: Vec<String>,
}

impl Serialize for PathGlob {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        PathGlobRepr {
            root: self.root.clone(),
            patterns: self.patterns.clone(),
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for PathGlob {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let repr = PathGlobRepr::deserialize(deserializer)?;
        PathGlob::new(&repr.root, &repr.patterns)
            .map_err(serde::de::Error::custom)?
            .ok_or_else(|| serde::de::Error::custom("empty path pattern list"))
    }
}
