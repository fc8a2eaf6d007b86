use crate::parser::PrecompileFormat;
use crate::rules::RuleSet;
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// How a discovered file is collected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileKind {
    Ruby,
    /// A data file converted to Ruby first
    Precompiled(PrecompileFormat),
}

/// Represents a discovered source file
#[derive(Debug, Clone)]
pub struct SourceFile {
    /// Absolute path to the file
    pub path: PathBuf,

    /// Path relative to the project root, used in every report
    pub relative: PathBuf,

    pub kind: FileKind,

    /// Whether the file is under `test_paths`
    pub test: bool,
}

impl SourceFile {
    pub fn new(path: PathBuf, relative: PathBuf, kind: FileKind, test: bool) -> Self {
        Self {
            path,
            relative,
            kind,
            test,
        }
    }

    /// Load and return owned contents
    pub fn read_contents(&self) -> std::io::Result<String> {
        std::fs::read_to_string(&self.path)
    }
}

/// File finder for discovering analyzable files in a project
pub struct FileFinder<'a> {
    rules: &'a RuleSet,
}

impl<'a> FileFinder<'a> {
    pub fn new(rules: &'a RuleSet) -> Self {
        Self { rules }
    }

    /// Find every analyzed file under the rule set's root, sorted by path
    pub fn find_files(&self) -> Vec<SourceFile> {
        let root = self.rules.root();
        debug!("Scanning for files in: {}", root.display());

        let mut files = self.scan_directory(root);
        files.sort_by(|a, b| a.relative.cmp(&b.relative));

        debug!("Found {} files", files.len());
        files
    }

    fn scan_directory(&self, dir: &Path) -> Vec<SourceFile> {
        if !dir.exists() {
            trace!("Directory does not exist: {}", dir.display());
            return Vec::new();
        }

        let walker = WalkBuilder::new(dir)
            .hidden(true)           // Skip hidden files
            .git_ignore(true)       // Respect .gitignore
            .git_global(true)       // Respect global gitignore
            .git_exclude(true)      // Respect .git/info/exclude
            .ignore(true)           // Respect .ignore files
            .parents(true)          // Check parent directories for ignore files
            .follow_links(false)    // Don't follow symlinks
            .build();

        walker
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
            .filter_map(|entry| {
                let path = entry.path();
                let relative = path.strip_prefix(dir).unwrap_or(path).to_path_buf();

                let Some(kind) = self.rules.classify(&relative) else {
                    trace!("Not analyzed: {}", relative.display());
                    return None;
                };
                let test = self.rules.is_test_path(&relative);

                trace!("Found {:?}: {}", kind, relative.display());
                Some(SourceFile::new(path.to_path_buf(), relative, kind, test))
            })
            .collect()
    }
}

/// Statistics about discovered files
#[derive(Debug, Default, PartialEq, Eq)]
pub struct FileStats {
    pub ruby_files: usize,
    pub precompiled_files: usize,
    pub test_files: usize,
}

impl FileStats {
    pub fn from_files(files: &[SourceFile]) -> Self {
        let mut stats = Self::default();
        for file in files {
            match file.kind {
                FileKind::Ruby => stats.ruby_files += 1,
                FileKind::Precompiled(_) => stats.precompiled_files += 1,
            }
            if file.test {
                stats.test_files += 1;
            }
        }
        stats
    }

    pub fn total(&self) -> usize {
        self.ruby_files + self.precompiled_files
    }
}
