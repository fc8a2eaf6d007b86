// Parallel collection over every discovered file using rayon

use super::FileCollector;
use crate::collection::{Collection, FileFacts};
use crate::config::ParseErrorPolicy;
use crate::discovery::{FileKind, SourceFile};
use crate::error::CollectError;
use crate::parser::precompile;
use crate::rules::RuleSet;
use indicatif::ProgressBar;
use rayon::prelude::*;
use tracing::{debug, info, warn};

/// Collects facts from many files on the rayon pool
pub struct ParallelCollector<'r> {
    rules: &'r RuleSet,
    progress: Option<ProgressBar>,
}

impl<'r> ParallelCollector<'r> {
    pub fn new(rules: &'r RuleSet) -> Self {
        Self {
            rules,
            progress: None,
        }
    }

    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Collect every file and merge the facts in file order
    pub fn collect(&self, files: &[SourceFile]) -> Result<Collection, CollectError> {
        info!("Collecting {} files in parallel...", files.len());

        let results: Vec<Result<FileFacts, CollectError>> = files
            .par_iter()
            .map(|file| {
                let result = self.collect_file(file);
                if let Some(progress) = &self.progress {
                    progress.inc(1);
                }
                result
            })
            .collect();

        if let Some(progress) = &self.progress {
            progress.finish_and_clear();
        }

        let mut collection = Collection::new();
        for (file, result) in files.iter().zip(results) {
            match result {
                Ok(facts) => {
                    debug!(
                        "{}: {} definitions, {} calls",
                        file.relative.display(),
                        facts.definitions.len(),
                        facts.calls.len()
                    );
                    collection.add_file(facts);
                }
                Err(e) if e.is_parse_failure() && self.rules.parse_errors() == ParseErrorPolicy::Skip => {
                    warn!("Skipping {}: {}", file.relative.display(), e);
                }
                Err(e) => return Err(e),
            }
        }

        info!(
            "Collected {} definitions and {} distinct called names",
            collection.definitions.len(),
            collection.calls.len() + collection.test_calls.len()
        );
        Ok(collection)
    }

    /// Read, precompile if needed, and collect a single file
    pub fn collect_file(&self, file: &SourceFile) -> Result<FileFacts, CollectError> {
        let contents = file.read_contents().map_err(|source| CollectError::Io {
            path: file.path.clone(),
            source,
        })?;

        let source = match file.kind {
            FileKind::Ruby => contents,
            FileKind::Precompiled(format) => precompile(format, &file.relative, &contents)?,
        };

        FileCollector::new(self.rules).collect(&file.relative, file.test, &source)
    }
}
