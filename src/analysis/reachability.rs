use super::{DefinitionName, Leftover, LeftoverIssue, LeftoverReport};
use crate::collection::{Collection, Definition};
use crate::matcher::Matcher;
use crate::rules::RuleSet;
use tracing::{debug, info};

/// Decides which definitions are leftovers
///
/// A definition is used when any of its names is called from a non-test
/// file, or when it is test-tolerant and any name is called from a test.
/// Kept definitions are never reported.
pub struct ReachabilityAnalyzer<'r> {
    keep: Option<&'r Matcher>,
    test_only: Option<&'r Matcher>,
}

impl<'r> ReachabilityAnalyzer<'r> {
    pub fn new(rules: &'r RuleSet) -> Self {
        Self {
            keep: rules.keep(),
            test_only: rules.test_only(),
        }
    }

    pub fn analyze(&self, collection: &Collection) -> LeftoverReport {
        info!("Checking {} definitions...", collection.definitions.len());

        let mut report = LeftoverReport {
            files: collection.files,
            definitions: collection.definitions.len(),
            ..LeftoverReport::default()
        };

        for definition in &collection.definitions {
            if self.is_kept(definition) || self.is_used(definition, collection) {
                continue;
            }

            let tested = definition.names.iter().any(|name| collection.is_test_called(name));
            let issue = if tested {
                LeftoverIssue::TestOnly
            } else {
                LeftoverIssue::NeverCalled
            };
            debug!("Leftover: {} ({})", definition.name(), definition.location);

            let leftover = Leftover::new(definition.clone(), issue);
            match issue {
                LeftoverIssue::TestOnly => report.test_only.push(leftover),
                LeftoverIssue::NeverCalled => report.never_called.push(leftover),
            }
        }

        // Sort by file and location for consistent output
        for list in [&mut report.test_only, &mut report.never_called] {
            list.sort_by(|a, b| {
                a.definition
                    .location
                    .cmp(&b.definition.location)
                    .then_with(|| a.definition.names.cmp(&b.definition.names))
            });
        }

        info!(
            "Found {} leftovers ({} only called in tests)",
            report.total(),
            report.test_only.len()
        );
        report
    }

    pub fn is_used(&self, definition: &Definition, collection: &Collection) -> bool {
        if definition.names.iter().any(|name| collection.is_called(name)) {
            return true;
        }
        self.is_test_tolerant(definition) && definition.names.iter().any(|name| collection.is_test_called(name))
    }

    pub fn is_kept(&self, definition: &Definition) -> bool {
        definition.keep || self.any_name_matches(self.keep, definition)
    }

    pub fn is_test_tolerant(&self, definition: &Definition) -> bool {
        definition.test || definition.test_only || self.any_name_matches(self.test_only, definition)
    }

    fn any_name_matches(&self, matcher: Option<&Matcher>, definition: &Definition) -> bool {
        let Some(matcher) = matcher else {
            return false;
        };
        definition.names.iter().any(|name| {
            matcher.matches(&DefinitionName {
                name,
                definition,
            })
        })
    }
}
