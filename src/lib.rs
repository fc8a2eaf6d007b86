//! Leftovers - find unused methods, constants and accessors in Ruby projects
//!
//! This library collects definitions and calls from Ruby sources and reports
//! the definitions nothing calls. Metaprogramming is described by
//! declarative rules, so `attr_accessor`, `send`, `define_method` and friends
//! are understood without running any Ruby.
//!
//! # Architecture
//!
//! The analysis pipeline consists of:
//! 1. **Configuration** - Merge the built-in Ruby profile, `.leftovers.yml` and the todo file
//! 2. **Rule building** - Compile the configuration into an immutable [`RuleSet`]
//! 3. **File Discovery** - Walk the project and classify files as source, data or test
//! 4. **Collection** - Parse each file with tree-sitter and record its definitions and calls
//! 5. **Reachability Analysis** - Report definitions whose names are never called
//! 6. **Reporting** - Output results, or write them to `.leftovers_todo.yml`

pub mod analysis;
pub mod collection;
pub mod collector;
pub mod config;
pub mod discovery;
pub mod error;
pub mod matcher;
pub mod parser;
pub mod processor;
pub mod report;
pub mod rules;
pub mod todo;

pub use analysis::{Leftover, LeftoverIssue, LeftoverReport, ReachabilityAnalyzer};
pub use collection::{Call, Collection, Definition, DefinitionKind, FileFacts, Location, Visibility};
pub use collector::{FileCollector, ParallelCollector};
pub use config::{Config, ConfigLoader, ParseErrorPolicy};
pub use discovery::{FileFinder, SourceFile};
pub use error::{CollectError, RuleError};
pub use report::{ReportFormat, Reporter};
pub use rules::RuleSet;
pub use todo::TodoFile;
