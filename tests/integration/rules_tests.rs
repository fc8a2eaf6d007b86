//! Rule set integration tests
//!
//! These tests verify configuration layering and how a configuration is
//! compiled into a rule set.

use leftovers::config::{Config, ConfigLoader, ParseErrorPolicy};
use leftovers::discovery::FileKind;
use leftovers::parser::PrecompileFormat;
use leftovers::todo::TODO_FILE;
use leftovers::{RuleError, RuleSet};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn build(yaml: &str) -> Result<RuleSet, RuleError> {
    let mut config = Config::builtin().unwrap();
    config.merge(Config::from_yaml(yaml).unwrap());
    RuleSet::build(&config, Path::new("/project"))
}

// ============================================================================
// Built-in profile
// ============================================================================

#[test]
fn test_builtin_profile_builds() {
    let rules = build("").unwrap();
    assert!(rules.dynamic().is_some());
    assert!(rules.keep().is_some());
    assert!(rules.test_only().is_none());
}

#[test]
fn test_builtin_paths() {
    let rules = build("").unwrap();
    assert_eq!(rules.classify(Path::new("lib/user.rb")), Some(FileKind::Ruby));
    assert_eq!(rules.classify(Path::new("Rakefile")), Some(FileKind::Ruby));
    assert_eq!(rules.classify(Path::new("tasks/db.rake")), Some(FileKind::Ruby));
    assert_eq!(rules.classify(Path::new("vendor/bundle/gem.rb")), None);
    assert_eq!(rules.classify(Path::new("README.md")), None);

    assert!(rules.is_test_path(Path::new("spec/user_spec.rb")));
    assert!(rules.is_test_path(Path::new("test/user_test.rb")));
    assert!(!rules.is_test_path(Path::new("lib/user.rb")));
}

#[test]
fn test_project_paths_extend_the_profile() {
    let rules = build("include_paths: '*.jbuilder'\nexclude_paths: /generated/\n").unwrap();
    assert_eq!(rules.classify(Path::new("app/views/show.jbuilder")), Some(FileKind::Ruby));
    assert_eq!(rules.classify(Path::new("lib/user.rb")), Some(FileKind::Ruby));
    assert_eq!(rules.classify(Path::new("generated/api.rb")), None);
}

#[test]
fn test_precompile_paths() {
    let rules = build("precompile:\n  - paths: 'config/*.json'\n    format: json\n").unwrap();
    assert_eq!(
        rules.classify(Path::new("config/routes.json")),
        Some(FileKind::Precompiled(PrecompileFormat::Json))
    );
}

// ============================================================================
// Invalid configuration
// ============================================================================

#[test]
fn test_unknown_action_key() {
    let error = build("dynamic:\n  name: x\n  calls:\n    argument: 0\n    bogus: 1\n").unwrap_err();
    assert!(matches!(error, RuleError::Invalid { .. }));
    assert!(error.to_string().contains("bogus"));
}

#[test]
fn test_invalid_regex() {
    let error = build("keep:\n  matches: '(unclosed'\n").unwrap_err();
    assert!(matches!(error, RuleError::Regex { .. }));
}

#[test]
fn test_invalid_yaml_is_reported() {
    assert!(Config::from_yaml("keep: [unclosed").is_err());
}

// ============================================================================
// Layered loading
// ============================================================================

fn project() -> TempDir {
    tempfile::Builder::new().prefix("project").tempdir().unwrap()
}

#[test]
fn test_loader_uses_project_file_and_todo() {
    let dir = project();
    fs::write(dir.path().join(".leftovers.yml"), "keep: project_method\nparse_errors: abort\n").unwrap();
    fs::write(dir.path().join(TODO_FILE), "keep:\n  - \"todo_method\"\n").unwrap();

    let config = ConfigLoader::new(dir.path()).load().unwrap();
    assert_eq!(config.parse_errors(), ParseErrorPolicy::Abort);
    let keep = serde_yaml::to_string(&config.keep).unwrap();
    assert!(keep.contains("project_method"));
    assert!(keep.contains("todo_method"));
    assert!(keep.contains("initialize"));

    let without = ConfigLoader::new(dir.path()).without_todo().load().unwrap();
    let keep = serde_yaml::to_string(&without.keep).unwrap();
    assert!(!keep.contains("todo_method"));
}

#[test]
fn test_loader_reads_toml() {
    let dir = project();
    let path = dir.path().join("custom.toml");
    fs::write(&path, "include_paths = ['*.ru']\nrequires = 'active_support'\n").unwrap();

    let config = ConfigLoader::new(dir.path()).with_file(Some(path)).load().unwrap();
    assert!(config.include_paths.contains(&"*.ru".to_string()));
    assert_eq!(config.requires, vec!["active_support"]);
}

#[test]
fn test_gem_profiles_build_into_rules() {
    let dir = project();
    fs::write(dir.path().join(".leftovers.yml"), "gems: [rspec, minitest]\n").unwrap();

    let config = ConfigLoader::new(dir.path()).load().unwrap();
    let rules = RuleSet::build(&config, dir.path()).unwrap();
    assert!(rules.is_test_path(Path::new("spec/models/user_spec.rb")));
    assert!(rules.is_test_path(Path::new("test/models/user_test.rb")));
    assert!(rules.dynamic().is_some());
}

#[test]
fn test_unknown_gem_is_rejected() {
    let dir = project();
    fs::write(dir.path().join(".leftovers.yml"), "gems: sinatra\n").unwrap();

    let error = ConfigLoader::new(dir.path()).load().unwrap_err();
    let message = error.to_string();
    assert!(message.contains("sinatra"));
    assert!(message.contains("rspec"));
}

#[test]
fn test_missing_config_file_is_an_error() {
    let dir = project();
    let result = ConfigLoader::new(dir.path())
        .with_file(Some(dir.path().join("missing.yml")))
        .load();
    assert!(result.is_err());
}
