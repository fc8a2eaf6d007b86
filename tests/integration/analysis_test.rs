//! Integration tests for the leftovers analysis
//!
//! These tests run the whole pipeline over temporary projects: discovery,
//! parallel collection and reachability.

use leftovers::config::{ConfigLoader, ParseErrorPolicy};
use leftovers::discovery::FileFinder;
use leftovers::{CollectError, LeftoverReport, ParallelCollector, ReachabilityAnalyzer, RuleSet};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Create a project directory with the given files
fn project(files: &[(&str, &str)]) -> TempDir {
    let dir = tempfile::Builder::new().prefix("project").tempdir().unwrap();
    for (path, contents) in files {
        let path = dir.path().join(path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, contents).unwrap();
    }
    dir
}

fn rules(root: &Path) -> RuleSet {
    let config = ConfigLoader::new(root).load().unwrap();
    RuleSet::build(&config, root).unwrap()
}

fn analyze_with(rules: &RuleSet) -> Result<LeftoverReport, CollectError> {
    let files = FileFinder::new(rules).find_files();
    let collection = ParallelCollector::new(rules).collect(&files)?;
    Ok(ReachabilityAnalyzer::new(rules).analyze(&collection))
}

fn analyze(root: &Path) -> LeftoverReport {
    analyze_with(&rules(root)).unwrap()
}

fn names(leftovers: &[leftovers::Leftover]) -> Vec<String> {
    leftovers.iter().map(|l| l.definition.name()).collect()
}

#[test]
fn test_unused_method_is_reported() {
    let dir = project(&[
        (
            "lib/greeter.rb",
            r#"
class Greeter
  def greet
    "hello"
  end

  def farewell
    "bye"
  end
end
"#,
        ),
        ("bin/run.rb", "puts Greeter.new.greet\n"),
    ]);

    let report = analyze(dir.path());
    assert_eq!(names(&report.never_called), vec!["farewell"]);
    assert!(report.test_only.is_empty());
    assert_eq!(report.files, 2);

    let farewell = &report.never_called[0].definition;
    assert_eq!(farewell.location.file, Path::new("lib/greeter.rb"));
    assert_eq!(farewell.location.line, 7);
    assert_eq!(farewell.source_line.trim(), "def farewell");
}

#[test]
fn test_test_only_calls_are_split() {
    let dir = project(&[
        (
            "lib/calculator.rb",
            r#"
class Calculator
  def add(a, b)
    a + b
  end

  def debug_dump; end
end
"#,
        ),
        ("bin/calc.rb", "Calculator.new.add(1, 2)\n"),
        (
            "spec/calculator_spec.rb",
            r#"
def build_calculator
  Calculator.new
end

build_calculator.debug_dump
"#,
        ),
    ]);

    let report = analyze(dir.path());
    assert_eq!(names(&report.test_only), vec!["debug_dump"]);
    assert!(report.never_called.is_empty(), "spec helpers called from specs are used");
}

#[test]
fn test_accessor_used_through_writer() {
    let dir = project(&[
        ("lib/user.rb", "class User\n  attr_accessor :name, :email\nend\n"),
        ("bin/run.rb", "user = User.new\nuser.name = 'a'\n"),
    ]);

    let report = analyze(dir.path());
    assert_eq!(names(&report.never_called), vec!["email, email="]);
}

#[test]
fn test_project_config_keeps_and_tolerates() {
    let dir = project(&[
        (
            ".leftovers.yml",
            r#"
keep:
  has_prefix: api_
test_only:
  has_suffix: _for_tests
"#,
        ),
        (
            "lib/service.rb",
            r#"
class Service
  def api_status; end
  def reset_for_tests; end
  def stale; end
end
"#,
        ),
        ("bin/run.rb", "Service.new\n"),
        ("test/service_test.rb", "Service.new.reset_for_tests\n"),
    ]);

    let report = analyze(dir.path());
    assert!(report.test_only.is_empty());
    assert_eq!(names(&report.never_called), vec!["stale"]);
}

#[test]
fn test_keep_by_privacy_uses_private_sections() {
    let dir = project(&[
        (".leftovers.yml", "keep:\n  privacy: private\n"),
        (
            "lib/vault.rb",
            r#"
class Vault
  def unused_public; end

  private

  def unused_private; end
end
"#,
        ),
        ("bin/run.rb", "Vault.new\n"),
    ]);

    let report = analyze(dir.path());
    assert_eq!(names(&report.never_called), vec!["unused_public"]);
}

#[test]
fn test_precompiled_yaml_calls() {
    let dir = project(&[
        (
            ".leftovers.yml",
            r#"
precompile:
  paths: 'config/*.yml'
  format: yaml
dynamic:
  document: true
  calls:
    keywords: '**'
    add_suffix: _job
"#,
        ),
        ("config/schedule.yml", "cleanup: daily\nreport: weekly\n"),
        (
            "lib/jobs.rb",
            r#"
def cleanup_job; end
def report_job; end
def orphan_job; end
"#,
        ),
    ]);

    let report = analyze(dir.path());
    assert_eq!(names(&report.never_called), vec!["orphan_job"]);
}

#[test]
fn test_excluded_and_ignored_files_are_skipped() {
    let dir = project(&[
        ("vendor/gem/lib/unused.rb", "def vendored; end\n"),
        (".ignore", "generated/\n"),
        ("generated/api.rb", "def generated_method; end\n"),
        ("lib/main.rb", "puts 1\n"),
    ]);

    let files = FileFinder::new(&rules(dir.path())).find_files();
    let relative: Vec<_> = files.iter().map(|f| f.relative.clone()).collect();
    assert!(relative.iter().any(|p| p == Path::new("lib/main.rb")));
    assert!(!relative.iter().any(|p| p.starts_with("vendor")));
    assert!(!relative.iter().any(|p| p.starts_with("generated")));
}

#[test]
fn test_parse_errors_policy() {
    let dir = project(&[
        ("lib/broken.rb", "def broken(\n  class end end\n"),
        ("lib/fine.rb", "def fine; end\n"),
    ]);

    let rules = rules(dir.path());
    let report = analyze_with(&rules).unwrap();
    assert_eq!(names(&report.never_called), vec!["fine"]);

    let abort = rules.with_parse_errors(ParseErrorPolicy::Abort);
    let error = analyze_with(&abort).unwrap_err();
    assert!(error.is_parse_failure());
}

#[test]
fn test_todo_file_hides_existing_leftovers() {
    let dir = project(&[("lib/old.rb", "def legacy; end\n")]);
    let report = analyze(dir.path());
    assert_eq!(names(&report.never_called), vec!["legacy"]);

    let todo = leftovers::TodoFile::new(dir.path());
    todo.write(&report).unwrap();

    let report = analyze(dir.path());
    assert!(report.is_empty());
}

#[test]
fn test_results_are_deterministic() {
    let dir = project(&[
        ("lib/a.rb", "def a_one; end\ndef a_two; end\n"),
        ("lib/b.rb", "def b_one; end\n"),
        ("lib/c.rb", "def c_one; end\n"),
    ]);

    let first = names(&analyze(dir.path()).never_called);
    let second = names(&analyze(dir.path()).never_called);
    assert_eq!(first, vec!["a_one", "a_two", "b_one", "c_one"]);
    assert_eq!(first, second);
}
