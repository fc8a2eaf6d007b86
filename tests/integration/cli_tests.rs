//! CLI integration tests
//!
//! These tests verify that the CLI works correctly with various options.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

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

fn leftovers(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("leftovers").unwrap();
    cmd.arg(dir).arg("--no-progress").env("NO_COLOR", "1");
    cmd
}

fn sample() -> TempDir {
    project(&[
        (
            "lib/shop.rb",
            r#"
class Shop
  def open; end
  def close; end
  def audit; end
end
"#,
        ),
        ("bin/run.rb", "Shop.new.open\n"),
        ("spec/shop_spec.rb", "Shop.new.audit\n"),
    ])
}

// ============================================================================
// Basic CLI Tests
// ============================================================================

#[test]
fn test_cli_help() {
    Command::cargo_bin("leftovers")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("leftovers"))
        .stdout(predicate::str::contains("--write-todo"))
        .stdout(predicate::str::contains("--parse-errors"));
}

#[test]
fn test_cli_version() {
    Command::cargo_bin("leftovers")
        .unwrap()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_cli_missing_path_fails() {
    Command::cargo_bin("leftovers")
        .unwrap()
        .arg("/definitely/not/a/project")
        .assert()
        .failure();
}

// ============================================================================
// Reporting
// ============================================================================

#[test]
fn test_cli_reports_leftovers_and_fails() {
    let dir = sample();
    leftovers(dir.path())
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Only directly called in tests"))
        .stdout(predicate::str::contains("lib/shop.rb:5:7 audit"))
        .stdout(predicate::str::contains("Not directly called at all"))
        .stdout(predicate::str::contains("lib/shop.rb:4:7 close"));
}

#[test]
fn test_cli_clean_project_succeeds() {
    let dir = project(&[("lib/app.rb", "def run; end\nrun\n")]);
    leftovers(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Everything is used"));
}

#[test]
fn test_cli_json_output() {
    let dir = sample();
    let output = leftovers(dir.path())
        .args(["--format", "json", "--quiet"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["total_issues"], 2);
    assert_eq!(value["summary"]["test_only"], 1);
    assert_eq!(value["issues"][0]["definition"]["names"][0], "audit");
}

#[test]
fn test_cli_json_output_file() {
    let dir = sample();
    let report = dir.path().join("report.json");
    leftovers(dir.path())
        .args(["--format", "json", "--output"])
        .arg(&report)
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Report written to"));
    assert!(report.exists());
}

#[test]
fn test_cli_format_from_config() {
    let dir = sample();
    fs::write(dir.path().join(".leftovers.yml"), "report:\n  format: json\n").unwrap();
    leftovers(dir.path())
        .arg("--quiet")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("\"total_issues\": 2"));
}

#[test]
fn test_cli_invalid_config_fails() {
    let dir = sample();
    fs::write(
        dir.path().join(".leftovers.yml"),
        "dynamic:\n  name: x\n  calls:\n    bogus: 1\n",
    )
    .unwrap();
    leftovers(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("bogus"));
}

// ============================================================================
// Todo file
// ============================================================================

#[test]
fn test_cli_write_todo() {
    let dir = sample();
    leftovers(dir.path())
        .arg("--write-todo")
        .assert()
        .success()
        .stdout(predicate::str::contains("Todo file written to"));

    let todo = fs::read_to_string(dir.path().join(".leftovers_todo.yml")).unwrap();
    assert!(todo.contains("test_only:"));
    assert!(todo.contains("  - \"audit\" # lib/shop.rb:5:7"));
    assert!(todo.contains("keep:"));
    assert!(todo.contains("  - \"close\" # lib/shop.rb:4:7"));

    // the todo file now hides both leftovers
    leftovers(dir.path()).assert().success();

    // regenerating ignores the previous todo file
    leftovers(dir.path())
        .arg("--write-todo")
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed previous"));
    let regenerated = fs::read_to_string(dir.path().join(".leftovers_todo.yml")).unwrap();
    assert!(regenerated.contains("\"close\""));
}

// ============================================================================
// Parse errors
// ============================================================================

#[test]
fn test_cli_parse_errors_abort() {
    let dir = project(&[("lib/broken.rb", "def broken(\n  class end end\n")]);
    leftovers(dir.path()).assert().success();
    leftovers(dir.path())
        .args(["--parse-errors", "abort"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("broken.rb"));
}
