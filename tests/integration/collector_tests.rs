//! Collector integration tests
//!
//! These tests run the built-in Ruby profile over small sources and check
//! the definitions and calls each file yields.

use leftovers::collection::{DefinitionKind, FileFacts, Visibility};
use leftovers::config::Config;
use leftovers::{CollectError, FileCollector, RuleSet};
use std::collections::BTreeSet;
use std::path::Path;

/// Rules from the built-in profile plus an extra YAML layer
fn rules_with(yaml: &str) -> RuleSet {
    let mut config = Config::builtin().unwrap();
    config.merge(Config::from_yaml(yaml).unwrap());
    RuleSet::build(&config, Path::new("/project")).unwrap()
}

fn collect_with(rules: &RuleSet, source: &str) -> FileFacts {
    FileCollector::new(rules)
        .collect(Path::new("lib/example.rb"), false, source)
        .unwrap()
}

fn collect(source: &str) -> FileFacts {
    collect_with(&rules_with(""), source)
}

fn calls(facts: &FileFacts) -> Vec<&str> {
    facts.call_names().collect()
}

fn call_set(facts: &FileFacts) -> BTreeSet<&str> {
    facts.call_names().collect()
}

fn set<'a>(names: &[&'a str]) -> BTreeSet<&'a str> {
    names.iter().copied().collect()
}

fn defines(facts: &FileFacts, name: &str) -> bool {
    facts.definition_names().any(|n| n == name)
}

// ============================================================================
// Built-in facts
// ============================================================================

#[test]
fn test_methods_and_calls() {
    let facts = collect(
        r#"
class Greeter
  def greet(name)
    format_name(name)
  end

  def format_name(name)
    name.capitalize
  end
end
"#,
    );

    assert!(defines(&facts, "Greeter"));
    assert!(defines(&facts, "greet"));
    assert!(defines(&facts, "format_name"));

    let calls = calls(&facts);
    assert!(calls.contains(&"format_name"));
    assert!(calls.contains(&"capitalize"));
    assert!(!calls.contains(&"name"), "parameters are locals, not calls");
}

#[test]
fn test_constants_and_variables() {
    let facts = collect(
        r#"
module Config
  LIMIT = 10
  @@count = 0
end

$debug = Config::LIMIT > 5
puts @missing
"#,
    );

    let limit = facts
        .definitions
        .iter()
        .find(|d| d.names == ["LIMIT"])
        .unwrap();
    assert_eq!(limit.kind, DefinitionKind::Constant);
    assert!(defines(&facts, "@@count"));
    assert!(defines(&facts, "$debug"));

    let calls = calls(&facts);
    assert!(calls.contains(&"Config"));
    assert!(calls.contains(&"LIMIT"));
    assert!(calls.contains(&">"));
    assert!(calls.contains(&"@missing"));
}

#[test]
fn test_attribute_assignment_calls_setter() {
    let facts = collect("user.name = 'x'\nuser.count += 1\n");
    let calls = calls(&facts);
    assert!(calls.contains(&"name="));
    assert!(calls.contains(&"count="));
    assert!(calls.contains(&"count"));
}

#[test]
fn test_symbol_block_argument() {
    let facts = collect("items.map(&:to_label)\n");
    assert!(calls(&facts).contains(&"to_label"));
}

#[test]
fn test_block_sees_outer_locals() {
    let facts = collect(
        r#"
def run
  total = 0
  [1, 2].each { |n| total += n }
  total
end
"#,
    );
    let calls = calls(&facts);
    assert!(!calls.contains(&"total"));
    assert!(!calls.contains(&"n"));
}

#[test]
fn test_method_body_is_a_scope_gate() {
    let facts = collect(
        r#"
helper = 1
def run
  helper
end
"#,
    );
    assert!(calls(&facts).contains(&"helper"));
}

// ============================================================================
// Built-in profile rules
// ============================================================================

#[test]
fn test_attr_accessor_defines_reader_and_writer() {
    let facts = collect("class User\n  attr_accessor :name\nend\n");
    let definition = facts
        .definitions
        .iter()
        .find(|d| d.names.contains(&"name".to_string()))
        .unwrap();
    assert_eq!(definition.names, vec!["name", "name="]);
    assert_eq!(definition.location.line, 2);
    assert!(calls(&facts).contains(&"@name"));
}

#[test]
fn test_send_calls_its_argument() {
    let facts = collect("object.send(:secret, 1)\nobject.public_send('shared')\n");
    let calls = calls(&facts);
    assert!(calls.contains(&"secret"));
    assert!(calls.contains(&"shared"));
}

#[test]
fn test_new_calls_initialize() {
    let facts = collect("Widget.new\n");
    let calls = calls(&facts);
    assert!(calls.contains(&"Widget"));
    assert!(calls.contains(&"initialize"));
}

#[test]
fn test_define_method_and_alias_method() {
    let facts = collect(
        r#"
class Report
  define_method(:title) { 'report' }
  alias_method :heading, :title
end
"#,
    );
    assert!(defines(&facts, "title"));
    assert!(defines(&facts, "heading"));
    assert!(calls(&facts).contains(&"title"));
}

#[test]
fn test_struct_members() {
    let facts = collect("Point = Struct.new(:x, :y)\n");
    assert!(defines(&facts, "Point"));
    assert!(defines(&facts, "x"));
    assert!(defines(&facts, "y="));
}

#[test]
fn test_frozen_constant_is_inlined() {
    let facts = collect(
        r#"
METHOD = :compute.freeze
object.send(METHOD)
"#,
    );
    assert!(calls(&facts).contains(&"compute"));
}

#[test]
fn test_local_splat_is_expanded() {
    let facts = collect(
        r#"
names = [:first, :last]
attr_reader(*names)
"#,
    );
    assert!(defines(&facts, "first"));
    assert!(defines(&facts, "last"));
}

#[test]
fn test_eval_source_is_collected_on_literal_line() {
    let facts = collect(
        r#"
class Widget
  class_eval "def generated; helper; end"
end
"#,
    );
    let generated = facts
        .definitions
        .iter()
        .find(|d| d.names == ["generated"])
        .unwrap();
    assert_eq!(generated.location.line, 3);
    assert!(calls(&facts).contains(&"helper"));
}

// ============================================================================
// Privacy
// ============================================================================

#[test]
fn test_private_section_and_named_privacy() {
    let facts = collect(
        r#"
class Account
  def open; end
  def close; end
  private :close

  private

  def audit; end
end
"#,
    );
    let visibility = |name: &str| {
        facts
            .definitions
            .iter()
            .find(|d| d.names == [name])
            .map(|d| d.visibility)
            .unwrap()
    };
    assert_eq!(visibility("open"), Visibility::Public);
    assert_eq!(visibility("close"), Visibility::Private);
    assert_eq!(visibility("audit"), Visibility::Private);
}

#[test]
fn test_bare_privacy_keywords_set_the_section() {
    let facts = collect(
        r#"
class Vault
  def peek; end

  protected

  def compare; end

  private

  def secret; end
  def other_secret; end
end
"#,
    );
    let visibility = |name: &str| {
        facts
            .definitions
            .iter()
            .find(|d| d.names == [name])
            .map(|d| d.visibility)
            .unwrap()
    };
    assert_eq!(visibility("peek"), Visibility::Public);
    assert_eq!(visibility("compare"), Visibility::Protected);
    assert_eq!(visibility("secret"), Visibility::Private);
    assert_eq!(visibility("other_secret"), Visibility::Private);
    assert!(calls(&facts).contains(&"private"));
}

#[test]
fn test_privacy_does_not_leak_between_classes() {
    let facts = collect(
        r#"
class A
  private
  def hidden; end
end

class B
  def shown; end
end
"#,
    );
    let shown = facts.definitions.iter().find(|d| d.names == ["shown"]).unwrap();
    assert_eq!(shown.visibility, Visibility::Public);
}

// ============================================================================
// Magic comments
// ============================================================================

#[test]
fn test_magic_comments() {
    let facts = collect(
        r#"
class Hooks
  def callback # leftovers:keep
  end

  def fixture_data; end # leftovers:test_only

  # leftovers:call registered, other
end
"#,
    );
    let callback = facts.definitions.iter().find(|d| d.names == ["callback"]).unwrap();
    assert!(callback.keep);
    let fixture = facts.definitions.iter().find(|d| d.names == ["fixture_data"]).unwrap();
    assert!(fixture.test_only);

    let calls = calls(&facts);
    assert!(calls.contains(&"registered"));
    assert!(calls.contains(&"other"));
}

#[test]
fn test_dynamic_comment_runs_named_rules() {
    let rules = rules_with(
        r#"
dynamic:
  name: route_table
  calls:
    arguments: '*'
    add_suffix: _path
"#,
    );
    let facts = collect_with(
        &rules,
        r#"
ROUTES = [:home, :about] # leftovers:dynamic:route_table
"#,
    );
    let calls = calls(&facts);
    assert!(calls.contains(&"home_path"));
    assert!(calls.contains(&"about_path"));
}

// ============================================================================
// Project rules
// ============================================================================

#[test]
fn test_project_rule_with_keyword_and_transforms() {
    let rules = rules_with(
        r#"
dynamic:
  name: validates
  calls:
    - arguments: '*'
    - keywords: '**'
      add_prefix: validate_
"#,
    );
    let facts = collect_with(&rules, "validates :email, presence: true, format: true\n");
    let calls = calls(&facts);
    assert!(calls.contains(&"email"));
    assert!(calls.contains(&"validate_presence"));
    assert!(calls.contains(&"validate_format"));
}

#[test]
fn test_definition_set_from_transforms() {
    let rules = rules_with(
        r#"
dynamic:
  name: flag
  defines:
    argument: 0
    transforms:
      - original
      - add_suffix: '?'
      - add_suffix: '!'
"#,
    );
    let facts = collect_with(&rules, "flag :archived\n");
    let set = facts
        .definitions
        .iter()
        .find(|d| d.names.contains(&"archived".to_string()))
        .unwrap();
    assert_eq!(set.names, vec!["archived", "archived?", "archived!"]);
}

#[test]
fn test_missing_inflections_is_an_error() {
    let rules = rules_with(
        r#"
dynamic:
  name: has_many
  calls:
    argument: 0
    camelize: true
"#,
    );
    let result = FileCollector::new(&rules).collect(Path::new("lib/a.rb"), false, "has_many :posts\n");
    assert!(matches!(result, Err(CollectError::MissingInflections { .. })));
}

#[cfg(feature = "inflections")]
#[test]
fn test_inflections_when_required() {
    let rules = rules_with(
        r#"
requires: active_support
dynamic:
  name: has_many
  calls:
    argument: 0
    transforms:
      - singularize: true
        camelize: true
"#,
    );
    let facts = collect_with(&rules, "has_many :blog_posts\n");
    assert!(calls(&facts).contains(&"BlogPost"));
}

#[test]
fn test_test_file_facts_are_marked() {
    let rules = rules_with("");
    let facts = FileCollector::new(&rules)
        .collect(Path::new("spec/user_spec.rb"), true, "def helper; end\nhelper\n")
        .unwrap();
    assert!(facts.test);
    assert!(facts.definitions.iter().all(|d| d.test));
}

// ============================================================================
// Assignment rules
// ============================================================================

#[test]
fn test_constant_array_assignment_arguments() {
    let rules = rules_with(
        r#"
dynamic:
  name: STRING_TRANSFORMS
  calls:
    argument: '*'
"#,
    );
    let facts = collect_with(&rules, "STRING_TRANSFORMS = %i{\n  downcase\n  upcase\n}\n");
    assert!(defines(&facts, "STRING_TRANSFORMS"));
    assert_eq!(call_set(&facts), set(&["downcase", "upcase"]));

    let frozen = collect_with(&rules, "STRING_TRANSFORMS = %i{downcase upcase}.freeze\n");
    assert_eq!(call_set(&frozen), set(&["downcase", "freeze", "upcase"]));
}

#[test]
fn test_constant_assignment_of_non_literal_has_no_arguments() {
    let rules = rules_with(
        r#"
dynamic:
  name: STRING_TRANSFORMS
  calls:
    argument: '*'
"#,
    );
    let regex = collect_with(&rules, "STRING_TRANSFORMS = /a_regex/\n");
    assert!(defines(&regex, "STRING_TRANSFORMS"));
    assert!(call_set(&regex).is_empty());

    let method = collect_with(&rules, "STRING_TRANSFORMS = %i{downcase upcase}.empty?\n");
    assert_eq!(call_set(&method), set(&["empty?"]));
}

#[test]
fn test_ivar_assignment_arguments() {
    let rules = rules_with(
        r#"
dynamic:
  name: '@string_transforms'
  calls:
    argument: '*'
"#,
    );
    let facts = collect_with(&rules, "@string_transforms = %i{downcase upcase}\n");
    assert!(defines(&facts, "@string_transforms"));
    assert_eq!(call_set(&facts), set(&["downcase", "upcase"]));
}

#[test]
fn test_constant_hash_assignment_keywords() {
    let rules = rules_with(
        r#"
dynamic:
  name: STRING_TRANSFORMS
  calls:
    keywords: '**'
    add_suffix: _call
"#,
    );
    let facts = collect_with(
        &rules,
        r#"
rest = {}
STRING_TRANSFORMS = {
  downcase: true,
  upcase: true,
  one => true,
  **rest
}
"#,
    );
    assert_eq!(call_set(&facts), set(&["downcase_call", "one", "upcase_call"]));
}

#[test]
fn test_recursive_hash_assignment() {
    let rules = rules_with(
        r#"
dynamic:
  name: STRING_TRANSFORMS
  calls:
    arguments: '**'
    keywords: '**'
    recursive: true
"#,
    );
    let facts = collect_with(
        &rules,
        r#"
STRING_TRANSFORMS = {
  body: { process: :downcase },
  title: { process: :upcase }
}
"#,
    );
    assert_eq!(
        call_set(&facts),
        set(&["body", "downcase", "process", "title", "upcase"])
    );
}

#[test]
fn test_assignment_passed_as_argument_is_recursed() {
    let rules = rules_with(
        r#"
dynamic:
  name: x
  calls:
    arguments: '*'
    recursive: true
"#,
    );
    let facts = collect_with(&rules, "x(STRING_TRANSFORMS = [:downcase, [:upcase]])\n");
    assert!(defines(&facts, "STRING_TRANSFORMS"));
    assert_eq!(call_set(&facts), set(&["downcase", "upcase", "x"]));
}

// ============================================================================
// Receivers
// ============================================================================

#[test]
fn test_local_receiver_is_not_a_name() {
    let rules = rules_with(
        r#"
dynamic:
  name: nonsense
  has_receiver:
    - my_lvar
  calls:
    argument: 0
"#,
    );
    let parameter = collect_with(&rules, "def foo(my_lvar)\n  my_lvar.nonsense(:my_symbol)\nend\n");
    assert_eq!(call_set(&parameter), set(&["nonsense"]));

    let assigned = collect_with(&rules, "my_lvar = 1\nmy_lvar.nonsense(:my_symbol)\n");
    assert_eq!(call_set(&assigned), set(&["nonsense"]));

    let method = collect_with(&rules, "my_lvar.nonsense(:my_symbol)\n");
    assert!(call_set(&method).contains("my_symbol"));
}

#[test]
fn test_scoped_constant_receiver() {
    let rules = rules_with(
        r#"
dynamic:
  name: new
  has_receiver:
    name: Caller
    has_receiver: Leftovers
  calls:
    argument: 0
"#,
    );
    let facts = collect_with(&rules, "Leftovers::Caller.new(:yes)\nCaller.new(:no)\n");
    let calls = call_set(&facts);
    assert!(calls.contains("yes"));
    assert!(!calls.contains("no"));
    for name in ["Caller", "Leftovers", "initialize", "new"] {
        assert!(calls.contains(name), "missing {name}");
    }
}

// ============================================================================
// Rule scenarios
// ============================================================================

#[test]
fn test_affixed_method_names() {
    let rules = rules_with(
        r#"
dynamic:
  - name:
      has_suffix: '_html'
    calls:
      - itself: true
        delete_suffix: _html
      - value: html
"#,
    );
    let facts = collect_with(&rules, "test_html\n");
    assert!(facts.definitions.is_empty());
    assert_eq!(call_set(&facts), set(&["html", "test", "test_html"]));
}

#[test]
fn test_nested_argument_value_position() {
    let rules = rules_with(
        r#"
dynamic:
  - name: flow
    has_argument:
      at: 1
      has_value:
        at: 0
        has_value:
          type: atom-literal
    calls:
      - argument: 0
"#,
    );
    let facts = collect_with(
        &rules,
        "flow(:whatever, [:one])\nflow(:whichever, [1])\nflow(:whenever, [])\nflow(:whyever, nil)\n",
    );
    assert_eq!(call_set(&facts), set(&["flow", "whatever"]));
}

#[test]
fn test_compacted_rules_collect_the_same_facts() {
    let separate = rules_with(
        r#"
dynamic:
  - name: flow
    calls:
      argument: 0
  - name: flow
    calls:
      argument: 1
      add_suffix: '?'
  - name: route
    calls:
      argument: 0
"#,
    );
    let merged = rules_with(
        r#"
dynamic:
  - names: [flow, route]
    calls:
      argument: 0
  - name: flow
    calls:
      argument: 1
      add_suffix: '?'
"#,
    );
    let source = "flow(:start, :done)\nroute(:home)\n";
    let a = collect_with(&separate, source);
    let b = collect_with(&merged, source);
    assert_eq!(call_set(&a), call_set(&b));
    assert_eq!(call_set(&a), set(&["done?", "flow", "home", "route", "start"]));
}
