use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Position of a fact inside a file (1-indexed line and column)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Span {
    pub line: usize,
    pub column: usize,
    pub start_byte: usize,
    pub end_byte: usize,
}

impl Span {
    pub fn new(line: usize, column: usize, start_byte: usize, end_byte: usize) -> Self {
        Self {
            line,
            column,
            start_byte,
            end_byte,
        }
    }

    pub fn at(self, file: &Path) -> Location {
        Location {
            file: file.to_path_buf(),
            line: self.line,
            column: self.column,
            start_byte: self.start_byte,
            end_byte: self.end_byte,
        }
    }
}

/// Location of a definition in the project
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Location {
    /// Path relative to the project root
    pub file: PathBuf,
    pub line: usize,
    pub column: usize,
    pub start_byte: usize,
    pub end_byte: usize,
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.file.display(), self.line, self.column)
    }
}

/// What kind of entity a definition introduces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DefinitionKind {
    Method,
    Constant,
    InstanceVariable,
    ClassVariable,
    GlobalVariable,
}

impl DefinitionKind {
    /// Guess the kind from the spelling of a name, for rule-produced definitions
    pub fn from_name(name: &str) -> Self {
        if name.starts_with("@@") {
            DefinitionKind::ClassVariable
        } else if name.starts_with('@') {
            DefinitionKind::InstanceVariable
        } else if name.starts_with('$') {
            DefinitionKind::GlobalVariable
        } else if name.chars().next().is_some_and(|c| c.is_ascii_uppercase())
            && !name.ends_with(['?', '!', '='])
        {
            DefinitionKind::Constant
        } else {
            DefinitionKind::Method
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            DefinitionKind::Method => "method",
            DefinitionKind::Constant => "constant",
            DefinitionKind::InstanceVariable => "instance variable",
            DefinitionKind::ClassVariable => "class variable",
            DefinitionKind::GlobalVariable => "global variable",
        }
    }
}

/// Visibility of a method or constant
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Public,
    Protected,
    Private,
}

impl Visibility {
    pub fn parse(keyword: &str) -> Option<Self> {
        match keyword {
            "public" => Some(Visibility::Public),
            "protected" => Some(Visibility::Protected),
            "private" => Some(Visibility::Private),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Protected => "protected",
            Visibility::Private => "private",
        }
    }
}

/// A named entity declared somewhere in the project
///
/// Generated accessors can introduce several names at once (`foo` and `foo=`);
/// the definition counts as used when any of them is called.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Definition {
    pub names: Vec<String>,
    pub kind: DefinitionKind,
    pub visibility: Visibility,
    pub location: Location,
    /// Trimmed text of the defining line
    pub source_line: String,
    /// Defined in a file under `test_paths`
    pub test: bool,
    /// Annotated with `# leftovers:keep`
    pub keep: bool,
    /// Annotated with `# leftovers:test_only`
    pub test_only: bool,
}

impl Definition {
    pub fn name(&self) -> String {
        self.names.join(", ")
    }
}

/// A reference to a name
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Call {
    pub name: String,
    pub span: Span,
}

impl Call {
    pub fn new(name: impl Into<String>, span: Span) -> Self {
        Self {
            name: name.into(),
            span,
        }
    }
}
