//! Conversion of data files into synthetic Ruby source.
//!
//! A YAML or JSON document becomes a single call to [`DOCUMENT_METHOD`] so the
//! ordinary rules (with `document: true`) can pick names out of it.

use crate::error::CollectError;
use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use std::path::Path;

/// Method name of the synthetic call wrapping a precompiled document
pub const DOCUMENT_METHOD: &str = "__leftovers_document";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrecompileFormat {
    Yaml,
    Json,
}

impl PrecompileFormat {
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "yaml" | "yml" => Some(PrecompileFormat::Yaml),
            "json" => Some(PrecompileFormat::Json),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PrecompileFormat::Yaml => "yaml",
            PrecompileFormat::Json => "json",
        }
    }
}

/// Turn a data document into Ruby source calling [`DOCUMENT_METHOD`]
pub fn precompile(format: PrecompileFormat, path: &Path, contents: &str) -> Result<String, CollectError> {
    let failure = |message: String| CollectError::Precompile {
        path: path.to_path_buf(),
        message,
    };

    let document: Value = match format {
        PrecompileFormat::Yaml => serde_yaml::from_str(contents).map_err(|e| failure(e.to_string()))?,
        PrecompileFormat::Json => {
            let json: serde_json::Value =
                serde_json::from_str(contents).map_err(|e| failure(e.to_string()))?;
            serde_yaml::to_value(json).map_err(|e| failure(e.to_string()))?
        }
    };

    let arguments = match untag(&document) {
        Value::Null => String::new(),
        Value::Sequence(items) if !items.is_empty() => format!("*{}", render(&document)),
        Value::Mapping(map) if !map.is_empty() => format!("**{}", render(&document)),
        Value::Sequence(_) | Value::Mapping(_) => String::new(),
        _ => render(&document),
    };

    Ok(format!("{}({})\n", DOCUMENT_METHOD, arguments))
}

fn untag(value: &Value) -> &Value {
    match value {
        Value::Tagged(tagged) => untag(&tagged.value),
        other => other,
    }
}

fn render(value: &Value) -> String {
    match untag(value) {
        Value::Null => "nil".to_string(),
        Value::Bool(flag) => flag.to_string(),
        Value::Number(number) => number.to_string(),
        Value::String(text) => quote(text),
        Value::Sequence(items) => {
            let items: Vec<String> = items.iter().map(render).collect();
            format!("[{}]", items.join(",\n"))
        }
        Value::Mapping(map) => {
            let pairs: Vec<String> = map
                .iter()
                .map(|(key, value)| format!("{} => {}", render(key), render(value)))
                .collect();
            format!("{{{}}}", pairs.join(",\n"))
        }
        Value::Tagged(tagged) => render(&tagged.value),
    }
}

/// Single-quoted Ruby string literal
fn quote(text: &str) -> String {
    format!("'{}'", text.replace('\\', "\\\\").replace('\'', "\\'"))
}
