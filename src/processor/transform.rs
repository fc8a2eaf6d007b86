use super::inflect::Inflect;
use crate::error::CollectError;

/// Case and word transforms backed by the inflection capability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Inflection {
    Camelize,
    Underscore,
    Titleize,
    Parameterize,
    Pluralize,
    Singularize,
    Demodulize,
    Deconstantize,
}

impl Inflection {
    pub fn name(&self) -> &'static str {
        match self {
            Inflection::Camelize => "camelize",
            Inflection::Underscore => "underscore",
            Inflection::Titleize => "titleize",
            Inflection::Parameterize => "parameterize",
            Inflection::Pluralize => "pluralize",
            Inflection::Singularize => "singularize",
            Inflection::Demodulize => "demodulize",
            Inflection::Deconstantize => "deconstantize",
        }
    }
}

/// One string-to-strings step of a processor pipeline
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Transform {
    Original,
    AddPrefix(String),
    AddSuffix(String),
    DeletePrefix(String),
    DeleteSuffix(String),
    /// Keep what follows the first occurrence
    DeleteBefore(String),
    DeleteBeforeLast(String),
    /// Keep what precedes the first occurrence
    DeleteAfter(String),
    DeleteAfterLast(String),
    Split(String),
    Upcase,
    Downcase,
    Capitalize,
    Swapcase,
    Inflect(Inflection),
}

impl Transform {
    /// Look up a transform taking no argument
    pub fn flag(name: &str) -> Option<Self> {
        let transform = match name {
            "original" => Transform::Original,
            "upcase" => Transform::Upcase,
            "downcase" => Transform::Downcase,
            "capitalize" => Transform::Capitalize,
            "swapcase" => Transform::Swapcase,
            "camelize" | "camelcase" => Transform::Inflect(Inflection::Camelize),
            "underscore" => Transform::Inflect(Inflection::Underscore),
            "titleize" | "titlecase" => Transform::Inflect(Inflection::Titleize),
            "parameterize" => Transform::Inflect(Inflection::Parameterize),
            "pluralize" => Transform::Inflect(Inflection::Pluralize),
            "singularize" => Transform::Inflect(Inflection::Singularize),
            "demodulize" => Transform::Inflect(Inflection::Demodulize),
            "deconstantize" => Transform::Inflect(Inflection::Deconstantize),
            _ => return None,
        };
        Some(transform)
    }

    /// Look up a transform taking a string argument
    pub fn with_argument(name: &str, argument: &str) -> Option<Self> {
        let argument = argument.to_string();
        let transform = match name {
            "add_prefix" => Transform::AddPrefix(argument),
            "add_suffix" => Transform::AddSuffix(argument),
            "delete_prefix" => Transform::DeletePrefix(argument),
            "delete_suffix" => Transform::DeleteSuffix(argument),
            "delete_before" => Transform::DeleteBefore(argument),
            "delete_before_last" => Transform::DeleteBeforeLast(argument),
            "delete_after" => Transform::DeleteAfter(argument),
            "delete_after_last" => Transform::DeleteAfterLast(argument),
            "split" => Transform::Split(argument),
            _ => return None,
        };
        Some(transform)
    }

    /// Apply to a present value; most transforms produce exactly one output
    pub fn apply(&self, input: &str, inflect: Option<&dyn Inflect>) -> Result<Vec<String>, CollectError> {
        let output = match self {
            Transform::Original => input.to_string(),
            Transform::AddPrefix(prefix) => format!("{prefix}{input}"),
            Transform::AddSuffix(suffix) => format!("{input}{suffix}"),
            Transform::DeletePrefix(prefix) => input.strip_prefix(prefix.as_str()).unwrap_or(input).to_string(),
            Transform::DeleteSuffix(suffix) => input.strip_suffix(suffix.as_str()).unwrap_or(input).to_string(),
            Transform::DeleteBefore(delimiter) => input
                .split_once(delimiter.as_str())
                .map_or(input, |(_, after)| after)
                .to_string(),
            Transform::DeleteBeforeLast(delimiter) => input
                .rsplit_once(delimiter.as_str())
                .map_or(input, |(_, after)| after)
                .to_string(),
            Transform::DeleteAfter(delimiter) => input
                .split_once(delimiter.as_str())
                .map_or(input, |(before, _)| before)
                .to_string(),
            Transform::DeleteAfterLast(delimiter) => input
                .rsplit_once(delimiter.as_str())
                .map_or(input, |(before, _)| before)
                .to_string(),
            Transform::Split(delimiter) => {
                if delimiter.is_empty() {
                    return Ok(input.chars().map(String::from).collect());
                }
                return Ok(input
                    .split(delimiter.as_str())
                    .filter(|part| !part.is_empty())
                    .map(String::from)
                    .collect());
            }
            Transform::Upcase => input.to_uppercase(),
            Transform::Downcase => input.to_lowercase(),
            Transform::Capitalize => capitalize(input),
            Transform::Swapcase => swapcase(input),
            Transform::Inflect(inflection) => {
                let inflect = inflect.ok_or(CollectError::MissingInflections {
                    transform: inflection.name(),
                })?;
                inflect.inflect(*inflection, input)
            }
        };
        Ok(vec![output])
    }
}

fn capitalize(input: &str) -> String {
    let mut chars = input.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

fn swapcase(input: &str) -> String {
    input
        .chars()
        .flat_map(|c| {
            if c.is_uppercase() {
                c.to_lowercase().collect::<Vec<_>>()
            } else {
                c.to_uppercase().collect::<Vec<_>>()
            }
        })
        .collect()
}
