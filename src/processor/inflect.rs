//! The string-inflection capability.
//!
//! Inflection transforms only work when the capability is both compiled in
//! (the `inflections` feature) and required by the configuration.

use super::transform::Inflection;
use std::fmt::Debug;

/// Requires that switch the inflection capability on
pub const INFLECTION_REQUIRES: &[&str] = &[
    "active_support",
    "active_support/core_ext/string",
    "active_support/inflector",
    "inflections",
];

pub trait Inflect: Send + Sync + Debug {
    fn inflect(&self, inflection: Inflection, input: &str) -> String;
}

/// Capability for the given `requires`, if any of them asks for it
pub fn capability<S: AsRef<str>>(requires: &[S]) -> Option<Box<dyn Inflect>> {
    let required = requires
        .iter()
        .any(|r| INFLECTION_REQUIRES.contains(&r.as_ref()));
    if !required {
        return None;
    }
    available()
}

#[cfg(feature = "inflections")]
fn available() -> Option<Box<dyn Inflect>> {
    Some(Box::new(Inflections))
}

#[cfg(not(feature = "inflections"))]
fn available() -> Option<Box<dyn Inflect>> {
    tracing::warn!("inflections were required, but leftovers was built without the `inflections` feature");
    None
}

/// Inflections implemented with the `Inflector` crate
#[cfg(feature = "inflections")]
#[derive(Debug, Clone, Copy, Default)]
pub struct Inflections;

#[cfg(feature = "inflections")]
impl Inflect for Inflections {
    fn inflect(&self, inflection: Inflection, input: &str) -> String {
        use inflector::Inflector;

        match inflection {
            Inflection::Camelize => input
                .split('/')
                .map(|segment| segment.to_pascal_case())
                .collect::<Vec<_>>()
                .join("::"),
            Inflection::Underscore => input
                .split("::")
                .map(|segment| segment.to_snake_case())
                .collect::<Vec<_>>()
                .join("/"),
            Inflection::Titleize => input.to_title_case(),
            Inflection::Parameterize => parameterize(input),
            Inflection::Pluralize => input.to_plural(),
            Inflection::Singularize => input.to_singular(),
            Inflection::Demodulize => demodulize(input).to_string(),
            Inflection::Deconstantize => deconstantize(input).to_string(),
        }
    }
}

#[cfg(feature = "inflections")]
fn parameterize(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        if c.is_ascii_alphanumeric() || c == '_' {
            out.push(c.to_ascii_lowercase());
        } else if !out.is_empty() && !out.ends_with('-') {
            out.push('-');
        }
    }
    out.trim_end_matches('-').to_string()
}

#[cfg(feature = "inflections")]
fn demodulize(input: &str) -> &str {
    input.rsplit_once("::").map_or(input, |(_, name)| name)
}

#[cfg(feature = "inflections")]
fn deconstantize(input: &str) -> &str {
    input.rsplit_once("::").map_or("", |(namespace, _)| namespace)
}

#[cfg(all(test, feature = "inflections"))]
mod tests {
    use super::*;

    fn inflect(inflection: Inflection, input: &str) -> String {
        Inflections.inflect(inflection, input)
    }

    #[test]
    fn test_capability_requires_opt_in() {
        let none: [&str; 0] = [];
        assert!(capability(&none).is_none());
        assert!(capability(&["json"]).is_none());
        assert!(capability(&["active_support"]).is_some());
    }

    #[test]
    fn test_camelize_and_underscore() {
        assert_eq!(inflect(Inflection::Camelize, "foo_bar"), "FooBar");
        assert_eq!(inflect(Inflection::Camelize, "admin/user_roles"), "Admin::UserRoles");
        assert_eq!(inflect(Inflection::Underscore, "Admin::UserRole"), "admin/user_role");
    }

    #[test]
    fn test_plurals() {
        assert_eq!(inflect(Inflection::Pluralize, "category"), "categories");
        assert_eq!(inflect(Inflection::Singularize, "categories"), "category");
    }

    #[test]
    fn test_namespaces() {
        assert_eq!(inflect(Inflection::Demodulize, "Admin::User"), "User");
        assert_eq!(inflect(Inflection::Demodulize, "User"), "User");
        assert_eq!(inflect(Inflection::Deconstantize, "Admin::User"), "Admin");
        assert_eq!(inflect(Inflection::Deconstantize, "User"), "");
    }

    #[test]
    fn test_parameterize() {
        assert_eq!(inflect(Inflection::Parameterize, "Hello, World!"), "hello-world");
    }
}
