//! Handler signature introspection.
//!
//! Parameter names are recovered from the textual form of a handler's
//! declaration. Only the arrow form `(res, a, b) => ...` is understood; a
//! named function statement such as `function handler(res, a) { ... }`
//! yields no names at all. That limitation is part of the contract: callers
//! that need something else register an explicit [`HandlerSignature::Declared`]
//! list instead.
//!
//! The split is purely textual. Default values and destructuring patterns are
//! not parsed, so `(res, {a, b}) => ...` produces `["res", "{a", "b}"]`.

use std::borrow::Cow;
use std::sync::OnceLock;

use regex::Regex;

/// How a handler describes the parameters it expects.
///
/// In every form the first name is reserved for the response capability and
/// is never bound to request data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandlerSignature {
    /// Arrow-form source text, parsed again on every dispatch.
    Source(Cow<'static, str>),
    /// Names given explicitly at registration time.
    Declared(Vec<String>),
    /// Nothing to introspect.
    Opaque,
}

impl HandlerSignature {
    /// The declared parameter names, response slot included.
    pub fn parameter_names(&self) -> Vec<String> {
        match self {
            HandlerSignature::Source(source) => parse_parameter_names(source),
            HandlerSignature::Declared(names) => names.clone(),
            HandlerSignature::Opaque => Vec::new(),
        }
    }
}

fn arrow_parameters() -> &'static Regex {
    static ARROW: OnceLock<Regex> = OnceLock::new();
    ARROW.get_or_init(|| Regex::new(r"(?m)^\s*[^(]*\(\s*([^)]*)\)\s?=>").expect("valid regex"))
}

fn comments() -> &'static Regex {
    static COMMENTS: OnceLock<Regex> = OnceLock::new();
    COMMENTS.get_or_init(|| Regex::new(r"(?m)//.*$|/\*[\s\S]*?\*/").expect("valid regex"))
}

/// Extract the ordered parameter names from arrow-form source text.
///
/// Line and block comments are removed first, then the first parenthesized
/// list followed by `=>` is split on commas. Each segment is trimmed and a
/// symmetric `_name_` marker is reduced to `name`. Segments that are empty or
/// contain interior whitespace are dropped.
pub fn parse_parameter_names(source: &str) -> Vec<String> {
    let stripped = comments().replace_all(source, "");

    let Some(list) = arrow_parameters()
        .captures(&stripped)
        .and_then(|caps| caps.get(1))
    else {
        return Vec::new();
    };

    list.as_str()
        .split(',')
        .filter_map(parameter_name)
        .map(str::to_string)
        .collect()
}

fn parameter_name(segment: &str) -> Option<&str> {
    let trimmed = segment.trim();
    if trimmed.is_empty() || trimmed.chars().any(char::is_whitespace) {
        return None;
    }

    match trimmed.strip_prefix('_').and_then(|s| s.strip_suffix('_')) {
        Some(inner) if !inner.is_empty() => Some(inner),
        _ => Some(trimmed),
    }
}
