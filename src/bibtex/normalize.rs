//! Cleaning of raw field values.

use crate::regex::Regex;
use itertools::Itertools;
use once_cell::sync::Lazy;

static AUTHOR_SEPARATOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\s+and\s+").unwrap());

/// Strip one enclosing layer of braces or quotes, then any brace or quote left
/// inside, then surrounding whitespace.
///
/// An empty result is `None`, never `Some("")`.
pub fn normalize_value(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let unwrapped = strip_enclosing(trimmed, '{', '}')
        .or_else(|| strip_enclosing(trimmed, '"', '"'))
        .unwrap_or(trimmed);
    let cleaned: String = unwrapped
        .chars()
        .filter(|c| !matches!(c, '{' | '}' | '"'))
        .collect();
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned.to_string())
    }
}

/// Split an author list on the word `and`, keeping source order.
pub fn split_authors(raw: &str) -> Vec<String> {
    let Some(value) = normalize_value(raw) else {
        return Vec::new();
    };
    AUTHOR_SEPARATOR
        .split(&value)
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(String::from)
        .collect()
}

/// Split a keyword list on `,` or `;`, keeping the first of any repeated term.
pub fn split_keywords(raw: &str) -> Vec<String> {
    let Some(value) = normalize_value(raw) else {
        return Vec::new();
    };
    value
        .split([',', ';'])
        .map(str::trim)
        .filter(|term| !term.is_empty())
        .unique()
        .map(String::from)
        .collect()
}

fn strip_enclosing(value: &str, open: char, close: char) -> Option<&str> {
    value.strip_prefix(open)?.strip_suffix(close)
}
