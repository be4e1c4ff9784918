use crate::{PaperError, Result};

/// Dashes accepted between a start and an end page.
const PAGE_DASHES: [char; 3] = ['-', '\u{2013}', '\u{2014}'];

/// Splits a page string into start and end on the first run of dashes.
///
/// BibTeX's `--` counts as a single separator. Empty parts are `None`.
///
/// # Arguments
///
/// * `pages` - The page string to split, e.g. `"100--110"` or `"e071674"`
pub fn split_pages(pages: &str) -> (Option<String>, Option<String>) {
    let non_empty = |s: &str| {
        let s = s.trim();
        (!s.is_empty()).then(|| s.to_string())
    };
    match pages.split_once(PAGE_DASHES) {
        Some((start, end)) => (non_empty(start), non_empty(end.trim_start_matches(PAGE_DASHES))),
        None => (non_empty(pages), None),
    }
}

/// Parses a publication year kept as text.
///
/// # Arguments
///
/// * `year` - The year text, surrounding whitespace allowed
pub fn parse_year(year: &str) -> Result<i32> {
    year.trim()
        .parse::<i32>()
        .map_err(|e| PaperError::InvalidFieldValue {
            field: "year".to_string(),
            message: format!("'{}' is not a year: {}", year.trim(), e),
        })
}

/// Returns `Some` for text with non-whitespace content, `None` otherwise.
pub(crate) fn non_blank(text: &str) -> Option<String> {
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}
