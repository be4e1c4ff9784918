//! BibTeX citation parser.
//!
//! Reads a single pasted entry and produces [`CanonicalMetadata`]. Parsing is
//! best-effort: malformed fragments are skipped, unknown fields are dropped, and
//! the worst case is an empty result rather than an error.
//!
//! # Example
//!
//! ```
//! use paperlib::{BibtexParser, CitationParser};
//!
//! let input = r#"@article{doe2024,
//!   title = {Deep Retrieval},
//!   author = {Jane Doe and John Public},
//!   year = {2024},
//! }"#;
//!
//! let metadata = BibtexParser::new().parse(input);
//! assert_eq!(metadata.title.as_deref(), Some("Deep Retrieval"));
//! assert_eq!(metadata.authors, ["Jane Doe", "John Public"]);
//! ```

mod config;
mod fields;
mod normalize;
mod parse;
mod structure;
mod tokenize;

pub use config::ParserConfig;
pub use fields::{DEFAULT_FIELD_MAP, FieldSlot};
pub use normalize::{normalize_value, split_authors, split_keywords};
pub use tokenize::{EntryHeader, FieldTokenizer, RawField, SkipReason, SkippedFragment, tokenize};

use crate::{CanonicalMetadata, CitationParser};
use parse::bibtex_parse;
use serde::{Deserialize, Serialize};

/// Parser for BibTeX-style citation entries.
#[derive(Debug, Clone, Default)]
pub struct BibtexParser {
    config: ParserConfig,
}

impl BibtexParser {
    /// Creates a new BibTeX parser with the default field mappings.
    ///
    /// # Examples
    ///
    /// ```
    /// use paperlib::BibtexParser;
    /// let parser = BibtexParser::new();
    /// ```
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new BibTeX parser with custom field mappings.
    #[must_use]
    pub fn with_config(mut self, config: ParserConfig) -> Self {
        self.config = config;
        self
    }

    /// Parses `input` and reports what was left out alongside the metadata.
    pub fn parse_with_report(&self, input: &str) -> ParseReport {
        let raw = bibtex_parse(input, &self.config);
        let metadata = CanonicalMetadata::from(&raw);
        if !raw.skipped.is_empty() || !raw.has_content() {
            tracing::debug!(
                skipped = raw.skipped.len(),
                recognized = raw.fields.len(),
                "citation parsed incompletely"
            );
        }
        ParseReport {
            metadata,
            entry_type: raw.entry_type,
            citation_key: raw.citation_key,
            ignored_keys: raw.ignored_keys.into_iter().map(String::from).collect(),
            skipped_fragments: raw.skipped,
        }
    }
}

impl CitationParser for BibtexParser {
    /// Parses a single BibTeX entry.
    ///
    /// Never fails: text that cannot be read yields fewer fields, down to an empty
    /// [`CanonicalMetadata`].
    fn parse(&self, input: &str) -> CanonicalMetadata {
        CanonicalMetadata::from(&bibtex_parse(input, &self.config))
    }
}

/// How much of a citation made it into the metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Completeness {
    /// No recognized field.
    Empty,
    /// Some fields, but the title is missing or fragments were skipped.
    Partial,
    /// A title and no skipped fragments.
    Complete,
}

/// The outcome of [`BibtexParser::parse_with_report`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParseReport {
    pub metadata: CanonicalMetadata,
    pub entry_type: Option<String>,
    pub citation_key: Option<String>,
    /// Well-formed fields with no slot, e.g. `doi` or `publisher`.
    pub ignored_keys: Vec<String>,
    pub skipped_fragments: Vec<SkippedFragment>,
}

impl ParseReport {
    pub fn completeness(&self) -> Completeness {
        if self.metadata.is_empty() {
            Completeness::Empty
        } else if self.metadata.title.is_none() || !self.skipped_fragments.is_empty() {
            Completeness::Partial
        } else {
            Completeness::Complete
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const DOE_2024: &str = "@article{doe2024, title = {Deep Retrieval}, author = {Jane Doe and John Public}, year = {2024}, journal = {ACL}, keywords = {nlp, retrieval}}";

    fn parse(input: &str) -> CanonicalMetadata {
        BibtexParser::new().parse(input)
    }

    #[test]
    fn test_parse_end_to_end() {
        let expected = CanonicalMetadata {
            title: Some("Deep Retrieval".to_string()),
            authors: vec!["Jane Doe".to_string(), "John Public".to_string()],
            year: Some("2024".to_string()),
            venue: Some("ACL".to_string()),
            keywords: vec!["nlp".to_string(), "retrieval".to_string()],
            ..Default::default()
        };
        assert_eq!(parse(DOE_2024), expected);
    }

    #[test]
    fn test_field_order_does_not_matter() {
        let permuted = "@article{doe2024, keywords = {nlp, retrieval}, journal = {ACL}, year = {2024}, author = {Jane Doe and John Public}, title = {Deep Retrieval}}";
        assert_eq!(parse(permuted), parse(DOE_2024));
    }

    #[test]
    fn test_later_duplicate_wins() {
        let input = "@article{k, title = {First}, year = 2020, title = {Second}}";
        assert_eq!(parse(input).title.as_deref(), Some("Second"));

        let input = "@inproceedings{k, booktitle = {Proc. A}, journal = {J. B}}";
        assert_eq!(parse(input).venue.as_deref(), Some("J. B"));
    }

    #[test]
    fn test_empty_values_are_absent() {
        assert_eq!(parse("@article{k, title = {}}").title, None);
        assert_eq!(parse("@article{k, title = \"\"}").title, None);
        assert!(parse("@article{k, title = {}, author = {}}").is_empty());
    }

    #[test]
    fn test_quoted_and_braced_values_agree() {
        assert_eq!(
            parse("@article{k, title = \"Example Title\"}"),
            parse("@article{k, title = {Example Title}}")
        );
    }

    #[test]
    fn test_unknown_fields_are_dropped() {
        let input = "@article{k, doi = {10.1/x}, publisher = {ACM}, title = {T}}";
        let metadata = parse(input);
        assert_eq!(
            metadata,
            CanonicalMetadata {
                title: Some("T".to_string()),
                ..Default::default()
            }
        );
    }

    #[test]
    fn test_all_slots() {
        let input = r#"@inproceedings{key,
            title     = {Full Record},
            author    = {A. One and B. Two},
            year      = 2023,
            booktitle = "Proceedings of Something",
            volume    = {12},
            number    = {3},
            pages     = {45--67},
            abstract  = {An {abstract} here.},
            keywords  = {x; y, z},
        }"#;
        let metadata = parse(input);
        assert_eq!(metadata.title.as_deref(), Some("Full Record"));
        assert_eq!(metadata.authors, vec!["A. One", "B. Two"]);
        assert_eq!(metadata.year.as_deref(), Some("2023"));
        assert_eq!(metadata.venue.as_deref(), Some("Proceedings of Something"));
        assert_eq!(metadata.volume.as_deref(), Some("12"));
        assert_eq!(metadata.issue.as_deref(), Some("3"));
        assert_eq!(metadata.pages.as_deref(), Some("45--67"));
        assert_eq!(metadata.abstract_text.as_deref(), Some("An abstract here."));
        assert_eq!(metadata.keywords, vec!["x", "y", "z"]);
    }

    #[test]
    fn test_garbage_input_yields_empty_metadata() {
        for input in ["", "hello world", "@@@{{{", "title = {unterminated"] {
            assert!(parse(input).is_empty(), "input: {input:?}");
        }
    }

    #[test]
    fn test_partial_citation_keeps_valid_fields() {
        let input = "@article{k, title = {Kept}, ???, year = 2020, abstract = {cut off";
        let metadata = parse(input);
        assert_eq!(metadata.title.as_deref(), Some("Kept"));
        assert_eq!(metadata.year.as_deref(), Some("2020"));
        assert_eq!(metadata.abstract_text, None);
    }

    #[test]
    fn test_unbalanced_brace_in_quoted_value_keeps_later_fields() {
        let metadata = parse("@article{k, title = \"Set {A of things\", year = 2020, journal = {ACL}}");
        assert_eq!(metadata.title.as_deref(), Some("Set A of things"));
        assert_eq!(metadata.year.as_deref(), Some("2020"));
        assert_eq!(metadata.venue.as_deref(), Some("ACL"));
    }

    #[test]
    fn test_field_after_junk_word_is_kept() {
        let metadata = parse("@article{k, junk title = {Kept}, year = 2020}");
        assert_eq!(metadata.title.as_deref(), Some("Kept"));
        assert_eq!(metadata.year.as_deref(), Some("2020"));
    }

    #[test]
    fn test_parse_with_config() {
        let mut config = ParserConfig::new();
        config.set_field_mapping("issue", FieldSlot::Issue);
        let parser = BibtexParser::new().with_config(config);
        assert_eq!(
            parser.parse("@article{k, issue = {7}}").issue.as_deref(),
            Some("7")
        );
    }

    #[test]
    fn test_report_complete() {
        let report = BibtexParser::new().parse_with_report(DOE_2024);
        assert_eq!(report.completeness(), Completeness::Complete);
        assert_eq!(report.entry_type.as_deref(), Some("article"));
        assert_eq!(report.citation_key.as_deref(), Some("doe2024"));
        assert!(report.ignored_keys.is_empty());
    }

    #[test]
    fn test_report_partial_and_empty() {
        let parser = BibtexParser::new();

        let report = parser.parse_with_report("@misc{k, year = 1999, doi = {10.1/x}}");
        assert_eq!(report.completeness(), Completeness::Partial);
        assert_eq!(report.ignored_keys, vec!["doi"]);

        let report = parser.parse_with_report("@misc{k, title = {T}, oops}");
        assert_eq!(report.completeness(), Completeness::Partial);
        assert_eq!(report.skipped_fragments.len(), 1);

        let report = parser.parse_with_report("not a citation");
        assert_eq!(report.completeness(), Completeness::Empty);
    }

    #[test]
    fn test_report_serializes() {
        let report = BibtexParser::new().parse_with_report("@misc{k, title = {T}, oops}");
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["metadata"]["title"], "T");
        assert_eq!(json["skipped_fragments"][0]["reason"], "missing_equals");
    }
}
