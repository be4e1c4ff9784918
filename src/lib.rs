//! A library for importing BibTeX-style citations into paper records.
//!
//! `paperlib` turns a pasted citation into normalized metadata that can fill an
//! editable form, and keeps the resulting papers in an ordered, identifier-keyed
//! store.
//!
//! # Key Features
//!
//! - **Forgiving Parsing**: a single BibTeX-style entry is read field by field.
//!   Malformed fragments are skipped, unknown fields are dropped, and the worst
//!   outcome is empty metadata, never an error.
//!
//! - **Normalization**:
//!   - Braces and quotes removed from values
//!   - Authors split on `and`, keywords on `,` or `;`
//!   - Empty values reported as absent
//!
//! - **Record Store**:
//!   - Newest-first ordering, update in place
//!   - O(1) lookup by identifier
//!   - A locked variant for multi-threaded writers
//!
//! # Basic Usage
//!
//! ```rust
//! use paperlib::{BibtexParser, CitationParser, PaperRecord, PaperStore};
//!
//! let input = "@article{doe2024, title = {Deep Retrieval}, author = {Jane Doe and John Public}, year = {2024}}";
//! let metadata = BibtexParser::new().parse(input);
//!
//! let record = PaperRecord::from_metadata("paper-001", &metadata).unwrap();
//! let mut store = PaperStore::new();
//! store.upsert(record);
//!
//! assert_eq!(store.lookup("paper-001").unwrap().year, Some(2024));
//! ```
//!
//! # Completeness Reporting
//!
//! ```rust
//! use paperlib::{BibtexParser, Completeness};
//!
//! let report = BibtexParser::new().parse_with_report("@misc{k, title = {T}, stray}");
//! assert_eq!(report.completeness(), Completeness::Partial);
//! assert_eq!(report.skipped_fragments[0].text, "stray");
//! ```
//!
//! # Error Handling
//!
//! Parsing and store operations do not fail. Record-level operations that can
//! reject input return the crate [`Result`], wrapping [`PaperError`]:
//!
//! ```rust
//! use paperlib::{CanonicalMetadata, PaperError, PaperRecord};
//!
//! let metadata = CanonicalMetadata {
//!     year: Some("in press".to_string()),
//!     ..Default::default()
//! };
//! match PaperRecord::from_metadata("p1", &metadata) {
//!     Ok(record) => println!("Imported {}", record.title),
//!     Err(PaperError::InvalidFieldValue { field, message }) => eprintln!("{field}: {message}"),
//!     Err(e) => eprintln!("Other error: {e}"),
//! }
//! ```
//!
//! # Logging
//!
//! Skipped fragments and store mutations are reported through `tracing` at
//! `debug` and `trace` level. No subscriber is installed by the library.

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod bibtex;
pub mod derived;
pub mod paper;
mod regex;
pub mod store;
mod utils;

// Reexports
pub use bibtex::{BibtexParser, Completeness, ParseReport, ParserConfig};
pub use derived::{DerivedField, DerivedFieldWriter};
pub use paper::{Language, PageRange, PaperRecord, PaperStatus, Section};
pub use store::{PaperStore, SharedPaperStore};
pub use utils::{parse_year, split_pages};

/// A specialized Result type for paper record operations.
pub type Result<T> = std::result::Result<T, PaperError>;

/// Represents errors that can occur when editing paper records.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PaperError {
    #[error("Invalid field value: {field} - {message}")]
    InvalidFieldValue { field: String, message: String },

    #[error("Unknown language tag: {0}")]
    UnknownLanguage(String),

    #[error("Unknown paper status: {0}")]
    UnknownStatus(String),

    #[error("Section not found: {0}")]
    SectionNotFound(String),
}

/// The normalized result of parsing one citation.
///
/// Every field is optional. A present string is never empty, and the lists are
/// empty exactly when the field is absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// In order of appearance
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub authors: Vec<String>,
    /// Kept as text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,
    /// Journal or proceedings name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub venue: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issue: Option<String>,
    /// Page range, unsplit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pages: Option<String>,
    #[serde(rename = "abstract", default, skip_serializing_if = "Option::is_none")]
    pub abstract_text: Option<String>,
    /// Without repeats, in order of first appearance
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,
}

impl CanonicalMetadata {
    /// Whether no field was recognized.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.authors.is_empty()
            && self.year.is_none()
            && self.venue.is_none()
            && self.volume.is_none()
            && self.issue.is_none()
            && self.pages.is_none()
            && self.abstract_text.is_none()
            && self.keywords.is_empty()
    }
}

/// Trait for implementing citation parsers.
pub trait CitationParser {
    /// Parse a string containing a single citation.
    ///
    /// # Arguments
    ///
    /// * `input` - The pasted citation text
    ///
    /// # Returns
    ///
    /// The recognized metadata; empty if nothing could be read
    fn parse(&self, input: &str) -> CanonicalMetadata;
}

/// Parses a BibTeX-style citation with the default field mappings.
pub fn parse_citation(input: &str) -> CanonicalMetadata {
    BibtexParser::new().parse(input)
}
