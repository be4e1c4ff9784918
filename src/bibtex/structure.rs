//! BibTeX intermediate data and its conversion into [`CanonicalMetadata`].
//!
//! # Field Processing Strategy
//! - **Last-wins**: fields are applied in source order, so a later occurrence
//!   of a slot overwrites an earlier one, also across aliases such as
//!   `journal` and `booktitle`.
//! - **Empty is absent**: a value that normalizes to nothing is not applied and
//!   leaves any earlier value in place.

use crate::CanonicalMetadata;
use crate::bibtex::fields::FieldSlot;
use crate::bibtex::normalize::{normalize_value, split_authors, split_keywords};
use crate::bibtex::tokenize::SkippedFragment;
use compact_str::CompactString;

/// Structured raw data from one BibTeX entry.
#[derive(Debug, Clone, Default)]
pub(crate) struct RawBibtexData {
    /// `article`, `inproceedings`, ... as written in the source.
    pub(crate) entry_type: Option<String>,
    pub(crate) citation_key: Option<String>,
    /// Recognized fields with their raw values, in source order.
    pub(crate) fields: Vec<(FieldSlot, String)>,
    /// Well-formed fields whose name maps to no slot.
    pub(crate) ignored_keys: Vec<CompactString>,
    /// Malformed fragments stepped over by the tokenizer.
    pub(crate) skipped: Vec<SkippedFragment>,
}

impl RawBibtexData {
    /// Check if any field was recognized.
    pub(crate) fn has_content(&self) -> bool {
        !self.fields.is_empty()
    }
}

impl From<&RawBibtexData> for CanonicalMetadata {
    fn from(raw: &RawBibtexData) -> Self {
        let mut metadata = CanonicalMetadata::default();
        for (slot, value) in &raw.fields {
            match slot {
                FieldSlot::Authors => replace_list(&mut metadata.authors, split_authors(value)),
                FieldSlot::Keywords => replace_list(&mut metadata.keywords, split_keywords(value)),
                FieldSlot::Title => replace_text(&mut metadata.title, value),
                FieldSlot::Year => replace_text(&mut metadata.year, value),
                FieldSlot::Venue => replace_text(&mut metadata.venue, value),
                FieldSlot::Volume => replace_text(&mut metadata.volume, value),
                FieldSlot::Issue => replace_text(&mut metadata.issue, value),
                FieldSlot::Pages => replace_text(&mut metadata.pages, value),
                FieldSlot::Abstract => replace_text(&mut metadata.abstract_text, value),
            }
        }
        metadata
    }
}

fn replace_text(slot: &mut Option<String>, raw: &str) {
    if let Some(text) = normalize_value(raw) {
        *slot = Some(text);
    }
}

fn replace_list(slot: &mut Vec<String>, items: Vec<String>) {
    if !items.is_empty() {
        *slot = items;
    }
}
