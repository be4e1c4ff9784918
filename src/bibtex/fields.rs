//! Canonical metadata slots and the BibTeX field names that map onto them.

use serde::{Deserialize, Serialize};

/// A slot of [`CanonicalMetadata`](crate::CanonicalMetadata).
#[derive(Debug, Eq, PartialEq, Hash, Copy, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldSlot {
    Title,
    /// Split on ` and `
    Authors,
    Year,
    /// Journal or proceedings name
    Venue,
    Volume,
    Issue,
    Pages,
    Abstract,
    /// Split on `,` or `;`
    Keywords,
}

/// Default mapping from lowercase BibTeX field name to slot.
///
/// Fields not listed here are dropped by the parser.
pub const DEFAULT_FIELD_MAP: &[(&str, FieldSlot)] = &[
    ("title", FieldSlot::Title),
    ("author", FieldSlot::Authors),
    ("year", FieldSlot::Year),
    ("journal", FieldSlot::Venue),
    ("booktitle", FieldSlot::Venue),
    ("volume", FieldSlot::Volume),
    ("number", FieldSlot::Issue),
    ("pages", FieldSlot::Pages),
    ("abstract", FieldSlot::Abstract),
    ("keywords", FieldSlot::Keywords),
];

impl FieldSlot {
    /// Name of the slot in [`CanonicalMetadata`](crate::CanonicalMetadata).
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldSlot::Title => "title",
            FieldSlot::Authors => "authors",
            FieldSlot::Year => "year",
            FieldSlot::Venue => "venue",
            FieldSlot::Volume => "volume",
            FieldSlot::Issue => "issue",
            FieldSlot::Pages => "pages",
            FieldSlot::Abstract => "abstract",
            FieldSlot::Keywords => "keywords",
        }
    }
}
