//! Write-back of derived fields.
//!
//! Translation and summarization run outside this crate. Their results come back
//! as a [`DerivedField`] and travel through the same upsert path as manual edits.

use crate::PaperRecord;
use serde::{Deserialize, Serialize};

/// A value computed from a record by an external producer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum DerivedField {
    TranslatedAbstract(String),
    OverallSummary(String),
    SectionSummary { section_id: String, summary: String },
}

/// Produces a derived field for a record, or nothing if there is nothing to derive.
///
/// Implemented for closures, so a producer can be passed inline:
///
/// ```
/// use paperlib::{DerivedField, PaperRecord, PaperStore};
///
/// let mut store = PaperStore::new();
/// let mut record = PaperRecord::new("p1");
/// record.abstract_text = "We study retrieval.".to_string();
/// store.upsert(record);
///
/// let summarize = |record: &PaperRecord| {
///     Some(DerivedField::OverallSummary(format!("Summary: {}", record.abstract_text)))
/// };
/// assert!(store.apply_writer("p1", &summarize).unwrap());
/// ```
pub trait DerivedFieldWriter {
    fn derive(&self, record: &PaperRecord) -> Option<DerivedField>;
}

impl<F> DerivedFieldWriter for F
where
    F: Fn(&PaperRecord) -> Option<DerivedField>,
{
    fn derive(&self, record: &PaperRecord) -> Option<DerivedField> {
        self(record)
    }
}
