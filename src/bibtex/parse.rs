//! BibTeX field list parsing.
//!
//! Runs the tokenizer over the input and sorts what it yields into fields bound
//! for a metadata slot, fields with an unknown name, and skipped fragments.

use crate::bibtex::config::ParserConfig;
use crate::bibtex::structure::RawBibtexData;
use crate::bibtex::tokenize::FieldTokenizer;
use either::{Left, Right};
use itertools::Itertools;

/// Parse the text of one citation entry into its raw, slot-tagged fields.
pub(crate) fn bibtex_parse<S: AsRef<str>>(text: S, config: &ParserConfig) -> RawBibtexData {
    let tokenizer = FieldTokenizer::new(text.as_ref());
    let header = tokenizer.header();

    let (skipped, fields): (Vec<_>, Vec<_>) = tokenizer.partition_map(|event| event);
    let (ignored_keys, fields): (Vec<_>, Vec<_>) =
        fields
            .into_iter()
            .partition_map(|field| match config.slot_for(&field.key) {
                Some(slot) => {
                    tracing::trace!(key = %field.key, slot = slot.as_str(), "mapped field");
                    Right((slot, field.value))
                }
                None => Left(field.key),
            });

    RawBibtexData {
        entry_type: header.map(|h| h.entry_type.to_string()),
        citation_key: header.and_then(|h| h.citation_key).map(String::from),
        fields,
        ignored_keys,
        skipped,
    }
}
