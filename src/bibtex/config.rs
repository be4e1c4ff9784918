//! Configuration for the BibTeX parser.

use crate::bibtex::fields::{DEFAULT_FIELD_MAP, FieldSlot};
use compact_str::CompactString;
use std::collections::HashMap;

/// Configuration for BibTeX parsing with custom field mappings.
///
/// Starts from [`DEFAULT_FIELD_MAP`]; extra source field names can be routed to
/// a slot, and default ones removed, without touching the parser.
///
/// # Examples
///
/// ```
/// use paperlib::bibtex::{FieldSlot, ParserConfig};
///
/// let mut config = ParserConfig::new();
/// config
///     .set_field_mapping("issue", FieldSlot::Issue)
///     .set_field_mapping("keyword", FieldSlot::Keywords)
///     .remove_field_mapping("abstract");
/// ```
#[derive(Debug, Clone)]
pub struct ParserConfig {
    field_map: HashMap<CompactString, FieldSlot>,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl ParserConfig {
    /// Creates a configuration holding the default field mappings.
    #[must_use]
    pub fn new() -> Self {
        let field_map = DEFAULT_FIELD_MAP
            .iter()
            .map(|&(name, slot)| (CompactString::from(name), slot))
            .collect();
        Self { field_map }
    }

    /// Routes the source field `key` to `slot`. Keys are matched case-insensitively.
    pub fn set_field_mapping(&mut self, key: &str, slot: FieldSlot) -> &mut Self {
        self.field_map.insert(lowercase(key), slot);
        self
    }

    /// Stops recognizing the source field `key`.
    pub fn remove_field_mapping(&mut self, key: &str) -> &mut Self {
        self.field_map.remove(&lowercase(key));
        self
    }

    /// Finds the slot for a source field name.
    pub fn slot_for(&self, key: &str) -> Option<FieldSlot> {
        self.field_map.get(&lowercase(key)).copied()
    }
}

fn lowercase(key: &str) -> CompactString {
    key.trim().chars().map(|c| c.to_ascii_lowercase()).collect()
}
