//! The paper record store.
//!
//! Holds records newest-first with an identifier index beside them. New records
//! are prepended; an upsert of a known identifier replaces the record where it
//! stands. The index is rebuilt whenever positions shift, so it always agrees
//! with the sequence once a method returns.
//!
//! [`PaperStore`] has no locking and needs `&mut self` to write. Use
//! [`SharedPaperStore`] when several threads write.
//!
//! # Example
//!
//! ```
//! use paperlib::{PaperRecord, PaperStore};
//!
//! let mut store = PaperStore::new();
//! store.upsert(PaperRecord::new("a"));
//! store.upsert(PaperRecord::new("b"));
//! assert_eq!(store.ids().collect::<Vec<_>>(), ["b", "a"]);
//!
//! store.delete("missing");
//! assert_eq!(store.len(), 2);
//! ```

use crate::derived::{DerivedField, DerivedFieldWriter};
use crate::{PaperRecord, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Ordered, identifier-keyed collection of [`PaperRecord`]s.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "Vec<PaperRecord>", into = "Vec<PaperRecord>")]
pub struct PaperStore {
    records: Vec<PaperRecord>,
    index: HashMap<String, usize>,
}

impl PaperStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store from records already in display order.
    ///
    /// A repeated identifier keeps its first occurrence.
    pub fn from_records<I>(records: I) -> Self
    where
        I: IntoIterator<Item = PaperRecord>,
    {
        let mut store = Self::new();
        for record in records {
            if store.index.contains_key(record.id()) {
                tracing::debug!(id = record.id(), "dropping repeated paper id");
                continue;
            }
            store
                .index
                .insert(record.id().to_string(), store.records.len());
            store.records.push(record);
        }
        store
    }

    /// Inserts `record` at the front, or replaces the record with the same
    /// identifier in its current position.
    pub fn upsert(&mut self, record: PaperRecord) {
        match self.index.get(record.id()) {
            Some(&pos) => {
                tracing::debug!(id = record.id(), pos, "replacing paper");
                self.records[pos] = record;
            }
            None => {
                tracing::debug!(id = record.id(), "inserting paper");
                self.records.insert(0, record);
                self.reindex();
            }
        }
    }

    /// Removes the record with identifier `id`. Removing an absent identifier does nothing.
    pub fn delete(&mut self, id: &str) -> Option<PaperRecord> {
        let pos = self.index.get(id).copied()?;
        let removed = self.records.remove(pos);
        self.reindex();
        tracing::debug!(id, "deleted paper");
        Some(removed)
    }

    pub fn lookup(&self, id: &str) -> Option<&PaperRecord> {
        self.index.get(id).map(|&pos| &self.records[pos])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// All records, newest first.
    pub fn all(&self) -> &[PaperRecord] {
        &self.records
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.records.iter().map(PaperRecord::id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Edits the record with identifier `id` in place and marks it modified.
    ///
    /// Returns `false` if there is no such record.
    pub fn update<F>(&mut self, id: &str, edit: F) -> bool
    where
        F: FnOnce(&mut PaperRecord),
    {
        let Some(&pos) = self.index.get(id) else {
            return false;
        };
        let record = &mut self.records[pos];
        edit(record);
        record.touch();
        true
    }

    /// Runs a derived-field writer on the record with identifier `id` and upserts
    /// the result.
    ///
    /// Returns `Ok(false)` when the record is absent or the writer produced nothing.
    ///
    /// # Errors
    ///
    /// Returns the error of [`PaperRecord::apply_derived`]; the stored record is
    /// left unchanged.
    pub fn apply_writer<W>(&mut self, id: &str, writer: &W) -> Result<bool>
    where
        W: DerivedFieldWriter + ?Sized,
    {
        let Some(field) = self.lookup(id).and_then(|current| writer.derive(current)) else {
            return Ok(false);
        };
        self.apply_derived(id, field)
    }

    /// Writes `field` into a copy of the record with identifier `id` and upserts
    /// the copy. The stored record is untouched on error.
    fn apply_derived(&mut self, id: &str, field: DerivedField) -> Result<bool> {
        let Some(current) = self.lookup(id) else {
            return Ok(false);
        };
        let mut next = current.clone();
        next.apply_derived(field)?;
        self.upsert(next);
        Ok(true)
    }

    fn reindex(&mut self) {
        self.index.clear();
        self.index.extend(
            self.records
                .iter()
                .enumerate()
                .map(|(pos, record)| (record.id().to_string(), pos)),
        );
    }
}

impl From<Vec<PaperRecord>> for PaperStore {
    fn from(records: Vec<PaperRecord>) -> Self {
        Self::from_records(records)
    }
}

impl From<PaperStore> for Vec<PaperRecord> {
    fn from(store: PaperStore) -> Self {
        store.records
    }
}

/// A [`PaperStore`] behind one lock, shareable between threads.
///
/// Every write holds the lock across both the sequence and the index. Reads hand
/// back owned copies. A lock poisoned by a panicking writer is recovered, since
/// each store method leaves the store consistent before it can panic.
#[derive(Debug, Clone, Default)]
pub struct SharedPaperStore {
    inner: Arc<RwLock<PaperStore>>,
}

impl SharedPaperStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, PaperStore> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, PaperStore> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn upsert(&self, record: PaperRecord) {
        self.write().upsert(record);
    }

    pub fn delete(&self, id: &str) -> Option<PaperRecord> {
        self.write().delete(id)
    }

    pub fn lookup(&self, id: &str) -> Option<PaperRecord> {
        self.read().lookup(id).cloned()
    }

    /// A snapshot of all records, newest first.
    pub fn all(&self) -> Vec<PaperRecord> {
        self.read().all().to_vec()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    pub fn update<F>(&self, id: &str, edit: F) -> bool
    where
        F: FnOnce(&mut PaperRecord),
    {
        self.write().update(id, edit)
    }

    /// Runs `writer` on a snapshot of the record, with no lock held, then writes
    /// the result into the record as it stands at that point.
    ///
    /// Returns `Ok(false)` if the record is absent before or after the writer runs.
    pub fn apply_writer<W>(&self, id: &str, writer: &W) -> Result<bool>
    where
        W: DerivedFieldWriter + ?Sized,
    {
        let Some(field) = self.lookup(id).and_then(|snapshot| writer.derive(&snapshot)) else {
            return Ok(false);
        };
        self.write().apply_derived(id, field)
    }

    /// Runs `f` with read access to the whole store.
    pub fn with<R>(&self, f: impl FnOnce(&PaperStore) -> R) -> R {
        let store = self.read();
        f(&store)
    }
}

impl From<PaperStore> for SharedPaperStore {
    fn from(store: PaperStore) -> Self {
        Self {
            inner: Arc::new(RwLock::new(store)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PaperError;
    use pretty_assertions::assert_eq;
    use std::thread;

    fn record(id: &str, title: &str) -> PaperRecord {
        let mut record = PaperRecord::new(id);
        record.title = title.to_string();
        record
    }

    fn ids(store: &PaperStore) -> Vec<&str> {
        store.ids().collect()
    }

    fn assert_index_consistent(store: &PaperStore) {
        assert_eq!(store.index.len(), store.records.len());
        for (pos, record) in store.records.iter().enumerate() {
            assert_eq!(store.index.get(record.id()), Some(&pos));
        }
    }

    #[test]
    fn test_upsert_new_prepends() {
        let mut store = PaperStore::new();
        store.upsert(record("a", "A"));
        store.upsert(record("b", "B"));
        store.upsert(record("c", "C"));
        assert_eq!(ids(&store), vec!["c", "b", "a"]);
        assert_index_consistent(&store);
    }

    #[test]
    fn test_upsert_existing_keeps_position() {
        let mut store = PaperStore::new();
        store.upsert(record("a", "A"));
        store.upsert(record("b", "B"));
        store.upsert(record("c", "C"));

        store.upsert(record("b", "B revised"));
        assert_eq!(ids(&store), vec!["c", "b", "a"]);
        assert_eq!(store.lookup("b").unwrap().title, "B revised");
        assert_eq!(store.len(), 3);
        assert_index_consistent(&store);
    }

    #[test]
    fn test_delete() {
        let mut store = PaperStore::from_records(vec![record("a", "A"), record("b", "B")]);
        let removed = store.delete("a").unwrap();
        assert_eq!(removed.id(), "a");
        assert_eq!(ids(&store), vec!["b"]);
        assert!(store.lookup("a").is_none());
        assert_index_consistent(&store);
    }

    #[test]
    fn test_delete_absent_is_noop() {
        let mut store = PaperStore::from_records(vec![record("a", "A"), record("b", "B")]);
        let before = store.all().to_vec();
        assert!(store.delete("zzz").is_none());
        assert_eq!(store.all(), before.as_slice());
        assert_index_consistent(&store);
    }

    #[test]
    fn test_lookup_missing() {
        let store = PaperStore::new();
        assert!(store.lookup("nope").is_none());
        assert!(!store.contains("nope"));
        assert!(store.is_empty());
    }

    #[test]
    fn test_delete_then_reinsert_goes_to_front() {
        let mut store = PaperStore::from_records(vec![record("a", "A"), record("b", "B")]);
        store.delete("b");
        store.upsert(record("b", "B again"));
        assert_eq!(ids(&store), vec!["b", "a"]);
        assert_index_consistent(&store);
    }

    #[test]
    fn test_from_records_drops_repeated_ids() {
        let store = PaperStore::from_records(vec![
            record("a", "first"),
            record("b", "B"),
            record("a", "second"),
        ]);
        assert_eq!(ids(&store), vec!["a", "b"]);
        assert_eq!(store.lookup("a").unwrap().title, "first");
        assert_index_consistent(&store);
    }

    #[test]
    fn test_update() {
        let mut store = PaperStore::from_records(vec![record("a", "A")]);
        let before = store.lookup("a").unwrap().updated_at();
        assert!(store.update("a", |r| r.title = "Edited".to_string()));
        let after = store.lookup("a").unwrap();
        assert_eq!(after.title, "Edited");
        assert!(after.updated_at() >= before);
        assert!(!store.update("missing", |r| r.title.clear()));
    }

    #[test]
    fn test_apply_writer() {
        let mut store = PaperStore::from_records(vec![record("a", "A"), record("b", "B")]);
        let translate = |r: &PaperRecord| {
            Some(DerivedField::TranslatedAbstract(format!("訳: {}", r.title)))
        };

        assert!(store.apply_writer("b", &translate).unwrap());
        assert_eq!(
            store.lookup("b").unwrap().translated_abstract.as_deref(),
            Some("訳: B")
        );
        assert_eq!(ids(&store), vec!["a", "b"]);

        assert!(!store.apply_writer("missing", &translate).unwrap());
        let nothing = |_: &PaperRecord| -> Option<DerivedField> { None };
        assert!(!store.apply_writer("a", &nothing).unwrap());
    }

    #[test]
    fn test_apply_writer_error_leaves_record() {
        let mut store = PaperStore::from_records(vec![record("a", "A")]);
        let before = store.lookup("a").unwrap().clone();
        let bad = |_: &PaperRecord| {
            Some(DerivedField::SectionSummary {
                section_id: "s-404".to_string(),
                summary: "x".to_string(),
            })
        };
        let err = store.apply_writer("a", &bad).unwrap_err();
        assert!(matches!(err, PaperError::SectionNotFound(_)));
        assert_eq!(store.lookup("a"), Some(&before));
    }

    #[test]
    fn test_store_serializes_as_sequence() {
        let store = PaperStore::from_records(vec![record("a", "A"), record("b", "B")]);
        let json = serde_json::to_value(&store).unwrap();
        assert_eq!(json.as_array().unwrap().len(), 2);
        assert_eq!(json[0]["id"], "a");

        let back: PaperStore = serde_json::from_value(json).unwrap();
        assert_eq!(ids(&back), vec!["a", "b"]);
        assert_index_consistent(&back);
    }

    #[test]
    fn test_shared_store_concurrent_writers() {
        let shared = SharedPaperStore::new();
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let shared = shared.clone();
                thread::spawn(move || {
                    for i in 0..25 {
                        let id = format!("t{t}-{i}");
                        shared.upsert(record(&id, "x"));
                        if i % 5 == 0 {
                            shared.delete(&id);
                        }
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(shared.len(), 8 * 20);
        shared.with(assert_index_consistent);
    }

    #[test]
    fn test_shared_store_round_trip() {
        let shared = SharedPaperStore::from(PaperStore::from_records(vec![record("a", "A")]));
        shared.upsert(record("b", "B"));
        assert_eq!(
            shared.all().iter().map(PaperRecord::id).collect::<Vec<_>>(),
            vec!["b", "a"]
        );
        assert!(shared.update("a", |r| r.title = "A2".to_string()));
        assert_eq!(shared.lookup("a").unwrap().title, "A2");
        assert_eq!(shared.delete("a").map(|r| r.title), Some("A2".to_string()));
        assert!(shared.lookup("a").is_none());
        assert!(!shared.is_empty());
    }

    #[test]
    fn test_shared_writer_may_read_the_store() {
        let shared = SharedPaperStore::new();
        shared.upsert(record("a", "Alpha"));
        shared.upsert(record("b", "Beta"));

        let reader = shared.clone();
        let summarize = move |r: &PaperRecord| {
            let others = reader.all().len() - 1;
            Some(DerivedField::OverallSummary(format!("{} (+{others})", r.title)))
        };
        assert_eq!(shared.apply_writer("a", &summarize), Ok(true));
        assert_eq!(
            shared.lookup("a").unwrap().overall_summary.as_deref(),
            Some("Alpha (+1)")
        );
    }

    #[test]
    fn test_shared_writer_result_lands_on_current_record() {
        let shared = SharedPaperStore::new();
        shared.upsert(record("a", "Alpha"));

        let editor = shared.clone();
        let translate = move |r: &PaperRecord| {
            editor.update("a", |current| current.title = "Alpha, revised".to_string());
            Some(DerivedField::TranslatedAbstract(format!("訳: {}", r.title)))
        };
        assert_eq!(shared.apply_writer("a", &translate), Ok(true));

        let stored = shared.lookup("a").unwrap();
        assert_eq!(stored.title, "Alpha, revised");
        assert_eq!(stored.translated_abstract.as_deref(), Some("訳: Alpha"));
    }

    #[test]
    fn test_shared_writer_on_record_deleted_meanwhile() {
        let shared = SharedPaperStore::new();
        shared.upsert(record("a", "Alpha"));

        let deleter = shared.clone();
        let summarize = move |_: &PaperRecord| -> Option<DerivedField> {
            deleter.delete("a");
            Some(DerivedField::OverallSummary("gone".to_string()))
        };
        assert_eq!(shared.apply_writer("a", &summarize), Ok(false));
        assert!(shared.is_empty());
    }
}
