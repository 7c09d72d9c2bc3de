//! The record store: one immutable generation of normalized records.
//!
//! A [`RecordStore`] is built once from the normalizer's output and never
//! mutated afterwards. Reloading builds a new store and publishes it through
//! a [`SharedStore`]; strategies only borrow from the generation they were
//! handed.
//!
//! # Indexes
//!
//! | Index | Built | Used by |
//! |-------|-------|---------|
//! | `case_id → position` | eagerly, in [`RecordStore::build`] | exact lookup |
//! | folded text per record | lazily, first text/name/filter scan | search strategies |
//! | category vocabulary | lazily, first suggestion | suggestion engine |

pub mod shared;

use std::collections::HashMap;
use std::sync::OnceLock;

use crate::models::{DataQualityIssue, Provenance, Record};
use crate::search::FoldedText;
use crate::suggest::Vocabulary;
use crate::text::fold;

pub use shared::SharedStore;

/// One generation of the queryable record collection.
#[derive(Debug)]
pub struct RecordStore {
    generation_id: u64,
    provenance: Option<Provenance>,
    records: Vec<Record>,
    by_case_id: HashMap<String, usize>,
    duplicates: Vec<DataQualityIssue>,
    folded: OnceLock<Vec<FoldedText>>,
    vocabulary: OnceLock<Vocabulary>,
}

impl RecordStore {
    /// Build a generation from normalized records.
    ///
    /// Duplicate `case_id`s keep the last occurrence (at its own position in
    /// load order) and are reported as [`DataQualityIssue::DuplicateCaseId`].
    pub fn build(generation_id: u64, records: Vec<Record>, provenance: Option<Provenance>) -> Self {
        let mut last_seen: HashMap<String, usize> = HashMap::with_capacity(records.len());
        let mut occurrences: HashMap<String, usize> = HashMap::new();
        let mut dup_order: Vec<String> = Vec::new();

        for (idx, r) in records.iter().enumerate() {
            let key = case_key(&r.case_id);
            if last_seen.insert(key.clone(), idx).is_some() {
                let count = occurrences.entry(key.clone()).or_insert(1);
                if *count == 1 {
                    dup_order.push(r.case_id.clone());
                }
                *count += 1;
            }
        }

        let duplicates: Vec<DataQualityIssue> = dup_order
            .into_iter()
            .map(|case_id| {
                let n = occurrences.get(&case_key(&case_id)).copied().unwrap_or(2);
                log::debug!("duplicate case id {} ({} occurrences)", case_id, n);
                DataQualityIssue::DuplicateCaseId {
                    case_id,
                    occurrences: n,
                }
            })
            .collect();

        let kept: Vec<Record> = records
            .into_iter()
            .enumerate()
            .filter(|(idx, r)| last_seen.get(&case_key(&r.case_id)) == Some(idx))
            .map(|(_, r)| r)
            .collect();

        let by_case_id = kept
            .iter()
            .enumerate()
            .map(|(idx, r)| (case_key(&r.case_id), idx))
            .collect();

        Self {
            generation_id,
            provenance,
            records: kept,
            by_case_id,
            duplicates,
            folded: OnceLock::new(),
            vocabulary: OnceLock::new(),
        }
    }

    pub fn generation_id(&self) -> u64 {
        self.generation_id
    }

    pub fn provenance(&self) -> Option<&Provenance> {
        self.provenance.as_ref()
    }

    /// Records in load order.
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Exact, case-insensitive lookup by `case_id`.
    pub fn get(&self, case_id: &str) -> Option<&Record> {
        self.position(case_id).map(|idx| &self.records[idx])
    }

    pub(crate) fn position(&self, case_id: &str) -> Option<usize> {
        self.by_case_id.get(&case_key(case_id)).copied()
    }

    /// Duplicate-id issues found while building this generation.
    pub fn duplicate_issues(&self) -> &[DataQualityIssue] {
        &self.duplicates
    }

    pub(crate) fn folded(&self) -> &[FoldedText] {
        self.folded
            .get_or_init(|| self.records.iter().map(FoldedText::of).collect())
    }

    pub(crate) fn vocabulary(&self) -> &Vocabulary {
        self.vocabulary
            .get_or_init(|| Vocabulary::build(&self.records))
    }
}

fn case_key(case_id: &str) -> String {
    fold(case_id.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(id: &str, status: &str) -> Record {
        let mut r = Record::new(id);
        r.status = Some(status.to_string());
        r
    }

    #[test]
    fn lookup_is_exact_and_case_insensitive() {
        let store = RecordStore::build(1, vec![rec("AB-1", "x"), rec("AB-2", "y")], None);
        assert_eq!(store.get("ab-2").map(|r| r.case_id.as_str()), Some("AB-2"));
        assert_eq!(store.get(" AB-1 ").map(|r| r.case_id.as_str()), Some("AB-1"));
        assert!(store.get("AB").is_none());
    }

    #[test]
    fn duplicates_keep_last_and_are_reported() {
        let store = RecordStore::build(
            7,
            vec![
                rec("1", "first"),
                rec("2", "only"),
                rec("1", "second"),
                rec("1", "third"),
            ],
            None,
        );
        assert_eq!(store.len(), 2);
        assert_eq!(store.get("1").unwrap().status.as_deref(), Some("third"));
        let ids: Vec<&str> = store.records().iter().map(|r| r.case_id.as_str()).collect();
        assert_eq!(ids, vec!["2", "1"]);
        assert_eq!(
            store.duplicate_issues(),
            &[DataQualityIssue::DuplicateCaseId {
                case_id: "1".to_string(),
                occurrences: 3
            }]
        );
    }

    #[test]
    fn lazy_indexes_cover_every_record() {
        let store = RecordStore::build(1, vec![rec("1", "a"), rec("2", "b")], None);
        assert_eq!(store.folded().len(), store.len());
    }
}
