//! Immutable dataset snapshot: canonical records plus their name index.
//!
//! The name index is built in the same constructor as the record sequence
//! and neither can change afterwards, so a search can never run against a
//! stale name set. Loading new data means building a new `Dataset`; callers
//! that share one across threads swap an `Arc<Dataset>`.

use crate::fuzzy::{EditDistanceMatcher, FuzzyMatcher, NameMatch};
use crate::ingest::{ingest_rows_with, IngestSummary};
use crate::models::{LifterRecord, RawRow};
use crate::names::NameIndex;
use crate::normalize::AliasTable;
use crate::query::{self, LiftSeries, Progression, ProgressionQuery};

#[derive(Debug)]
pub struct Dataset {
    records: Vec<LifterRecord>,
    names: NameIndex,
    summary: IngestSummary,
}

impl Dataset {
    /// Ingest rows with the default alias table and matcher.
    pub fn from_rows(rows: &[RawRow]) -> Self {
        Self::from_rows_with(rows, &AliasTable::default(), &EditDistanceMatcher::default())
    }

    pub fn from_rows_with(rows: &[RawRow], table: &AliasTable, matcher: &dyn FuzzyMatcher) -> Self {
        let (records, summary) = ingest_rows_with(table, rows);
        let names = NameIndex::build_with(&records, matcher);
        Self {
            records,
            names,
            summary,
        }
    }

    /// Wrap already-normalized records.
    pub fn from_records(records: Vec<LifterRecord>) -> Self {
        Self::from_records_with(records, &EditDistanceMatcher::default())
    }

    pub fn from_records_with(records: Vec<LifterRecord>, matcher: &dyn FuzzyMatcher) -> Self {
        let names = NameIndex::build_with(&records, matcher);
        // No header sets: the records never passed through a column plan.
        let mut summary = IngestSummary::default();
        for record in &records {
            summary.observe(record);
        }
        Self {
            records,
            names,
            summary,
        }
    }

    pub fn empty() -> Self {
        Self::from_records(Vec::new())
    }

    pub fn records(&self) -> &[LifterRecord] {
        &self.records
    }

    pub fn names(&self) -> &NameIndex {
        &self.names
    }

    pub fn summary(&self) -> &IngestSummary {
        &self.summary
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Sorted distinct lifter names.
    pub fn list_names(&self) -> &[String] {
        self.names.list_names()
    }

    /// Fuzzy name search, best match first.
    pub fn search_names(&self, query: &str) -> Vec<String> {
        self.names.search(query)
    }

    pub fn search_scored(&self, query: &str, limit: usize) -> Vec<NameMatch> {
        self.names.search_scored(query, limit)
    }

    pub fn progression_series(&self, query: &ProgressionQuery) -> Vec<LiftSeries> {
        query::progression_series(&self.records, query)
    }

    pub fn progression(&self, query: &ProgressionQuery) -> Progression {
        query::progression(&self.records, query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Lift, Unit};
    use crate::query::EquipmentFilter;

    fn row(pairs: &[(&str, &str)]) -> RawRow {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Dataset>();
    }

    #[test]
    fn test_empty_dataset_degrades() {
        let dataset = Dataset::from_rows(&[]);
        assert!(dataset.is_empty());
        assert!(dataset.list_names().is_empty());
        assert!(dataset.search_names("jane").is_empty());
        let q = ProgressionQuery::new("Jane", EquipmentFilter::All, Unit::Kg, Lift::ALL);
        assert!(dataset.progression_series(&q).is_empty());
    }

    #[test]
    fn test_rebuild_replaces_names() {
        let first = Dataset::from_rows(&[row(&[("Name", "Old Lifter")])]);
        let second = Dataset::from_rows(&[row(&[("Name", "New Lifter")])]);
        assert_eq!(first.search_names("old lifter"), vec!["Old Lifter"]);
        assert!(second.search_names("old lifter").is_empty());
        assert_eq!(second.list_names(), ["New Lifter"]);
    }

    #[test]
    fn test_from_records_summary_matches_ingest() {
        let rows = [
            row(&[("Name", "Ann Smith"), ("TotalKg", "300"), ("MeetDate", "2020-01-05")]),
            row(&[("Name", ""), ("Equipment", "Raw")]),
            row(&[("Name", "Ann Smith"), ("SquatKg", "bad")]),
        ];
        let ingested = Dataset::from_rows(&rows);
        let wrapped = Dataset::from_records(ingested.records().to_vec());

        let summary = wrapped.summary();
        assert_eq!(summary.rows, 3);
        assert_eq!(summary.missing_name, 1);
        assert_eq!(summary.missing_date, 2);
        assert_eq!(summary.missing_lifts, 2);
        assert_eq!(summary.missing_lifts, ingested.summary().missing_lifts);
        assert_eq!(summary.header_sets, 0);
    }

    #[test]
    fn test_custom_table_and_matcher() {
        let table = AliasTable::default().with_alias(crate::normalize::Field::Name, "athlete");
        let dataset = Dataset::from_rows_with(
            &[row(&[("Athlete", "Kim Park")])],
            &table,
            &EditDistanceMatcher::new(0.95),
        );
        assert_eq!(dataset.list_names(), ["Kim Park"]);
        assert!(dataset.search_names("kim prk").is_empty());
        assert_eq!(dataset.summary().rows, 1);
    }
}
