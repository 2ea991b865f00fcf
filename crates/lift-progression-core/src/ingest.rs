//! Ingestion pipeline: raw rows → ordered canonical records.
//!
//! Ingestion is a pure, order-preserving transform. It never deduplicates
//! or sorts (the query layer does that), and a malformed row degrades to a
//! sparse record instead of failing the batch: `n` rows in, `n` records out.
//!
//! Rows that share a header set (the common case for one CSV file) reuse a
//! single [`ColumnPlan`], so alias resolution runs once per distinct header
//! set rather than once per row.

use serde_json::Value;
use tracing::debug;

use crate::error::IngestError;
use crate::models::{LifterRecord, RawRow};
use crate::normalize::{normalize_with_plan, AliasTable, ColumnPlan};

/// Counters describing one ingestion run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestSummary {
    pub rows: usize,
    pub missing_name: usize,
    pub missing_date: usize,
    /// Rows where no lift (squat, bench, deadlift, total) has a value.
    pub missing_lifts: usize,
    /// Number of distinct header sets encountered.
    pub header_sets: usize,
}

impl IngestSummary {
    pub(crate) fn observe(&mut self, record: &LifterRecord) {
        self.rows += 1;
        if record.name.is_empty() {
            self.missing_name += 1;
        }
        if record.meet_date.is_none() {
            self.missing_date += 1;
        }
        if record.squat.is_empty()
            && record.bench.is_empty()
            && record.deadlift.is_empty()
            && record.total.is_empty()
        {
            self.missing_lifts += 1;
        }
    }
}

/// Ingest rows with the default [`AliasTable`].
pub fn ingest_rows(rows: &[RawRow]) -> Vec<LifterRecord> {
    ingest_rows_with(&AliasTable::default(), rows).0
}

/// Ingest rows with a caller-supplied alias table, returning run counters.
pub fn ingest_rows_with(table: &AliasTable, rows: &[RawRow]) -> (Vec<LifterRecord>, IngestSummary) {
    let mut records = Vec::with_capacity(rows.len());
    let mut summary = IngestSummary::default();
    let mut plan: Option<ColumnPlan> = None;

    for row in rows {
        if !plan.as_ref().is_some_and(|p| p.fits(row)) {
            plan = None;
        }
        let active = plan.get_or_insert_with(|| {
            summary.header_sets += 1;
            ColumnPlan::resolve(table, row.keys())
        });
        let record = normalize_with_plan(row, active);
        summary.observe(&record);
        records.push(record);
    }

    debug!(
        rows = summary.rows,
        missing_name = summary.missing_name,
        missing_date = summary.missing_date,
        missing_lifts = summary.missing_lifts,
        header_sets = summary.header_sets,
        "ingested rows"
    );

    (records, summary)
}

/// Convert JSON rows (objects keyed by column name) into [`RawRow`]s.
///
/// Strings are taken as-is, numbers and booleans are stringified, and
/// `null` becomes an empty cell. Nested arrays/objects are stringified as
/// JSON text and coerced like any other cell. A row that is not an object
/// is a structural error.
pub fn json_to_raw_rows(rows: &[Value]) -> Result<Vec<RawRow>, IngestError> {
    rows.iter()
        .enumerate()
        .map(|(index, value)| match value {
            Value::Object(map) => Ok(map
                .iter()
                .map(|(k, v)| (k.clone(), json_cell(v)))
                .collect::<RawRow>()),
            other => Err(IngestError::NotAMapping {
                index,
                found: json_kind(other),
            }),
        })
        .collect()
}

/// Ingest JSON rows with the default alias table.
pub fn ingest_json_rows(rows: &[Value]) -> Result<Vec<LifterRecord>, IngestError> {
    let raw = json_to_raw_rows(rows)?;
    Ok(ingest_rows(&raw))
}

fn json_cell(v: &Value) -> String {
    match v {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
