//! Raw row → [`LifterRecord`] normalization.
//!
//! Column names differ between exports (`Name` vs `Lifter`, `SquatKg` vs
//! `Best3SquatKg`, ...). Instead of conditional chains, every canonical
//! field has a [`FieldSpec`] in an [`AliasTable`]:
//!
//! 1. `aliases` are compared against the column key after lowercasing and
//!    stripping non-alphanumerics, so `"Best3SquatKg"`, `"best3squat_kg"` and
//!    `"BEST3SQUATKG"` all match the alias `"best3squatkg"`.
//! 2. `contains` patterns are the fallback when no exact alias matches: any
//!    column whose folded key contains the pattern is a candidate, unless it
//!    also contains one of the `excludes` substrings.
//!
//! The per-field candidate list for a header set is computed once as a
//! [`ColumnPlan`]; for each row, the first candidate column present in the
//! row wins, even when its cell is empty. Supporting a new export format
//! means adding data to the table.

use std::collections::BTreeMap;

use crate::coerce::{clean_text, coerce_date, coerce_number, normalize_name};
use crate::models::{LifterRecord, RawRow, UnitPair};

/// Canonical fields of a [`LifterRecord`] that are sourced from columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    Name,
    MeetDate,
    Meet,
    Equipment,
    Federation,
    Age,
    BodyweightKg,
    SquatKg,
    BenchKg,
    DeadliftKg,
    TotalKg,
}

/// How one canonical field is located among arbitrary column names.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub field: Field,
    /// Exact aliases (folded form), highest priority first.
    pub aliases: Vec<String>,
    /// Substring patterns for the fallback scan, highest priority first.
    pub contains: Vec<String>,
    /// Substrings that disqualify a key from the fallback scan.
    pub excludes: Vec<String>,
}

impl FieldSpec {
    fn new(field: Field, aliases: &[&str], contains: &[&str], excludes: &[&str]) -> Self {
        let own = |xs: &[&str]| xs.iter().map(|s| fold_key(s)).collect();
        Self {
            field,
            aliases: own(aliases),
            contains: own(contains),
            excludes: own(excludes),
        }
    }
}

/// Ordered alias rules for every canonical field.
#[derive(Debug, Clone)]
pub struct AliasTable {
    specs: Vec<FieldSpec>,
}

impl Default for AliasTable {
    fn default() -> Self {
        use Field::*;
        Self {
            specs: vec![
                FieldSpec::new(
                    Name,
                    &["name", "lifter", "liftername", "athlete", "fullname"],
                    &["lifter", "name"],
                    &["meet", "fed", "division", "class", "country", "state", "town"],
                ),
                FieldSpec::new(
                    MeetDate,
                    &["meetdate", "date", "competitiondate", "eventdate"],
                    &["date"],
                    &["birth"],
                ),
                FieldSpec::new(
                    Meet,
                    &["meetname", "meet", "competition"],
                    &["meetname"],
                    &[],
                ),
                FieldSpec::new(
                    Equipment,
                    &["equipment", "equip", "gear"],
                    &["equipment", "gear"],
                    &[],
                ),
                FieldSpec::new(
                    Federation,
                    &["federation", "fed"],
                    &["federation"],
                    &["parent"],
                ),
                FieldSpec::new(Age, &["age", "ageyears"], &[], &[]),
                FieldSpec::new(
                    BodyweightKg,
                    &["bodyweightkg", "bodyweight", "bodywt", "bwkg", "bw", "weight"],
                    &["bodyweight", "bodywt"],
                    &["lb"],
                ),
                FieldSpec::new(
                    SquatKg,
                    &["squatkg", "squat", "best3squatkg", "best3sqkg", "best3sq"],
                    &["best3squat", "best3sq", "squat"],
                    &["lb", "1kg", "2kg", "3kg", "4kg"],
                ),
                FieldSpec::new(
                    BenchKg,
                    &["benchkg", "bench", "best3benchkg", "best3bnkg", "best3bn"],
                    &["best3bench", "best3bn", "bench"],
                    &["lb", "1kg", "2kg", "3kg", "4kg"],
                ),
                FieldSpec::new(
                    DeadliftKg,
                    &[
                        "deadliftkg",
                        "deadlift",
                        "best3deadliftkg",
                        "best3dlkg",
                        "best3dl",
                        "dl",
                    ],
                    &["best3deadlift", "best3dl", "deadlift", "dead"],
                    &["lb", "1kg", "2kg", "3kg", "4kg"],
                ),
                FieldSpec::new(
                    TotalKg,
                    &["totalkg", "total"],
                    &["total"],
                    &["lb", "points"],
                ),
            ],
        }
    }
}

impl AliasTable {
    /// Add an exact alias for `field`, ahead of the built-in aliases.
    pub fn with_alias(mut self, field: Field, alias: &str) -> Self {
        if let Some(spec) = self.specs.iter_mut().find(|s| s.field == field) {
            spec.aliases.insert(0, fold_key(alias));
        }
        self
    }

    pub fn spec(&self, field: Field) -> Option<&FieldSpec> {
        self.specs.iter().find(|s| s.field == field)
    }

    pub fn specs(&self) -> &[FieldSpec] {
        &self.specs
    }
}

/// Fold a column key for comparison: lowercase ASCII alphanumerics only.
pub fn fold_key(key: &str) -> String {
    key.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Resolved candidate columns, in priority order, for each field of one
/// header set.
#[derive(Debug, Clone, Default)]
pub struct ColumnPlan {
    columns: BTreeMap<Field, Vec<String>>,
    headers: Vec<String>,
}

impl ColumnPlan {
    /// Resolve every field of `table` against `headers`.
    pub fn resolve<'a, I>(table: &AliasTable, headers: I) -> Self
    where
        I: IntoIterator<Item = &'a String>,
    {
        let mut headers: Vec<String> = headers.into_iter().cloned().collect();
        headers.sort();
        headers.dedup();
        let folded: Vec<(String, &String)> = headers.iter().map(|h| (fold_key(h), h)).collect();

        let mut columns = BTreeMap::new();
        for spec in table.specs() {
            let mut candidates: Vec<String> = Vec::new();
            let mut push = |h: &String| {
                if !candidates.contains(h) {
                    candidates.push(h.clone());
                }
            };

            for alias in &spec.aliases {
                for (key, header) in &folded {
                    if key == alias {
                        push(*header);
                    }
                }
            }
            for pattern in &spec.contains {
                for (key, header) in &folded {
                    if key.contains(pattern.as_str())
                        && !spec.excludes.iter().any(|x| key.contains(x.as_str()))
                    {
                        push(*header);
                    }
                }
            }

            if !candidates.is_empty() {
                columns.insert(spec.field, candidates);
            }
        }

        Self { columns, headers }
    }

    /// Candidate columns for `field`, best first.
    pub fn candidates(&self, field: Field) -> &[String] {
        self.columns.get(&field).map(Vec::as_slice).unwrap_or(&[])
    }

    /// True if `row` has exactly the header set this plan was resolved for.
    pub fn fits(&self, row: &RawRow) -> bool {
        row.len() == self.headers.len() && row.keys().zip(&self.headers).all(|(a, b)| a == b)
    }

    /// Cell of the first candidate column present in `row`, cleaned.
    ///
    /// An empty winning cell is `None`; lower-priority columns are not
    /// consulted.
    pub fn value(&self, row: &RawRow, field: Field) -> Option<String> {
        self.candidates(field)
            .iter()
            .find_map(|col| row.get(col))
            .map(|v| clean_text(v))
            .filter(|v| !v.is_empty())
    }
}

/// Normalize one row with the default alias table.
pub fn normalize_row(row: &RawRow) -> LifterRecord {
    let plan = ColumnPlan::resolve(&AliasTable::default(), row.keys());
    normalize_with_plan(row, &plan)
}

/// Normalize one row against a precomputed [`ColumnPlan`].
///
/// Never fails: absent or unparsable cells become `""` / `None`.
pub fn normalize_with_plan(row: &RawRow, plan: &ColumnPlan) -> LifterRecord {
    let text = |field| plan.value(row, field).unwrap_or_default();
    let number = |field| plan.value(row, field).and_then(|v| coerce_number(&v));

    let name = text(Field::Name);
    let name_key = normalize_name(&name);

    LifterRecord {
        name_key,
        name,
        meet_date: plan.value(row, Field::MeetDate).and_then(|v| coerce_date(&v)),
        meet: text(Field::Meet),
        equipment: text(Field::Equipment),
        federation: text(Field::Federation),
        age: number(Field::Age),
        bodyweight: UnitPair::from_kg(number(Field::BodyweightKg)),
        squat: UnitPair::from_kg(number(Field::SquatKg)),
        bench: UnitPair::from_kg(number(Field::BenchKg)),
        deadlift: UnitPair::from_kg(number(Field::DeadliftKg)),
        total: UnitPair::from_kg(number(Field::TotalKg)),
    }
}
