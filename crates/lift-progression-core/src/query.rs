//! Progression queries: filtered, time-ordered, unit-converted series.
//!
//! A query is a pure function of a record slice and a [`ProgressionQuery`].
//!
//! # Algorithm
//!
//! 1. Keep records whose display name equals the selected name exactly.
//! 2. Apply the [`EquipmentFilter`].
//! 3. Stable-sort ascending by meet date. Records without a date are kept
//!    and sort before every dated record, in source order.
//! 4. For each requested lift in canonical order, emit one [`LiftSeries`]
//!    with one point per surviving record.
//!
//! An unknown name, an empty lift set or an empty record slice all yield
//! an empty series list.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::dataset::Dataset;
use crate::error::ParseValueError;
use crate::models::{Lift, LifterRecord, Unit};

/// Equipment restriction applied before sorting.
///
/// Only an explicit "raw" mention counts as raw: a record with an empty
/// equipment label is dropped by [`Raw`](Self::Raw) and kept by
/// [`Equipped`](Self::Equipped).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EquipmentFilter {
    #[default]
    All,
    Raw,
    Equipped,
}

impl EquipmentFilter {
    pub fn matches(&self, equipment: &str) -> bool {
        match self {
            EquipmentFilter::All => true,
            EquipmentFilter::Raw => is_raw(equipment),
            EquipmentFilter::Equipped => !is_raw(equipment),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EquipmentFilter::All => "all",
            EquipmentFilter::Raw => "raw",
            EquipmentFilter::Equipped => "equipped",
        }
    }
}

fn is_raw(equipment: &str) -> bool {
    equipment.to_ascii_lowercase().contains("raw")
}

impl fmt::Display for EquipmentFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EquipmentFilter {
    type Err = ParseValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" | "" => Ok(EquipmentFilter::All),
            "raw" => Ok(EquipmentFilter::Raw),
            "equipped" => Ok(EquipmentFilter::Equipped),
            _ => Err(ParseValueError::new("equipment filter", s)),
        }
    }
}

/// Parameters of one progression query.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressionQuery {
    pub name: String,
    pub equipment: EquipmentFilter,
    pub unit: Unit,
    /// Requested lifts. A set, so order and duplicates in the input don't
    /// matter; iteration follows canonical lift order.
    pub lifts: BTreeSet<Lift>,
}

impl ProgressionQuery {
    pub fn new(
        name: impl Into<String>,
        equipment: EquipmentFilter,
        unit: Unit,
        lifts: impl IntoIterator<Item = Lift>,
    ) -> Self {
        Self {
            name: name.into(),
            equipment,
            unit,
            lifts: lifts.into_iter().collect(),
        }
    }
}

/// Hover metadata for one plotted point.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PointMeta {
    pub meet: String,
    pub age: Option<f64>,
    pub bodyweight_kg: Option<f64>,
    pub federation: String,
    pub equipment: String,
}

/// One lift's series. `x`, `y` and `points` always have the same length.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LiftSeries {
    pub lift: Lift,
    pub unit: Unit,
    /// ISO `YYYY-MM-DD` dates, `None` where the record had no date.
    pub x: Vec<Option<String>>,
    pub y: Vec<Option<f64>>,
    pub points: Vec<PointMeta>,
}

impl LiftSeries {
    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    pub fn has_values(&self) -> bool {
        self.y.iter().any(Option::is_some)
    }
}

/// Series for one lifter plus the chart labels a renderer needs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Progression {
    pub lifter: String,
    pub unit: Unit,
    pub equipment: EquipmentFilter,
    pub title: String,
    pub y_axis_title: String,
    pub series: Vec<LiftSeries>,
}

impl Progression {
    /// True when at least one series has at least one value.
    pub fn has_values(&self) -> bool {
        self.series.iter().any(LiftSeries::has_values)
    }
}

/// Records for the selected lifter after the equipment filter, date-ordered.
pub fn select_records<'a>(records: &'a [LifterRecord], query: &ProgressionQuery) -> Vec<&'a LifterRecord> {
    let mut selected: Vec<&LifterRecord> = records
        .iter()
        .filter(|r| !r.name.is_empty() && r.name == query.name)
        .filter(|r| query.equipment.matches(&r.equipment))
        .collect();
    // Option orders None before Some, and sort_by_key is stable.
    selected.sort_by_key(|r| r.meet_date);
    selected
}

/// Build one series per requested lift.
pub fn progression_series(records: &[LifterRecord], query: &ProgressionQuery) -> Vec<LiftSeries> {
    if query.lifts.is_empty() {
        return Vec::new();
    }
    let selected = select_records(records, query);
    if selected.is_empty() {
        return Vec::new();
    }

    let x: Vec<Option<String>> = selected.iter().map(|r| r.meet_date_iso()).collect();
    let points: Vec<PointMeta> = selected
        .iter()
        .map(|r| PointMeta {
            meet: r.meet.clone(),
            age: r.age,
            bodyweight_kg: r.bodyweight.kg(),
            federation: r.federation.clone(),
            equipment: r.equipment.clone(),
        })
        .collect();

    query
        .lifts
        .iter()
        .map(|&lift| LiftSeries {
            lift,
            unit: query.unit,
            x: x.clone(),
            y: selected.iter().map(|r| r.lift(lift).get(query.unit)).collect(),
            points: points.clone(),
        })
        .collect()
}

/// Series plus chart title and axis label.
pub fn progression(records: &[LifterRecord], query: &ProgressionQuery) -> Progression {
    Progression {
        lifter: query.name.clone(),
        unit: query.unit,
        equipment: query.equipment,
        title: format!("{} — progression", query.name),
        y_axis_title: query.unit.label().to_string(),
        series: progression_series(records, query),
    }
}

/// Pick the lifter to chart.
///
/// A non-empty search query with at least one match selects the top match;
/// otherwise the name picked from the full list is used, if it exists.
pub fn resolve_selection(dataset: &Dataset, query: Option<&str>, picked: Option<&str>) -> Option<String> {
    let searched = query
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .and_then(|q| dataset.search_scored(q, 1).into_iter().next())
        .map(|m| m.name);

    searched.or_else(|| {
        picked
            .filter(|name| dataset.names().contains(name))
            .map(str::to_string)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::ingest_rows;
    use crate::models::RawRow;

    fn row(pairs: &[(&str, &str)]) -> RawRow {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn jane() -> Vec<LifterRecord> {
        ingest_rows(&[
            row(&[("Name", "Jane Doe"), ("SquatKg", "105"), ("MeetDate", "2021-03-10"), ("Equipment", "Raw")]),
            row(&[("Name", "Jane Doe"), ("SquatKg", "100"), ("MeetDate", "2020-01-05"), ("Equipment", "Single-ply")]),
            row(&[("Name", "John Roe"), ("SquatKg", "200"), ("MeetDate", "2020-06-01"), ("Equipment", "Raw")]),
        ])
    }

    fn query(lifts: &[Lift], unit: Unit, equipment: EquipmentFilter) -> ProgressionQuery {
        ProgressionQuery::new("Jane Doe", equipment, unit, lifts.iter().copied())
    }

    #[test]
    fn test_sorted_by_date() {
        let series = progression_series(&jane(), &query(&[Lift::Squat], Unit::Kg, EquipmentFilter::All));
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].lift, Lift::Squat);
        assert_eq!(
            series[0].x,
            vec![Some("2020-01-05".to_string()), Some("2021-03-10".to_string())]
        );
        assert_eq!(series[0].y, vec![Some(100.0), Some(105.0)]);
        assert_eq!(series[0].points[1].equipment, "Raw");
    }

    #[test]
    fn test_unit_toggle_only_changes_y() {
        let records = jane();
        let kg = progression_series(&records, &query(&[Lift::Squat], Unit::Kg, EquipmentFilter::All));
        let lb = progression_series(&records, &query(&[Lift::Squat], Unit::Lb, EquipmentFilter::All));
        assert_eq!(kg[0].x, lb[0].x);
        assert_eq!(kg[0].len(), lb[0].len());
        assert_eq!(lb[0].y, vec![Some(220.46), Some(231.49)]);
        assert_eq!(lb[0].unit, Unit::Lb);
    }

    #[test]
    fn test_equipment_filters() {
        let mut records = jane();
        records.extend(ingest_rows(&[row(&[("Name", "Jane Doe"), ("SquatKg", "90")])]));

        let raw = select_records(&records, &query(&[Lift::Squat], Unit::Kg, EquipmentFilter::Raw));
        assert_eq!(raw.len(), 1);
        assert!(raw.iter().all(|r| r.equipment.to_lowercase().contains("raw")));

        // Empty equipment counts as equipped.
        let equipped = select_records(&records, &query(&[Lift::Squat], Unit::Kg, EquipmentFilter::Equipped));
        assert_eq!(equipped.len(), 2);

        assert!(EquipmentFilter::Raw.matches("Raw w/ wraps"));
        assert!(!EquipmentFilter::Raw.matches(""));
        assert!(EquipmentFilter::Equipped.matches(""));
    }

    #[test]
    fn test_null_dates_sort_first() {
        let records = ingest_rows(&[
            row(&[("Name", "A"), ("TotalKg", "1"), ("MeetDate", "2020-01-01")]),
            row(&[("Name", "A"), ("TotalKg", "2")]),
            row(&[("Name", "A"), ("TotalKg", "3"), ("MeetDate", "2019-01-01")]),
            row(&[("Name", "A"), ("TotalKg", "4"), ("MeetDate", "junk")]),
        ]);
        let q = ProgressionQuery::new("A", EquipmentFilter::All, Unit::Kg, [Lift::Total]);
        let series = progression_series(&records, &q);
        assert_eq!(series[0].y, vec![Some(2.0), Some(4.0), Some(3.0), Some(1.0)]);
        assert_eq!(series[0].x[0], None);
        assert_eq!(series[0].x[1], None);
    }

    #[test]
    fn test_lifts_canonical_order_and_deduped() {
        let q = query(&[Lift::Total, Lift::Squat, Lift::Total], Unit::Kg, EquipmentFilter::All);
        let series = progression_series(&jane(), &q);
        let lifts: Vec<Lift> = series.iter().map(|s| s.lift).collect();
        assert_eq!(lifts, vec![Lift::Squat, Lift::Total]);
        assert_eq!(series[1].y, vec![None, None]);
    }

    #[test]
    fn test_empty_results() {
        let records = jane();
        assert!(progression_series(&records, &query(&[], Unit::Kg, EquipmentFilter::All)).is_empty());

        let unknown = ProgressionQuery::new("Nobody", EquipmentFilter::All, Unit::Kg, [Lift::Squat]);
        assert!(progression_series(&records, &unknown).is_empty());
        assert!(progression_series(&[], &unknown).is_empty());

        let blank = ProgressionQuery::new("", EquipmentFilter::All, Unit::Kg, [Lift::Squat]);
        let anonymous = ingest_rows(&[row(&[("SquatKg", "100")])]);
        assert!(progression_series(&anonymous, &blank).is_empty());
    }

    #[test]
    fn test_progression_labels() {
        let p = progression(&jane(), &query(&[Lift::Bench], Unit::Lb, EquipmentFilter::All));
        assert_eq!(p.title, "Jane Doe — progression");
        assert_eq!(p.y_axis_title, "lb");
        assert_eq!(p.series.len(), 1);
        assert!(!p.has_values());
    }

    #[test]
    fn test_equipment_filter_parse() {
        assert_eq!("RAW".parse::<EquipmentFilter>().unwrap(), EquipmentFilter::Raw);
        assert_eq!("all".parse::<EquipmentFilter>().unwrap(), EquipmentFilter::All);
        assert!("wraps".parse::<EquipmentFilter>().is_err());
    }

    #[test]
    fn test_resolve_selection() {
        let dataset = Dataset::from_records(jane());
        assert_eq!(
            resolve_selection(&dataset, Some("jane do"), Some("John Roe")).as_deref(),
            Some("Jane Doe")
        );
        assert_eq!(
            resolve_selection(&dataset, Some(""), Some("John Roe")).as_deref(),
            Some("John Roe")
        );
        assert_eq!(
            resolve_selection(&dataset, Some("zzzz"), Some("John Roe")).as_deref(),
            Some("John Roe")
        );
        assert_eq!(resolve_selection(&dataset, None, Some("Ghost")), None);
    }
}
