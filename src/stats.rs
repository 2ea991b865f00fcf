//! Dataset statistics and health overview.
//!
//! Provides a quick summary of what was loaded: row and lifter counts, the
//! meet date range, how many rows are missing key fields, and per-equipment
//! and per-federation breakdowns. Used by `liftprog stats` to give
//! confidence that column detection worked on a new export.

use anyhow::Result;
use chrono::NaiveDate;
use std::collections::BTreeMap;

use lift_progression_core::models::LifterRecord;

use crate::source::LoadedDataset;

/// Number of rows in each group of a breakdown table.
struct GroupCount {
    label: String,
    rows: usize,
}

/// Counts per label, largest first, ties by label. Empty labels are grouped
/// as `(none)`.
fn group_counts<'a, F>(records: &'a [LifterRecord], key: F) -> Vec<GroupCount>
where
    F: Fn(&'a LifterRecord) -> &'a str,
{
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for r in records {
        let label = key(r).trim();
        *counts.entry(if label.is_empty() { "(none)" } else { label }).or_default() += 1;
    }
    let mut groups: Vec<GroupCount> = counts
        .into_iter()
        .map(|(label, rows)| GroupCount {
            label: label.to_string(),
            rows,
        })
        .collect();
    groups.sort_by(|a, b| b.rows.cmp(&a.rows).then_with(|| a.label.cmp(&b.label)));
    groups
}

fn date_range(records: &[LifterRecord]) -> Option<(NaiveDate, NaiveDate)> {
    let mut dates = records.iter().filter_map(|r| r.meet_date);
    let first = dates.next()?;
    Some(dates.fold((first, first), |(lo, hi), d| (lo.min(d), hi.max(d))))
}

/// Run the stats command and print a summary.
pub fn run_stats(loaded: &LoadedDataset) -> Result<()> {
    let dataset = &loaded.dataset;
    let summary = dataset.summary();

    println!("Lift Progression — Dataset Stats");
    println!("================================");
    println!();
    println!("  Source:       {}", loaded.source);
    println!("  Fingerprint:  {}", loaded.short_fingerprint());
    println!("  Loaded:       {}", loaded.loaded_at.format("%Y-%m-%d %H:%M:%S UTC"));
    println!();
    println!("  Rows:         {}", dataset.len());
    println!("  Lifters:      {}", dataset.names().len());
    match date_range(dataset.records()) {
        Some((lo, hi)) => println!("  Date range:   {} .. {}", lo, hi),
        None => println!("  Date range:   (none)"),
    }
    println!("  No name:      {}", summary.missing_name);
    println!("  No date:      {}", summary.missing_date);
    println!("  No lifts:     {}", summary.missing_lifts);
    if loaded.skipped > 0 {
        println!("  Skipped:      {} unreadable CSV records", loaded.skipped);
    }

    for (title, groups) in [
        ("EQUIPMENT", group_counts(dataset.records(), |r| r.equipment.as_str())),
        ("FEDERATION", group_counts(dataset.records(), |r| r.federation.as_str())),
    ] {
        if groups.is_empty() {
            continue;
        }
        println!();
        println!("  {:<24} {:>8}", title, "ROWS");
        println!("  {}", "-".repeat(33));
        for g in &groups {
            println!("  {:<24} {:>8}", g.label, g.rows);
        }
    }

    println!();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lift_progression_core::ingest::ingest_rows;
    use lift_progression_core::models::RawRow;

    fn records() -> Vec<LifterRecord> {
        let row = |eq: &str, date: &str| -> RawRow {
            RawRow::from([
                ("Name".to_string(), "A".to_string()),
                ("Equipment".to_string(), eq.to_string()),
                ("Date".to_string(), date.to_string()),
            ])
        };
        ingest_rows(&[
            row("Raw", "2021-01-01"),
            row("Wraps", "2019-05-05"),
            row("Raw", ""),
            row("", "2020-02-02"),
        ])
    }

    #[test]
    fn test_group_counts_sorted() {
        let records = records();
        let groups = group_counts(&records, |r| r.equipment.as_str());
        let labels: Vec<(&str, usize)> = groups.iter().map(|g| (g.label.as_str(), g.rows)).collect();
        assert_eq!(labels, vec![("Raw", 2), ("(none)", 1), ("Wraps", 1)]);
    }

    #[test]
    fn test_date_range() {
        let (lo, hi) = date_range(&records()).unwrap();
        assert_eq!(lo.to_string(), "2019-05-05");
        assert_eq!(hi.to_string(), "2021-01-01");
        assert_eq!(date_range(&[]), None);
    }
}
