//! `liftprog progression`: one lifter's series as a table or JSON.

use anyhow::Result;

use lift_progression_core::dataset::Dataset;
use lift_progression_core::models::{Lift, Unit};
use lift_progression_core::query::{resolve_selection, EquipmentFilter, Progression, ProgressionQuery};

use crate::config::Config;

/// Command-line arguments after parsing; `None` means "use the config default".
#[derive(Debug, Clone, Default)]
pub struct ProgressionArgs {
    pub name: String,
    /// Treat `name` as a fuzzy query and chart the top match.
    pub fuzzy: bool,
    pub lifts: Vec<Lift>,
    pub unit: Option<Unit>,
    pub equipment: Option<EquipmentFilter>,
    pub json: bool,
}

/// Turn arguments plus config defaults into a query.
///
/// Returns `None` when the name doesn't resolve to a lifter in the dataset.
pub fn build_query(config: &Config, dataset: &Dataset, args: &ProgressionArgs) -> Result<Option<ProgressionQuery>> {
    let lifter = if args.fuzzy {
        resolve_selection(dataset, Some(args.name.as_str()), None)
    } else {
        resolve_selection(dataset, None, Some(args.name.trim()))
    };
    let Some(lifter) = lifter else {
        return Ok(None);
    };

    let lifts = if args.lifts.is_empty() {
        config.query.lifts()?
    } else {
        args.lifts.clone()
    };
    let unit = match args.unit {
        Some(u) => u,
        None => config.query.unit()?,
    };
    let equipment = match args.equipment {
        Some(e) => e,
        None => config.query.equipment()?,
    };

    Ok(Some(ProgressionQuery::new(lifter, equipment, unit, lifts)))
}

pub fn run_progression(config: &Config, dataset: &Dataset, args: &ProgressionArgs) -> Result<()> {
    let Some(query) = build_query(config, dataset, args)? else {
        if args.json {
            println!("{}", serde_json::json!({ "lifter": null, "series": [] }));
        } else {
            println!("No data for selected lifter");
        }
        return Ok(());
    };

    let progression = dataset.progression(&query);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&progression)?);
        return Ok(());
    }

    print_table(&progression);
    Ok(())
}

fn print_table(progression: &Progression) {
    println!(
        "{} ({}, equipment: {})",
        progression.title, progression.unit, progression.equipment
    );

    let Some(first) = progression.series.first() else {
        println!("No data for selected lifter");
        return;
    };
    if !progression.has_values() {
        println!("No lift values available for chosen lifts/units");
        return;
    }

    println!();
    print!("  {:<10}  {:<28}", "DATE", "MEET");
    for s in &progression.series {
        print!(" {:>9}", s.lift.as_str().to_uppercase());
    }
    println!();
    println!("  {}", "-".repeat(40 + 10 * progression.series.len()));

    for i in 0..first.len() {
        let date = first.x[i].as_deref().unwrap_or("(no date)");
        print!("  {:<10}  {:<28}", date, truncate(&first.points[i].meet, 28));
        for s in &progression.series {
            print!(" {:>9}", format_value(s.y[i]));
        }
        println!();
    }
}

fn format_value(v: Option<f64>) -> String {
    match v {
        Some(v) => format!("{}", v),
        None => "-".to_string(),
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(max.saturating_sub(3)).collect();
        out.push_str("...");
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lift_progression_core::models::RawRow;

    fn dataset() -> Dataset {
        let row = |name: &str, squat: &str| -> RawRow {
            RawRow::from([
                ("Name".to_string(), name.to_string()),
                ("SquatKg".to_string(), squat.to_string()),
            ])
        };
        Dataset::from_rows(&[row("Jane Doe", "100"), row("John Roe", "200")])
    }

    #[test]
    fn test_exact_name_required_without_fuzzy() {
        let args = ProgressionArgs {
            name: "jane doe".to_string(),
            ..Default::default()
        };
        assert!(build_query(&Config::minimal(), &dataset(), &args).unwrap().is_none());
    }

    #[test]
    fn test_fuzzy_picks_top_match() {
        let args = ProgressionArgs {
            name: "jane do".to_string(),
            fuzzy: true,
            ..Default::default()
        };
        let query = build_query(&Config::minimal(), &dataset(), &args).unwrap().unwrap();
        assert_eq!(query.name, "Jane Doe");
    }

    #[test]
    fn test_config_defaults_fill_gaps() {
        let args = ProgressionArgs {
            name: "John Roe".to_string(),
            unit: Some(Unit::Lb),
            ..Default::default()
        };
        let query = build_query(&Config::minimal(), &dataset(), &args).unwrap().unwrap();
        assert_eq!(query.unit, Unit::Lb);
        assert_eq!(query.equipment, EquipmentFilter::All);
        assert_eq!(query.lifts.len(), 3);
        assert!(!query.lifts.contains(&Lift::Total));
    }

    #[test]
    fn test_format_helpers() {
        assert_eq!(format_value(Some(100.0)), "100");
        assert_eq!(format_value(Some(220.46)), "220.46");
        assert_eq!(format_value(None), "-");
        assert_eq!(truncate("Short", 28), "Short");
        assert_eq!(truncate("abcdefghij", 6), "abc...");
    }
}
