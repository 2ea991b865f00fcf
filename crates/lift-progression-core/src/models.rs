//! Core data models used throughout Lift Progression.
//!
//! These types represent the raw rows, canonical records, and lift/unit
//! vocabulary that flow through the ingestion and query pipeline.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::Serialize;

use crate::coerce::kg_to_lb;
use crate::error::ParseValueError;

/// One source row before normalization: column name → cell text.
///
/// Keys are kept in sorted order so alias fallback resolution is
/// deterministic regardless of the order columns arrived in.
pub type RawRow = BTreeMap<String, String>;

/// A kilogram/pound pair for a single magnitude.
///
/// The only constructor takes kilograms, so the pound value is always
/// derived and both sides are either present or absent together.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct UnitPair {
    kg: Option<f64>,
    lb: Option<f64>,
}

impl UnitPair {
    pub fn from_kg(kg: Option<f64>) -> Self {
        Self {
            kg,
            lb: kg.map(kg_to_lb),
        }
    }

    pub fn kg(&self) -> Option<f64> {
        self.kg
    }

    pub fn lb(&self) -> Option<f64> {
        self.lb
    }

    /// Magnitude in the requested unit.
    pub fn get(&self, unit: Unit) -> Option<f64> {
        match unit {
            Unit::Kg => self.kg,
            Unit::Lb => self.lb,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.kg.is_none()
    }
}

/// Normalized result of one lifter at one meet.
///
/// Produced once per ingestion run and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LifterRecord {
    /// Display name as found in the source (trimmed). May be empty.
    pub name: String,
    /// Grouping key derived from `name`; never shown to users.
    pub name_key: String,
    /// Meet date, serialized as `YYYY-MM-DD`.
    pub meet_date: Option<NaiveDate>,
    /// Meet name, empty if the source has none.
    pub meet: String,
    /// Raw equipment label (e.g. `"Raw"`, `"Single-ply"`), empty if absent.
    pub equipment: String,
    pub federation: String,
    pub age: Option<f64>,
    pub bodyweight: UnitPair,
    pub squat: UnitPair,
    pub bench: UnitPair,
    pub deadlift: UnitPair,
    pub total: UnitPair,
}

impl LifterRecord {
    /// The unit pair for one lift.
    pub fn lift(&self, lift: Lift) -> UnitPair {
        match lift {
            Lift::Squat => self.squat,
            Lift::Bench => self.bench,
            Lift::Deadlift => self.deadlift,
            Lift::Total => self.total,
        }
    }

    /// ISO `YYYY-MM-DD` form of the meet date.
    pub fn meet_date_iso(&self) -> Option<String> {
        self.meet_date.map(|d| d.format("%Y-%m-%d").to_string())
    }
}

/// The four charted lifts, in canonical display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Lift {
    Squat,
    Bench,
    Deadlift,
    Total,
}

impl Lift {
    pub const ALL: [Lift; 4] = [Lift::Squat, Lift::Bench, Lift::Deadlift, Lift::Total];

    pub fn as_str(&self) -> &'static str {
        match self {
            Lift::Squat => "Squat",
            Lift::Bench => "Bench",
            Lift::Deadlift => "Deadlift",
            Lift::Total => "Total",
        }
    }
}

impl fmt::Display for Lift {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Lift {
    type Err = ParseValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "squat" | "sq" => Ok(Lift::Squat),
            "bench" | "bench press" | "bp" => Ok(Lift::Bench),
            "deadlift" | "dead" | "dl" => Ok(Lift::Deadlift),
            "total" => Ok(Lift::Total),
            _ => Err(ParseValueError::new("lift", s)),
        }
    }
}

/// Display unit for lift magnitudes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    #[default]
    Kg,
    Lb,
}

impl Unit {
    pub fn label(&self) -> &'static str {
        match self {
            Unit::Kg => "kg",
            Unit::Lb => "lb",
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Unit {
    type Err = ParseValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "kg" | "kgs" | "kilograms" => Ok(Unit::Kg),
            "lb" | "lbs" | "pounds" => Ok(Unit::Lb),
            _ => Err(ParseValueError::new("unit", s)),
        }
    }
}
