//! # Lift Progression Core
//!
//! Pure logic for Lift Progression: field coercion, alias-driven record
//! normalization, the ingestion pipeline, the fuzzy name index, and the
//! progression query layer.
//!
//! This crate contains no async runtime, filesystem I/O, or network
//! dependencies. It operates entirely on rows that are already resident in
//! memory; obtaining CSV text is the application's concern.
//!
//! # Example
//!
//! ```rust
//! use std::collections::BTreeMap;
//! use lift_progression_core::dataset::Dataset;
//! use lift_progression_core::models::{Lift, RawRow, Unit};
//! use lift_progression_core::query::{EquipmentFilter, ProgressionQuery};
//!
//! let row: RawRow = BTreeMap::from([
//!     ("Name".to_string(), "Jane Doe".to_string()),
//!     ("SquatKg".to_string(), "100".to_string()),
//!     ("MeetDate".to_string(), "2020-01-05".to_string()),
//! ]);
//! let dataset = Dataset::from_rows(&[row]);
//! assert_eq!(dataset.list_names(), ["Jane Doe"]);
//!
//! let query = ProgressionQuery::new("Jane Doe", EquipmentFilter::All, Unit::Kg, [Lift::Squat]);
//! let series = dataset.progression_series(&query);
//! assert_eq!(series[0].y, vec![Some(100.0)]);
//! ```

pub mod coerce;
pub mod dataset;
pub mod error;
pub mod fuzzy;
pub mod ingest;
pub mod models;
pub mod names;
pub mod normalize;
pub mod query;
