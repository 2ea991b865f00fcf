//! # Lift Progression
//!
//! Load powerlifting meet results from a CSV export, find lifters by
//! (misspelled) name, and build the per-lift time series a progression
//! chart needs.
//!
//! The pure pipeline (coercion, normalization, name index, queries) lives in
//! [`lift_progression_core`]. This crate supplies the CSV transport, the
//! `liftprog` CLI commands, and the JSON HTTP API.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌──────────────┐   ┌──────────────────┐
//! │  CSV file   │──▶│  csv parser   │──▶│ Dataset snapshot │
//! │  or URL     │   │  (raw rows)   │   │ records + index  │
//! └─────────────┘   └──────────────┘   └────────┬─────────┘
//!                                               │
//!                          ┌────────────────────┤
//!                          ▼                    ▼
//!                     ┌──────────┐        ┌──────────┐
//!                     │   CLI    │        │   HTTP   │
//!                     │(liftprog)│        │  (JSON)  │
//!                     └──────────┘        └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! liftprog --csv data/sample.csv names
//! liftprog --csv data/sample.csv search "jhon doe"
//! liftprog --csv data/sample.csv progression "John Doe" --lift squat --lift total --unit lb
//! liftprog serve
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`source`] | CSV download, parsing, and dataset loading |
//! | [`progress`] | Load progress on stderr |
//! | [`names`] | `liftprog names` |
//! | [`search`] | `liftprog search` |
//! | [`progression`] | `liftprog progression` |
//! | [`stats`] | `liftprog stats` |
//! | [`server`] | JSON HTTP server |
//! | [`logging`] | Tracing subscriber setup |

pub mod config;
pub mod logging;
pub mod names;
pub mod progress;
pub mod progression;
pub mod search;
pub mod server;
pub mod source;
pub mod stats;
