//! Error types for the core crate.
//!
//! Almost nothing in the core can fail: unparsable cells degrade to `None`
//! and unknown columns take defaults. The errors here cover the two cases
//! that are genuinely invalid input.

use thiserror::Error;

/// Structural ingestion failure: the input is not row-shaped at all.
#[derive(Debug, Error, PartialEq)]
pub enum IngestError {
    /// A row was not a key/value mapping (e.g. a JSON array or scalar).
    #[error("row {index} is not a mapping of column names to values (found {found})")]
    NotAMapping { index: usize, found: &'static str },
}

/// A string could not be parsed into one of the query vocabulary enums.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid {kind}: '{value}'")]
pub struct ParseValueError {
    pub kind: &'static str,
    pub value: String,
}

impl ParseValueError {
    pub fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}
