//! `liftprog search`: ranked fuzzy name matches with scores.

use anyhow::{bail, Result};

use lift_progression_core::dataset::Dataset;

use crate::config::Config;

pub fn run_search(config: &Config, dataset: &Dataset, query: &str, limit: Option<usize>) -> Result<()> {
    let limit = limit.unwrap_or(config.search.limit);
    if limit == 0 {
        bail!("--limit must be >= 1");
    }

    let matches = dataset.search_scored(query, limit);
    if matches.is_empty() {
        println!("No results.");
        return Ok(());
    }

    for (i, m) in matches.iter().enumerate() {
        println!("{}. [{:.2}] {}", i + 1, m.score, m.name);
    }
    Ok(())
}
