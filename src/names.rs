//! `liftprog names`: list every distinct lifter name.

use anyhow::Result;

use lift_progression_core::dataset::Dataset;

pub fn run_names(dataset: &Dataset, limit: Option<usize>) -> Result<()> {
    let names = dataset.list_names();
    if names.is_empty() {
        println!("No lifters.");
        return Ok(());
    }

    let shown = limit.unwrap_or(names.len()).min(names.len());
    for name in &names[..shown] {
        println!("{}", name);
    }
    if shown < names.len() {
        println!("... and {} more", names.len() - shown);
    }
    Ok(())
}
