//! The `bandscore validate` command.

use std::path::PathBuf;

use anyhow::Result;

use bandscore_core::parser::{load_samples, validate_sample_set};

pub fn execute(samples_path: PathBuf) -> Result<()> {
    let sets = load_samples(&samples_path)?;

    let mut total_warnings = 0;

    for set in &sets {
        println!("Sample set: {} ({} samples)", set.name, set.samples.len());

        let warnings = validate_sample_set(set);
        for w in &warnings {
            let prefix = w
                .sample_id
                .as_ref()
                .map(|id| format!("  [{id}]"))
                .unwrap_or_else(|| "  ".to_string());
            println!("{prefix} WARNING: {}", w.message);
        }
        total_warnings += warnings.len();
    }

    if total_warnings == 0 {
        println!("All sample sets valid.");
    } else {
        println!("\n{total_warnings} warning(s) found.");
    }

    Ok(())
}
