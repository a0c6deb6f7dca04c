//! The `bandscore compare` command.

use std::path::PathBuf;

use anyhow::Result;

use bandscore_core::report::BatchReport;

pub fn execute(
    baseline_path: PathBuf,
    current_path: PathBuf,
    threshold: f64,
    fail_on_regression: bool,
    format: String,
) -> Result<()> {
    anyhow::ensure!(threshold >= 0.0, "threshold must not be negative");

    let baseline = BatchReport::load_json(&baseline_path)?;
    let current = BatchReport::load_json(&current_path)?;

    let report = current.compare(&baseline, threshold);

    match format.as_str() {
        "markdown" | "md" => {
            println!("{}", report.to_markdown());
        }
        "json" => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        _ => {
            // text format
            println!(
                "Comparison: {} regressions, {} improvements, {} unchanged (mean band {:.2} -> {:.2})",
                report.regressions.len(),
                report.improvements.len(),
                report.unchanged,
                report.baseline_mean,
                report.current_mean
            );

            for (title, changes) in [
                ("Regressions", &report.regressions),
                ("Improvements", &report.improvements),
            ] {
                if changes.is_empty() {
                    continue;
                }
                println!("\n{title}:");
                for c in changes {
                    println!(
                        "  {} {:.1} -> {:.1} ({:+.1})",
                        c.sample_id, c.baseline_band, c.current_band, c.delta
                    );
                }
            }

            if report.new_samples > 0 {
                println!("\n{} new sample(s)", report.new_samples);
            }
            if report.removed_samples > 0 {
                println!("{} removed sample(s)", report.removed_samples);
            }
        }
    }

    if fail_on_regression && report.has_regressions() {
        std::process::exit(1);
    }

    Ok(())
}
