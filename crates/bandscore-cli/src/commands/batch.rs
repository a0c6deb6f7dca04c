//! The `bandscore batch` command.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;

use bandscore_core::engine::{BatchConfig, BatchEngine, ProgressReporter};
use bandscore_core::parser;
use bandscore_core::report::{BatchReport, SampleResult};
use bandscore_providers::build_chain;
use bandscore_providers::config::load_config_from;
use bandscore_report::html::{generate_batch_html, write_html};

/// Console progress reporter.
struct ConsoleReporter;

impl ProgressReporter for ConsoleReporter {
    fn on_sample_start(&self, sample_id: &str) {
        eprintln!("  Starting: {sample_id}");
    }

    fn on_sample_complete(&self, result: &SampleResult) {
        let expected = result
            .expected_band
            .map(|b| format!(" (expected {b:.1})"))
            .unwrap_or_default();
        eprintln!(
            "  Done: {} band {:.1}{} via {} ({}ms)",
            result.sample_id,
            result.overall_band(),
            expected,
            result.scored.provider,
            result.latency_ms,
        );
    }

    fn on_sample_error(&self, sample_id: &str, error: &str) {
        eprintln!("  ERROR: {sample_id}: {error}");
    }

    fn on_set_complete(&self, total: usize, completed: usize, failed: usize, elapsed: Duration) {
        eprintln!(
            "\nComplete: {completed}/{total} succeeded, {failed} failed ({:.1}s)",
            elapsed.as_secs_f64()
        );
    }
}

pub async fn execute(
    samples_path: PathBuf,
    output: Option<PathBuf>,
    format: String,
    parallelism: Option<usize>,
    offline: bool,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let parallelism = parallelism.unwrap_or(config.parallelism);
    anyhow::ensure!(parallelism >= 1, "parallelism must be at least 1");
    let output = output.unwrap_or_else(|| config.output_dir.clone());

    let formats: Vec<&str> = if format == "all" {
        vec!["json", "html"]
    } else {
        format.split(',').map(str::trim).collect()
    };

    let sets = parser::load_samples(&samples_path)?;
    anyhow::ensure!(
        !sets.is_empty(),
        "no sample sets found in {}",
        samples_path.display()
    );

    let chain = build_chain(&config, offline)?;
    let engine = BatchEngine::new(Arc::new(chain), BatchConfig { parallelism });
    let reporter = ConsoleReporter;

    for set in &sets {
        eprintln!(
            "bandscore v{} - Evaluating {} samples from {}",
            env!("CARGO_PKG_VERSION"),
            set.samples.len(),
            set.name
        );
        eprintln!();

        let report = engine.run(set, &reporter).await?;
        print_summary(&report);

        std::fs::create_dir_all(&output)?;
        let timestamp = chrono::Utc::now().format("%Y-%m-%dT%H%M%S");

        for fmt in &formats {
            match *fmt {
                "json" => {
                    let path = output.join(format!("{}-{timestamp}.json", set.id));
                    report.save_json(&path)?;
                    eprintln!("Results saved to: {}", path.display());
                }
                "html" => {
                    let path = output.join(format!("{}-{timestamp}.html", set.id));
                    write_html(&generate_batch_html(&report), &path)?;
                    eprintln!("HTML report: {}", path.display());
                }
                _ => {
                    eprintln!("Unknown format: {fmt}");
                }
            }
        }
    }

    Ok(())
}

fn print_summary(report: &BatchReport) {
    use comfy_table::{Cell, Table};

    let mut table = Table::new();
    table.set_header(vec!["Sample", "Type", "Overall", "Expected", "Weakest"]);

    for r in &report.results {
        let weakest = r
            .scored
            .result
            .scores
            .weakest()
            .map(|(c, band)| format!("{} {band:.1}", c.label()))
            .unwrap_or_default();
        table.add_row(vec![
            Cell::new(&r.sample_id),
            Cell::new(r.work_type),
            Cell::new(format!("{:.1}", r.overall_band())),
            Cell::new(
                r.expected_band
                    .map(|b| format!("{b:.1}"))
                    .unwrap_or_else(|| "-".into()),
            ),
            Cell::new(weakest),
        ]);
    }

    let stats = &report.aggregate;
    eprintln!("\n{table}");
    eprintln!(
        "Mean overall band {:.2}, median {:.2}{}",
        stats.mean_overall_band,
        stats.median_overall_band,
        stats
            .mean_absolute_error
            .map(|mae| format!(", mean absolute error {mae:.2}"))
            .unwrap_or_default()
    );
}
