//! Batch report types with JSON persistence and progress tracking.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::{Criterion, ScoredWork, WorkType};
use crate::statistics::AggregateStats;

/// One successfully evaluated sample.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SampleResult {
    pub sample_id: String,
    #[serde(default)]
    pub name: String,
    pub work_type: WorkType,
    pub scored: ScoredWork,
    /// Examiner band carried over from the sample set.
    #[serde(default)]
    pub expected_band: Option<f64>,
    pub latency_ms: u64,
}

impl SampleResult {
    pub fn overall_band(&self) -> f64 {
        self.scored.result.scores.overall_band()
    }
}

/// A sample whose evaluation failed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SampleFailure {
    pub sample_id: String,
    pub error: String,
}

/// A complete batch report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    /// Unique report identifier.
    pub id: Uuid,
    /// When the report was created.
    pub created_at: DateTime<Utc>,
    /// Summary of the sample set.
    pub sample_set: SampleSetSummary,
    /// Provider (or chain) that produced the results.
    pub provider: String,
    /// Successful results, in sample-set order.
    pub results: Vec<SampleResult>,
    #[serde(default)]
    pub failures: Vec<SampleFailure>,
    /// Aggregate statistics.
    pub aggregate: AggregateStats,
    /// Total wall-clock duration in milliseconds.
    pub duration_ms: u64,
}

/// Summary of a sample set (without the sample text).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SampleSetSummary {
    pub id: String,
    pub name: String,
    pub sample_count: usize,
}

impl BatchReport {
    /// Save the report as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        Ok(())
    }

    /// Load a report from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read report from {}", path.display()))?;
        let report: BatchReport =
            serde_json::from_str(&content).context("failed to parse report JSON")?;
        Ok(report)
    }

    /// Compare this report against an earlier one, matching samples by ID.
    /// Overall band changes larger than `threshold` count as movement.
    pub fn compare(&self, baseline: &BatchReport, threshold: f64) -> ProgressReport {
        let baseline_by_id: HashMap<&str, &SampleResult> = baseline
            .results
            .iter()
            .map(|r| (r.sample_id.as_str(), r))
            .collect();

        let mut regressions = Vec::new();
        let mut improvements = Vec::new();
        let mut unchanged = 0usize;
        let mut new_samples = 0usize;

        for current in &self.results {
            let Some(before) = baseline_by_id.get(current.sample_id.as_str()) else {
                new_samples += 1;
                continue;
            };

            let delta = current.overall_band() - before.overall_band();
            if delta.abs() <= threshold {
                unchanged += 1;
                continue;
            }

            let change = BandChange {
                sample_id: current.sample_id.clone(),
                baseline_band: before.overall_band(),
                current_band: current.overall_band(),
                delta,
                criterion_deltas: criterion_deltas(before, current),
            };
            if delta < 0.0 {
                regressions.push(change);
            } else {
                improvements.push(change);
            }
        }

        let current_ids: std::collections::HashSet<&str> =
            self.results.iter().map(|r| r.sample_id.as_str()).collect();
        let removed_samples = baseline
            .results
            .iter()
            .filter(|r| !current_ids.contains(r.sample_id.as_str()))
            .count();

        ProgressReport {
            baseline_mean: baseline.aggregate.mean_overall_band,
            current_mean: self.aggregate.mean_overall_band,
            regressions,
            improvements,
            unchanged,
            new_samples,
            removed_samples,
        }
    }
}

fn criterion_deltas(before: &SampleResult, after: &SampleResult) -> BTreeMap<Criterion, f64> {
    after
        .scored
        .result
        .scores
        .iter()
        .filter_map(|(criterion, band)| {
            before
                .scored
                .result
                .scores
                .get(criterion)
                .map(|prev| (criterion, band - prev))
        })
        .filter(|(_, delta)| *delta != 0.0)
        .collect()
}

/// Result of comparing two batch reports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressReport {
    pub baseline_mean: f64,
    pub current_mean: f64,
    /// Samples whose overall band went down.
    pub regressions: Vec<BandChange>,
    /// Samples whose overall band went up.
    pub improvements: Vec<BandChange>,
    /// Samples with no significant change.
    pub unchanged: usize,
    /// Samples in current but not baseline.
    pub new_samples: usize,
    /// Samples in baseline but not current.
    pub removed_samples: usize,
}

/// A change in one sample's bands between two reports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BandChange {
    pub sample_id: String,
    pub baseline_band: f64,
    pub current_band: f64,
    pub delta: f64,
    /// Criteria whose band moved, with the signed change.
    #[serde(default)]
    pub criterion_deltas: BTreeMap<Criterion, f64>,
}

impl ProgressReport {
    /// Format the progress report as markdown.
    pub fn to_markdown(&self) -> String {
        let mut md = String::new();

        md.push_str(&format!(
            "**Summary:** {} regressions, {} improvements, {} unchanged \
             (mean band {:.2} -> {:.2})\n\n",
            self.regressions.len(),
            self.improvements.len(),
            self.unchanged,
            self.baseline_mean,
            self.current_mean
        ));

        for (title, changes) in [
            ("Regressions", &self.regressions),
            ("Improvements", &self.improvements),
        ] {
            if changes.is_empty() {
                continue;
            }
            md.push_str(&format!("### {title}\n\n"));
            md.push_str("| Sample | Baseline | Current | Delta | Criteria |\n");
            md.push_str("|--------|----------|---------|-------|----------|\n");
            for c in changes {
                let criteria = c
                    .criterion_deltas
                    .iter()
                    .map(|(criterion, d)| format!("{criterion} {d:+.1}"))
                    .collect::<Vec<_>>()
                    .join(", ");
                md.push_str(&format!(
                    "| {} | {:.1} | {:.1} | {:+.1} | {} |\n",
                    c.sample_id, c.baseline_band, c.current_band, c.delta, criteria
                ));
            }
            md.push('\n');
        }

        md
    }

    /// Returns true if there are any regressions.
    pub fn has_regressions(&self) -> bool {
        !self.regressions.is_empty()
    }
}
