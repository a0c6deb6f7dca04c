//! Aggregate statistics over a batch of evaluations.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::Criterion;
use crate::report::SampleResult;

/// Aggregate statistics across all results in a batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregateStats {
    /// Samples evaluated successfully.
    pub evaluated: usize,
    /// Samples whose evaluation failed.
    pub failed: usize,
    pub mean_overall_band: f64,
    pub median_overall_band: f64,
    /// Per-criterion statistics, in criterion order.
    pub per_criterion: BTreeMap<Criterion, CriterionStats>,
    /// Overall bands bucketed to the half band below.
    pub band_histogram: Vec<BandBucket>,
    /// How often each criterion was a focus area.
    pub focus_area_frequency: BTreeMap<Criterion, usize>,
    /// Mean absolute difference from examiner bands, when any were given.
    #[serde(default)]
    pub mean_absolute_error: Option<f64>,
    pub total_tokens: u64,
    pub total_cost_usd: f64,
}

/// Statistics for one criterion across the batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriterionStats {
    pub count: usize,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
}

/// Number of samples whose overall band falls in `[band, band + 0.5)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandBucket {
    pub band: f64,
    pub count: usize,
}

/// Compute aggregate statistics from successful results.
pub fn compute_aggregate_stats(results: &[SampleResult], failed: usize) -> AggregateStats {
    if results.is_empty() {
        return AggregateStats {
            failed,
            ..AggregateStats::default()
        };
    }

    let mut overall: Vec<f64> = results
        .iter()
        .map(|r| r.scored.result.scores.overall_band())
        .collect();

    let mean_overall_band = mean(&overall);
    overall.sort_by(f64::total_cmp);
    let median_overall_band = median_of_sorted(&overall);

    let mut criterion_bands: BTreeMap<Criterion, Vec<f64>> = BTreeMap::new();
    let mut focus_area_frequency: BTreeMap<Criterion, usize> = BTreeMap::new();
    for r in results {
        for (criterion, band) in r.scored.result.scores.iter() {
            criterion_bands.entry(criterion).or_default().push(band);
        }
        for criterion in &r.scored.result.evaluation.focus_areas {
            *focus_area_frequency.entry(*criterion).or_default() += 1;
        }
    }

    let per_criterion = criterion_bands
        .into_iter()
        .map(|(criterion, bands)| {
            let stats = CriterionStats {
                count: bands.len(),
                mean: mean(&bands),
                min: bands.iter().copied().fold(f64::INFINITY, f64::min),
                max: bands.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            };
            (criterion, stats)
        })
        .collect();

    let errors: Vec<f64> = results
        .iter()
        .filter_map(|r| {
            r.expected_band
                .map(|expected| (r.scored.result.scores.overall_band() - expected).abs())
        })
        .collect();
    let mean_absolute_error = (!errors.is_empty()).then(|| mean(&errors));

    AggregateStats {
        evaluated: results.len(),
        failed,
        mean_overall_band,
        median_overall_band,
        per_criterion,
        band_histogram: band_histogram(&overall),
        focus_area_frequency,
        mean_absolute_error,
        total_tokens: results.iter().map(|r| r.scored.tokens_used as u64).sum(),
        total_cost_usd: results.iter().map(|r| r.scored.cost_usd).sum(),
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

fn median_of_sorted(sorted: &[f64]) -> f64 {
    match sorted.len() {
        0 => 0.0,
        n if n % 2 == 1 => sorted[n / 2],
        n => (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0,
    }
}

fn band_histogram(bands: &[f64]) -> Vec<BandBucket> {
    // half-band index keeps the map key exact
    let mut counts: BTreeMap<u32, usize> = BTreeMap::new();
    for band in bands {
        let index = (band * 2.0).floor().max(0.0) as u32;
        *counts.entry(index).or_default() += 1;
    }
    counts
        .into_iter()
        .map(|(index, count)| BandBucket {
            band: index as f64 / 2.0,
            count,
        })
        .collect()
}
