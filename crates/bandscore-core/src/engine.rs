//! Batch evaluation engine.
//!
//! Evaluates every sample of a set against one provider with bounded
//! parallelism. Failed samples are recorded and never abort the batch.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use futures::stream::{FuturesUnordered, StreamExt};
use tokio::sync::Semaphore;
use uuid::Uuid;

use crate::model::SampleSet;
use crate::report::{BatchReport, SampleFailure, SampleResult, SampleSetSummary};
use crate::statistics::compute_aggregate_stats;
use crate::traits::ScoringProvider;

/// Configuration for the batch engine.
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Maximum concurrent evaluations.
    pub parallelism: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self { parallelism: 4 }
    }
}

/// Progress reporting trait.
pub trait ProgressReporter: Send + Sync {
    fn on_sample_start(&self, sample_id: &str);
    fn on_sample_complete(&self, result: &SampleResult);
    fn on_sample_error(&self, sample_id: &str, error: &str);
    fn on_set_complete(&self, total: usize, completed: usize, failed: usize, elapsed: Duration);
}

/// No-op progress reporter.
pub struct NoopReporter;

impl ProgressReporter for NoopReporter {
    fn on_sample_start(&self, _: &str) {}
    fn on_sample_complete(&self, _: &SampleResult) {}
    fn on_sample_error(&self, _: &str, _: &str) {}
    fn on_set_complete(&self, _: usize, _: usize, _: usize, _: Duration) {}
}

/// Runs a sample set through a provider.
pub struct BatchEngine {
    provider: Arc<dyn ScoringProvider>,
    config: BatchConfig,
}

impl BatchEngine {
    pub fn new(provider: Arc<dyn ScoringProvider>, config: BatchConfig) -> Self {
        Self { provider, config }
    }

    /// Evaluate every sample in `set`.
    pub async fn run(&self, set: &SampleSet, progress: &dyn ProgressReporter) -> Result<BatchReport> {
        let start = Instant::now();
        let run_id = Uuid::new_v4();
        let semaphore = Arc::new(Semaphore::new(self.config.parallelism.max(1)));

        let mut futures = FuturesUnordered::new();

        for (index, case) in set.samples.iter().enumerate() {
            let provider = Arc::clone(&self.provider);
            let semaphore = Arc::clone(&semaphore);
            let sample = set.work_sample(case);
            let case = case.clone();

            futures.push(async move {
                let inner = async {
                    let _permit = semaphore
                        .acquire()
                        .await
                        .map_err(|_| anyhow::anyhow!("semaphore closed"))?;

                    progress.on_sample_start(&case.id);
                    let eval_start = Instant::now();
                    let scored = provider.evaluate(&sample).await?;

                    Ok::<_, anyhow::Error>(SampleResult {
                        sample_id: case.id.clone(),
                        name: case.name.clone(),
                        work_type: sample.work_type,
                        scored,
                        expected_band: case.expected_band,
                        latency_ms: eval_start.elapsed().as_millis() as u64,
                    })
                };
                (index, case.id.clone(), inner.await)
            });
        }

        let total = futures.len();
        let mut results = Vec::new();
        let mut failures = Vec::new();

        while let Some((index, sample_id, result)) = futures.next().await {
            match result {
                Ok(sample_result) => {
                    progress.on_sample_complete(&sample_result);
                    results.push((index, sample_result));
                }
                Err(e) => {
                    tracing::error!(%run_id, "evaluation failed for {sample_id}: {e:#}");
                    progress.on_sample_error(&sample_id, &format!("{e:#}"));
                    failures.push((
                        index,
                        SampleFailure {
                            sample_id,
                            error: format!("{e:#}"),
                        },
                    ));
                }
            }
        }

        results.sort_by_key(|(index, _)| *index);
        failures.sort_by_key(|(index, _)| *index);
        let results: Vec<SampleResult> = results.into_iter().map(|(_, r)| r).collect();
        let failures: Vec<SampleFailure> = failures.into_iter().map(|(_, f)| f).collect();

        let elapsed = start.elapsed();
        progress.on_set_complete(total, results.len(), failures.len(), elapsed);

        let aggregate = compute_aggregate_stats(&results, failures.len());

        Ok(BatchReport {
            id: run_id,
            created_at: chrono::Utc::now(),
            sample_set: SampleSetSummary {
                id: set.id.clone(),
                name: set.name.clone(),
                sample_count: set.samples.len(),
            },
            provider: self.provider.name().to_string(),
            results,
            failures,
            aggregate,
            duration_ms: elapsed.as_millis() as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::error::ValidationError;
    use crate::model::{SampleCase, ScoredWork, WorkSample};
    use crate::service::ScoringService;

    /// Scores with the rule-based service and tracks peak concurrency.
    struct CountingProvider {
        service: ScoringService,
        active: AtomicUsize,
        peak: AtomicUsize,
    }

    impl CountingProvider {
        fn new() -> Self {
            Self {
                service: ScoringService::default(),
                active: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl ScoringProvider for CountingProvider {
        fn name(&self) -> &str {
            "counting"
        }

        async fn evaluate(&self, sample: &WorkSample) -> Result<ScoredWork> {
            let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(5)).await;
            self.active.fetch_sub(1, Ordering::SeqCst);

            let result = self.service.evaluate(sample)?;
            Ok(ScoredWork {
                result,
                provider: "counting".into(),
                model: "rules".into(),
                tokens_used: 0,
                cost_usd: 0.0,
            })
        }
    }

    #[derive(Default)]
    struct RecordingReporter {
        completed: Mutex<Vec<String>>,
        errors: Mutex<Vec<String>>,
    }

    impl ProgressReporter for RecordingReporter {
        fn on_sample_start(&self, _: &str) {}
        fn on_sample_complete(&self, result: &SampleResult) {
            self.completed.lock().unwrap().push(result.sample_id.clone());
        }
        fn on_sample_error(&self, sample_id: &str, _: &str) {
            self.errors.lock().unwrap().push(sample_id.to_string());
        }
        fn on_set_complete(&self, _: usize, _: usize, _: usize, _: Duration) {}
    }

    fn case(id: &str, content: &str) -> SampleCase {
        SampleCase {
            id: id.into(),
            name: id.into(),
            content: content.into(),
            work_type: None,
            task_type: None,
            declared_word_count: None,
            expected_band: None,
            tags: vec![],
        }
    }

    fn sample_set(samples: Vec<SampleCase>) -> SampleSet {
        SampleSet {
            id: "batch".into(),
            name: "Batch".into(),
            description: String::new(),
            samples,
            default_work_type: "essay".into(),
            default_task_type: "task2".into(),
        }
    }

    #[tokio::test]
    async fn failures_are_recorded_without_aborting() {
        let set = sample_set(vec![
            case("first", "A complete sentence, with a comma."),
            case("empty", "   "),
            case("third", "Another sentence."),
        ]);
        let engine = BatchEngine::new(Arc::new(CountingProvider::new()), BatchConfig::default());
        let reporter = RecordingReporter::default();

        let report = engine.run(&set, &reporter).await.unwrap();

        assert_eq!(report.results.len(), 2);
        assert_eq!(report.results[0].sample_id, "first");
        assert_eq!(report.results[1].sample_id, "third");
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].sample_id, "empty");
        assert!(report.failures[0]
            .error
            .contains(&ValidationError::EmptyContent.to_string()));
        assert_eq!(report.aggregate.evaluated, 2);
        assert_eq!(report.aggregate.failed, 1);
        assert_eq!(reporter.errors.lock().unwrap().as_slice(), ["empty"]);
        assert_eq!(reporter.completed.lock().unwrap().len(), 2);
        assert_eq!(report.provider, "counting");
    }

    #[tokio::test]
    async fn parallelism_is_bounded() {
        let samples = (0..12)
            .map(|i| case(&format!("s{i}"), "Some text to score."))
            .collect();
        let set = sample_set(samples);
        let provider = Arc::new(CountingProvider::new());
        let engine = BatchEngine::new(provider.clone(), BatchConfig { parallelism: 3 });

        let report = engine.run(&set, &NoopReporter).await.unwrap();

        assert_eq!(report.results.len(), 12);
        assert!(provider.peak.load(Ordering::SeqCst) <= 3);
    }

    #[tokio::test]
    async fn empty_set() {
        let engine = BatchEngine::new(Arc::new(CountingProvider::new()), BatchConfig::default());
        let report = engine.run(&sample_set(vec![]), &NoopReporter).await.unwrap();
        assert!(report.results.is_empty());
        assert_eq!(report.sample_set.sample_count, 0);
    }
}
