//! Mock provider for testing.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use bandscore_core::error::ProviderError;
use bandscore_core::model::{ScoreSet, ScoredWork, WorkSample};
use bandscore_core::service::validate_content;
use bandscore_core::traits::ScoringProvider;
use bandscore_core::ScoringService;

/// A scoring provider with scripted behaviour, for exercising retry,
/// fallback and batch logic without network calls.
///
/// Scripted outcomes are consumed in order; once exhausted every call
/// returns the fixed scores, or rule-based scores when none are set.
pub struct MockProvider {
    name: String,
    fixed_scores: Option<ScoreSet>,
    script: Mutex<VecDeque<Result<ScoreSet, ProviderError>>>,
    service: ScoringService,
    /// Number of calls made.
    call_count: AtomicU32,
    /// Last sample received.
    last_sample: Mutex<Option<WorkSample>>,
}

impl MockProvider {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            fixed_scores: None,
            script: Mutex::new(VecDeque::new()),
            service: ScoringService::default(),
            call_count: AtomicU32::new(0),
            last_sample: Mutex::new(None),
        }
    }

    /// Create a mock that always returns the same scores.
    pub fn with_fixed_scores(name: &str, scores: ScoreSet) -> Self {
        Self {
            fixed_scores: Some(scores),
            ..Self::new(name)
        }
    }

    /// Queue an error for the next unscripted call.
    pub fn then_fail(self, error: ProviderError) -> Self {
        self.script.lock().unwrap().push_back(Err(error));
        self
    }

    /// Queue a successful result for the next unscripted call.
    pub fn then_succeed(self, scores: ScoreSet) -> Self {
        self.script.lock().unwrap().push_back(Ok(scores));
        self
    }

    /// Get the number of calls made to this provider.
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }

    /// Get the last sample passed to this provider.
    pub fn last_sample(&self) -> Option<WorkSample> {
        self.last_sample.lock().unwrap().clone()
    }
}

#[async_trait]
impl ScoringProvider for MockProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn evaluate(&self, sample: &WorkSample) -> anyhow::Result<ScoredWork> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        *self.last_sample.lock().unwrap() = Some(sample.clone());
        validate_content(&sample.content)?;

        let next = self.script.lock().unwrap().pop_front();
        let result = match next {
            Some(Err(error)) => return Err(error.into()),
            Some(Ok(scores)) => self.service.complete_from_scores(sample, scores),
            None => match &self.fixed_scores {
                Some(scores) => self.service.complete_from_scores(sample, scores.clone()),
                None => self.service.evaluate(sample)?,
            },
        };

        Ok(ScoredWork {
            result,
            provider: self.name.clone(),
            model: "mock-model".into(),
            tokens_used: (sample.content.len() / 4) as u32,
            cost_usd: 0.0,
        })
    }
}
