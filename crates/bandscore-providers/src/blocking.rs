//! Synchronous adapter for callers without an async runtime, such as
//! background task-queue workers.

use std::sync::Arc;

use anyhow::{Context, Result};

use bandscore_core::model::{ScoredWork, WorkSample};
use bandscore_core::traits::ScoringProvider;

/// Drives a provider to completion on a private current-thread runtime.
///
/// Must not be called from inside another tokio runtime.
pub struct BlockingEvaluator {
    runtime: tokio::runtime::Runtime,
    provider: Arc<dyn ScoringProvider>,
}

impl BlockingEvaluator {
    pub fn new(provider: Arc<dyn ScoringProvider>) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .context("failed to build evaluation runtime")?;
        Ok(Self { runtime, provider })
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub fn evaluate(&self, sample: &WorkSample) -> Result<ScoredWork> {
        self.runtime.block_on(self.provider.evaluate(sample))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule_based::RuleBasedProvider;
    use bandscore_core::model::WorkType;

    #[test]
    fn evaluates_without_async_context() {
        let evaluator = BlockingEvaluator::new(Arc::new(RuleBasedProvider::default())).unwrap();
        let scored = evaluator
            .evaluate(&WorkSample::speaking("I usually walk to work, because it is close."))
            .unwrap();
        assert!(scored.result.scores.covers(WorkType::Speaking));
        assert_eq!(evaluator.provider_name(), "rule_based");
    }

    #[test]
    fn propagates_errors() {
        let evaluator = BlockingEvaluator::new(Arc::new(RuleBasedProvider::default())).unwrap();
        assert!(evaluator.evaluate(&WorkSample::essay("", "task1")).is_err());
    }
}
