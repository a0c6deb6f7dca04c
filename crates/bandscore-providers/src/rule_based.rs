//! Local rule-engine provider.

use async_trait::async_trait;
use tracing::instrument;

use bandscore_core::model::{ScoredWork, WorkSample};
use bandscore_core::traits::ScoringProvider;
use bandscore_core::ScoringService;

/// Identifier recorded as the model for rule-based results.
pub const RULESET_VERSION: &str = "rules-v1";

/// Scores with the in-process [`ScoringService`]. Never fails on non-empty
/// input and costs nothing.
#[derive(Debug, Clone, Default)]
pub struct RuleBasedProvider {
    service: ScoringService,
}

impl RuleBasedProvider {
    pub fn new(service: ScoringService) -> Self {
        Self { service }
    }
}

#[async_trait]
impl ScoringProvider for RuleBasedProvider {
    fn name(&self) -> &str {
        "rule_based"
    }

    #[instrument(skip_all, fields(work_type = %sample.work_type))]
    async fn evaluate(&self, sample: &WorkSample) -> anyhow::Result<ScoredWork> {
        let result = self.service.evaluate(sample)?;
        Ok(ScoredWork {
            result,
            provider: self.name().to_string(),
            model: RULESET_VERSION.to_string(),
            tokens_used: 0,
            cost_usd: 0.0,
        })
    }
}
