//! Ordered provider chain with retries.
//!
//! Each provider is tried in turn. Transient failures are retried with
//! exponential backoff (capped at 60s) that honours rate-limit hints;
//! permanent failures move straight on to the next provider. Validation
//! errors are returned immediately since no provider would accept the input.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use bandscore_core::error::{ProviderError, ValidationError};
use bandscore_core::model::{ScoredWork, WorkSample};
use bandscore_core::traits::ScoringProvider;

const MAX_RETRY_DELAY: Duration = Duration::from_secs(60);

/// How often and how patiently each provider is retried.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retries per provider after the first attempt.
    pub max_retries: u32,
    /// Delay before the first retry; doubled after each one.
    pub initial_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_secs(1),
        }
    }
}

pub struct FallbackChain {
    providers: Vec<Arc<dyn ScoringProvider>>,
    policy: RetryPolicy,
    name: String,
}

impl FallbackChain {
    pub fn new(providers: Vec<Arc<dyn ScoringProvider>>, policy: RetryPolicy) -> Self {
        let name = providers
            .iter()
            .map(|p| p.name())
            .collect::<Vec<_>>()
            .join(" > ");
        Self {
            providers,
            policy,
            name,
        }
    }

    /// Provider names in the order they are tried.
    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Try one provider until it succeeds, fails permanently or runs out of
    /// retries.
    async fn attempt(
        &self,
        provider: &dyn ScoringProvider,
        sample: &WorkSample,
    ) -> anyhow::Result<ScoredWork> {
        let mut last_error = None;
        let mut retry_delay = self.policy.initial_delay;
        for retry in 0..=self.policy.max_retries {
            if retry > 0 {
                debug!(provider = provider.name(), retry, ?retry_delay, "retrying");
                tokio::time::sleep(retry_delay).await;
                retry_delay = (retry_delay * 2).min(MAX_RETRY_DELAY);
            }
            match provider.evaluate(sample).await {
                Ok(scored) => return Ok(scored),
                Err(e) => {
                    if e.downcast_ref::<ValidationError>().is_some() {
                        return Err(e);
                    }
                    if let Some(provider_error) = e.downcast_ref::<ProviderError>() {
                        if provider_error.is_permanent() {
                            return Err(e);
                        }
                        if let Some(ms) = provider_error.retry_after_ms() {
                            retry_delay = Duration::from_millis(ms).min(MAX_RETRY_DELAY);
                        }
                    }
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| anyhow::anyhow!("unknown error")))
    }
}

#[async_trait]
impl ScoringProvider for FallbackChain {
    fn name(&self) -> &str {
        &self.name
    }

    async fn evaluate(&self, sample: &WorkSample) -> anyhow::Result<ScoredWork> {
        let mut last_error = None;
        for (index, provider) in self.providers.iter().enumerate() {
            match self.attempt(provider.as_ref(), sample).await {
                Ok(scored) => return Ok(scored),
                Err(e) if e.downcast_ref::<ValidationError>().is_some() => return Err(e),
                Err(e) => {
                    if let Some(next) = self.providers.get(index + 1) {
                        warn!(
                            provider = provider.name(),
                            next = next.name(),
                            "provider failed, falling back: {e:#}"
                        );
                    }
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| anyhow::anyhow!("no scoring providers configured")))
    }
}
