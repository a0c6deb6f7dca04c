//! bandscore-providers - Scoring provider implementations.
//!
//! Implements the `ScoringProvider` trait for the local rule engine and for
//! OpenAI, plus a retrying fallback chain, a blocking adapter for
//! synchronous workers, and configuration loading.

pub mod blocking;
pub mod config;
pub mod fallback;
pub mod mock;
pub mod openai;
pub mod rule_based;

pub use bandscore_core::error::ProviderError;
pub use blocking::BlockingEvaluator;
pub use config::{build_chain, build_service, load_config, BandscoreConfig, ProviderConfig};
pub use fallback::{FallbackChain, RetryPolicy};
pub use rule_based::RuleBasedProvider;
