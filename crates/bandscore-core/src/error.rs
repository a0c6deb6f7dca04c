//! Error types shared across bandscore crates.
//!
//! `ValidationError` is the caller-facing rejection raised at the service
//! boundary. `ProviderError` describes failures of a scoring provider; it
//! lives here so the fallback chain can downcast and classify errors for
//! retry decisions without string matching.

use thiserror::Error;

/// Input rejected before any scoring happens.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The submitted content is empty or whitespace-only.
    #[error("content cannot be empty")]
    EmptyContent,

    /// The work type is not one the service scores and strict handling is on.
    #[error("unsupported work type: {0}")]
    UnsupportedWorkType(String),
}

/// Errors that can occur when interacting with a scoring provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The API returned a 429 rate limit response.
    #[error("rate limited, retry after {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },

    /// Authentication failed (invalid API key).
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The requested model was not found.
    #[error("model not found: {0}")]
    ModelNotFound(String),

    /// The API returned an error response.
    #[error("API error (HTTP {status}): {message}")]
    ApiError { status: u16, message: String },

    /// The request timed out.
    #[error("request timed out after {0}s")]
    Timeout(u64),

    /// A network error occurred.
    #[error("network error: {0}")]
    NetworkError(String),

    /// The provider answered, but not with a usable assessment.
    #[error("invalid assessment from provider: {0}")]
    InvalidResponse(String),
}

impl ProviderError {
    /// Returns `true` if this error is permanent and should not be retried.
    pub fn is_permanent(&self) -> bool {
        matches!(
            self,
            ProviderError::AuthenticationFailed(_)
                | ProviderError::ModelNotFound(_)
                | ProviderError::InvalidResponse(_)
        )
    }

    /// Returns the retry-after delay in milliseconds, if applicable.
    pub fn retry_after_ms(&self) -> Option<u64> {
        match self {
            ProviderError::RateLimited { retry_after_ms } => Some(*retry_after_ms),
            _ => None,
        }
    }
}
