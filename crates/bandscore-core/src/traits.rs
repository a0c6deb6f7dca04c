//! Core trait definitions for scoring providers.
//!
//! The trait is implemented by the `bandscore-providers` crate; the batch
//! engine and CLI only ever see `dyn ScoringProvider`.

use async_trait::async_trait;

use crate::model::{ScoredWork, WorkSample};

/// A backend that evaluates a work sample.
///
/// Every implementation returns the same output shape, so callers can treat
/// providers interchangeably and chain them with fallback.
#[async_trait]
pub trait ScoringProvider: Send + Sync {
    /// Human-readable provider name (e.g. "openai").
    fn name(&self) -> &str;

    /// Evaluate one sample.
    ///
    /// Empty content is rejected with [`crate::error::ValidationError`];
    /// provider failures are reported as [`crate::error::ProviderError`]
    /// so retry logic can classify them.
    async fn evaluate(&self, sample: &WorkSample) -> anyhow::Result<ScoredWork>;
}

// ---------------------------------------------------------------------------
// JSON extraction
// ---------------------------------------------------------------------------

/// Extract a JSON object from a model response.
///
/// Handles:
/// - A ```json``` or generic ``` fenced block (first one wins)
/// - Raw JSON surrounded by prose (outermost braces)
/// - A bare JSON object (returned as-is)
pub fn extract_json_object(response: &str) -> Option<&str> {
    if let Some(block) = fenced_block(response) {
        return outer_braces(block);
    }
    outer_braces(response)
}

fn fenced_block(response: &str) -> Option<&str> {
    let start = response.find("```")?;
    let after_fence = &response[start + 3..];
    // skip the info string ("json", "JSON", or nothing)
    let body_start = after_fence.find('\n')? + 1;
    let body = &after_fence[body_start..];
    match body.find("```") {
        Some(end) => Some(&body[..end]),
        // truncated, take what we have
        None => Some(body),
    }
}

fn outer_braces(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_bare_object() {
        let input = r#"{"scores": {}}"#;
        assert_eq!(extract_json_object(input), Some(input));
    }

    #[test]
    fn extract_fenced_json_block() {
        let input = "Here is the assessment:\n\n```json\n{\"a\": 1}\n```\n\nGood luck!";
        assert_eq!(extract_json_object(input), Some("{\"a\": 1}"));
    }

    #[test]
    fn extract_generic_fence() {
        let input = "```\n{\"b\": 2}\n```";
        assert_eq!(extract_json_object(input), Some("{\"b\": 2}"));
    }

    #[test]
    fn extract_from_prose() {
        let input = "Sure! {\"nested\": {\"x\": 1}} Hope this helps.";
        assert_eq!(extract_json_object(input), Some("{\"nested\": {\"x\": 1}}"));
    }

    #[test]
    fn extract_truncated_fence() {
        let input = "```json\n{\"c\": 3}";
        assert_eq!(extract_json_object(input), Some("{\"c\": 3}"));
    }

    #[test]
    fn no_object_found() {
        assert_eq!(extract_json_object("no json here"), None);
        assert_eq!(extract_json_object("} backwards {"), None);
    }
}
