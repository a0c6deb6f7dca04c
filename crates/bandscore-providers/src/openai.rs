//! OpenAI chat-completions scoring provider.
//!
//! The remote model returns criterion bands and free-text feedback as JSON.
//! Focus areas, per-criterion feedback and the improvement course are
//! completed locally from those bands, so remote and rule-based results have
//! the same shape.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use bandscore_core::error::ProviderError;
use bandscore_core::model::{ScoreSet, ScoredWork, WorkSample, WorkType};
use bandscore_core::service::validate_content;
use bandscore_core::traits::{extract_json_object, ScoringProvider};
use bandscore_core::ScoringService;

const DEFAULT_BASE_URL: &str = "https://api.openai.com";
const DEFAULT_MODEL: &str = "gpt-4";
const DEFAULT_TIMEOUT_SECS: u64 = 120;
const MAX_TOKENS: u32 = 2000;
const TEMPERATURE: f64 = 0.2;
const SYSTEM_PROMPT: &str = "You are an expert IELTS examiner. Assess the submitted work strictly \
according to the official IELTS band descriptors and give accurate, detailed feedback. \
Always return valid JSON.";

/// OpenAI-compatible API provider.
pub struct OpenAiProvider {
    api_key: String,
    base_url: String,
    model: String,
    org_id: Option<String>,
    client: reqwest::Client,
    service: ScoringService,
}

impl OpenAiProvider {
    pub fn new(api_key: &str, base_url: Option<String>, org_id: Option<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .expect("failed to build HTTP client");

        Self {
            api_key: api_key.to_string(),
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            model: DEFAULT_MODEL.to_string(),
            org_id,
            client,
            service: ScoringService::default(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Service used to complete remote scores into a full result.
    pub fn with_service(mut self, service: ScoringService) -> Self {
        self.service = service;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

/// USD per 1K tokens, blended prompt and completion.
fn cost_per_1k_tokens(model: &str) -> f64 {
    if model.starts_with("gpt-3.5") {
        0.002
    } else {
        0.03
    }
}

fn task_description(task_type: &str) -> &'static str {
    match task_type {
        "task1" => "IELTS Academic Task 1 (150+ words): describing visual information",
        "task2" => "IELTS Academic Task 2 (250+ words): argumentative essay",
        _ => "IELTS General Training: formal or informal letter or essay",
    }
}

fn essay_prompt(sample: &WorkSample) -> String {
    format!(
        r#"Evaluate the following essay for {task}.

Essay:
"""
{content}
"""

Respond with a JSON object of exactly this shape:
{{
  "scores": {{
    "task_achievement": 0.0,
    "coherence_cohesion": 0.0,
    "lexical_resource": 0.0,
    "grammar_accuracy": 0.0
  }},
  "feedback": {{
    "strengths": ["..."],
    "improvements": ["..."],
    "suggestions": ["..."]
  }}
}}

Use band scores from 0 to 9 in 0.5 increments."#,
        task = task_description(&sample.task_type),
        content = sample.content,
    )
}

fn speaking_prompt(sample: &WorkSample) -> String {
    format!(
        r#"Evaluate the following transcript of an IELTS Speaking response.

Transcript:
"""
{content}
"""

Respond with a JSON object of exactly this shape:
{{
  "scores": {{
    "fluency_coherence": 0.0,
    "lexical_resource": 0.0,
    "grammatical_range": 0.0,
    "pronunciation": 0.0
  }},
  "feedback": {{
    "strengths": ["..."],
    "improvements": ["..."],
    "suggestions": ["..."]
  }}
}}

Use band scores from 0 to 9 in 0.5 increments."#,
        content = sample.content,
    )
}

/// Build the user prompt for a sample. General work is assessed as an essay.
pub fn build_prompt(sample: &WorkSample) -> String {
    match sample.work_type {
        WorkType::Speaking => speaking_prompt(sample),
        WorkType::Essay | WorkType::General => essay_prompt(sample),
    }
}

#[derive(Serialize)]
struct OpenAiRequest {
    model: String,
    max_tokens: u32,
    temperature: f64,
    messages: Vec<OpenAiMessage>,
    response_format: ResponseFormat,
}

#[derive(Serialize)]
struct OpenAiMessage {
    role: String,
    content: String,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
    #[serde(default)]
    usage: OpenAiUsage,
    model: String,
}

#[derive(Deserialize)]
struct OpenAiChoice {
    message: OpenAiChoiceMessage,
}

#[derive(Deserialize)]
struct OpenAiChoiceMessage {
    content: String,
}

#[derive(Deserialize, Default)]
struct OpenAiUsage {
    #[serde(default)]
    total_tokens: u32,
}

/// The assessment JSON the model is asked to produce.
#[derive(Debug, Deserialize)]
struct RemoteAssessment {
    scores: ScoreSet,
    #[serde(default)]
    feedback: RemoteFeedback,
}

#[derive(Debug, Default, Deserialize)]
struct RemoteFeedback {
    #[serde(default)]
    strengths: Vec<String>,
    #[serde(default)]
    improvements: Vec<String>,
    #[serde(default)]
    suggestions: Vec<String>,
}

fn parse_assessment(content: &str, work_type: WorkType) -> Result<RemoteAssessment, ProviderError> {
    let json = extract_json_object(content)
        .ok_or_else(|| ProviderError::InvalidResponse("no JSON object in response".into()))?;
    let mut assessment: RemoteAssessment = serde_json::from_str(json)
        .map_err(|e| ProviderError::InvalidResponse(format!("malformed assessment: {e}")))?;

    let expected = match work_type {
        WorkType::Speaking => WorkType::Speaking,
        WorkType::Essay | WorkType::General => WorkType::Essay,
    };
    if !assessment.scores.covers(expected) {
        let names: Vec<&str> = expected.criteria().iter().map(|c| c.as_str()).collect();
        return Err(ProviderError::InvalidResponse(format!(
            "expected scores for {}",
            names.join(", ")
        )));
    }
    // bands are reported on the half-band grid whatever the provider
    assessment.scores = assessment.scores.snapped_to_half_bands();
    Ok(assessment)
}

#[async_trait]
impl ScoringProvider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    #[instrument(skip(self, sample), fields(model = %self.model, work_type = %sample.work_type))]
    async fn evaluate(&self, sample: &WorkSample) -> anyhow::Result<ScoredWork> {
        validate_content(&sample.content)?;

        let body = OpenAiRequest {
            model: self.model.clone(),
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
            messages: vec![
                OpenAiMessage {
                    role: "system".to_string(),
                    content: SYSTEM_PROMPT.to_string(),
                },
                OpenAiMessage {
                    role: "user".to_string(),
                    content: build_prompt(sample),
                },
            ],
            response_format: ResponseFormat {
                kind: "json_object",
            },
        };

        let mut req = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("content-type", "application/json");

        if let Some(org) = &self.org_id {
            req = req.header("OpenAI-Organization", org);
        }

        let response = req.json(&body).send().await.map_err(|e| {
            if e.is_timeout() {
                ProviderError::Timeout(DEFAULT_TIMEOUT_SECS)
            } else {
                ProviderError::NetworkError(e.to_string())
            }
        })?;

        let status = response.status().as_u16();
        if status == 429 {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(5)
                * 1000;
            return Err(ProviderError::RateLimited {
                retry_after_ms: retry_after,
            }
            .into());
        }
        if status == 401 {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::AuthenticationFailed(body).into());
        }
        if status == 404 {
            return Err(ProviderError::ModelNotFound(self.model.clone()).into());
        }
        if status >= 400 {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::ApiError {
                status,
                message: body,
            }
            .into());
        }

        let api_response: OpenAiResponse = response.json().await.map_err(|e| {
            ProviderError::ApiError {
                status: 0,
                message: format!("failed to parse response: {e}"),
            }
        })?;

        let content = api_response
            .choices
            .first()
            .map(|c| c.message.content.as_str())
            .unwrap_or_default();
        let remote = parse_assessment(content, sample.work_type)?;
        debug!(overall = remote.scores.overall_band(), "remote scores accepted");

        let mut result = self.service.complete_from_scores(sample, remote.scores);
        let feedback = remote.feedback;
        if !feedback.strengths.is_empty() {
            result.evaluation.strengths = feedback.strengths;
        }
        if !feedback.improvements.is_empty() {
            result.evaluation.weaknesses = feedback.improvements;
            result.improvement_course.addressed_weaknesses = result.evaluation.weaknesses.clone();
        }
        if !feedback.suggestions.is_empty() {
            result.evaluation.suggestions = feedback.suggestions;
        }

        let tokens_used = api_response.usage.total_tokens;
        let cost_usd = tokens_used as f64 * cost_per_1k_tokens(&api_response.model) / 1000.0;

        Ok(ScoredWork {
            result,
            provider: self.name().to_string(),
            model: api_response.model,
            tokens_used,
            cost_usd,
        })
    }
}
