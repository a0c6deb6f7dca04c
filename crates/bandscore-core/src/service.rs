//! The single entry point callers use to evaluate work.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::course::{CourseCatalog, CourseGenerator, CourseSettings};
use crate::criteria::CriterionScorer;
use crate::error::ValidationError;
use crate::lexicon::LexiconTables;
use crate::model::{EvaluationResult, ScoreSet, WorkSample, WorkType};
use crate::synthesis::AssessmentSynthesizer;

/// Behavior switches for [`ScoringService`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Reject unknown work-type labels instead of scoring them as general.
    pub strict_work_type: bool,
    pub course: CourseSettings,
}

/// Validates input and runs extraction, scoring, synthesis and course
/// generation. Cheap to clone and safe to share across threads.
#[derive(Debug, Clone)]
pub struct ScoringService {
    scorer: CriterionScorer,
    synthesizer: AssessmentSynthesizer,
    courses: CourseGenerator,
    config: ServiceConfig,
}

impl Default for ScoringService {
    fn default() -> Self {
        Self::new(
            LexiconTables::shared(),
            CourseCatalog::default(),
            ServiceConfig::default(),
        )
    }
}

impl ScoringService {
    pub fn new(lexicon: Arc<LexiconTables>, catalog: CourseCatalog, config: ServiceConfig) -> Self {
        Self {
            scorer: CriterionScorer::new(Arc::clone(&lexicon)),
            synthesizer: AssessmentSynthesizer::new(lexicon),
            courses: CourseGenerator::new(catalog, config.course.clone()),
            config,
        }
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Evaluate from loose caller input.
    ///
    /// Unknown work-type labels fall back to the general pipeline unless
    /// `strict_work_type` is set.
    pub fn evaluate_work(
        &self,
        content: &str,
        work_type: &str,
        task_type: Option<&str>,
        word_count: Option<u32>,
    ) -> Result<EvaluationResult, ValidationError> {
        let work_type = self.resolve_work_type(work_type)?;
        let sample = WorkSample {
            content: content.to_string(),
            work_type,
            task_type: task_type.unwrap_or("general").to_string(),
            declared_word_count: word_count,
        };
        self.evaluate(&sample)
    }

    /// Map a label to a work type, honoring strict handling.
    pub fn resolve_work_type(&self, label: &str) -> Result<WorkType, ValidationError> {
        match label.parse::<WorkType>() {
            Ok(work_type) => Ok(work_type),
            Err(_) if self.config.strict_work_type => {
                Err(ValidationError::UnsupportedWorkType(label.to_string()))
            }
            Err(_) => {
                debug!(label, "unsupported work type, using general pipeline");
                Ok(WorkType::General)
            }
        }
    }

    #[instrument(skip_all, fields(work_type = %sample.work_type, task_type = %sample.task_type))]
    pub fn evaluate(&self, sample: &WorkSample) -> Result<EvaluationResult, ValidationError> {
        validate_content(&sample.content)?;
        let scores = self.scorer.score(sample);
        Ok(self.complete_from_scores(sample, scores))
    }

    /// Finish an evaluation from scores produced elsewhere, such as a remote
    /// provider, so every provider shares synthesis and course generation.
    pub fn complete_from_scores(&self, sample: &WorkSample, scores: ScoreSet) -> EvaluationResult {
        let evaluation = self.synthesizer.synthesize_sample(&scores, sample);
        debug!(
            strengths = evaluation.strengths.len(),
            weaknesses = evaluation.weaknesses.len(),
            "synthesized assessment"
        );
        let improvement_course = self
            .courses
            .generate_course(&scores, &evaluation.weaknesses);
        EvaluationResult {
            scores,
            evaluation,
            improvement_course,
        }
    }
}

/// Reject empty or whitespace-only content.
pub fn validate_content(content: &str) -> Result<(), ValidationError> {
    if content.trim().is_empty() {
        return Err(ValidationError::EmptyContent);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Criterion;

    #[test]
    fn empty_content_is_rejected() {
        let service = ScoringService::default();
        assert_eq!(
            service.evaluate(&WorkSample::essay("", "task2")).unwrap_err(),
            ValidationError::EmptyContent
        );
        assert_eq!(
            service.evaluate_work(" \n\t ", "speaking", None, None).unwrap_err(),
            ValidationError::EmptyContent
        );
    }

    #[test]
    fn unknown_label_falls_back_to_general() {
        let service = ScoringService::default();
        let result = service
            .evaluate_work("Some reading notes.", "reading", None, None)
            .unwrap();
        assert!(result.scores.iter().all(|(_, b)| b == 5.0));
        assert!(result.scores.covers(WorkType::Essay));
        assert_eq!(result.improvement_course.duration_weeks, 4);
    }

    #[test]
    fn strict_mode_rejects_unknown_label() {
        let config = ServiceConfig {
            strict_work_type: true,
            ..ServiceConfig::default()
        };
        let service = ScoringService::new(LexiconTables::shared(), CourseCatalog::default(), config);
        assert_eq!(
            service
                .evaluate_work("Text.", "reading", None, None)
                .unwrap_err(),
            ValidationError::UnsupportedWorkType("reading".into())
        );
        assert!(service.evaluate_work("Text.", "essay", None, None).is_ok());
    }

    #[test]
    fn complete_from_scores_reuses_pipeline() {
        let service = ScoringService::default();
        let sample = WorkSample::speaking("I enjoy reading books in the evening.");
        let scores = ScoreSet::uniform(WorkType::Speaking, 7.0);
        let result = service.complete_from_scores(&sample, scores);
        assert_eq!(result.evaluation.strengths.len(), 4);
        assert_eq!(result.improvement_course.duration_weeks, 6);
        assert_eq!(result.improvement_course.primary_focus, Criterion::FluencyCoherence);
    }

    #[test]
    fn speaking_pipeline_shape() {
        let service = ScoringService::default();
        let result = service
            .evaluate_work("Well I think it is nice.", "speech", None, None)
            .unwrap();
        assert!(result.scores.covers(WorkType::Speaking));
        assert!(result.evaluation.weaknesses.iter().any(|w| w.contains("too brief")));
    }
}
