//! Turns a score set into strengths, weaknesses, feedback and suggestions.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use crate::criteria::task_minimum_words;
use crate::features::FeatureExtractor;
use crate::lexicon::LexiconTables;
use crate::model::{Assessment, Criterion, ScoreSet, WorkSample, WorkType};

/// Scores at or above this are reported as strengths.
pub const STRENGTH_THRESHOLD: f64 = 7.0;
/// Scores below this are weaknesses and focus areas.
pub const WEAKNESS_THRESHOLD: f64 = 6.0;

const GOOD_LENGTH_WORDS: usize = 250;
const BRIEF_SPEECH_WORDS: usize = 80;
const FILLER_LIMIT: usize = 3;

const DEFAULT_SUGGESTION: &str = "Keep practicing regularly to improve your skills";

fn strength_text(criterion: Criterion) -> &'static str {
    match criterion {
        Criterion::TaskAchievement => "Clear task response with well-developed ideas",
        Criterion::CoherenceCohesion => "Clear logical structure and flow",
        Criterion::LexicalResource => "Good vocabulary range and usage",
        Criterion::GrammarAccuracy => "Good grammar with some complexity",
        Criterion::FluencyCoherence => "Speaks at length with logically connected ideas",
        Criterion::GrammaticalRange => "Good range of grammatical structures",
        Criterion::Pronunciation => "Clear and intelligible pronunciation",
    }
}

fn weakness_text(criterion: Criterion) -> &'static str {
    match criterion {
        Criterion::TaskAchievement => "Develop ideas more fully with specific examples",
        Criterion::CoherenceCohesion => "Use more linking words between ideas",
        Criterion::LexicalResource => "Expand vocabulary range and precision",
        Criterion::GrammarAccuracy => "Use more complex sentence structures",
        Criterion::FluencyCoherence => "Extend answers and connect ideas more smoothly",
        Criterion::GrammaticalRange => "Use a wider range of sentence structures",
        Criterion::Pronunciation => "Work on pronunciation clarity",
    }
}

fn suggestion_text(criterion: Criterion) -> &'static str {
    match criterion {
        Criterion::TaskAchievement => "Add concrete examples to support your main points",
        Criterion::CoherenceCohesion => {
            "Try transitions like: 'Furthermore', 'However', 'In addition', 'Therefore'"
        }
        Criterion::LexicalResource => "Use more varied and academic vocabulary",
        Criterion::GrammarAccuracy => {
            "Try combining sentences with 'which', 'although', 'because', 'while'"
        }
        Criterion::FluencyCoherence => "Practice speaking for two minutes on a topic without stopping",
        Criterion::GrammaticalRange => "Practice conditionals and relative clauses in spoken answers",
        Criterion::Pronunciation => "Record yourself and compare with model answers",
    }
}

/// Level name used in per-criterion feedback.
pub fn band_level(band: f64) -> &'static str {
    if band >= 8.0 {
        "Excellent"
    } else if band >= 7.0 {
        "Good"
    } else if band >= 6.0 {
        "Competent"
    } else if band >= 5.0 {
        "Modest"
    } else {
        "Needs improvement"
    }
}

/// `"Score: 6.5/9 - Competent"`.
pub fn feedback_line(band: f64) -> String {
    format!("Score: {band:.1}/9 - {}", band_level(band))
}

/// Builds an [`Assessment`] from scores and the text they were computed on.
#[derive(Debug, Clone, Default)]
pub struct AssessmentSynthesizer {
    extractor: FeatureExtractor,
}

impl AssessmentSynthesizer {
    pub fn new(lexicon: Arc<LexiconTables>) -> Self {
        Self {
            extractor: FeatureExtractor::new(lexicon),
        }
    }

    /// Synthesize with the work type inferred from the score set and no
    /// task-specific length target.
    pub fn synthesize(&self, scores: &ScoreSet, content: &str) -> Assessment {
        let sample = WorkSample {
            content: content.to_string(),
            work_type: scores.work_type(),
            task_type: "general".to_string(),
            declared_word_count: None,
        };
        self.synthesize_sample(scores, &sample)
    }

    /// Synthesize for a known sample, so length checks use its task type and
    /// declared word count.
    pub fn synthesize_sample(&self, scores: &ScoreSet, sample: &WorkSample) -> Assessment {
        let features = self.extractor.extract(&sample.content);
        let word_count = match sample.declared_word_count {
            Some(n) if n > 0 => n as usize,
            _ => features.word_count,
        };
        let speaking = sample.work_type == WorkType::Speaking;

        let mut strengths = Vec::new();
        let mut weaknesses = Vec::new();
        let mut focus_areas = BTreeSet::new();
        let mut feedback = BTreeMap::new();
        let mut suggestions = Vec::new();

        for (criterion, band) in scores.iter() {
            feedback.insert(criterion, feedback_line(band));
            if band >= STRENGTH_THRESHOLD {
                strengths.push(strength_text(criterion).to_string());
            } else if band < WEAKNESS_THRESHOLD {
                weaknesses.push(weakness_text(criterion).to_string());
                focus_areas.insert(criterion);
                suggestions.push(suggestion_text(criterion).to_string());
            }
        }

        if word_count > GOOD_LENGTH_WORDS {
            strengths.push("Good length with well-developed content".to_string());
        }
        if features.academic_word_hits > 0 {
            strengths.push("Uses academic vocabulary".to_string());
        }

        if speaking {
            if word_count < BRIEF_SPEECH_WORDS {
                weaknesses.push("Response is too brief; speak at greater length".to_string());
            }
            if features.filler_hits >= FILLER_LIMIT {
                weaknesses.push(
                    "Frequent filler words (um, uh, like) interrupt fluency".to_string(),
                );
            }
        } else {
            let minimum = task_minimum_words(&sample.task_type);
            if word_count < minimum {
                suggestions.push(format!("Aim for at least {minimum} words for this task"));
            }
        }

        if suggestions.is_empty() {
            suggestions.push(DEFAULT_SUGGESTION.to_string());
        }

        Assessment {
            strengths,
            weaknesses,
            focus_areas,
            feedback,
            suggestions,
        }
    }
}
