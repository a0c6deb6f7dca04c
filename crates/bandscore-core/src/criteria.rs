//! Criterion rule tables and the scorer that applies them.
//!
//! Every criterion starts from a base band and owns an ordered list of
//! [`Rule`]s. Each rule reads one [`Signal`] from the extracted features and
//! awards the bonus of the first [`Tier`] whose threshold holds. Rules are
//! plain data, so adding or retuning one never touches the scoring loop.

use std::sync::Arc;

use tracing::debug;

use crate::features::FeatureExtractor;
use crate::lexicon::LexiconTables;
use crate::model::{clamp_band, Criterion, FeatureSet, ScoreSet, WorkSample, WorkType};

/// Band every rule-driven criterion starts from.
pub const BASE_BAND: f64 = 5.0;
/// Fixed band for pronunciation, which text cannot measure.
pub const PRONUNCIATION_BAND: f64 = 6.0;

/// Minimum expected essay length for a task variant.
pub fn task_minimum_words(task_type: &str) -> usize {
    match task_type.trim().to_lowercase().as_str() {
        "task1" => 150,
        "task2" => 250,
        _ => 200,
    }
}

/// A measurable property of the text that a rule compares against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    /// Effective word count minus the task minimum.
    WordsOverTaskMinimum,
    WordCount,
    SentenceCount,
    ParagraphCount,
    SentenceSpread,
    TransitionHits,
    AcademicHits,
    ComplexHits,
    FillerHits,
    UniqueWordRatio,
    LongWordRatio,
    /// 1 when an exemplification phrase is present.
    Exemplification,
    /// 1 when a thesis marker is present.
    ThesisMarker,
    /// 1 when the text uses both a comma and a semicolon.
    CommaAndSemicolon,
}

impl Signal {
    fn measure(self, input: &RuleInput<'_>) -> f64 {
        let f = input.features;
        match self {
            Signal::WordsOverTaskMinimum => {
                input.effective_word_count as f64 - input.task_minimum as f64
            }
            Signal::WordCount => f.word_count as f64,
            Signal::SentenceCount => f.sentence_count as f64,
            Signal::ParagraphCount => f.paragraph_count as f64,
            Signal::SentenceSpread => f.sentence_length_spread as f64,
            Signal::TransitionHits => f.transition_hits as f64,
            Signal::AcademicHits => f.academic_word_hits as f64,
            Signal::ComplexHits => f.complex_pattern_hits as f64,
            Signal::FillerHits => f.filler_hits as f64,
            Signal::UniqueWordRatio => f.unique_word_ratio,
            Signal::LongWordRatio => f.long_word_ratio,
            Signal::Exemplification => flag(input.has_exemplification),
            Signal::ThesisMarker => flag(input.has_thesis_marker),
            Signal::CommaAndSemicolon => flag(f.has_comma && f.has_semicolon),
        }
    }
}

fn flag(value: bool) -> f64 {
    if value {
        1.0
    } else {
        0.0
    }
}

/// Threshold comparison for one tier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Threshold {
    AtLeast(f64),
    Above(f64),
    Below(f64),
}

impl Threshold {
    fn holds(self, value: f64) -> bool {
        match self {
            Threshold::AtLeast(t) => value >= t,
            Threshold::Above(t) => value > t,
            Threshold::Below(t) => value < t,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tier {
    pub threshold: Threshold,
    pub bonus: f64,
}

/// One scoring rule: the first matching tier wins, none matching adds 0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rule {
    pub signal: Signal,
    pub tiers: &'static [Tier],
}

impl Rule {
    fn bonus(&self, input: &RuleInput<'_>) -> f64 {
        let value = self.signal.measure(input);
        self.tiers
            .iter()
            .find(|tier| tier.threshold.holds(value))
            .map_or(0.0, |tier| tier.bonus)
    }
}

use Threshold::{Above, AtLeast, Below};

const TASK_ACHIEVEMENT_RULES: &[Rule] = &[
    Rule {
        signal: Signal::WordsOverTaskMinimum,
        tiers: &[Tier { threshold: AtLeast(0.0), bonus: 0.5 }],
    },
    Rule {
        signal: Signal::ParagraphCount,
        tiers: &[Tier { threshold: AtLeast(3.0), bonus: 0.5 }],
    },
    Rule {
        signal: Signal::Exemplification,
        tiers: &[Tier { threshold: AtLeast(1.0), bonus: 0.5 }],
    },
    Rule {
        signal: Signal::ThesisMarker,
        tiers: &[Tier { threshold: AtLeast(1.0), bonus: 0.5 }],
    },
];

const COHERENCE_RULES: &[Rule] = &[
    Rule {
        signal: Signal::TransitionHits,
        tiers: &[
            Tier { threshold: AtLeast(3.0), bonus: 1.0 },
            Tier { threshold: AtLeast(1.0), bonus: 0.5 },
        ],
    },
    Rule {
        signal: Signal::ParagraphCount,
        tiers: &[Tier { threshold: AtLeast(4.0), bonus: 0.5 }],
    },
    Rule {
        signal: Signal::SentenceSpread,
        tiers: &[Tier { threshold: Above(5.0), bonus: 0.5 }],
    },
];

const LEXICAL_RULES: &[Rule] = &[
    Rule {
        signal: Signal::UniqueWordRatio,
        tiers: &[
            Tier { threshold: Above(0.6), bonus: 1.0 },
            Tier { threshold: Above(0.4), bonus: 0.5 },
        ],
    },
    Rule {
        signal: Signal::AcademicHits,
        tiers: &[
            Tier { threshold: AtLeast(3.0), bonus: 1.0 },
            Tier { threshold: AtLeast(1.0), bonus: 0.5 },
        ],
    },
    Rule {
        signal: Signal::LongWordRatio,
        tiers: &[Tier { threshold: Above(0.2), bonus: 0.5 }],
    },
];

const GRAMMAR_RULES: &[Rule] = &[
    Rule {
        signal: Signal::ComplexHits,
        tiers: &[
            Tier { threshold: AtLeast(3.0), bonus: 1.0 },
            Tier { threshold: AtLeast(1.0), bonus: 0.5 },
        ],
    },
    Rule {
        signal: Signal::SentenceCount,
        tiers: &[Tier { threshold: Above(5.0), bonus: 0.5 }],
    },
    Rule {
        signal: Signal::CommaAndSemicolon,
        tiers: &[Tier { threshold: AtLeast(1.0), bonus: 0.5 }],
    },
];

const FLUENCY_RULES: &[Rule] = &[
    Rule {
        signal: Signal::WordCount,
        tiers: &[
            Tier { threshold: Above(150.0), bonus: 1.0 },
            Tier { threshold: Above(100.0), bonus: 0.5 },
        ],
    },
    Rule {
        signal: Signal::SentenceCount,
        tiers: &[Tier { threshold: Above(5.0), bonus: 0.5 }],
    },
    Rule {
        signal: Signal::FillerHits,
        tiers: &[Tier { threshold: Below(3.0), bonus: 0.5 }],
    },
];

impl Criterion {
    /// The rule table applied on top of [`Criterion::base_band`].
    pub fn rules(self) -> &'static [Rule] {
        match self {
            Criterion::TaskAchievement => TASK_ACHIEVEMENT_RULES,
            Criterion::CoherenceCohesion => COHERENCE_RULES,
            Criterion::LexicalResource => LEXICAL_RULES,
            Criterion::GrammarAccuracy | Criterion::GrammaticalRange => GRAMMAR_RULES,
            Criterion::FluencyCoherence => FLUENCY_RULES,
            Criterion::Pronunciation => &[],
        }
    }

    pub fn base_band(self) -> f64 {
        match self {
            Criterion::Pronunciation => PRONUNCIATION_BAND,
            _ => BASE_BAND,
        }
    }
}

/// Everything a rule may look at.
#[derive(Debug, Clone, Copy)]
pub struct RuleInput<'a> {
    pub features: &'a FeatureSet,
    pub effective_word_count: usize,
    pub task_minimum: usize,
    pub has_exemplification: bool,
    pub has_thesis_marker: bool,
}

/// Apply a criterion's rule table to prepared input.
pub fn score_criterion(criterion: Criterion, input: &RuleInput<'_>) -> f64 {
    let raw = criterion
        .rules()
        .iter()
        .fold(criterion.base_band(), |band, rule| band + rule.bonus(input));
    clamp_band(raw)
}

/// Scores essays and speech transcriptions against the rule tables.
#[derive(Debug, Clone, Default)]
pub struct CriterionScorer {
    extractor: FeatureExtractor,
}

impl CriterionScorer {
    pub fn new(lexicon: Arc<LexiconTables>) -> Self {
        Self {
            extractor: FeatureExtractor::new(lexicon),
        }
    }

    pub fn extractor(&self) -> &FeatureExtractor {
        &self.extractor
    }

    /// Dispatch on the sample's work type.
    pub fn score(&self, sample: &WorkSample) -> ScoreSet {
        match sample.work_type {
            WorkType::Essay => self.score_essay(
                &sample.content,
                &sample.task_type,
                sample.declared_word_count,
            ),
            WorkType::Speaking => self.score_speaking(&sample.content),
            WorkType::General => self.score_general(),
        }
    }

    /// Score an essay. A declared word count greater than zero replaces the
    /// derived count for the task-length rule.
    pub fn score_essay(
        &self,
        content: &str,
        task_type: &str,
        declared_word_count: Option<u32>,
    ) -> ScoreSet {
        let features = self.extractor.extract(content);
        let effective_word_count = match declared_word_count {
            Some(n) if n > 0 => n as usize,
            _ => features.word_count,
        };
        let input = self.rule_input(content, &features, effective_word_count, task_type);
        let scores = score_all(WorkType::Essay, &input);
        debug!(
            task_type,
            word_count = effective_word_count,
            overall = scores.overall_band(),
            "scored essay"
        );
        scores
    }

    pub fn score_speaking(&self, content: &str) -> ScoreSet {
        let features = self.extractor.extract(content);
        let input = self.rule_input(content, &features, features.word_count, "general");
        let scores = score_all(WorkType::Speaking, &input);
        debug!(
            word_count = features.word_count,
            fillers = features.filler_hits,
            overall = scores.overall_band(),
            "scored speaking"
        );
        scores
    }

    /// Degenerate path for unsupported work types: essay criteria at base.
    pub fn score_general(&self) -> ScoreSet {
        ScoreSet::uniform(WorkType::General, BASE_BAND)
    }

    fn rule_input<'a>(
        &self,
        content: &str,
        features: &'a FeatureSet,
        effective_word_count: usize,
        task_type: &str,
    ) -> RuleInput<'a> {
        let lowered = content.to_lowercase();
        let lexicon = self.extractor.lexicon();
        RuleInput {
            features,
            effective_word_count,
            task_minimum: task_minimum_words(task_type),
            has_exemplification: lexicon.has_exemplification(&lowered),
            has_thesis_marker: lexicon.has_thesis_marker(&lowered),
        }
    }
}

fn score_all(work_type: WorkType, input: &RuleInput<'_>) -> ScoreSet {
    ScoreSet::new(
        work_type
            .criteria()
            .into_iter()
            .map(|c| (c, score_criterion(c, input))),
    )
}
