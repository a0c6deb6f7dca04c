//! Core data model types for bandscore.
//!
//! Every value here is created fresh per evaluation and returned to the
//! caller; nothing is persisted or mutated after construction.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Lowest band a criterion can hold.
pub const MIN_BAND: f64 = 0.0;
/// Highest band a criterion can hold.
pub const MAX_BAND: f64 = 9.0;

/// The kind of submitted work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkType {
    Essay,
    Speaking,
    /// Fallback for labels the scorer has no pipeline for.
    General,
}

impl WorkType {
    /// The four criteria scored for this work type, in report order.
    pub fn criteria(self) -> [Criterion; 4] {
        match self {
            WorkType::Essay | WorkType::General => [
                Criterion::TaskAchievement,
                Criterion::CoherenceCohesion,
                Criterion::LexicalResource,
                Criterion::GrammarAccuracy,
            ],
            WorkType::Speaking => [
                Criterion::FluencyCoherence,
                Criterion::LexicalResource,
                Criterion::GrammaticalRange,
                Criterion::Pronunciation,
            ],
        }
    }
}

impl fmt::Display for WorkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkType::Essay => write!(f, "essay"),
            WorkType::Speaking => write!(f, "speaking"),
            WorkType::General => write!(f, "general"),
        }
    }
}

impl FromStr for WorkType {
    type Err = String;

    /// Only the scored work types parse; `general` is never produced from a
    /// label so the service can decide between lenient and strict handling.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "essay" | "writing" => Ok(WorkType::Essay),
            "speaking" | "speech" => Ok(WorkType::Speaking),
            other => Err(format!("unknown work type: {other}")),
        }
    }
}

/// A scored sub-skill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Criterion {
    TaskAchievement,
    CoherenceCohesion,
    LexicalResource,
    GrammarAccuracy,
    FluencyCoherence,
    GrammaticalRange,
    Pronunciation,
}

impl Criterion {
    pub const ALL: [Criterion; 7] = [
        Criterion::TaskAchievement,
        Criterion::CoherenceCohesion,
        Criterion::LexicalResource,
        Criterion::GrammarAccuracy,
        Criterion::FluencyCoherence,
        Criterion::GrammaticalRange,
        Criterion::Pronunciation,
    ];

    /// Wire name, e.g. `"task_achievement"`.
    pub fn as_str(self) -> &'static str {
        match self {
            Criterion::TaskAchievement => "task_achievement",
            Criterion::CoherenceCohesion => "coherence_cohesion",
            Criterion::LexicalResource => "lexical_resource",
            Criterion::GrammarAccuracy => "grammar_accuracy",
            Criterion::FluencyCoherence => "fluency_coherence",
            Criterion::GrammaticalRange => "grammatical_range",
            Criterion::Pronunciation => "pronunciation",
        }
    }

    /// Human-readable name, e.g. `"Task Achievement"`.
    pub fn label(self) -> &'static str {
        match self {
            Criterion::TaskAchievement => "Task Achievement",
            Criterion::CoherenceCohesion => "Coherence & Cohesion",
            Criterion::LexicalResource => "Lexical Resource",
            Criterion::GrammarAccuracy => "Grammar Accuracy",
            Criterion::FluencyCoherence => "Fluency & Coherence",
            Criterion::GrammaticalRange => "Grammatical Range",
            Criterion::Pronunciation => "Pronunciation",
        }
    }

    fn speaking_only(self) -> bool {
        matches!(
            self,
            Criterion::FluencyCoherence | Criterion::GrammaticalRange | Criterion::Pronunciation
        )
    }
}

impl fmt::Display for Criterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Criterion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Criterion::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("unknown criterion: {s}"))
    }
}

/// A single piece of submitted text (essay) or transcribed speech.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkSample {
    /// Raw essay text or speech transcription.
    pub content: String,
    /// Which pipeline scores this sample.
    pub work_type: WorkType,
    /// Task variant, e.g. "task1", "task2", "general".
    #[serde(default = "default_task_type")]
    pub task_type: String,
    /// Word count supplied by the caller; derived from content when absent.
    #[serde(default)]
    pub declared_word_count: Option<u32>,
}

fn default_task_type() -> String {
    "general".to_string()
}

impl WorkSample {
    pub fn essay(content: impl Into<String>, task_type: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            work_type: WorkType::Essay,
            task_type: task_type.into(),
            declared_word_count: None,
        }
    }

    pub fn speaking(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            work_type: WorkType::Speaking,
            task_type: default_task_type(),
            declared_word_count: None,
        }
    }

    pub fn with_word_count(mut self, word_count: u32) -> Self {
        self.declared_word_count = Some(word_count);
        self
    }
}

/// Surface statistics extracted from a text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureSet {
    pub word_count: usize,
    pub sentence_count: usize,
    /// Distinct lowercase tokens over all tokens, in [0, 1].
    pub unique_word_ratio: f64,
    pub academic_word_hits: usize,
    pub transition_hits: usize,
    pub complex_pattern_hits: usize,
    pub avg_sentence_length: f64,
    /// Blocks of text separated by blank lines.
    pub paragraph_count: usize,
    /// Tokens longer than six characters over all tokens, in [0, 1].
    pub long_word_ratio: f64,
    /// Longest minus shortest sentence, in words.
    pub sentence_length_spread: usize,
    pub filler_hits: usize,
    pub has_comma: bool,
    pub has_semicolon: bool,
}

/// Round half to even at one decimal, so 6.25 becomes 6.2 and 6.75 becomes 6.8.
pub fn round_band(value: f64) -> f64 {
    (value * 10.0).round_ties_even() / 10.0
}

/// Clamp a band into [0, 9].
pub fn clamp_band(value: f64) -> f64 {
    if value.is_nan() {
        return MIN_BAND;
    }
    value.clamp(MIN_BAND, MAX_BAND)
}

/// Snap a band to the nearest half band (ties upward), then clamp.
pub fn snap_half_band(value: f64) -> f64 {
    clamp_band((value * 2.0).round() / 2.0)
}

/// Criterion bands plus the derived overall band.
///
/// Bands keep insertion order, which is also the tie-break order when the
/// weakest criterion is selected. The overall band is always recomputed from
/// the criteria; it cannot be set independently.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreSet {
    bands: Vec<(Criterion, f64)>,
    overall_band: f64,
}

impl ScoreSet {
    /// Build a score set; each band is clamped to [0, 9]. A repeated
    /// criterion replaces the earlier value in place.
    pub fn new(bands: impl IntoIterator<Item = (Criterion, f64)>) -> Self {
        let mut ordered: Vec<(Criterion, f64)> = Vec::new();
        for (criterion, band) in bands {
            let band = clamp_band(band);
            match ordered.iter_mut().find(|(c, _)| *c == criterion) {
                Some(slot) => slot.1 = band,
                None => ordered.push((criterion, band)),
            }
        }

        let overall_band = if ordered.is_empty() {
            0.0
        } else {
            round_band(ordered.iter().map(|(_, b)| b).sum::<f64>() / ordered.len() as f64)
        };

        Self {
            bands: ordered,
            overall_band,
        }
    }

    /// Every criterion of `work_type` at the same band.
    pub fn uniform(work_type: WorkType, band: f64) -> Self {
        Self::new(work_type.criteria().into_iter().map(|c| (c, band)))
    }

    /// Same criteria with every band snapped to the half-band grid.
    pub fn snapped_to_half_bands(&self) -> Self {
        Self::new(self.iter().map(|(c, b)| (c, snap_half_band(b))))
    }

    pub fn get(&self, criterion: Criterion) -> Option<f64> {
        self.bands
            .iter()
            .find(|(c, _)| *c == criterion)
            .map(|(_, b)| *b)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Criterion, f64)> + '_ {
        self.bands.iter().copied()
    }

    pub fn overall_band(&self) -> f64 {
        self.overall_band
    }

    pub fn len(&self) -> usize {
        self.bands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bands.is_empty()
    }

    /// Speaking when any speaking-only criterion is present, essay otherwise.
    pub fn work_type(&self) -> WorkType {
        if self.bands.iter().any(|(c, _)| c.speaking_only()) {
            WorkType::Speaking
        } else {
            WorkType::Essay
        }
    }

    /// True when the set holds exactly the criteria of `work_type`.
    pub fn covers(&self, work_type: WorkType) -> bool {
        let expected = work_type.criteria();
        self.bands.len() == expected.len() && expected.iter().all(|c| self.get(*c).is_some())
    }

    /// The lowest-scoring criterion; the first one encountered wins ties.
    pub fn weakest(&self) -> Option<(Criterion, f64)> {
        let mut weakest: Option<(Criterion, f64)> = None;
        for &(criterion, band) in &self.bands {
            match weakest {
                Some((_, lowest)) if band >= lowest => {}
                _ => weakest = Some((criterion, band)),
            }
        }
        weakest
    }
}

impl Serialize for ScoreSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.bands.len() + 1))?;
        for (criterion, band) in &self.bands {
            map.serialize_entry(criterion.as_str(), band)?;
        }
        map.serialize_entry("overall_band", &self.overall_band)?;
        map.end()
    }
}

impl<'de> Deserialize<'de> for ScoreSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ScoreSetVisitor;

        impl<'de> Visitor<'de> for ScoreSetVisitor {
            type Value = ScoreSet;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of criterion names to band scores")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<ScoreSet, A::Error> {
                let mut bands = Vec::new();
                while let Some(key) = access.next_key::<String>()? {
                    let band: f64 = access.next_value()?;
                    if key == "overall_band" {
                        // derived, recomputed below
                        continue;
                    }
                    let criterion = key.parse::<Criterion>().map_err(de::Error::custom)?;
                    bands.push((criterion, band));
                }
                Ok(ScoreSet::new(bands))
            }
        }

        deserializer.deserialize_map(ScoreSetVisitor)
    }
}

/// Strengths, weaknesses and feedback derived from a score set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    /// Criteria scoring below 6.0.
    pub focus_areas: BTreeSet<Criterion>,
    /// Per-criterion score description.
    #[serde(default)]
    pub feedback: BTreeMap<Criterion, String>,
    #[serde(default)]
    pub suggestions: Vec<String>,
}

/// One week of an improvement course.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeekPlan {
    pub week_number: u32,
    pub focus_theme: String,
    pub goals: Vec<String>,
    pub activities: Vec<String>,
}

/// A recurring daily study task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyActivity {
    pub activity: String,
    pub duration_minutes: u32,
}

/// A checkpoint with an interpolated target band.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Milestone {
    pub week: u32,
    pub target_band: f64,
    pub success_criteria: Vec<String>,
}

/// A multi-week study plan keyed to the weakest criterion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImprovementCourse {
    pub title: String,
    pub current_level: f64,
    pub target_level: f64,
    pub duration_weeks: u32,
    pub primary_focus: Criterion,
    pub weekly_plan: Vec<WeekPlan>,
    pub daily_activities: Vec<DailyActivity>,
    pub milestones: Vec<Milestone>,
    pub resources: Vec<String>,
    /// The weaknesses this course was generated to address.
    #[serde(default)]
    pub addressed_weaknesses: Vec<String>,
}

/// The full output of one evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub scores: ScoreSet,
    pub evaluation: Assessment,
    pub improvement_course: ImprovementCourse,
}

/// An evaluation together with which provider produced it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredWork {
    pub result: EvaluationResult,
    /// Provider name (e.g. "rule_based", "openai").
    pub provider: String,
    /// Model or ruleset identifier.
    pub model: String,
    #[serde(default)]
    pub tokens_used: u32,
    #[serde(default)]
    pub cost_usd: f64,
}

/// A named collection of samples for batch evaluation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SampleSet {
    /// Unique identifier for this sample set.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub samples: Vec<SampleCase>,
    /// Work-type label for samples that don't specify one.
    #[serde(default = "default_work_type_label")]
    pub default_work_type: String,
    /// Task type for samples that don't specify one.
    #[serde(default = "default_task_type")]
    pub default_task_type: String,
}

fn default_work_type_label() -> String {
    "essay".to_string()
}

impl SampleSet {
    /// Build the work sample for a case, applying set defaults. Labels that
    /// don't name a scored work type map to [`WorkType::General`].
    pub fn work_sample(&self, case: &SampleCase) -> WorkSample {
        let label = case.work_type.as_deref().unwrap_or(&self.default_work_type);
        WorkSample {
            content: case.content.clone(),
            work_type: label.parse().unwrap_or(WorkType::General),
            task_type: case
                .task_type
                .clone()
                .unwrap_or_else(|| self.default_task_type.clone()),
            declared_word_count: case.declared_word_count,
        }
    }
}

/// One sample inside a [`SampleSet`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SampleCase {
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// Essay text or speech transcription.
    pub content: String,
    /// Raw work-type label; the set default applies when absent.
    #[serde(default)]
    pub work_type: Option<String>,
    #[serde(default)]
    pub task_type: Option<String>,
    #[serde(default)]
    pub declared_word_count: Option<u32>,
    /// Band a human examiner gave this sample, if known.
    #[serde(default)]
    pub expected_band: Option<f64>,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_set_defaults_apply() {
        let set = SampleSet {
            id: "s".into(),
            name: "S".into(),
            description: String::new(),
            samples: vec![],
            default_work_type: "speaking".into(),
            default_task_type: "task1".into(),
        };
        let case = SampleCase {
            id: "a".into(),
            name: String::new(),
            content: "Hello.".into(),
            work_type: None,
            task_type: None,
            declared_word_count: Some(12),
            expected_band: None,
            tags: vec![],
        };
        let sample = set.work_sample(&case);
        assert_eq!(sample.work_type, WorkType::Speaking);
        assert_eq!(sample.task_type, "task1");
        assert_eq!(sample.declared_word_count, Some(12));

        let poem = SampleCase {
            work_type: Some("poem".into()),
            ..case
        };
        assert_eq!(set.work_sample(&poem).work_type, WorkType::General);
    }

    #[test]
    fn work_type_display_and_parse() {
        assert_eq!(WorkType::Essay.to_string(), "essay");
        assert_eq!("Speaking".parse::<WorkType>().unwrap(), WorkType::Speaking);
        assert_eq!("writing".parse::<WorkType>().unwrap(), WorkType::Essay);
        assert!("general".parse::<WorkType>().is_err());
        assert!("poem".parse::<WorkType>().is_err());
    }

    #[test]
    fn criterion_names_roundtrip() {
        for c in Criterion::ALL {
            assert_eq!(c.as_str().parse::<Criterion>().unwrap(), c);
        }
        assert!("vocabulary".parse::<Criterion>().is_err());
    }

    #[test]
    fn overall_band_rounds_half_to_even() {
        let scores = ScoreSet::new([
            (Criterion::TaskAchievement, 6.0),
            (Criterion::CoherenceCohesion, 6.0),
            (Criterion::LexicalResource, 6.5),
            (Criterion::GrammarAccuracy, 6.5),
        ]);
        assert_eq!(scores.overall_band(), 6.2);

        let scores = ScoreSet::new([
            (Criterion::TaskAchievement, 6.5),
            (Criterion::CoherenceCohesion, 6.5),
            (Criterion::LexicalResource, 7.0),
            (Criterion::GrammarAccuracy, 7.0),
        ]);
        assert_eq!(scores.overall_band(), 6.8);
    }

    #[test]
    fn bands_are_clamped() {
        let scores = ScoreSet::new([
            (Criterion::TaskAchievement, 11.0),
            (Criterion::CoherenceCohesion, -2.0),
        ]);
        assert_eq!(scores.get(Criterion::TaskAchievement), Some(9.0));
        assert_eq!(scores.get(Criterion::CoherenceCohesion), Some(0.0));
        assert_eq!(scores.overall_band(), 4.5);
    }

    #[test]
    fn snapping_to_half_bands() {
        assert_eq!(snap_half_band(6.3), 6.5);
        assert_eq!(snap_half_band(6.2), 6.0);
        assert_eq!(snap_half_band(6.25), 6.5);
        assert_eq!(snap_half_band(9.4), 9.0);

        let scores = ScoreSet::new([
            (Criterion::FluencyCoherence, 6.3),
            (Criterion::Pronunciation, 7.1),
        ])
        .snapped_to_half_bands();
        assert_eq!(scores.get(Criterion::FluencyCoherence), Some(6.5));
        assert_eq!(scores.get(Criterion::Pronunciation), Some(7.0));
        assert_eq!(scores.overall_band(), 6.8);
    }

    #[test]
    fn weakest_prefers_first_on_ties() {
        let scores = ScoreSet::new([
            (Criterion::TaskAchievement, 6.5),
            (Criterion::CoherenceCohesion, 5.5),
            (Criterion::LexicalResource, 5.5),
            (Criterion::GrammarAccuracy, 7.0),
        ]);
        assert_eq!(
            scores.weakest(),
            Some((Criterion::CoherenceCohesion, 5.5))
        );
    }

    #[test]
    fn work_type_inferred_from_criteria() {
        assert_eq!(ScoreSet::uniform(WorkType::Speaking, 6.0).work_type(), WorkType::Speaking);
        assert_eq!(ScoreSet::uniform(WorkType::Essay, 6.0).work_type(), WorkType::Essay);
        assert!(ScoreSet::uniform(WorkType::Speaking, 6.0).covers(WorkType::Speaking));
        assert!(!ScoreSet::uniform(WorkType::Speaking, 6.0).covers(WorkType::Essay));
    }

    #[test]
    fn score_set_json_keeps_criterion_order() {
        let scores = ScoreSet::uniform(WorkType::Speaking, 6.0);
        let json = serde_json::to_string(&scores).unwrap();
        assert_eq!(
            json,
            r#"{"fluency_coherence":6.0,"lexical_resource":6.0,"grammatical_range":6.0,"pronunciation":6.0,"overall_band":6.0}"#
        );
    }

    #[test]
    fn deserialize_recomputes_overall_band() {
        let json = r#"{"task_achievement":6,"coherence_cohesion":7.0,"lexical_resource":6.0,"grammar_accuracy":6.5,"overall_band":9.0}"#;
        let scores: ScoreSet = serde_json::from_str(json).unwrap();
        assert_eq!(scores.overall_band(), 6.4);
        assert_eq!(
            scores.iter().map(|(c, _)| c).collect::<Vec<_>>(),
            WorkType::Essay.criteria().to_vec()
        );
    }

    #[test]
    fn deserialize_rejects_unknown_criterion() {
        let json = r#"{"vocabulary":6.0}"#;
        assert!(serde_json::from_str::<ScoreSet>(json).is_err());
    }
}
