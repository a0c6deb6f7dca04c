//! Improvement-course generation.
//!
//! A course targets the weakest criterion. Week themes, goals and
//! activities cycle through that skill's track in the [`CourseCatalog`];
//! milestones sit on even weeks with linearly interpolated target bands.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::model::{
    round_band, Criterion, DailyActivity, ImprovementCourse, Milestone, ScoreSet, WeekPlan,
    WorkType, MAX_BAND,
};

/// Tunable numbers behind course length and targets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CourseSettings {
    /// Band gain a course aims for.
    pub target_gain: f64,
    pub min_weeks: u32,
    /// Weeks of study per band of improvement.
    pub weeks_per_band: f64,
    /// Speaking courses run a fixed length regardless of the gap.
    pub speaking_weeks: u32,
}

impl Default for CourseSettings {
    fn default() -> Self {
        Self {
            target_gain: 0.5,
            min_weeks: 4,
            weeks_per_band: 8.0,
            speaking_weeks: 6,
        }
    }
}

/// Study material for one criterion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillTrack {
    /// Cycled by week.
    pub themes: Vec<String>,
    /// Cycled by week, parallel to `themes`.
    pub weekly_goals: Vec<Vec<String>>,
    /// Cycled by week, parallel to `themes`.
    pub weekly_activities: Vec<Vec<String>>,
    pub resources: Vec<String>,
    pub daily_activities: Vec<DailyActivity>,
}

impl SkillTrack {
    fn week_entry<T: Clone + Default>(items: &[T], week: u32) -> T {
        if items.is_empty() {
            return T::default();
        }
        items[(week as usize - 1) % items.len()].clone()
    }
}

/// Per-criterion course material.
#[derive(Debug, Clone, PartialEq)]
pub struct CourseCatalog {
    tracks: BTreeMap<Criterion, SkillTrack>,
}

impl Default for CourseCatalog {
    fn default() -> Self {
        let tracks = Criterion::ALL
            .into_iter()
            .map(|c| (c, builtin_track(c)))
            .collect();
        Self { tracks }
    }
}

impl CourseCatalog {
    /// Replace the track for one criterion.
    pub fn with_track(mut self, criterion: Criterion, track: SkillTrack) -> Self {
        self.tracks.insert(criterion, track);
        self
    }

    pub fn track(&self, criterion: Criterion) -> Option<&SkillTrack> {
        self.tracks.get(&criterion)
    }
}

/// Builds an [`ImprovementCourse`] from a score set.
#[derive(Debug, Clone, Default)]
pub struct CourseGenerator {
    catalog: CourseCatalog,
    settings: CourseSettings,
}

impl CourseGenerator {
    pub fn new(catalog: CourseCatalog, settings: CourseSettings) -> Self {
        Self { catalog, settings }
    }

    pub fn settings(&self) -> &CourseSettings {
        &self.settings
    }

    /// Generate a course. Deterministic in `scores` and `weaknesses`.
    ///
    /// The target level is `overall_band + target_gain` (0.5 by default),
    /// capped at [`MAX_BAND`]: a 9.0 overall gets a 9.0 target, not 9.5.
    /// Essay courses then run `max(min_weeks, floor(weeks_per_band × gap))`
    /// weeks, so a capped target falls back to the minimum length.
    pub fn generate_course(&self, scores: &ScoreSet, weaknesses: &[String]) -> ImprovementCourse {
        let primary_focus = scores
            .weakest()
            .map_or(Criterion::TaskAchievement, |(criterion, _)| criterion);
        let current_level = scores.overall_band();
        let target_level = round_band((current_level + self.settings.target_gain).min(MAX_BAND));

        let duration_weeks = if scores.work_type() == WorkType::Speaking {
            debug!(weeks = self.settings.speaking_weeks, "fixed-length speaking course");
            self.settings.speaking_weeks
        } else {
            self.essay_weeks(current_level, target_level)
        };

        let empty = SkillTrack {
            themes: Vec::new(),
            weekly_goals: Vec::new(),
            weekly_activities: Vec::new(),
            resources: Vec::new(),
            daily_activities: Vec::new(),
        };
        let track = self.catalog.track(primary_focus).unwrap_or(&empty);

        let weekly_plan = (1..=duration_weeks)
            .map(|week| WeekPlan {
                week_number: week,
                focus_theme: SkillTrack::week_entry(&track.themes, week),
                goals: SkillTrack::week_entry(&track.weekly_goals, week),
                activities: SkillTrack::week_entry(&track.weekly_activities, week),
            })
            .collect();

        let milestones = milestones(primary_focus, current_level, target_level, duration_weeks);

        debug!(
            focus = %primary_focus,
            current_level,
            target_level,
            duration_weeks,
            "generated course"
        );

        ImprovementCourse {
            title: format!(
                "{} Improvement Course: {current_level:.1} to {target_level:.1}",
                primary_focus.label()
            ),
            current_level,
            target_level,
            duration_weeks,
            primary_focus,
            weekly_plan,
            daily_activities: track.daily_activities.clone(),
            milestones,
            resources: track.resources.clone(),
            addressed_weaknesses: weaknesses.to_vec(),
        }
    }

    fn essay_weeks(&self, current: f64, target: f64) -> u32 {
        // epsilon absorbs binary error in the band difference
        let weeks = ((target - current) * self.settings.weeks_per_band + 1e-9).floor();
        (weeks.max(0.0) as u32).max(self.settings.min_weeks)
    }
}

fn round_hundredths(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn milestones(focus: Criterion, current: f64, target: f64, weeks: u32) -> Vec<Milestone> {
    let count = weeks / 2;
    if count == 0 {
        return Vec::new();
    }
    let step = (target - current) / count as f64;

    (1..=count)
        .map(|k| {
            let target_band = round_hundredths(current + k as f64 * step);
            Milestone {
                week: k * 2,
                target_band,
                success_criteria: vec![
                    format!("Achieve {target_band:.2}+ overall"),
                    "Complete a timed practice test".to_string(),
                    format!("Show measurable progress in {}", focus.label()),
                ],
            }
        })
        .collect()
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn daily(items: &[(&str, u32)]) -> Vec<DailyActivity> {
    items
        .iter()
        .map(|(activity, duration_minutes)| DailyActivity {
            activity: activity.to_string(),
            duration_minutes: *duration_minutes,
        })
        .collect()
}

struct TrackData {
    themes: [&'static str; 4],
    goals: [[&'static str; 2]; 4],
    activities: [[&'static str; 3]; 4],
    resources: [&'static str; 3],
    daily: [(&'static str, u32); 3],
}

fn builtin_track(criterion: Criterion) -> SkillTrack {
    let data = track_data(criterion);
    SkillTrack {
        themes: strings(&data.themes),
        weekly_goals: data.goals.iter().map(|g| strings(g)).collect(),
        weekly_activities: data.activities.iter().map(|a| strings(a)).collect(),
        resources: strings(&data.resources),
        daily_activities: daily(&data.daily),
    }
}

fn track_data(criterion: Criterion) -> TrackData {
    match criterion {
        Criterion::TaskAchievement => TrackData {
            themes: [
                "Understanding the Question",
                "Developing Main Ideas",
                "Supporting with Examples",
                "Timed Task Practice",
            ],
            goals: [
                ["Identify every part of a task prompt", "Plan answers before writing"],
                ["Write clear topic sentences", "Develop each idea fully"],
                ["Support every point with an example", "State a clear position"],
                ["Complete full tasks within time", "Meet the word count every time"],
            ],
            activities: [
                ["Prompt analysis drills", "Outline five essay plans", "Compare model answers"],
                ["Topic sentence practice", "Paragraph expansion exercises", "Peer review"],
                ["Example brainstorming", "Thesis statement rewriting", "Argument mapping"],
                ["Timed Task 2 essay", "Timed Task 1 report", "Self-assessment against band descriptors"],
            ],
            resources: [
                "Official IELTS Practice Materials",
                "Cambridge IELTS Writing Task Collection",
                "Band descriptor guide for Task Achievement",
            ],
            daily: [
                ("Analyze one essay prompt", 10),
                ("Write one developed paragraph", 20),
                ("Review a model answer", 15),
            ],
        },
        Criterion::CoherenceCohesion => TrackData {
            themes: [
                "Paragraph Structure",
                "Linking Words and Transitions",
                "Referencing and Substitution",
                "Logical Progression",
            ],
            goals: [
                ["Use one central idea per paragraph", "Write four-paragraph essays"],
                ["Use transitions accurately", "Vary linking expressions"],
                ["Avoid needless repetition", "Use pronouns and synonyms for reference"],
                ["Order ideas logically", "Write strong introductions and conclusions"],
            ],
            activities: [
                ["Paragraph reordering exercises", "Essay skeleton writing", "Model essay analysis"],
                ["Transition gap-fill exercises", "Rewrite essays with linkers", "Linking word flashcards"],
                ["Reference chain tracking", "Synonym substitution drills", "Editing for repetition"],
                ["Idea sequencing practice", "Introduction and conclusion writing", "Timed essay"],
            ],
            resources: [
                "Academic Writing Linking Words Guide",
                "Official IELTS Practice Materials",
                "Cohesion in English reference sheet",
            ],
            daily: [
                ("Practice five transition sentences", 10),
                ("Outline one essay structure", 15),
                ("Edit a paragraph for flow", 15),
            ],
        },
        Criterion::LexicalResource => TrackData {
            themes: [
                "Academic Word List",
                "Collocations",
                "Paraphrasing",
                "Precision and Style",
            ],
            goals: [
                ["Learn 50 academic words", "Use new words in context"],
                ["Learn common topic collocations", "Avoid unnatural word combinations"],
                ["Paraphrase prompts accurately", "Reduce word repetition"],
                ["Choose precise vocabulary", "Keep an academic register"],
            ],
            activities: [
                ["Academic word list study", "Vocabulary notebook entries", "Word family exercises"],
                ["Collocation matching", "Topic vocabulary mind maps", "Reading for collocations"],
                ["Prompt paraphrasing drills", "Synonym practice", "Rewrite sentences two ways"],
                ["Register correction exercises", "Precise word choice drills", "Timed essay"],
            ],
            resources: [
                "Academic Word List",
                "Oxford Collocations Dictionary",
                "Vocabulary for IELTS",
            ],
            daily: [
                ("Learn ten new words", 15),
                ("Write sentences with new vocabulary", 15),
                ("Read an academic article", 20),
            ],
        },
        Criterion::GrammarAccuracy => TrackData {
            themes: [
                "Sentence Fundamentals",
                "Complex Sentences",
                "Conditionals and Relative Clauses",
                "Error Correction",
            ],
            goals: [
                ["Eliminate subject-verb agreement errors", "Use tenses consistently"],
                ["Combine clauses with subordinators", "Vary sentence length"],
                ["Use conditionals correctly", "Write relative clauses with correct punctuation"],
                ["Find and fix your common errors", "Punctuate complex sentences correctly"],
            ],
            activities: [
                ["Tense review exercises", "Agreement drills", "Sentence correction"],
                ["Sentence combining practice", "Subordinate clause exercises", "Model essay analysis"],
                ["Conditional transformation drills", "Relative clause writing", "Punctuation practice"],
                ["Error log review", "Proofreading practice", "Timed essay"],
            ],
            resources: [
                "English Grammar in Use",
                "Grammar for IELTS",
                "Official IELTS Practice Materials",
            ],
            daily: [
                ("Complete one grammar exercise set", 15),
                ("Write five complex sentences", 10),
                ("Proofread yesterday's writing", 10),
            ],
        },
        Criterion::FluencyCoherence => TrackData {
            themes: [
                "Speaking at Length",
                "Organizing Spoken Answers",
                "Reducing Hesitation",
                "Mock Interviews",
            ],
            goals: [
                ["Speak for two minutes on a topic", "Extend Part 1 answers"],
                ["Structure Part 2 answers", "Use spoken discourse markers"],
                ["Reduce filler words", "Paraphrase instead of pausing"],
                ["Complete full mock interviews", "Sustain fluency in Part 3"],
            ],
            activities: [
                ["Part 1 question practice", "Two-minute talks", "Recording and playback"],
                ["Cue card planning", "Discourse marker drills", "Part 2 practice"],
                ["Filler word awareness drills", "Shadowing exercises", "Paraphrase practice"],
                ["Full mock interview", "Part 3 discussion practice", "Self-assessment"],
            ],
            resources: [
                "Official IELTS Speaking Practice Tests",
                "IELTS Speaking cue card collection",
                "Podcast listening list for shadowing",
            ],
            daily: [
                ("Answer three Part 1 questions aloud", 10),
                ("Prepare and deliver a cue card talk", 15),
                ("Shadow a native speaker recording", 10),
            ],
        },
        Criterion::GrammaticalRange => TrackData {
            themes: [
                "Accurate Spoken Tenses",
                "Complex Spoken Structures",
                "Conditionals in Speech",
                "Mixed Structure Practice",
            ],
            goals: [
                ["Use past and perfect tenses accurately", "Self-correct tense slips"],
                ["Use relative clauses when speaking", "Link ideas with subordinators"],
                ["Speculate with conditionals", "Express opinions with modal verbs"],
                ["Mix simple and complex sentences", "Keep accuracy under time pressure"],
            ],
            activities: [
                ["Tense storytelling practice", "Recording review", "Correction drills"],
                ["Relative clause speaking drills", "Sentence expansion games", "Part 2 practice"],
                ["Hypothetical question practice", "Modal verb drills", "Part 3 practice"],
                ["Full mock interview", "Structure variety review", "Self-assessment"],
            ],
            resources: [
                "English Grammar in Use",
                "Official IELTS Speaking Practice Tests",
                "Grammar for IELTS",
            ],
            daily: [
                ("Describe your day using three tenses", 10),
                ("Answer one Part 3 question with conditionals", 10),
                ("Review a recorded answer for errors", 15),
            ],
        },
        Criterion::Pronunciation => TrackData {
            themes: [
                "Individual Sounds",
                "Word Stress",
                "Sentence Stress and Rhythm",
                "Intonation",
            ],
            goals: [
                ["Distinguish difficult vowel pairs", "Pronounce final consonants"],
                ["Stress multi-syllable words correctly", "Learn stress patterns of word families"],
                ["Use natural sentence rhythm", "Link words in connected speech"],
                ["Use intonation to show meaning", "Sound natural in longer answers"],
            ],
            activities: [
                ["Minimal pair drills", "Phonetic chart study", "Recording and playback"],
                ["Word stress marking", "Dictionary pronunciation checks", "Repetition drills"],
                ["Shadowing exercises", "Connected speech practice", "Reading aloud"],
                ["Intonation pattern drills", "Full mock interview", "Self-assessment"],
            ],
            resources: [
                "English Pronunciation in Use",
                "Online pronunciation dictionary",
                "Podcast listening list for shadowing",
            ],
            daily: [
                ("Practice minimal pairs", 10),
                ("Shadow a short recording", 10),
                ("Read a paragraph aloud and record it", 10),
            ],
        },
    }
}
