//! Word lists and grammar patterns used by feature extraction.
//!
//! Tables are immutable once built and shared through `Arc`, so any number
//! of concurrent evaluations can read them. Tests and deployments that want
//! different vocabulary build their own `LexiconTables` and inject it.

use std::path::Path;
use std::sync::{Arc, OnceLock};

use anyhow::{Context, Result};
use regex::Regex;
use serde::Deserialize;

const ACADEMIC_TERMS: &[&str] = &[
    "analyze",
    "evaluate",
    "demonstrate",
    "illustrate",
    "significant",
    "substantial",
    "comprehensive",
    "investigate",
    "perspective",
    "phenomenon",
    "establish",
    "framework",
    "hypothesis",
    "methodology",
];

const TRANSITION_TERMS: &[&str] = &[
    "firstly",
    "secondly",
    "finally",
    "however",
    "moreover",
    "furthermore",
    "therefore",
    "consequently",
    "nevertheless",
    "in addition",
    "in conclusion",
    "on the other hand",
];

const EXEMPLIFICATION_PHRASES: &[&str] = &["for example", "for instance", "such as", "including"];

const THESIS_MARKERS: &[&str] = &["i believe", "in my opinion", "this essay will", "my view"];

const FILLER_TERMS: &[&str] = &["um", "uh", "like", "you know"];

const COMPLEX_PATTERNS: &[(&str, &str)] = &[
    (
        "connective_adverb",
        r"(?i)\b(although|however|nevertheless|furthermore|moreover|consequently)\b",
    ),
    ("relative_clause", r"(?i)\b(which|who|that|where|when)\b.*,"),
    ("conditional_clause", r"(?i)\b(if|unless|provided|assuming)\b.*,"),
    ("causal_connective", r"(?i)\b(because|since|as|due to|owing to)\b"),
];

/// A named grammar-pattern category.
#[derive(Debug, Clone)]
pub struct GrammarPattern {
    pub name: String,
    pub regex: Regex,
}

impl GrammarPattern {
    pub fn new(name: &str, pattern: &str) -> Result<Self> {
        let regex = Regex::new(pattern)
            .with_context(|| format!("invalid grammar pattern '{name}': {pattern}"))?;
        Ok(Self {
            name: name.to_string(),
            regex,
        })
    }
}

/// Compiled whole-word matcher for a filler term.
#[derive(Debug, Clone)]
struct FillerMatcher {
    term: String,
    regex: Regex,
}

/// The fixed vocabulary, phrase and pattern tables.
///
/// All terms are stored lowercase; matching is case-insensitive.
#[derive(Debug, Clone)]
pub struct LexiconTables {
    academic_terms: Vec<String>,
    transition_terms: Vec<String>,
    exemplification_phrases: Vec<String>,
    thesis_markers: Vec<String>,
    fillers: Vec<FillerMatcher>,
    complex_patterns: Vec<GrammarPattern>,
}

static SHARED: OnceLock<Arc<LexiconTables>> = OnceLock::new();

impl Default for LexiconTables {
    fn default() -> Self {
        Self::builder()
            .build()
            .expect("built-in lexicon patterns are valid")
    }
}

impl LexiconTables {
    /// Start from the built-in tables and replace individual lists.
    pub fn builder() -> LexiconBuilder {
        LexiconBuilder::default()
    }

    /// The built-in tables, compiled once per process.
    pub fn shared() -> Arc<LexiconTables> {
        Arc::clone(SHARED.get_or_init(|| Arc::new(LexiconTables::default())))
    }

    /// Parse replacement tables from TOML. Omitted lists keep their defaults.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: TomlLexicon = toml::from_str(content).context("failed to parse lexicon TOML")?;

        let mut builder = Self::builder();
        if let Some(terms) = file.academic_terms {
            builder = builder.academic_terms(terms);
        }
        if let Some(terms) = file.transition_terms {
            builder = builder.transition_terms(terms);
        }
        if let Some(phrases) = file.exemplification_phrases {
            builder = builder.exemplification_phrases(phrases);
        }
        if let Some(markers) = file.thesis_markers {
            builder = builder.thesis_markers(markers);
        }
        if let Some(terms) = file.filler_terms {
            builder = builder.filler_terms(terms);
        }
        if let Some(patterns) = file.complex_patterns {
            builder = builder.complex_patterns(
                patterns
                    .into_iter()
                    .map(|p| (p.name, p.pattern))
                    .collect(),
            );
        }
        builder.build()
    }

    /// Load replacement tables from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read lexicon file: {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("invalid lexicon file: {}", path.display()))
    }

    pub fn academic_terms(&self) -> &[String] {
        &self.academic_terms
    }

    pub fn transition_terms(&self) -> &[String] {
        &self.transition_terms
    }

    pub fn complex_patterns(&self) -> &[GrammarPattern] {
        &self.complex_patterns
    }

    /// Number of academic terms present in `lowered` (already lowercase).
    pub fn count_academic(&self, lowered: &str) -> usize {
        count_present(&self.academic_terms, lowered)
    }

    /// Number of transition terms present in `lowered` (already lowercase).
    pub fn count_transitions(&self, lowered: &str) -> usize {
        count_present(&self.transition_terms, lowered)
    }

    pub fn has_exemplification(&self, lowered: &str) -> bool {
        count_present(&self.exemplification_phrases, lowered) > 0
    }

    pub fn has_thesis_marker(&self, lowered: &str) -> bool {
        count_present(&self.thesis_markers, lowered) > 0
    }

    /// Total filler occurrences, matched as whole words or phrases.
    pub fn count_fillers(&self, content: &str) -> usize {
        self.fillers
            .iter()
            .map(|f| f.regex.find_iter(content).count())
            .sum()
    }

    /// Sum of matches over every grammar-pattern category.
    pub fn count_complex_patterns(&self, content: &str) -> usize {
        self.complex_patterns
            .iter()
            .map(|p| p.regex.find_iter(content).count())
            .sum()
    }

    pub fn filler_terms(&self) -> impl Iterator<Item = &str> {
        self.fillers.iter().map(|f| f.term.as_str())
    }
}

fn count_present(terms: &[String], lowered: &str) -> usize {
    terms.iter().filter(|t| lowered.contains(t.as_str())).count()
}

fn lowercase_all(terms: Vec<String>) -> Vec<String> {
    terms
        .into_iter()
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .collect()
}

fn owned(terms: &[&str]) -> Vec<String> {
    terms.iter().map(|t| t.to_string()).collect()
}

/// Builder over the built-in tables.
#[derive(Debug, Clone)]
pub struct LexiconBuilder {
    academic_terms: Vec<String>,
    transition_terms: Vec<String>,
    exemplification_phrases: Vec<String>,
    thesis_markers: Vec<String>,
    filler_terms: Vec<String>,
    complex_patterns: Vec<(String, String)>,
}

impl Default for LexiconBuilder {
    fn default() -> Self {
        Self {
            academic_terms: owned(ACADEMIC_TERMS),
            transition_terms: owned(TRANSITION_TERMS),
            exemplification_phrases: owned(EXEMPLIFICATION_PHRASES),
            thesis_markers: owned(THESIS_MARKERS),
            filler_terms: owned(FILLER_TERMS),
            complex_patterns: COMPLEX_PATTERNS
                .iter()
                .map(|(name, pattern)| (name.to_string(), pattern.to_string()))
                .collect(),
        }
    }
}

impl LexiconBuilder {
    pub fn academic_terms(mut self, terms: Vec<String>) -> Self {
        self.academic_terms = terms;
        self
    }

    pub fn transition_terms(mut self, terms: Vec<String>) -> Self {
        self.transition_terms = terms;
        self
    }

    pub fn exemplification_phrases(mut self, phrases: Vec<String>) -> Self {
        self.exemplification_phrases = phrases;
        self
    }

    pub fn thesis_markers(mut self, markers: Vec<String>) -> Self {
        self.thesis_markers = markers;
        self
    }

    pub fn filler_terms(mut self, terms: Vec<String>) -> Self {
        self.filler_terms = terms;
        self
    }

    /// `(name, regex)` pairs; patterns should carry their own `(?i)` flag.
    pub fn complex_patterns(mut self, patterns: Vec<(String, String)>) -> Self {
        self.complex_patterns = patterns;
        self
    }

    pub fn build(self) -> Result<LexiconTables> {
        let fillers = lowercase_all(self.filler_terms)
            .into_iter()
            .map(|term| {
                let pattern = format!(r"(?i)\b{}\b", regex::escape(&term));
                let regex = Regex::new(&pattern)
                    .with_context(|| format!("invalid filler term: {term}"))?;
                Ok(FillerMatcher { term, regex })
            })
            .collect::<Result<Vec<_>>>()?;

        let complex_patterns = self
            .complex_patterns
            .iter()
            .map(|(name, pattern)| GrammarPattern::new(name, pattern))
            .collect::<Result<Vec<_>>>()?;

        Ok(LexiconTables {
            academic_terms: lowercase_all(self.academic_terms),
            transition_terms: lowercase_all(self.transition_terms),
            exemplification_phrases: lowercase_all(self.exemplification_phrases),
            thesis_markers: lowercase_all(self.thesis_markers),
            fillers,
            complex_patterns,
        })
    }
}

#[derive(Debug, Deserialize)]
struct TomlLexicon {
    #[serde(default)]
    academic_terms: Option<Vec<String>>,
    #[serde(default)]
    transition_terms: Option<Vec<String>>,
    #[serde(default)]
    exemplification_phrases: Option<Vec<String>>,
    #[serde(default)]
    thesis_markers: Option<Vec<String>>,
    #[serde(default)]
    filler_terms: Option<Vec<String>>,
    #[serde(default)]
    complex_patterns: Option<Vec<TomlPattern>>,
}

#[derive(Debug, Deserialize)]
struct TomlPattern {
    name: String,
    pattern: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_table_sizes() {
        let tables = LexiconTables::default();
        assert_eq!(tables.academic_terms().len(), 14);
        assert_eq!(tables.transition_terms().len(), 12);
        assert_eq!(tables.complex_patterns().len(), 4);
        assert_eq!(tables.filler_terms().count(), 4);
    }

    #[test]
    fn shared_tables_are_reused() {
        let a = LexiconTables::shared();
        let b = LexiconTables::shared();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn academic_terms_match_as_substrings() {
        let tables = LexiconTables::default();
        let text = "we analyzed the data to establish a framework";
        assert_eq!(tables.count_academic(text), 3);
    }

    #[test]
    fn each_term_counts_once() {
        let tables = LexiconTables::default();
        assert_eq!(tables.count_transitions("however, however, however"), 1);
    }

    #[test]
    fn fillers_match_whole_words_only() {
        let tables = LexiconTables::default();
        assert_eq!(tables.count_fillers("Um, I like it, you know, uh"), 4);
        // "umbrella" and "likely" are not fillers
        assert_eq!(tables.count_fillers("an umbrella is likely useful"), 0);
    }

    #[test]
    fn complex_patterns_sum_across_categories() {
        let tables = LexiconTables::default();
        // connective: however; causal: because
        assert_eq!(tables.count_complex_patterns("However it failed because it rained"), 2);
    }

    #[test]
    fn toml_overrides_only_listed_tables() {
        let toml = r#"
academic_terms = ["Paradigm", "empirical"]

[[complex_patterns]]
name = "passive"
pattern = '(?i)\b(was|were)\s+\w+ed\b'
"#;
        let tables = LexiconTables::from_toml_str(toml).unwrap();
        assert_eq!(tables.academic_terms(), ["paradigm", "empirical"]);
        assert_eq!(tables.transition_terms().len(), 12);
        assert_eq!(tables.count_complex_patterns("It was tested."), 1);
    }

    #[test]
    fn invalid_pattern_is_an_error() {
        let toml = r#"
[[complex_patterns]]
name = "broken"
pattern = "(unclosed"
"#;
        let err = LexiconTables::from_toml_str(toml).unwrap_err();
        assert!(format!("{err:#}").contains("broken"));
    }
}
