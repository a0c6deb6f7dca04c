//! Surface-feature extraction.

use std::collections::HashSet;
use std::sync::{Arc, OnceLock};

use regex::Regex;

use crate::lexicon::LexiconTables;
use crate::model::FeatureSet;

fn sentence_breaks() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[.!?]+").expect("valid regex"))
}

/// Computes a [`FeatureSet`] from raw text using injected lexicon tables.
#[derive(Debug, Clone)]
pub struct FeatureExtractor {
    lexicon: Arc<LexiconTables>,
}

impl Default for FeatureExtractor {
    fn default() -> Self {
        Self::new(LexiconTables::shared())
    }
}

impl FeatureExtractor {
    pub fn new(lexicon: Arc<LexiconTables>) -> Self {
        Self { lexicon }
    }

    pub fn lexicon(&self) -> &LexiconTables {
        &self.lexicon
    }

    /// Extract features. Total over any input; empty text yields zeros.
    pub fn extract(&self, content: &str) -> FeatureSet {
        let words: Vec<&str> = content.split_whitespace().collect();
        let word_count = words.len();

        let sentence_lengths: Vec<usize> = sentence_breaks()
            .split(content)
            .filter(|s| !s.trim().is_empty())
            .map(|s| s.split_whitespace().count())
            .collect();
        let sentence_count = sentence_lengths.len();

        let sentence_length_spread = match (
            sentence_lengths.iter().max(),
            sentence_lengths.iter().min(),
        ) {
            (Some(max), Some(min)) => max - min,
            _ => 0,
        };

        let (unique_word_ratio, long_word_ratio) = if word_count == 0 {
            (0.0, 0.0)
        } else {
            let unique: HashSet<String> = words.iter().map(|w| w.to_lowercase()).collect();
            let long = words.iter().filter(|w| w.chars().count() > 6).count();
            (
                unique.len() as f64 / word_count as f64,
                long as f64 / word_count as f64,
            )
        };

        let lowered = content.to_lowercase();

        FeatureSet {
            word_count,
            sentence_count,
            unique_word_ratio,
            academic_word_hits: self.lexicon.count_academic(&lowered),
            transition_hits: self.lexicon.count_transitions(&lowered),
            complex_pattern_hits: self.lexicon.count_complex_patterns(content),
            avg_sentence_length: word_count as f64 / sentence_count.max(1) as f64,
            paragraph_count: count_paragraphs(content),
            long_word_ratio,
            sentence_length_spread,
            filler_hits: self.lexicon.count_fillers(content),
            has_comma: content.contains(','),
            has_semicolon: content.contains(';'),
        }
    }
}

/// One more than the number of non-overlapping `"\n\n"` pairs. Whitespace-only
/// lines are not breaks, and any text (even empty) has at least one paragraph.
fn count_paragraphs(content: &str) -> usize {
    content.matches("\n\n").count() + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(text: &str) -> FeatureSet {
        FeatureExtractor::default().extract(text)
    }

    #[test]
    fn empty_text_is_all_zero() {
        let features = extract("");
        assert_eq!(
            features,
            FeatureSet {
                paragraph_count: 1,
                ..FeatureSet::default()
            }
        );

        let features = extract("   \n\n  ");
        assert_eq!(features.word_count, 0);
        assert_eq!(features.paragraph_count, 2);
    }

    #[test]
    fn counts_words_and_sentences() {
        let features = extract("The cat sat. The dog ran away!  Why?");
        assert_eq!(features.word_count, 8);
        assert_eq!(features.sentence_count, 3);
        assert!((features.avg_sentence_length - 8.0 / 3.0).abs() < 1e-9);
        // longest 4, shortest 1
        assert_eq!(features.sentence_length_spread, 3);
    }

    #[test]
    fn runs_of_terminators_split_once() {
        let features = extract("Wait... what?! Really.");
        assert_eq!(features.sentence_count, 3);
    }

    #[test]
    fn unique_ratio_is_case_insensitive() {
        let features = extract("Word word WORD other");
        assert!((features.unique_word_ratio - 0.5).abs() < 1e-9);
    }

    #[test]
    fn long_word_ratio() {
        // "important" and "example" are longer than six characters
        let features = extract("an important example here");
        assert!((features.long_word_ratio - 0.5).abs() < 1e-9);
    }

    #[test]
    fn paragraphs_count_double_newlines() {
        let count = |text: &str| extract(text).paragraph_count;

        assert_eq!(count("Single block\nwith a line break."), 1);
        assert_eq!(count("One idea.\n\nTwo idea.\n\nThree idea."), 3);
        // each "\n\n" pair counts, so a double gap is two breaks
        assert_eq!(count("One idea.\n\n\n\nTwo idea.\n\nThree idea."), 4);
        // a line holding only a space is not a break
        assert_eq!(count("One idea.\n \nTwo idea.\n \nThree idea."), 1);
        assert_eq!(count("One idea.\n\nTwo idea.\n\n"), 3);
    }

    #[test]
    fn lexicon_hits() {
        let text = "Firstly, we analyze the framework. However, the hypothesis failed because data was missing.";
        let features = extract(text);
        assert_eq!(features.academic_word_hits, 3);
        assert_eq!(features.transition_hits, 2);
        // however (connective) + because (causal)
        assert_eq!(features.complex_pattern_hits, 2);
        assert!(features.has_comma);
        assert!(!features.has_semicolon);
    }

    #[test]
    fn filler_hits_counted_per_occurrence() {
        let features = extract("Um, I think, um, it was like, you know, fine.");
        assert_eq!(features.filler_hits, 4);
    }

    #[test]
    fn injected_lexicon_is_used() {
        let lexicon = LexiconTables::builder()
            .academic_terms(vec!["paradigm".into()])
            .build()
            .unwrap();
        let extractor = FeatureExtractor::new(Arc::new(lexicon));
        let features = extractor.extract("A new paradigm to analyze.");
        assert_eq!(features.academic_word_hits, 1);
    }

    #[test]
    fn deterministic() {
        let text = "Moreover, the results, which were significant, demonstrate a trend.";
        assert_eq!(extract(text), extract(text));
    }
}
