//! TOML sample set parser.
//!
//! Loads sample sets from TOML files and directories, and validates them.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::model::{SampleCase, SampleSet, WorkType, MAX_BAND, MIN_BAND};

/// Intermediate TOML structure for parsing sample set files.
#[derive(Debug, Deserialize)]
struct TomlSampleFile {
    sample_set: TomlSampleSetHeader,
    #[serde(default)]
    samples: Vec<TomlSample>,
}

#[derive(Debug, Deserialize)]
struct TomlSampleSetHeader {
    id: String,
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default = "default_work_type")]
    default_work_type: String,
    #[serde(default = "default_task_type")]
    default_task_type: String,
}

fn default_work_type() -> String {
    "essay".to_string()
}

fn default_task_type() -> String {
    "task2".to_string()
}

#[derive(Debug, Deserialize)]
struct TomlSample {
    id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    content: Option<String>,
    /// Path to a text file, relative to the sample set file.
    #[serde(default)]
    content_file: Option<String>,
    #[serde(default)]
    work_type: Option<String>,
    #[serde(default)]
    task_type: Option<String>,
    #[serde(default)]
    word_count: Option<u32>,
    #[serde(default)]
    expected_band: Option<f64>,
    #[serde(default)]
    tags: Vec<String>,
}

/// Parse a single TOML file into a `SampleSet`.
pub fn parse_sample_set(path: &Path) -> Result<SampleSet> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read sample set file: {}", path.display()))?;

    parse_sample_set_str(&content, path)
}

/// Parse a TOML string into a `SampleSet`. `content_file` entries resolve
/// against the directory of `source_path`.
pub fn parse_sample_set_str(content: &str, source_path: &Path) -> Result<SampleSet> {
    let parsed: TomlSampleFile = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;

    let base_dir = source_path.parent().unwrap_or_else(|| Path::new("."));

    let samples = parsed
        .samples
        .into_iter()
        .map(|s| {
            let content = match (s.content, s.content_file) {
                (Some(text), None) => text,
                (None, Some(file)) => {
                    let path = base_dir.join(&file);
                    std::fs::read_to_string(&path).with_context(|| {
                        format!("sample '{}': failed to read {}", s.id, path.display())
                    })?
                }
                (Some(_), Some(_)) => {
                    anyhow::bail!("sample '{}': set either content or content_file, not both", s.id)
                }
                (None, None) => anyhow::bail!("sample '{}': missing content", s.id),
            };

            Ok(SampleCase {
                name: s.name.unwrap_or_else(|| s.id.clone()),
                id: s.id,
                content,
                work_type: s.work_type,
                task_type: s.task_type,
                declared_word_count: s.word_count,
                expected_band: s.expected_band,
                tags: s.tags,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(SampleSet {
        id: parsed.sample_set.id,
        name: parsed.sample_set.name,
        description: parsed.sample_set.description,
        samples,
        default_work_type: parsed.sample_set.default_work_type,
        default_task_type: parsed.sample_set.default_task_type,
    })
}

/// Recursively load all `.toml` sample set files from a directory.
pub fn load_sample_directory(dir: &Path) -> Result<Vec<SampleSet>> {
    let mut sets = Vec::new();

    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    let mut entries = std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
        .collect::<std::io::Result<Vec<_>>>()?;
    entries.sort_by_key(|e| e.path());

    for entry in entries {
        let path = entry.path();

        if path.is_dir() {
            sets.extend(load_sample_directory(&path)?);
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            match parse_sample_set(&path) {
                Ok(set) => sets.push(set),
                Err(e) => {
                    tracing::warn!("skipping {}: {:#}", path.display(), e);
                }
            }
        }
    }

    Ok(sets)
}

/// Load a single file or every set under a directory.
pub fn load_samples(path: &Path) -> Result<Vec<SampleSet>> {
    if path.is_dir() {
        load_sample_directory(path)
    } else {
        Ok(vec![parse_sample_set(path)?])
    }
}

/// A warning from sample set validation.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// The sample ID (if applicable).
    pub sample_id: Option<String>,
    /// Warning message.
    pub message: String,
}

/// Declared counts further than this fraction from the actual count are flagged.
const WORD_COUNT_TOLERANCE: f64 = 0.2;

/// Validate a sample set for common issues.
pub fn validate_sample_set(set: &SampleSet) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    if set.default_work_type.parse::<WorkType>().is_err() {
        warnings.push(ValidationWarning {
            sample_id: None,
            message: format!(
                "unknown default work type '{}', samples will use the general pipeline",
                set.default_work_type
            ),
        });
    }

    // Check for duplicate sample IDs
    let mut seen_ids = std::collections::HashSet::new();
    for sample in &set.samples {
        if !seen_ids.insert(&sample.id) {
            warnings.push(ValidationWarning {
                sample_id: Some(sample.id.clone()),
                message: format!("duplicate sample ID: {}", sample.id),
            });
        }
    }

    for sample in &set.samples {
        let warn = |message: String| ValidationWarning {
            sample_id: Some(sample.id.clone()),
            message,
        };

        if sample.content.trim().is_empty() {
            warnings.push(warn("content is empty".into()));
        }

        if let Some(label) = &sample.work_type {
            if label.parse::<WorkType>().is_err() {
                warnings.push(warn(format!(
                    "unknown work type '{label}', will use the general pipeline"
                )));
            }
        }

        if let Some(declared) = sample.declared_word_count {
            let actual = sample.content.split_whitespace().count();
            let drift = (declared as f64 - actual as f64).abs();
            if declared > 0 && drift > actual.max(1) as f64 * WORD_COUNT_TOLERANCE {
                warnings.push(warn(format!(
                    "declared word count {declared} differs from actual {actual}"
                )));
            }
        }

        if let Some(band) = sample.expected_band {
            if !(MIN_BAND..=MAX_BAND).contains(&band) {
                warnings.push(warn(format!("expected band {band} is outside 0-9")));
            }
        }
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const VALID_TOML: &str = r#"
[sample_set]
id = "writing-week-1"
name = "Writing Week 1"
description = "First week essays"
default_work_type = "essay"
default_task_type = "task2"

[[samples]]
id = "education"
name = "Education essay"
content = """
In my opinion, education is the foundation of a fair society.

For example, free schooling lets every child develop their talents.
"""
expected_band = 6.0
tags = ["opinion"]

[[samples]]
id = "interview"
work_type = "speaking"
content = "Well, I live in a small town near the coast."
"#;

    #[test]
    fn parse_valid_toml() {
        let set = parse_sample_set_str(VALID_TOML, &PathBuf::from("test.toml")).unwrap();
        assert_eq!(set.id, "writing-week-1");
        assert_eq!(set.samples.len(), 2);
        assert_eq!(set.samples[0].expected_band, Some(6.0));
        assert_eq!(set.samples[1].name, "interview");
        assert_eq!(set.work_sample(&set.samples[1]).work_type, WorkType::Speaking);
    }

    #[test]
    fn parse_missing_optional_fields() {
        let toml = r#"
[sample_set]
id = "minimal"
name = "Minimal"

[[samples]]
id = "one"
content = "A short essay."
"#;
        let set = parse_sample_set_str(toml, &PathBuf::from("test.toml")).unwrap();
        assert_eq!(set.default_work_type, "essay");
        assert_eq!(set.default_task_type, "task2");
        assert!(set.samples[0].tags.is_empty());
        assert!(validate_sample_set(&set).is_empty());
    }

    #[test]
    fn content_file_is_read_relative_to_set() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("essay.txt"), "Essay from a file.").unwrap();
        let toml = r#"
[sample_set]
id = "files"
name = "Files"

[[samples]]
id = "from-file"
content_file = "essay.txt"
"#;
        let set = parse_sample_set_str(toml, &dir.path().join("set.toml")).unwrap();
        assert_eq!(set.samples[0].content, "Essay from a file.");
    }

    #[test]
    fn missing_content_is_an_error() {
        let toml = r#"
[sample_set]
id = "bad"
name = "Bad"

[[samples]]
id = "nothing"
"#;
        let err = parse_sample_set_str(toml, &PathBuf::from("test.toml")).unwrap_err();
        assert!(err.to_string().contains("missing content"));
    }

    #[test]
    fn validate_duplicate_ids() {
        let toml = r#"
[sample_set]
id = "dupes"
name = "Dupes"

[[samples]]
id = "same"
content = "First."

[[samples]]
id = "same"
content = "Second."
"#;
        let set = parse_sample_set_str(toml, &PathBuf::from("test.toml")).unwrap();
        let warnings = validate_sample_set(&set);
        assert!(warnings.iter().any(|w| w.message.contains("duplicate")));
    }

    #[test]
    fn validate_content_labels_and_counts() {
        let toml = r#"
[sample_set]
id = "issues"
name = "Issues"

[[samples]]
id = "blank"
content = "   "

[[samples]]
id = "poem"
work_type = "poem"
content = "Roses are red."

[[samples]]
id = "inflated"
content = "Only five words are here."
word_count = 250

[[samples]]
id = "off-scale"
content = "Fine."
expected_band = 10.5
"#;
        let set = parse_sample_set_str(toml, &PathBuf::from("test.toml")).unwrap();
        let warnings = validate_sample_set(&set);
        let for_id = |id: &str| {
            warnings
                .iter()
                .filter(|w| w.sample_id.as_deref() == Some(id))
                .count()
        };
        assert_eq!(for_id("blank"), 1);
        assert_eq!(for_id("poem"), 1);
        assert_eq!(for_id("inflated"), 1);
        assert_eq!(for_id("off-scale"), 1);
    }

    #[test]
    fn parse_malformed_toml() {
        let bad = "this is not [valid toml }{";
        let result = parse_sample_set_str(bad, &PathBuf::from("bad.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn load_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.toml"), VALID_TOML).unwrap();
        std::fs::write(dir.path().join("broken.toml"), "not toml {").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let sets = load_sample_directory(dir.path()).unwrap();
        assert_eq!(sets.len(), 1);
        assert_eq!(sets[0].id, "writing-week-1");

        let single = load_samples(&dir.path().join("a.toml")).unwrap();
        assert_eq!(single.len(), 1);
    }
}
