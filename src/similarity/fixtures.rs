//! Cross-language fixture conformance
//!
//! Loads the shared similarity corpus and runs every case through the
//! engine. The same YAML drives the sibling libraries' test suites.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{
    distance, score, substring_match, suggest, Algorithm, JaroWinklerOptions, NormalizationPreset,
    ScoreOptions, SuggestOptions, Suggestion,
};
use crate::assets;
use crate::error::{FulmenError, Result};

const DEFAULT_TOLERANCE: f64 = 1e-6;
const EMBEDDED_CORPUS: &str = "similarity/fixtures.yaml";

/// The fixture corpus document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixtureCorpus {
    #[serde(rename = "$schema", default)]
    pub schema: Option<String>,
    pub version: String,
    #[serde(default)]
    pub description: Option<String>,
    pub test_cases: Vec<FixtureCategory>,
}

/// Cases grouped by algorithm or feature
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixtureCategory {
    pub category: String,
    pub cases: Vec<FixtureCase>,
}

/// A single case. Which fields apply depends on the category.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FixtureCase {
    pub description: Option<String>,
    pub input_a: Option<String>,
    pub input_b: Option<String>,
    pub needle: Option<String>,
    pub haystack: Option<String>,
    pub input: Option<String>,
    pub preset: Option<NormalizationPreset>,
    pub candidates: Vec<String>,
    pub options: Option<Value>,
    pub expected: Option<String>,
    pub expected_distance: Option<usize>,
    pub expected_score: Option<f64>,
    pub expected_range: Option<ExpectedRange>,
    pub expected_suggestions: Option<Vec<Suggestion>>,
    pub tolerance: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpectedRange {
    pub start: usize,
    pub end: usize,
    #[serde(default = "default_true")]
    pub valid: bool,
}

fn default_true() -> bool {
    true
}

/// Outcome of running the corpus
#[derive(Debug, Clone, Default, Serialize)]
pub struct FixtureReport {
    pub version: String,
    pub total: usize,
    pub passed: usize,
    pub failures: Vec<FixtureFailure>,
}

impl FixtureReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FixtureFailure {
    pub category: String,
    pub description: String,
    pub detail: String,
}

impl FixtureCorpus {
    /// The corpus compiled into the library
    pub fn embedded() -> Result<Self> {
        let content = assets::asset_str(EMBEDDED_CORPUS)
            .ok_or_else(|| FulmenError::not_found("asset", EMBEDDED_CORPUS))?;
        Self::from_yaml_str(content)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_yaml_str(&content)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).map_err(|e| FulmenError::parse("similarity fixtures", e))
    }

    pub fn case_count(&self) -> usize {
        self.test_cases.iter().map(|c| c.cases.len()).sum()
    }

    /// Run every case and collect failures.
    pub fn run(&self) -> FixtureReport {
        let mut report = FixtureReport {
            version: self.version.clone(),
            ..Default::default()
        };

        for category in &self.test_cases {
            for (index, case) in category.cases.iter().enumerate() {
                report.total += 1;
                match run_case(&category.category, case) {
                    Ok(()) => report.passed += 1,
                    Err(detail) => report.failures.push(FixtureFailure {
                        category: category.category.clone(),
                        description: case
                            .description
                            .clone()
                            .unwrap_or_else(|| format!("case #{}", index)),
                        detail,
                    }),
                }
            }
        }

        tracing::debug!(
            total = report.total,
            passed = report.passed,
            "similarity fixtures complete"
        );
        report
    }
}

fn run_case(category: &str, case: &FixtureCase) -> std::result::Result<(), String> {
    let tolerance = case.tolerance.unwrap_or(DEFAULT_TOLERANCE);
    match category {
        "levenshtein" | "damerau_osa" | "damerau_unrestricted" | "jaro_winkler" => {
            let algorithm: Algorithm = category.parse().map_err(|e| format!("{}", e))?;
            let a = required(&case.input_a, "input_a")?;
            let b = required(&case.input_b, "input_b")?;

            if let Some(expected) = case.expected_distance {
                let actual = distance(a, b, algorithm).map_err(|e| e.to_string())?;
                if actual != expected {
                    return Err(format!("distance: expected {}, got {}", expected, actual));
                }
            }
            if let Some(expected) = case.expected_score {
                let options = score_options(case)?;
                let actual = score(a, b, algorithm, Some(&options));
                check_score(expected, actual, tolerance)?;
            }
            Ok(())
        }
        "substring" => {
            let needle = required(&case.needle, "needle")?;
            let haystack = required(&case.haystack, "haystack")?;
            let (range, actual) = substring_match(needle, haystack);
            if let Some(expected) = case.expected_range {
                let got = ExpectedRange {
                    start: range.start,
                    end: range.end,
                    valid: range.valid,
                };
                if got != expected {
                    return Err(format!("range: expected {:?}, got {:?}", expected, got));
                }
            }
            if let Some(expected) = case.expected_score {
                check_score(expected, actual, tolerance)?;
            }
            Ok(())
        }
        "normalization_presets" => {
            let input = required(&case.input, "input")?;
            let preset = case.preset.ok_or("missing preset")?;
            let expected = required(&case.expected, "expected")?;
            let actual = preset.apply(input);
            if actual != expected {
                return Err(format!("{} preset: expected {:?}, got {:?}", preset, expected, actual));
            }
            Ok(())
        }
        "suggestions" => {
            let input = required(&case.input, "input")?;
            let options: SuggestOptions = match &case.options {
                Some(value) => serde_json::from_value(value.clone()).map_err(|e| format!("options: {}", e))?,
                None => SuggestOptions::default(),
            };
            let expected = case.expected_suggestions.as_deref().unwrap_or_default();
            let actual = suggest(input, &case.candidates, &options);
            if actual.len() != expected.len() {
                return Err(format!(
                    "expected {} suggestions, got {:?}",
                    expected.len(),
                    actual
                ));
            }
            for (want, got) in expected.iter().zip(&actual) {
                if want.value != got.value {
                    return Err(format!("expected {:?}, got {:?}", want.value, got.value));
                }
                check_score(want.score, got.score, tolerance)?;
            }
            Ok(())
        }
        other => Err(format!("unknown category '{}'", other)),
    }
}

fn score_options(case: &FixtureCase) -> std::result::Result<ScoreOptions, String> {
    let jaro_winkler = match &case.options {
        Some(value) => serde_json::from_value::<JaroWinklerOptions>(value.clone())
            .map_err(|e| format!("options: {}", e))?,
        None => JaroWinklerOptions::default(),
    };
    Ok(ScoreOptions { jaro_winkler })
}

fn required<'a>(field: &'a Option<String>, name: &str) -> std::result::Result<&'a str, String> {
    field.as_deref().ok_or_else(|| format!("missing {}", name))
}

fn check_score(expected: f64, actual: f64, tolerance: f64) -> std::result::Result<(), String> {
    if (expected - actual).abs() > tolerance {
        Err(format!("score: expected {}, got {}", expected, actual))
    } else {
        Ok(())
    }
}
