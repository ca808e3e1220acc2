//! String similarity engine
//!
//! Five algorithms behind two entry points: [`distance`] for the edit
//! distances and [`score`] for a normalized similarity in [0, 1].
//! Jaro–Winkler and substring have no integer distance; asking for one is a
//! [`SimilarityError::WrongApi`].
//!
//! All lengths and indices count Unicode scalar values, never bytes.

pub mod damerau;
pub mod fixtures;
pub mod jaro;
pub mod levenshtein;
pub mod normalize;
pub mod substring;
pub mod suggest;

pub use damerau::{damerau_osa, damerau_unrestricted};
pub use jaro::{jaro, jaro_winkler, JaroWinklerOptions};
pub use levenshtein::levenshtein;
pub use normalize::{casefold, equals_ignore_case, normalize, strip_accents, NormalizationPreset, NormalizeOptions};
pub use substring::{substring_match, MatchRange};
pub use suggest::{suggest, SuggestOptions, Suggestion, DEFAULT_MAX_SUGGESTIONS, DEFAULT_MIN_SCORE};

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::telemetry;

/// Similarity errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SimilarityError {
    #[error("{algorithm} is a similarity metric without a distance; use {use_instead} instead")]
    WrongApi {
        algorithm: Algorithm,
        use_instead: &'static str,
    },

    #[error("Invalid algorithm: {0}")]
    InvalidAlgorithm(String),
}

/// Supported algorithms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Algorithm {
    #[default]
    Levenshtein,
    DamerauOsa,
    DamerauUnrestricted,
    JaroWinkler,
    Substring,
}

impl Algorithm {
    pub const ALL: [Algorithm; 5] = [
        Algorithm::Levenshtein,
        Algorithm::DamerauOsa,
        Algorithm::DamerauUnrestricted,
        Algorithm::JaroWinkler,
        Algorithm::Substring,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Levenshtein => "levenshtein",
            Self::DamerauOsa => "damerau_osa",
            Self::DamerauUnrestricted => "damerau_unrestricted",
            Self::JaroWinkler => "jaro_winkler",
            Self::Substring => "substring",
        }
    }

    /// Whether the algorithm yields an integer edit distance
    pub fn has_distance(&self) -> bool {
        matches!(self, Self::Levenshtein | Self::DamerauOsa | Self::DamerauUnrestricted)
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Algorithm {
    type Err = SimilarityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = s.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|a| a.as_str() == tag)
            .ok_or_else(|| SimilarityError::InvalidAlgorithm(s.to_string()))
    }
}

/// Options for [`score`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreOptions {
    pub jaro_winkler: JaroWinklerOptions,
}

/// Edit distance between `a` and `b`.
pub fn distance(a: &str, b: &str, algorithm: Algorithm) -> Result<usize, SimilarityError> {
    record_call("distance", algorithm, a, b);

    if !algorithm.has_distance() {
        telemetry::emit_counter(
            metrics::ERROR,
            1.0,
            &[("error_type", "wrong_api"), ("algorithm", algorithm.as_str())],
        );
        return Err(SimilarityError::WrongApi {
            algorithm,
            use_instead: "score",
        });
    }

    if a == b {
        telemetry::emit_counter(metrics::FAST_PATH, 1.0, &[("reason", "identical")]);
        return Ok(0);
    }

    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    Ok(distance_chars(&a, &b, algorithm))
}

/// [`distance`] with the algorithm given by name.
pub fn distance_by_name(a: &str, b: &str, algorithm: &str) -> Result<usize, SimilarityError> {
    distance(a, b, algorithm.parse()?)
}

/// Similarity score in [0, 1].
///
/// Distance algorithms score `1 - distance / max(|a|, |b|)`.
pub fn score(a: &str, b: &str, algorithm: Algorithm, options: Option<&ScoreOptions>) -> f64 {
    record_call("score", algorithm, a, b);

    if a.is_empty() && b.is_empty() {
        telemetry::emit_counter(metrics::EDGE_CASE, 1.0, &[("case", "both_empty")]);
        return 1.0;
    }
    if a == b {
        telemetry::emit_counter(metrics::FAST_PATH, 1.0, &[("reason", "identical")]);
        return 1.0;
    }

    let jw = options.map(|o| o.jaro_winkler).unwrap_or_default();
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    score_chars(&a, &b, algorithm, &jw)
}

/// [`score`] with the algorithm given by name.
pub fn score_by_name(a: &str, b: &str, algorithm: &str, options: Option<&ScoreOptions>) -> Result<f64, SimilarityError> {
    Ok(score(a, b, algorithm.parse()?, options))
}

fn distance_chars(a: &[char], b: &[char], algorithm: Algorithm) -> usize {
    match algorithm {
        Algorithm::Levenshtein => levenshtein::levenshtein_chars(a, b),
        Algorithm::DamerauOsa => damerau::osa_chars(a, b),
        Algorithm::DamerauUnrestricted => strsim::generic_damerau_levenshtein(a, b),
        Algorithm::JaroWinkler | Algorithm::Substring => unreachable!("checked by has_distance"),
    }
}

pub(crate) fn score_chars(a: &[char], b: &[char], algorithm: Algorithm, jw: &JaroWinklerOptions) -> f64 {
    if a == b {
        return 1.0;
    }
    match algorithm {
        Algorithm::JaroWinkler => jaro::jaro_winkler_chars(a, b, jw),
        Algorithm::Substring => substring::substring_score_chars(a, b),
        _ => {
            let max_len = a.len().max(b.len());
            let d = distance_chars(a, b, algorithm);
            (1.0 - d as f64 / max_len as f64).clamp(0.0, 1.0)
        }
    }
}

/// Counter names emitted while telemetry is enabled
pub mod metrics {
    pub const DISTANCE_CALLS: &str = "foundry.similarity.distance.calls";
    pub const SCORE_CALLS: &str = "foundry.similarity.score.calls";
    pub const STRING_LENGTH: &str = "foundry.similarity.string_length";
    pub const FAST_PATH: &str = "foundry.similarity.fast_path";
    pub const EDGE_CASE: &str = "foundry.similarity.edge_case";
    pub const ERROR: &str = "foundry.similarity.error";
}

/// Length bucket for the longer of two inputs
pub fn length_bucket(len: usize) -> &'static str {
    match len {
        0 => "empty",
        1..=10 => "tiny",
        11..=50 => "short",
        51..=200 => "medium",
        201..=1000 => "long",
        _ => "very_long",
    }
}

fn record_call(api: &str, algorithm: Algorithm, a: &str, b: &str) {
    if !telemetry::is_enabled() {
        return;
    }
    let name = if api == "distance" {
        metrics::DISTANCE_CALLS
    } else {
        metrics::SCORE_CALLS
    };
    telemetry::emit_counter(name, 1.0, &[("algorithm", algorithm.as_str())]);
    let longest = a.chars().count().max(b.chars().count());
    telemetry::emit_counter(metrics::STRING_LENGTH, 1.0, &[("bucket", length_bucket(longest))]);
}
