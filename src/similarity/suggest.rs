//! "Did you mean" suggestion ranking

use serde::{Deserialize, Serialize};

use super::normalize::{normalize, NormalizeOptions};
use super::{score_chars, Algorithm};
use crate::similarity::jaro::JaroWinklerOptions;

pub const DEFAULT_MIN_SCORE: f64 = 0.6;
pub const DEFAULT_MAX_SUGGESTIONS: usize = 3;

/// Options for [`suggest`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SuggestOptions {
    pub min_score: f64,
    pub max_suggestions: usize,
    pub normalize: bool,
    /// Scoring algorithm; Levenshtein unless a caller needs transpositions.
    pub algorithm: Algorithm,
}

impl Default for SuggestOptions {
    fn default() -> Self {
        Self {
            min_score: DEFAULT_MIN_SCORE,
            max_suggestions: DEFAULT_MAX_SUGGESTIONS,
            normalize: true,
            algorithm: Algorithm::Levenshtein,
        }
    }
}

/// A ranked candidate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub value: String,
    pub score: f64,
}

/// Rank `candidates` by similarity to `input`.
///
/// Results are ordered by score descending, then by candidate ascending, and
/// carry the original (un-normalized) candidate text.
pub fn suggest<S: AsRef<str>>(input: &str, candidates: &[S], options: &SuggestOptions) -> Vec<Suggestion> {
    let normalize_options = NormalizeOptions::default();
    let prepare = |value: &str| -> Vec<char> {
        if options.normalize {
            normalize(value, &normalize_options).chars().collect()
        } else {
            value.chars().collect()
        }
    };

    let input_chars = prepare(input);
    let jw = JaroWinklerOptions::default();

    let mut ranked: Vec<Suggestion> = candidates
        .iter()
        .filter_map(|candidate| {
            let candidate = candidate.as_ref();
            let score = score_chars(&input_chars, &prepare(candidate), options.algorithm, &jw);
            (score >= options.min_score).then(|| Suggestion {
                value: candidate.to_string(),
                score,
            })
        })
        .collect();

    ranked.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.value.cmp(&b.value)));
    ranked.truncate(options.max_suggestions);
    ranked
}
