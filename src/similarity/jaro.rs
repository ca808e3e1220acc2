//! Jaro and Jaro–Winkler similarity

use serde::{Deserialize, Serialize};

pub const DEFAULT_PREFIX_SCALE: f64 = 0.1;
pub const DEFAULT_MAX_PREFIX: usize = 4;

/// Winkler prefix bonus parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JaroWinklerOptions {
    /// Weight of each shared prefix character, clamped to [0, 0.25]
    pub prefix_scale: f64,
    /// Longest prefix considered, clamped to [1, 8]
    pub max_prefix: usize,
}

impl Default for JaroWinklerOptions {
    fn default() -> Self {
        Self {
            prefix_scale: DEFAULT_PREFIX_SCALE,
            max_prefix: DEFAULT_MAX_PREFIX,
        }
    }
}

impl JaroWinklerOptions {
    fn clamped(&self) -> (f64, usize) {
        (self.prefix_scale.clamp(0.0, 0.25), self.max_prefix.clamp(1, 8))
    }
}

/// Jaro similarity in [0, 1].
pub fn jaro(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    jaro_chars(&a, &b)
}

/// Jaro–Winkler similarity in [0, 1].
pub fn jaro_winkler(a: &str, b: &str, options: &JaroWinklerOptions) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    jaro_winkler_chars(&a, &b, options)
}

pub(crate) fn jaro_chars(a: &[char], b: &[char]) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let window = (a.len().max(b.len()) / 2).saturating_sub(1);
    let mut a_matched = vec![false; a.len()];
    let mut b_matched = vec![false; b.len()];
    let mut matches = 0usize;

    for (i, &ca) in a.iter().enumerate() {
        let start = i.saturating_sub(window);
        let end = (i + window + 1).min(b.len());
        for j in start..end {
            if !b_matched[j] && b[j] == ca {
                a_matched[i] = true;
                b_matched[j] = true;
                matches += 1;
                break;
            }
        }
    }

    if matches == 0 {
        return 0.0;
    }

    let mut half_transpositions = 0usize;
    let mut k = 0usize;
    for (i, &ca) in a.iter().enumerate() {
        if !a_matched[i] {
            continue;
        }
        while !b_matched[k] {
            k += 1;
        }
        if ca != b[k] {
            half_transpositions += 1;
        }
        k += 1;
    }

    let m = matches as f64;
    let t = half_transpositions as f64 / 2.0;
    (m / a.len() as f64 + m / b.len() as f64 + (m - t) / m) / 3.0
}

pub(crate) fn jaro_winkler_chars(a: &[char], b: &[char], options: &JaroWinklerOptions) -> f64 {
    let jaro = jaro_chars(a, b);
    let (scale, max_prefix) = options.clamped();
    let prefix = a
        .iter()
        .zip(b.iter())
        .take(max_prefix)
        .take_while(|(x, y)| x == y)
        .count();
    (jaro + prefix as f64 * scale * (1.0 - jaro)).clamp(0.0, 1.0)
}
