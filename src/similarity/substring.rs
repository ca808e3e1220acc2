//! Longest common substring

use serde::{Deserialize, Serialize};

/// Half-open `[start, end)` range of scalar-value indices into the haystack
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MatchRange {
    pub start: usize,
    pub end: usize,
    pub valid: bool,
}

impl MatchRange {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// The matched slice of `haystack`, when valid.
    pub fn slice<'a>(&self, haystack: &'a str) -> Option<&'a str> {
        if !self.valid {
            return None;
        }
        let mut indices = haystack
            .char_indices()
            .map(|(i, _)| i)
            .chain(std::iter::once(haystack.len()));
        let start = indices.nth(self.start)?;
        let end = if self.is_empty() {
            start
        } else {
            indices.nth(self.len() - 1)?
        };
        haystack.get(start..end)
    }
}

/// Locate the longest common substring of `needle` within `haystack`.
///
/// The score is `lcs_length / max(|needle|, |haystack|)`. The earliest
/// occurrence wins when several substrings share the longest length.
pub fn substring_match(needle: &str, haystack: &str) -> (MatchRange, f64) {
    let n: Vec<char> = needle.chars().collect();
    let h: Vec<char> = haystack.chars().collect();
    let (len, end) = longest_common_substring(&n, &h);

    let max_len = n.len().max(h.len());
    let score = if max_len == 0 {
        1.0
    } else {
        len as f64 / max_len as f64
    };
    let range = MatchRange {
        start: end - len,
        end,
        valid: len > 0,
    };
    (range, score)
}

pub(crate) fn substring_score_chars(a: &[char], b: &[char]) -> f64 {
    let max_len = a.len().max(b.len());
    if max_len == 0 {
        return 1.0;
    }
    let (len, _) = longest_common_substring(a, b);
    len as f64 / max_len as f64
}

/// Returns `(length, end index in b)` of the longest common substring.
fn longest_common_substring(a: &[char], b: &[char]) -> (usize, usize) {
    if a.is_empty() || b.is_empty() {
        return (0, 0);
    }

    let mut prev = vec![0usize; b.len() + 1];
    let mut curr = vec![0usize; b.len() + 1];
    let mut best_len = 0usize;
    let mut best_end = 0usize;

    for &ca in a {
        for j in 1..=b.len() {
            if ca == b[j - 1] {
                curr[j] = prev[j - 1] + 1;
                if curr[j] > best_len || (curr[j] == best_len && j < best_end) {
                    best_len = curr[j];
                    best_end = j;
                }
            } else {
                curr[j] = 0;
            }
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    (best_len, best_end)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_world_in_hello_world() {
        let (range, score) = substring_match("world", "hello world");
        assert_eq!(
            range,
            MatchRange {
                start: 6,
                end: 11,
                valid: true
            }
        );
        assert!((score - 5.0 / 11.0).abs() < 1e-12);
        assert_eq!(range.slice("hello world"), Some("world"));
    }

    #[test]
    fn test_no_overlap_is_invalid() {
        let (range, score) = substring_match("xyz", "abc");
        assert!(!range.valid);
        assert_eq!(score, 0.0);
        assert_eq!(range.slice("abc"), None);
    }

    #[test]
    fn test_ranges_use_scalar_indices() {
        let haystack = "\u{1F600}\u{1F600}caf\u{e9}!";
        let (range, _) = substring_match("caf\u{e9}", haystack);
        assert_eq!((range.start, range.end), (2, 6));
        assert_eq!(range.slice(haystack), Some("caf\u{e9}"));
    }

    #[test]
    fn test_earliest_occurrence_wins() {
        let (range, _) = substring_match("ab", "xxabyyab");
        assert_eq!((range.start, range.end), (2, 4));
    }

    #[test]
    fn test_empty_inputs() {
        let (range, score) = substring_match("", "");
        assert!(!range.valid);
        assert_eq!(score, 1.0);
        let (_, score) = substring_match("", "abc");
        assert_eq!(score, 0.0);
    }
}
