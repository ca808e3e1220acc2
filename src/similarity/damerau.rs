//! Damerau–Levenshtein variants
//!
//! `damerau_osa` is optimal string alignment: adjacent transpositions are
//! allowed but no substring is edited twice. `damerau_unrestricted` permits
//! edits between transposed characters and delegates to `strsim`.

/// Optimal string alignment distance over Unicode scalar values.
pub fn damerau_osa(a: &str, b: &str) -> usize {
    if a == b {
        return 0;
    }
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    osa_chars(&a, &b)
}

/// Unrestricted Damerau–Levenshtein distance.
pub fn damerau_unrestricted(a: &str, b: &str) -> usize {
    if a == b {
        return 0;
    }
    strsim::damerau_levenshtein(a, b)
}

pub(crate) fn osa_chars(a: &[char], b: &[char]) -> usize {
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let n = b.len();
    // Row i-2, consulted only when the swap candidates match.
    let mut two_ago = vec![0usize; n + 1];
    let mut prev: Vec<usize> = (0..=n).collect();
    let mut curr = vec![0usize; n + 1];

    for i in 1..=a.len() {
        curr[0] = i;
        for j in 1..=n {
            let cost = usize::from(a[i - 1] != b[j - 1]);
            let mut best = (prev[j] + 1).min(curr[j - 1] + 1).min(prev[j - 1] + cost);
            if i > 1 && j > 1 && a[i - 1] == b[j - 2] && a[i - 2] == b[j - 1] {
                best = best.min(two_ago[j - 2] + 1);
            }
            curr[j] = best;
        }
        std::mem::swap(&mut two_ago, &mut prev);
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[n]
}
