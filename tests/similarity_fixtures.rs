//! Similarity behaviour shared with the other Fulmen language libraries

use rsfulmen::similarity::fixtures::FixtureCorpus;
use rsfulmen::similarity::{
    distance, normalize, score, substring_match, suggest, Algorithm, NormalizeOptions, SimilarityError, SuggestOptions,
};
use rstest::rstest;

const EPSILON: f64 = 1e-4;

#[test]
fn test_embedded_corpus_is_clean() {
    let corpus = FixtureCorpus::embedded().unwrap();
    assert!(corpus.case_count() > 0);

    let report = corpus.run();
    assert_eq!(report.total, corpus.case_count());
    assert!(report.is_clean(), "{:#?}", report.failures);
}

#[rstest]
#[case("kitten", "sitting", Algorithm::Levenshtein, 3)]
#[case("CA", "ABC", Algorithm::DamerauOsa, 3)]
#[case("CA", "ABC", Algorithm::DamerauUnrestricted, 2)]
#[case("café", "cafe", Algorithm::Levenshtein, 1)]
#[case("", "abc", Algorithm::Levenshtein, 3)]
#[case("ab", "ba", Algorithm::DamerauOsa, 1)]
fn test_distance(#[case] a: &str, #[case] b: &str, #[case] algorithm: Algorithm, #[case] expected: usize) {
    assert_eq!(distance(a, b, algorithm).unwrap(), expected);
    assert_eq!(distance(b, a, algorithm).unwrap(), expected);
}

#[rstest]
#[case("kitten", "sitting", Algorithm::Levenshtein, 4.0 / 7.0)]
#[case("café", "cafe", Algorithm::Levenshtein, 0.75)]
#[case("martha", "marhta", Algorithm::JaroWinkler, 0.9611)]
#[case("", "", Algorithm::Levenshtein, 1.0)]
#[case("abc", "abc", Algorithm::JaroWinkler, 1.0)]
fn test_score(#[case] a: &str, #[case] b: &str, #[case] algorithm: Algorithm, #[case] expected: f64) {
    let actual = score(a, b, algorithm, None);
    assert!((actual - expected).abs() < EPSILON, "{} vs {}: {}", a, b, actual);
}

#[test]
fn test_similarity_metrics_have_no_distance() {
    let err = distance("a", "b", Algorithm::JaroWinkler).unwrap_err();
    assert!(matches!(err, SimilarityError::WrongApi { .. }));
}

#[test]
fn test_substring_match() {
    let (range, score) = substring_match("world", "hello world");
    assert!(range.valid);
    assert_eq!((range.start, range.end), (6, 11));
    assert_eq!(range.slice("hello world"), Some("world"));
    assert!((score - 5.0 / 11.0).abs() < EPSILON);

    let (range, score) = substring_match("xyz", "hello");
    assert!(!range.valid);
    assert_eq!(score, 0.0);
}

#[test]
fn test_suggest_ranks_close_candidates() {
    let candidates = ["docscribe", "crucible", "config"];
    let suggestions = suggest("docscrib", &candidates, &SuggestOptions::default());

    assert_eq!(suggestions.len(), 1);
    assert_eq!(suggestions[0].value, "docscribe");
    assert!((suggestions[0].score - 8.0 / 9.0).abs() < EPSILON);
}

#[test]
fn test_suggest_normalizes_before_scoring() {
    let suggestions = suggest("  CONFIG ", &["config", "confirm"], &SuggestOptions::default());
    assert_eq!(suggestions.first().map(|s| s.value.as_str()), Some("config"));
    assert_eq!(suggestions[0].score, 1.0);
}

#[test]
fn test_normalize_strip_accents() {
    let options = NormalizeOptions {
        strip_accents: true,
        locale: None,
    };
    assert_eq!(normalize("  Café Crème ", &options), "cafe creme");
}
