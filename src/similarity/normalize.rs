//! Unicode normalization pipeline
//!
//! `normalize` trims, case folds and optionally strips accents. Turkish
//! locales swap the generic fold for dotted/dotless I lowercasing.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use unicode_general_category::{get_general_category, GeneralCategory};
use unicode_normalization::UnicodeNormalization;

/// Options for [`normalize`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizeOptions {
    pub strip_accents: bool,
    pub locale: Option<String>,
}

impl NormalizeOptions {
    pub fn with_strip_accents(mut self) -> Self {
        self.strip_accents = true;
        self
    }

    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = Some(locale.into());
        self
    }
}

/// Trim, case fold and (optionally) strip accents.
pub fn normalize(value: &str, options: &NormalizeOptions) -> String {
    let folded = casefold(trim_whitespace(value), options.locale.as_deref());
    if options.strip_accents {
        strip_accents(&folded)
    } else {
        folded
    }
}

/// Unicode case fold, with Turkish dotted/dotless I rules for `tr`.
pub fn casefold(value: &str, locale: Option<&str>) -> String {
    if locale.is_some_and(is_turkish) {
        let mut out = String::with_capacity(value.len());
        for c in value.chars() {
            match c {
                '\u{130}' => out.push('i'),
                'I' => out.push('\u{131}'),
                other => out.extend(other.to_lowercase()),
            }
        }
        out
    } else {
        caseless::default_case_fold_str(value)
    }
}

/// Decompose, drop nonspacing marks, recompose.
pub fn strip_accents(value: &str) -> String {
    value.nfd().filter(|c| !is_nonspacing_mark(*c)).nfc().collect()
}

/// Compare two strings after normalizing both with `options`.
pub fn equals_ignore_case(a: &str, b: &str, options: &NormalizeOptions) -> bool {
    normalize(a, options) == normalize(b, options)
}

/// Named normalization presets shared with the fixture corpus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NormalizationPreset {
    /// Identity
    None,
    /// NFC + trim
    Minimal,
    /// NFC + case fold + trim
    #[default]
    Default,
    /// NFKD + case fold + strip accents + remove punctuation + trim
    Aggressive,
}

impl NormalizationPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Minimal => "minimal",
            Self::Default => "default",
            Self::Aggressive => "aggressive",
        }
    }

    pub fn apply(&self, value: &str) -> String {
        match self {
            Self::None => value.to_string(),
            Self::Minimal => {
                let composed: String = value.nfc().collect();
                trim_whitespace(&composed).to_string()
            }
            Self::Default => {
                let composed: String = value.nfc().collect();
                casefold(trim_whitespace(&composed), None)
            }
            Self::Aggressive => {
                let decomposed: String = value.nfkd().collect();
                let folded = caseless::default_case_fold_str(&decomposed);
                let filtered: String = folded
                    .chars()
                    .filter(|c| !is_nonspacing_mark(*c) && !is_punctuation(*c))
                    .collect();
                trim_whitespace(&filtered).to_string()
            }
        }
    }
}

impl fmt::Display for NormalizationPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NormalizationPreset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "minimal" => Ok(Self::Minimal),
            "default" => Ok(Self::Default),
            "aggressive" => Ok(Self::Aggressive),
            other => Err(format!("unknown normalization preset '{}'", other)),
        }
    }
}

fn trim_whitespace(value: &str) -> &str {
    value.trim_matches(|c| matches!(c, ' ' | '\t' | '\r' | '\n'))
}

fn is_turkish(locale: &str) -> bool {
    let lower = locale.to_ascii_lowercase();
    lower == "tr" || lower.starts_with("tr-") || lower.starts_with("tr_")
}

fn is_nonspacing_mark(c: char) -> bool {
    get_general_category(c) == GeneralCategory::NonspacingMark
}

fn is_punctuation(c: char) -> bool {
    matches!(
        get_general_category(c),
        GeneralCategory::ConnectorPunctuation
            | GeneralCategory::DashPunctuation
            | GeneralCategory::OpenPunctuation
            | GeneralCategory::ClosePunctuation
            | GeneralCategory::InitialPunctuation
            | GeneralCategory::FinalPunctuation
            | GeneralCategory::OtherPunctuation
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trim_and_fold() {
        assert_eq!(normalize("  Hello  ", &NormalizeOptions::default()), "hello");
        assert_eq!(normalize("\t\r\nMiXeD\n", &NormalizeOptions::default()), "mixed");
    }

    #[test]
    fn test_strip_accents_option() {
        let options = NormalizeOptions::default().with_strip_accents();
        assert_eq!(normalize("Caf\u{e9}", &options), "cafe");
        assert_eq!(normalize("Cafe\u{301}", &options), "cafe");
        assert_eq!(strip_accents("na\u{ef}ve r\u{e9}sum\u{e9}"), "naive resume");
    }

    #[test]
    fn test_turkish_locale() {
        let options = NormalizeOptions::default().with_locale("tr");
        assert_eq!(normalize("\u{130}stanbul", &options), "istanbul");
        assert_eq!(casefold("ISPARTA", Some("TR")), "\u{131}sparta");
        assert_eq!(casefold("I", Some("tr-TR")), "\u{131}");
    }

    #[test]
    fn test_case_fold_is_full_fold() {
        assert_eq!(casefold("Stra\u{df}e", None), "strasse");
    }

    #[test]
    fn test_equals_ignore_case() {
        let options = NormalizeOptions::default();
        assert!(equals_ignore_case(" HELLO", "hello ", &options));
        assert!(!equals_ignore_case("caf\u{e9}", "cafe", &options));
        assert!(equals_ignore_case("caf\u{e9}", "CAFE", &options.with_strip_accents()));
    }

    #[test]
    fn test_presets() {
        assert_eq!(NormalizationPreset::None.apply("  Caf\u{e9} "), "  Caf\u{e9} ");
        assert_eq!(NormalizationPreset::Minimal.apply("  Cafe\u{301} "), "Caf\u{e9}");
        assert_eq!(NormalizationPreset::Default.apply("  Cafe\u{301} "), "caf\u{e9}");
        assert_eq!(NormalizationPreset::Aggressive.apply(" Caf\u{e9}-Latt\u{e9}! "), "cafelatte");
    }

    #[test]
    fn test_preset_parsing() {
        assert_eq!("AGGRESSIVE".parse::<NormalizationPreset>(), Ok(NormalizationPreset::Aggressive));
        assert!("loud".parse::<NormalizationPreset>().is_err());
    }
}
