//! Shared pattern catalog
//!
//! Patterns come in three kinds. Regexes compile lazily with the flags the
//! catalog declares for `rust`; globs are translated to anchored regexes;
//! literals compare for exact equality.

use std::collections::{BTreeMap, HashMap};
use std::sync::OnceLock;

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::assets;
use crate::error::Result;

const CATALOG: &str = "foundry/patterns.yaml";
const RUST_FLAGS: &str = "rust";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatternKind {
    Regex,
    Glob,
    Literal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pattern {
    pub id: String,
    pub name: String,
    pub kind: PatternKind,
    pub pattern: String,
    #[serde(default)]
    pub description: Option<String>,
    /// language tag -> flag name -> enabled
    #[serde(default)]
    pub flags: BTreeMap<String, BTreeMap<String, bool>>,
    #[serde(default)]
    pub examples: Vec<String>,
    #[serde(default)]
    pub non_examples: Vec<String>,
    #[serde(skip)]
    compiled: OnceLock<std::result::Result<Regex, regex::Error>>,
}

impl Pattern {
    fn rust_flag(&self, name: &str) -> bool {
        self.flags
            .get(RUST_FLAGS)
            .and_then(|flags| flags.get(name))
            .copied()
            .unwrap_or(false)
    }

    /// The compiled matcher for regex and glob patterns
    pub fn regex(&self) -> Result<Option<&Regex>> {
        let source = match self.kind {
            PatternKind::Literal => return Ok(None),
            PatternKind::Regex => self.pattern.clone(),
            PatternKind::Glob => glob_to_regex(&self.pattern),
        };
        let compiled = self.compiled.get_or_init(|| {
            RegexBuilder::new(&source)
                .case_insensitive(self.rust_flag("case_insensitive"))
                .multi_line(self.rust_flag("multiline"))
                .dot_matches_new_line(self.rust_flag("dotall"))
                .build()
        });
        match compiled {
            Ok(regex) => Ok(Some(regex)),
            Err(err) => Err(err.clone().into()),
        }
    }

    pub fn matches(&self, value: &str) -> Result<bool> {
        match self.regex()? {
            Some(regex) => Ok(regex.is_match(value)),
            None => Ok(value == self.pattern),
        }
    }

    /// Examples that fail to match and non-examples that match
    pub fn check_examples(&self) -> Result<Vec<String>> {
        let mut problems = Vec::new();
        for example in &self.examples {
            if !self.matches(example)? {
                problems.push(format!("{}: example '{}' does not match", self.id, example));
            }
        }
        for counter in &self.non_examples {
            if self.matches(counter)? {
                problems.push(format!("{}: non-example '{}' matches", self.id, counter));
            }
        }
        Ok(problems)
    }
}

#[derive(Debug, Deserialize)]
struct PatternFile {
    version: String,
    patterns: Vec<Pattern>,
}

/// Loaded pattern catalog
#[derive(Debug)]
pub struct PatternCatalog {
    pub version: String,
    patterns: Vec<Pattern>,
    by_id: HashMap<String, usize>,
}

impl PatternCatalog {
    pub fn get(&self, id: &str) -> Option<&Pattern> {
        self.by_id.get(&id.to_ascii_lowercase()).map(|&i| &self.patterns[i])
    }

    pub fn patterns(&self) -> &[Pattern] {
        &self.patterns
    }
}

/// The embedded pattern catalog
pub fn catalog() -> &'static PatternCatalog {
    static CATALOG_CELL: OnceLock<PatternCatalog> = OnceLock::new();
    CATALOG_CELL.get_or_init(|| {
        let file: PatternFile = assets::load_yaml_catalog(CATALOG);
        let by_id = file
            .patterns
            .iter()
            .enumerate()
            .map(|(i, p)| (p.id.to_ascii_lowercase(), i))
            .collect();
        tracing::debug!(count = file.patterns.len(), "loaded pattern catalog");
        PatternCatalog {
            version: file.version,
            patterns: file.patterns,
            by_id,
        }
    })
}

/// Look up a pattern by id (case-insensitive)
pub fn pattern(id: &str) -> Option<&'static Pattern> {
    catalog().get(id)
}

/// Translate a glob into an anchored regex.
///
/// `*` and `?` stop at `/`, `**/` spans directories, `{a,b}` alternates and
/// `[...]` classes pass through.
pub fn glob_to_regex(glob: &str) -> String {
    let chars: Vec<char> = glob.chars().collect();
    let mut out = String::from("^");
    let mut in_braces = false;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            '*' if chars.get(i + 1) == Some(&'*') => {
                if chars.get(i + 2) == Some(&'/') {
                    out.push_str("(?:.*/)?");
                    i += 2;
                } else {
                    out.push_str(".*");
                    i += 1;
                }
            }
            '*' => out.push_str("[^/]*"),
            '?' => out.push_str("[^/]"),
            '[' => match chars[i..].iter().position(|&ch| ch == ']') {
                Some(len) => {
                    let class: String = chars[i + 1..i + len].iter().collect();
                    let class = class.strip_prefix('!').map(|rest| format!("^{}", rest)).unwrap_or(class);
                    out.push('[');
                    out.push_str(&class);
                    out.push(']');
                    i += len;
                }
                None => out.push_str(r"\["),
            },
            '{' => {
                in_braces = true;
                out.push_str("(?:");
            }
            '}' if in_braces => {
                in_braces = false;
                out.push(')');
            }
            ',' if in_braces => out.push('|'),
            other => out.push_str(&regex::escape(&other.to_string())),
        }
        i += 1;
    }

    out.push('$');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_examples_hold() {
        for p in catalog().patterns() {
            let problems = p.check_examples().unwrap();
            assert!(problems.is_empty(), "{:?}", problems);
        }
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        assert_eq!(pattern("EMAIL").map(|p| p.kind), Some(PatternKind::Regex));
        assert!(pattern("nope").is_none());
    }

    #[test]
    fn test_rust_flags_apply() {
        let uuid = pattern("uuid").unwrap();
        assert!(uuid.matches("0190B2F5-6C1D-7A3E-9F10-2B3C4D5E6F70").unwrap());
        let v7 = pattern("uuid-v7").unwrap();
        assert!(!v7.matches("0190B2F5-6C1D-7A3E-9F10-2B3C4D5E6F70").unwrap());
    }

    #[test]
    fn test_glob_translation() {
        assert_eq!(glob_to_regex("*.json"), r"^[^/]*\.json$");
        assert_eq!(glob_to_regex("**/*.{yaml,yml}"), r"^(?:.*/)?[^/]*\.(?:yaml|yml)$");
        assert_eq!(glob_to_regex("file[!0-9]?"), r"^file[^0-9][^/]$");
    }

    #[test]
    fn test_literal_and_invalid_regex() {
        let literal = pattern("localhost").unwrap();
        assert!(literal.regex().unwrap().is_none());
        assert!(literal.matches("localhost").unwrap());

        let broken: Pattern = serde_yaml::from_str("id: broken\nname: Broken\nkind: regex\npattern: '(oops'\n").unwrap();
        assert!(broken.matches("x").is_err());
    }
}
