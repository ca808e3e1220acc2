//! Version directory parsing
//!
//! Catalog schemas live under version directories such as `v1.0.0`. Those
//! that parse as semver order numerically; anything else (`v1`, `draft`)
//! orders lexically below every semver directory.

use semver::Version;
use std::cmp::Ordering;
use std::fmt;

/// A catalog version directory name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogVersion {
    raw: String,
    semver: Option<Version>,
}

impl CatalogVersion {
    pub fn parse(dir_name: &str) -> Self {
        let trimmed = dir_name.strip_prefix('v').unwrap_or(dir_name);
        Self {
            raw: dir_name.to_string(),
            semver: Version::parse(trimmed).ok(),
        }
    }

    /// Strict parse; fails on non-semver directory names.
    pub fn parse_semver(dir_name: &str) -> Result<Version, semver::Error> {
        Version::parse(dir_name.strip_prefix('v').unwrap_or(dir_name))
    }

    pub fn semver(&self) -> Option<&Version> {
        self.semver.as_ref()
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Directory name for a version (e.g., "v1.2.3")
    pub fn dir_name(version: &Version) -> String {
        format!("v{}", version)
    }
}

impl fmt::Display for CatalogVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl PartialOrd for CatalogVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CatalogVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        match (&self.semver, &other.semver) {
            (Some(a), Some(b)) => a.cmp(b).then_with(|| self.raw.cmp(&other.raw)),
            (Some(_), None) => Ordering::Greater,
            (None, Some(_)) => Ordering::Less,
            (None, None) => self.raw.cmp(&other.raw),
        }
    }
}
