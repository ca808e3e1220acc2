//! ISO 3166-1 country codes

use std::collections::HashMap;
use std::fmt;
use std::sync::OnceLock;

use serde::{Deserialize, Deserializer, Serialize};

use crate::assets;
use crate::error::FulmenError;

const CATALOG: &str = "foundry/country-codes.yaml";

/// A canonical country code: upper-case alpha-2, upper-case alpha-3 or a
/// zero-padded three-digit numeric code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct CountryCode(String);

impl CountryCode {
    /// Normalise `input` to canonical form.
    ///
    /// Only the shape is checked; use [`country`] to confirm the code is
    /// catalogued.
    pub fn new(input: &str) -> Result<Self, FulmenError> {
        let trimmed = input.trim();
        let invalid = || FulmenError::InvalidCountryCode(input.to_string());

        if !trimmed.is_empty() && trimmed.chars().all(|c| c.is_ascii_digit()) {
            if trimmed.len() > 3 {
                return Err(invalid());
            }
            return Ok(Self(format!("{:0>3}", trimmed)));
        }
        if matches!(trimmed.len(), 2 | 3) && trimmed.chars().all(|c| c.is_ascii_alphabetic()) {
            return Ok(Self(trimmed.to_ascii_uppercase()));
        }
        Err(invalid())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_numeric(&self) -> bool {
        self.0.bytes().all(|b| b.is_ascii_digit())
    }
}

impl fmt::Display for CountryCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for CountryCode {
    type Err = FulmenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl<'de> Deserialize<'de> for CountryCode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Number(u16),
        }
        let raw = match Raw::deserialize(deserializer)? {
            Raw::Text(s) => s,
            Raw::Number(n) => n.to_string(),
        };
        CountryCode::new(&raw).map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Country {
    pub alpha2: CountryCode,
    pub alpha3: CountryCode,
    /// Some upstream rows carry the numeric code as a bare integer
    pub numeric: CountryCode,
    pub name: String,
    #[serde(default)]
    pub official_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CountryFile {
    version: String,
    countries: Vec<Country>,
}

#[derive(Debug)]
pub struct CountryCatalog {
    pub version: String,
    /// sorted by alpha-2
    countries: Vec<Country>,
    index: HashMap<CountryCode, usize>,
}

impl CountryCatalog {
    pub fn countries(&self) -> &[Country] {
        &self.countries
    }

    pub fn get(&self, code: &CountryCode) -> Option<&Country> {
        self.index.get(code).map(|&i| &self.countries[i])
    }

    pub fn lookup(&self, input: &str) -> Option<&Country> {
        CountryCode::new(input).ok().and_then(|code| self.get(&code))
    }
}

pub fn catalog() -> &'static CountryCatalog {
    static CELL: OnceLock<CountryCatalog> = OnceLock::new();
    CELL.get_or_init(|| {
        let file: CountryFile = assets::load_yaml_catalog(CATALOG);
        let mut countries = file.countries;
        countries.sort_by(|a, b| a.alpha2.cmp(&b.alpha2));

        let mut index = HashMap::new();
        for (i, c) in countries.iter().enumerate() {
            let shapes_ok = c.alpha2.as_str().len() == 2
                && c.alpha3.as_str().len() == 3
                && c.numeric.is_numeric();
            if !shapes_ok {
                assets::load_failure(CATALOG, &format!("malformed codes for {}", c.name));
            }
            for code in [&c.alpha2, &c.alpha3, &c.numeric] {
                if index.insert(code.clone(), i).is_some() {
                    assets::load_failure(CATALOG, &format!("country code {} listed twice", code));
                }
            }
        }
        tracing::debug!(count = countries.len(), "loaded country catalog");
        CountryCatalog {
            version: file.version,
            countries,
            index,
        }
    })
}

/// Look up by alpha-2, alpha-3 or numeric code in any case or padding
pub fn country(input: &str) -> Option<&'static Country> {
    catalog().lookup(input)
}

pub fn countries() -> &'static [Country] {
    catalog().countries()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_normalisation() {
        assert_eq!(CountryCode::new(" us ").unwrap().as_str(), "US");
        assert_eq!(CountryCode::new("deu").unwrap().as_str(), "DEU");
        assert_eq!(CountryCode::new("4").unwrap().as_str(), "004");
        assert_eq!(CountryCode::new("040").unwrap().as_str(), "040");
        for bad in ["", "U", "USAA", "1234", "U5", "ü"] {
            assert!(
                matches!(CountryCode::new(bad), Err(FulmenError::InvalidCountryCode(_))),
                "{:?}",
                bad
            );
        }
    }

    #[test]
    fn test_lookup_all_forms() {
        let by2 = country("us").unwrap();
        assert_eq!(country("USA"), Some(by2));
        assert_eq!(country("840"), Some(by2));
        assert_eq!(by2.name, "United States");
        assert!(country("XX").is_none());
        assert!(country("not a code").is_none());
    }

    #[test]
    fn test_integer_numeric_is_padded() {
        let afghanistan = country("AF").unwrap();
        assert_eq!(afghanistan.numeric.as_str(), "004");
        assert_eq!(country("4"), Some(afghanistan));
        // Norway survives YAML's boolean coercion because it is quoted
        assert_eq!(country("no").map(|c| c.alpha3.as_str()), Some("NOR"));
    }

    #[test]
    fn test_listing_sorted_by_alpha2() {
        let codes: Vec<&str> = countries().iter().map(|c| c.alpha2.as_str()).collect();
        let mut sorted = codes.clone();
        sorted.sort();
        assert_eq!(codes, sorted);
        assert_eq!(codes.first(), Some(&"AF"));
    }
}
