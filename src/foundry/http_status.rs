//! HTTP status codes grouped by class

use std::collections::HashMap;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::assets;

const CATALOG: &str = "foundry/http-statuses.yaml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusEntry {
    pub value: u16,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusGroup {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub codes: Vec<StatusEntry>,
}

impl StatusGroup {
    pub fn contains(&self, code: u16) -> bool {
        self.codes.iter().any(|c| c.value == code)
    }
}

#[derive(Debug, Deserialize)]
struct StatusFile {
    version: String,
    groups: Vec<StatusGroup>,
}

#[derive(Debug)]
pub struct StatusCatalog {
    pub version: String,
    groups: Vec<StatusGroup>,
    /// code -> (group index, entry index)
    by_code: HashMap<u16, (usize, usize)>,
}

impl StatusCatalog {
    pub fn groups(&self) -> &[StatusGroup] {
        &self.groups
    }

    pub fn group(&self, id: &str) -> Option<&StatusGroup> {
        self.groups.iter().find(|g| g.id.eq_ignore_ascii_case(id.trim()))
    }

    pub fn group_for_code(&self, code: u16) -> Option<&StatusGroup> {
        self.by_code.get(&code).map(|&(g, _)| &self.groups[g])
    }

    pub fn reason_phrase(&self, code: u16) -> Option<&str> {
        self.by_code
            .get(&code)
            .map(|&(g, e)| self.groups[g].codes[e].reason.as_str())
    }
}

pub fn catalog() -> &'static StatusCatalog {
    static CELL: OnceLock<StatusCatalog> = OnceLock::new();
    CELL.get_or_init(|| {
        let file: StatusFile = assets::load_yaml_catalog(CATALOG);
        let mut by_code = HashMap::new();
        for (g, group) in file.groups.iter().enumerate() {
            for (e, entry) in group.codes.iter().enumerate() {
                if !(100..=599).contains(&entry.value) {
                    assets::load_failure(CATALOG, &format!("status {} out of range", entry.value));
                }
                if by_code.insert(entry.value, (g, e)).is_some() {
                    assets::load_failure(CATALOG, &format!("status {} listed twice", entry.value));
                }
            }
        }
        tracing::debug!(codes = by_code.len(), "loaded http status catalog");
        StatusCatalog {
            version: file.version,
            groups: file.groups,
            by_code,
        }
    })
}

pub fn status_group(id: &str) -> Option<&'static StatusGroup> {
    catalog().group(id)
}

pub fn group_for_code(code: u16) -> Option<&'static StatusGroup> {
    catalog().group_for_code(code)
}

pub fn reason_phrase(code: u16) -> Option<&'static str> {
    catalog().reason_phrase(code)
}

// Class helpers go by numeric range so uncatalogued codes still classify.

pub fn is_informational(code: u16) -> bool {
    (100..200).contains(&code)
}

pub fn is_success(code: u16) -> bool {
    (200..300).contains(&code)
}

pub fn is_redirect(code: u16) -> bool {
    (300..400).contains(&code)
}

pub fn is_client_error(code: u16) -> bool {
    (400..500).contains(&code)
}

pub fn is_server_error(code: u16) -> bool {
    (500..600).contains(&code)
}

pub fn is_error(code: u16) -> bool {
    is_client_error(code) || is_server_error(code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_lookup() {
        let group = status_group("Client-Error").unwrap();
        assert!(group.contains(404));
        assert_eq!(group_for_code(503).map(|g| g.id.as_str()), Some("server-error"));
        assert!(status_group("teapots").is_none());
    }

    #[test]
    fn test_reason_phrase() {
        assert_eq!(reason_phrase(200), Some("OK"));
        assert_eq!(reason_phrase(418), Some("I'm a teapot"));
        assert_eq!(reason_phrase(299), None);
    }

    #[test]
    fn test_groups_match_classes() {
        for group in catalog().groups() {
            for entry in &group.codes {
                let class = match group.id.as_str() {
                    "informational" => is_informational(entry.value),
                    "success" => is_success(entry.value),
                    "redirect" => is_redirect(entry.value),
                    "client-error" => is_client_error(entry.value),
                    "server-error" => is_server_error(entry.value),
                    other => panic!("unexpected group {}", other),
                };
                assert!(class, "{} in {}", entry.value, group.id);
            }
        }
        assert!(is_error(404) && is_error(500) && !is_error(302));
    }
}
