//! Content checksums for catalog schemas

use sha2::{Digest, Sha256};
use serde::{Deserialize, Serialize};
use std::fmt;

/// SHA-256 checksum of a schema's canonical JSON bytes
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Checksum(String);

impl Checksum {
    /// Compute checksum from raw bytes
    pub fn from_bytes(data: &[u8]) -> Self {
        let hash = Sha256::digest(data);
        Self(format!("{:x}", hash))
    }

    /// Compute checksum of a value's canonical JSON form
    pub fn of_value(value: &serde_json::Value) -> Self {
        Self::from_bytes(&crate::schema::canonical_bytes(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Verify that bytes match this checksum
    pub fn verify(&self, data: &[u8]) -> bool {
        Self::from_bytes(data) == *self
    }
}

impl fmt::Display for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sha256:{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_checksum_consistency() {
        let content = br#"{"name":"test","version":"1.0.0"}"#;
        assert_eq!(Checksum::from_bytes(content), Checksum::from_bytes(content));
        assert_eq!(Checksum::from_bytes(content).as_str().len(), 64);
    }

    #[test]
    fn test_value_checksum_ignores_key_order() {
        let a = json!({"b": 1, "a": {"y": true, "x": null}});
        let b = json!({"a": {"x": null, "y": true}, "b": 1});
        assert_eq!(Checksum::of_value(&a), Checksum::of_value(&b));
        assert_ne!(Checksum::of_value(&a), Checksum::of_value(&json!({"b": 2})));
    }

    #[test]
    fn test_checksum_verification() {
        let checksum = Checksum::from_bytes(b"{}");
        assert!(checksum.verify(b"{}"));
        assert!(!checksum.verify(b"[]"));
        assert!(checksum.to_string().starts_with("sha256:"));
    }
}
