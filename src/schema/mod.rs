//! Schema catalog and validation engine
//!
//! A catalog indexes a directory tree of JSON Schema documents (JSON or
//! YAML) by `<category>/<version>/<name>`. Validators compile against an
//! offline resolver so `$ref`s to the JSON Schema metaschemas and to the
//! vendor schema host never touch the network.
//!
//! ## Layout
//!
//! ```text
//! schemas/
//! ├── VERSION
//! ├── meta/
//! │   ├── draft-2020-12/
//! │   └── draft-07/
//! ├── pathfinder/
//! │   └── v1.0.0/
//! │       ├── path-result.schema.json
//! │       └── path-metadata.schema.json
//! └── config/
//!     └── v1.0.0/
//!         └── app-config.schema.yaml
//! ```

pub mod catalog;
pub mod compose;
pub mod diagnostic;
pub mod export;
pub mod resolver;
pub mod validator;

pub use catalog::{default_catalog, discover_root, SchemaCatalog, SchemaDescriptor, SourceFormat};
pub use compose::{diff, diff_values, merge, merge_values, DiffEntry};
pub use diagnostic::{has_errors, Diagnostic, Severity};
pub use export::{
    export, strip_provenance, validate_exported_schema, ExportContext, ExportFormat, ExportOptions, ExportResult,
    Identity, IdentityProvider, Provenance, ProvenanceStyle, PROVENANCE_KEY,
};
pub use resolver::CatalogResolver;
pub use validator::{detect_draft, validate_schema_bytes, Validator};

use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use serde_json::Value;

use crate::error::{FulmenError, Result};

/// Canonical JSON bytes: compact, object keys sorted.
pub fn canonical_bytes(value: &Value) -> Vec<u8> {
    // Serializing a Value into memory cannot fail.
    serde_json::to_vec(&Canonical(value)).unwrap_or_default()
}

/// Parse a schema or data document, sniffing JSON vs YAML.
///
/// Content whose first non-whitespace byte is `{` or `[` is JSON; anything
/// else goes through the YAML parser.
pub fn parse_document(bytes: &[u8], context: &str) -> Result<Value> {
    let first = bytes.iter().find(|b| !b.is_ascii_whitespace());
    if matches!(first, Some(b'{') | Some(b'[')) {
        serde_json::from_slice(bytes).map_err(|e| FulmenError::parse(context, e))
    } else {
        serde_yaml::from_slice(bytes).map_err(|e| FulmenError::parse(context, e))
    }
}

struct Canonical<'a>(&'a Value);

impl Serialize for Canonical<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self.0 {
            Value::Object(map) => {
                let mut entries: Vec<_> = map.iter().collect();
                entries.sort_by(|a, b| a.0.cmp(b.0));
                let mut out = serializer.serialize_map(Some(entries.len()))?;
                for (key, value) in entries {
                    out.serialize_entry(key, &Canonical(value))?;
                }
                out.end()
            }
            Value::Array(items) => {
                let mut out = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    out.serialize_element(&Canonical(item))?;
                }
                out.end()
            }
            scalar => scalar.serialize(serializer),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_canonical_bytes_sorted_compact() {
        let value = json!({"b": [3, {"z": 1, "a": 2}], "a": "x"});
        assert_eq!(canonical_bytes(&value), br#"{"a":"x","b":[3,{"a":2,"z":1}]}"#.to_vec());
    }

    #[test]
    fn test_parse_document_sniffs_format() {
        let json = parse_document(b"  {\"type\": \"object\"}", "inline").unwrap();
        let yaml = parse_document(b"type: object\n", "inline").unwrap();
        assert_eq!(json, yaml);
        assert!(matches!(
            parse_document(b"{ broken", "inline"),
            Err(FulmenError::Parse { .. })
        ));
    }
}
