//! Compiled schema validators
//!
//! Findings come back as [`Diagnostic`]s; errors are reserved for inputs
//! that cannot be read, parsed or compiled.

use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::sync::{Arc, OnceLock};

use jsonschema::{Draft, JSONSchema};
use serde_json::Value;

use super::diagnostic::{from_validation_error, Diagnostic};
use super::resolver::CatalogResolver;
use super::parse_document;
use crate::error::{FulmenError, Result};

const SOURCE_LIBRARY: &str = "library";
const SOURCE_COMPILE: &str = "compile";
const SOURCE_METASCHEMA: &str = "metaschema";

/// A compiled schema, safe to share across threads
pub struct Validator {
    schema_id: String,
    draft: Draft,
    compiled: JSONSchema,
}

impl std::fmt::Debug for Validator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Validator")
            .field("schema_id", &self.schema_id)
            .field("draft", &self.draft)
            .finish_non_exhaustive()
    }
}

impl Validator {
    /// Compile `schema` with the draft declared by its `$schema`.
    pub fn compile(schema_id: impl Into<String>, schema: &Value, resolver: CatalogResolver) -> Result<Self> {
        Self::compile_with_draft(schema_id, schema, detect_draft(schema), resolver)
    }

    pub fn compile_with_draft(
        schema_id: impl Into<String>,
        schema: &Value,
        draft: Draft,
        resolver: CatalogResolver,
    ) -> Result<Self> {
        let schema_id = schema_id.into();
        tracing::debug!(schema_id = %schema_id, ?draft, "compiling schema");

        let unresolved = resolver.unresolved_references(schema, SOURCE_COMPILE);
        if !unresolved.is_empty() {
            tracing::warn!(schema_id = %schema_id, count = unresolved.len(), "schema has unresolvable references");
            return Err(FulmenError::Compilation {
                schema_id,
                diagnostics: unresolved,
            });
        }

        let compiled = JSONSchema::options()
            .with_draft(draft)
            .with_resolver(resolver)
            .compile(schema)
            .map_err(|err| FulmenError::Compilation {
                schema_id: schema_id.clone(),
                diagnostics: vec![from_validation_error(&err, SOURCE_COMPILE)],
            })?;

        Ok(Self {
            schema_id,
            draft,
            compiled,
        })
    }

    pub fn schema_id(&self) -> &str {
        &self.schema_id
    }

    pub fn draft(&self) -> Draft {
        self.draft
    }

    /// Validate an in-memory value. Empty means valid.
    pub fn validate_data(&self, value: &Value) -> Vec<Diagnostic> {
        self.validate_with_source(value, SOURCE_LIBRARY)
    }

    /// Validate JSON bytes.
    pub fn validate_json(&self, bytes: &[u8]) -> Result<Vec<Diagnostic>> {
        let value: Value = serde_json::from_slice(bytes)
            .map_err(|e| FulmenError::parse(format!("JSON input for {}", self.schema_id), e))?;
        Ok(self.validate_data(&value))
    }

    /// Validate a JSON or YAML file.
    pub fn validate_file(&self, path: impl AsRef<Path>) -> Result<Vec<Diagnostic>> {
        let path = path.as_ref();
        let bytes = fs::read(path)?;
        let value = parse_document(&bytes, &path.display().to_string())?;
        Ok(self.validate_data(&value))
    }

    fn validate_with_source(&self, value: &Value, source: &str) -> Vec<Diagnostic> {
        match self.compiled.validate(value) {
            Ok(()) => Vec::new(),
            Err(errors) => errors.map(|err| from_validation_error(&err, source)).collect(),
        }
    }
}

/// Map a document's `$schema` to a draft; Draft 2020-12 when absent.
pub fn detect_draft(schema: &Value) -> Draft {
    let declared = schema.get("$schema").and_then(Value::as_str).unwrap_or_default();
    if declared.contains("draft-07") {
        Draft::Draft7
    } else if declared.contains("draft-06") {
        Draft::Draft6
    } else if declared.contains("draft-04") {
        Draft::Draft4
    } else if declared.contains("draft/2019-09") {
        Draft::Draft201909
    } else {
        Draft::Draft202012
    }
}

/// Validate a schema document against the embedded metaschemas.
///
/// Reports structural problems as diagnostics, then attempts a trial
/// compile so authoring errors the metaschema cannot express still surface.
pub fn validate_schema_bytes(bytes: &[u8]) -> Result<Vec<Diagnostic>> {
    let value = parse_document(bytes, "schema document")?;
    Ok(validate_schema_value("<inline>", &value, CatalogResolver::embedded()))
}

pub(crate) fn validate_schema_value(schema_id: &str, schema: &Value, resolver: CatalogResolver) -> Vec<Diagnostic> {
    if !schema.is_object() && !schema.is_boolean() {
        return vec![Diagnostic::error(
            "",
            "type",
            "schema document must be an object or a boolean",
            SOURCE_METASCHEMA,
        )];
    }

    let draft = detect_draft(schema);
    let mut diagnostics = match metaschema_validator(draft) {
        Some(meta) => meta.validate_with_source(schema, SOURCE_METASCHEMA),
        None => vec![Diagnostic::warn(
            "",
            "$schema",
            format!("no embedded metaschema for {:?}; structural check skipped", draft),
            SOURCE_METASCHEMA,
        )],
    };

    if let Err(err) = Validator::compile_with_draft(schema_id, schema, draft, resolver) {
        // the trial compile re-reports what the metaschema already flagged
        let flagged: HashSet<String> = diagnostics
            .iter()
            .filter(|d| d.is_error())
            .map(|d| d.pointer.clone())
            .collect();
        diagnostics.extend(
            err.diagnostics()
                .iter()
                .filter(|d| !flagged.contains(&d.pointer))
                .cloned(),
        );
    }
    diagnostics
}

static META_2020_12: OnceLock<Option<Arc<Validator>>> = OnceLock::new();
static META_07: OnceLock<Option<Arc<Validator>>> = OnceLock::new();

fn metaschema_validator(draft: Draft) -> Option<Arc<Validator>> {
    let (cell, path) = match draft {
        Draft::Draft202012 => (&META_2020_12, "draft-2020-12/schema.json"),
        Draft::Draft7 => (&META_07, "draft-07/schema.json"),
        _ => return None,
    };
    cell.get_or_init(|| compile_metaschema(draft, path)).clone()
}

fn compile_metaschema(draft: Draft, path: &str) -> Option<Arc<Validator>> {
    let content = crate::assets::metaschema_str(path)
        .unwrap_or_else(|| crate::assets::load_failure(path, "metaschema missing from build"));
    let meta: Value = serde_json::from_str(content)
        .unwrap_or_else(|e| crate::assets::load_failure(path, &e.to_string()));

    match Validator::compile_with_draft(path, &meta, draft, CatalogResolver::embedded()) {
        Ok(validator) => Some(Arc::new(validator)),
        Err(err) => {
            tracing::warn!(metaschema = path, error = %err, "metaschema failed to compile");
            None
        }
    }
}
