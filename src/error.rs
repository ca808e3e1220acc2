//! Error types for the fulmen library

use std::path::PathBuf;

use thiserror::Error;

use crate::schema::Diagnostic;
use crate::similarity::SimilarityError;

/// Result type for library operations
pub type Result<T> = std::result::Result<T, FulmenError>;

/// Library errors
///
/// Validation findings are not errors: validators return diagnostics as data
/// and only use this type for load, parse and compile failures.
#[derive(Error, Debug)]
pub enum FulmenError {
    #[error("{kind} not found: {key}{}", format_suggestions(.suggestions))]
    NotFound {
        kind: &'static str,
        key: String,
        suggestions: Vec<String>,
    },

    #[error("Parse error in {context}: {message}")]
    Parse { context: String, message: String },

    #[error("Schema {schema_id} failed to compile ({} diagnostics)", .diagnostics.len())]
    Compilation {
        schema_id: String,
        diagnostics: Vec<Diagnostic>,
    },

    #[error("Schema {schema_id} has {} validation diagnostics", .diagnostics.len())]
    Validation {
        schema_id: String,
        diagnostics: Vec<Diagnostic>,
    },

    #[error("Duplicate schema id {id}: {first} and {second}")]
    DuplicateSchemaId {
        id: String,
        first: PathBuf,
        second: PathBuf,
    },

    #[error("Refusing to overwrite existing file: {0}")]
    FileExists(PathBuf),

    #[error("Path {path} escapes working root {root}")]
    PathValidation { path: PathBuf, root: PathBuf },

    #[error("Exported schema {schema_id} at {path} does not match the catalog source")]
    ExportMismatch { schema_id: String, path: PathBuf },

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Invalid correlation id: {0}")]
    InvalidCorrelationId(String),

    #[error("Invalid country code: {0}")]
    InvalidCountryCode(String),

    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    #[error(transparent)]
    Similarity(#[from] SimilarityError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    #[error("Semver error: {0}")]
    Semver(#[from] semver::Error),
}

impl FulmenError {
    pub(crate) fn not_found(kind: &'static str, key: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            key: key.into(),
            suggestions: Vec::new(),
        }
    }

    pub(crate) fn parse(context: impl Into<String>, message: impl ToString) -> Self {
        Self::Parse {
            context: context.into(),
            message: message.to_string(),
        }
    }

    /// Diagnostics carried by compile or validation failures
    pub fn diagnostics(&self) -> &[Diagnostic] {
        match self {
            Self::Compilation { diagnostics, .. } | Self::Validation { diagnostics, .. } => diagnostics,
            _ => &[],
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

fn format_suggestions(suggestions: &[String]) -> String {
    if suggestions.is_empty() {
        String::new()
    } else {
        format!(" (did you mean {}?)", suggestions.join(", "))
    }
}
