//! Structured validation findings

use serde::{Deserialize, Serialize};
use std::fmt;

/// Diagnostic severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Error,
    Warn,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => f.write_str("ERROR"),
            Severity::Warn => f.write_str("WARN"),
        }
    }
}

/// A single validation or compilation finding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// JSON Pointer to the offending instance location ("" is the root)
    pub pointer: String,
    /// Schema keyword that produced the finding
    pub keyword: String,
    pub message: String,
    pub severity: Severity,
    /// Which validator emitted the finding
    pub source: String,
}

impl Diagnostic {
    pub fn error(
        pointer: impl Into<String>,
        keyword: impl Into<String>,
        message: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            pointer: pointer.into(),
            keyword: keyword.into(),
            message: message.into(),
            severity: Severity::Error,
            source: source.into(),
        }
    }

    pub fn warn(
        pointer: impl Into<String>,
        keyword: impl Into<String>,
        message: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            severity: Severity::Warn,
            ..Self::error(pointer, keyword, message, source)
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pointer = if self.pointer.is_empty() { "/" } else { &self.pointer };
        write!(
            f,
            "{} {} [{}] {} ({})",
            self.severity, pointer, self.keyword, self.message, self.source
        )
    }
}

/// Convert a `jsonschema` error into a diagnostic
pub(crate) fn from_validation_error(err: &jsonschema::ValidationError<'_>, source: &str) -> Diagnostic {
    use jsonschema::error::ValidationErrorKind;

    if matches!(
        err.kind,
        ValidationErrorKind::Resolver { .. }
            | ValidationErrorKind::InvalidReference { .. }
            | ValidationErrorKind::UnknownReferenceScheme { .. }
    ) {
        return Diagnostic::error(err.instance_path.to_string(), "$ref", err.to_string(), source);
    }

    let schema_path = err.schema_path.to_string();
    let keyword = schema_path
        .rsplit('/')
        .find(|segment| !segment.is_empty() && segment.parse::<usize>().is_err())
        .unwrap_or("schema")
        .to_string();
    Diagnostic::error(err.instance_path.to_string(), keyword, err.to_string(), source)
}

/// Whether any diagnostic in `diagnostics` is an error
pub fn has_errors(diagnostics: &[Diagnostic]) -> bool {
    diagnostics.iter().any(Diagnostic::is_error)
}
