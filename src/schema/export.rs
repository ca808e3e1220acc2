//! Schema export with provenance
//!
//! Writes a catalog schema to disk as JSON or YAML, optionally tagged with
//! where it came from. [`validate_exported_schema`] strips that tag again and
//! checks the payload is byte-identical to the catalog's canonical JSON.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::catalog::SchemaCatalog;
use super::diagnostic::has_errors;
use super::{canonical_bytes, parse_document};
use crate::error::{FulmenError, Result};
use crate::timestamp::NanoTimestamp;

/// Reserved root key for object-style provenance
pub const PROVENANCE_KEY: &str = "x-crucible-source";

const COMMENT_KEY: &str = "$comment";
const UNKNOWN_VERSION: &str = "unknown";

/// Output serialization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Json,
    Yaml,
    /// Chosen from the output file extension
    #[default]
    Auto,
}

impl ExportFormat {
    fn resolve(self, path: &Path) -> Self {
        match self {
            Self::Auto => match path.extension().and_then(|e| e.to_str()) {
                Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") => Self::Yaml,
                _ => Self::Json,
            },
            other => other,
        }
    }
}

impl std::str::FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "yaml" | "yml" => Ok(Self::Yaml),
            "auto" => Ok(Self::Auto),
            other => Err(format!("unknown export format '{}'", other)),
        }
    }
}

/// Where provenance goes in the exported document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProvenanceStyle {
    /// A single reserved root key
    #[default]
    Object,
    /// A `$comment` string prefixed with the reserved key
    Comment,
    None,
}

impl std::str::FromStr for ProvenanceStyle {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "object" => Ok(Self::Object),
            "comment" => Ok(Self::Comment),
            "none" => Ok(Self::None),
            other => Err(format!("unknown provenance style '{}'", other)),
        }
    }
}

/// Consumer identity recorded in provenance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub vendor: String,
    pub binary: String,
}

/// Supplies the consumer identity at export time
pub trait IdentityProvider: Send + Sync {
    fn identity(&self) -> Option<Identity>;
}

impl IdentityProvider for Identity {
    fn identity(&self) -> Option<Identity> {
        Some(self.clone())
    }
}

/// Provenance metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provenance {
    pub schema_id: String,
    pub source_library_version: String,
    pub consumer_library_version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git_revision: Option<String>,
    pub exported_at: NanoTimestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity: Option<Identity>,
}

impl Provenance {
    fn fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = vec![
            ("schema_id", self.schema_id.clone()),
            ("source_library_version", self.source_library_version.clone()),
            ("consumer_library_version", self.consumer_library_version.clone()),
        ];
        if let Some(rev) = &self.git_revision {
            fields.push(("git_revision", rev.clone()));
        }
        fields.push(("exported_at", self.exported_at.to_string()));
        if let Some(identity) = &self.identity {
            fields.push(("identity_vendor", identity.vendor.clone()));
            fields.push(("identity_binary", identity.binary.clone()));
        }
        fields
    }

    /// `x-crucible-source: k=v; k=v; …`
    pub fn to_comment(&self) -> String {
        let pairs: Vec<String> = self.fields().into_iter().map(|(k, v)| format!("{}={}", k, v)).collect();
        format!("{}: {}", PROVENANCE_KEY, pairs.join("; "))
    }

    fn to_front_matter(&self) -> String {
        let mut out = format!("# {}:\n", PROVENANCE_KEY);
        for (key, value) in self.fields() {
            out.push_str(&format!("#   {}: {}\n", key, value));
        }
        out
    }
}

/// Export request
#[derive(Clone)]
pub struct ExportOptions {
    pub schema_id: String,
    pub out_path: PathBuf,
    pub format: ExportFormat,
    pub include_provenance: bool,
    pub provenance_style: ProvenanceStyle,
    /// Check the schema against its metaschema before writing
    pub validate_schema: bool,
    pub overwrite: bool,
    pub identity_provider: Option<Arc<dyn IdentityProvider>>,
    /// Discovered from the catalog's git repository when unset
    pub git_revision: Option<String>,
}

impl std::fmt::Debug for ExportOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExportOptions")
            .field("schema_id", &self.schema_id)
            .field("out_path", &self.out_path)
            .field("format", &self.format)
            .field("include_provenance", &self.include_provenance)
            .field("provenance_style", &self.provenance_style)
            .field("validate_schema", &self.validate_schema)
            .field("overwrite", &self.overwrite)
            .field("identity_provider", &self.identity_provider.is_some())
            .field("git_revision", &self.git_revision)
            .finish()
    }
}

impl ExportOptions {
    pub fn new(schema_id: impl Into<String>, out_path: impl Into<PathBuf>) -> Self {
        Self {
            schema_id: schema_id.into(),
            out_path: out_path.into(),
            format: ExportFormat::Auto,
            include_provenance: true,
            provenance_style: ProvenanceStyle::Object,
            validate_schema: true,
            overwrite: false,
            identity_provider: None,
            git_revision: None,
        }
    }
}

/// Cancellation and path policy for an export
#[derive(Debug, Clone, Default)]
pub struct ExportContext {
    cancelled: Arc<AtomicBool>,
    working_root: Option<PathBuf>,
}

impl ExportContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Exports must land under `root`; defaults to the working directory
    pub fn with_working_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.working_root = Some(root.into());
        self
    }

    /// Cancel this context and every clone of it
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(FulmenError::Cancelled)
        } else {
            Ok(())
        }
    }

    fn working_root(&self) -> Result<PathBuf> {
        match &self.working_root {
            Some(root) => Ok(root.clone()),
            None => Ok(std::env::current_dir()?),
        }
    }
}

/// What an export wrote
#[derive(Debug, Clone)]
pub struct ExportResult {
    pub path: PathBuf,
    pub format: ExportFormat,
    pub provenance: Option<Provenance>,
    /// Style actually applied; comment style can fall back to object
    pub provenance_style: ProvenanceStyle,
}

/// Export a catalog schema to `options.out_path`.
pub fn export(catalog: &SchemaCatalog, ctx: &ExportContext, options: &ExportOptions) -> Result<ExportResult> {
    ctx.check()?;

    let id = options.schema_id.as_str();
    let document = catalog.schema_value(id)?;

    let root = normalize_lexically(&ctx.working_root()?);
    let target = normalize_lexically(&root.join(&options.out_path));
    if !target.starts_with(&root) {
        return Err(FulmenError::PathValidation {
            path: options.out_path.clone(),
            root,
        });
    }

    if !options.overwrite && target.exists() {
        return Err(FulmenError::FileExists(target));
    }

    if options.validate_schema {
        let diagnostics = catalog.validate_schema_by_id(id)?;
        if has_errors(&diagnostics) {
            return Err(FulmenError::Validation {
                schema_id: id.to_string(),
                diagnostics,
            });
        }
    }

    let format = options.format.resolve(&target);
    let provenance = (options.include_provenance && options.provenance_style != ProvenanceStyle::None)
        .then(|| build_provenance(catalog, options));

    let mut payload = (*document).clone();
    let mut applied = ProvenanceStyle::None;
    let rendered = match format {
        ExportFormat::Yaml => {
            let body = serde_yaml::to_string(&payload)?;
            match &provenance {
                Some(p) => {
                    applied = options.provenance_style;
                    format!("{}---\n{}", p.to_front_matter(), body)
                }
                None => body,
            }
        }
        _ => {
            if let (Some(p), Value::Object(map)) = (&provenance, &mut payload) {
                applied = attach_provenance(map, p, options.provenance_style)?;
            }
            let mut json = serde_json::to_string_pretty(&payload)?;
            json.push('\n');
            json
        }
    };

    ctx.check()?;
    write_output(&target, rendered.as_bytes(), options.overwrite)?;
    tracing::info!(schema_id = id, path = %target.display(), ?format, "exported schema");

    Ok(ExportResult {
        path: target,
        format,
        provenance,
        provenance_style: applied,
    })
}

/// Check an exported file against the catalog source.
///
/// Provenance (the reserved key or a marked `$comment`) is removed before
/// the canonical JSON comparison.
pub fn validate_exported_schema(catalog: &SchemaCatalog, schema_id: &str, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let expected = catalog.schema_bytes(schema_id)?;

    let bytes = fs::read(path)?;
    let mut exported = parse_document(&bytes, &path.display().to_string())?;
    strip_provenance(&mut exported);

    if canonical_bytes(&exported) == expected {
        Ok(())
    } else {
        Err(FulmenError::ExportMismatch {
            schema_id: schema_id.to_string(),
            path: path.to_path_buf(),
        })
    }
}

/// Remove both provenance forms from a document root
pub fn strip_provenance(document: &mut Value) {
    if let Value::Object(map) = document {
        map.remove(PROVENANCE_KEY);
        let generated = map
            .get(COMMENT_KEY)
            .and_then(Value::as_str)
            .is_some_and(is_provenance_comment);
        if generated {
            map.remove(COMMENT_KEY);
        }
    }
}

/// Only the exact shape written by [`Provenance::to_comment`] counts; an
/// authored `$comment` that merely mentions the key is part of the schema.
fn is_provenance_comment(comment: &str) -> bool {
    comment
        .strip_prefix(PROVENANCE_KEY)
        .and_then(|rest| rest.strip_prefix(": schema_id="))
        .is_some_and(|id| !id.is_empty())
}

fn attach_provenance(map: &mut Map<String, Value>, provenance: &Provenance, style: ProvenanceStyle) -> Result<ProvenanceStyle> {
    let style = if style == ProvenanceStyle::Comment && map.contains_key(COMMENT_KEY) {
        tracing::debug!(
            schema_id = %provenance.schema_id,
            "schema declares its own $comment, using object provenance"
        );
        ProvenanceStyle::Object
    } else {
        style
    };

    match style {
        ProvenanceStyle::Object => {
            map.insert(PROVENANCE_KEY.to_string(), serde_json::to_value(provenance)?);
        }
        ProvenanceStyle::Comment => {
            map.insert(COMMENT_KEY.to_string(), Value::String(provenance.to_comment()));
        }
        ProvenanceStyle::None => {}
    }
    Ok(style)
}

fn build_provenance(catalog: &SchemaCatalog, options: &ExportOptions) -> Provenance {
    Provenance {
        schema_id: options.schema_id.clone(),
        source_library_version: catalog.source_version().unwrap_or_else(|| UNKNOWN_VERSION.to_string()),
        consumer_library_version: crate::LIBRARY_VERSION.to_string(),
        git_revision: options
            .git_revision
            .clone()
            .or_else(|| git_revision(catalog.root())),
        exported_at: NanoTimestamp::now(),
        identity: options.identity_provider.as_ref().and_then(|p| p.identity()),
    }
}

/// HEAD commit of the repository containing `path`, if any
fn git_revision(path: &Path) -> Option<String> {
    let repo = git2::Repository::discover(path).ok()?;
    let head = repo.head().ok()?.peel_to_commit().ok()?;
    Some(head.id().to_string())
}

fn write_output(target: &Path, bytes: &[u8], overwrite: bool) -> Result<()> {
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = if overwrite {
        fs::File::create(target)?
    } else {
        OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(target)
            .map_err(|e| match e.kind() {
                ErrorKind::AlreadyExists => FulmenError::FileExists(target.to_path_buf()),
                _ => FulmenError::Io(e),
            })?
    };
    file.write_all(bytes)?;
    file.flush()?;
    Ok(())
}

/// Resolve `.` and `..` without touching the filesystem.
fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
