//! Schema catalog
//!
//! Indexes a schema directory tree on first access. Every `.json`, `.yaml`
//! and `.yml` file outside the reserved `meta/` directory becomes a
//! [`SchemaDescriptor`] keyed by `<category>/<version>/<name>`.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use walkdir::WalkDir;

use super::diagnostic::Diagnostic;
use super::resolver::CatalogResolver;
use super::validator::{self, Validator};
use super::{canonical_bytes, parse_document};
use crate::checksum::Checksum;
use crate::config::{FulmenConfig, DEFAULT_VENDOR_DOMAIN};
use crate::error::{FulmenError, Result};
use crate::similarity::{suggest, SuggestOptions};
use crate::version::CatalogVersion;

const META_DIR: &str = "meta";
const VERSION_FILE: &str = "VERSION";
const ROOT_MARKER: &str = "schemas/meta/draft-2020-12";
const MAX_ANCESTORS: usize = 4;

/// Serialization a schema file was authored in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    Json,
    Yaml,
}

/// Index entry for one schema file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaDescriptor {
    /// `<category>/<version>/<name>`
    pub id: String,
    /// Category path, possibly nested (e.g., `observability/logging`)
    pub category: String,
    pub version: String,
    pub name: String,
    pub path: PathBuf,
    /// Declared `$schema` URL
    pub draft: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub format: SourceFormat,
    /// SHA-256 of the canonical JSON
    pub checksum: Checksum,
}

struct Entry {
    descriptor: SchemaDescriptor,
    document: Arc<Value>,
}

/// A lazily indexed schema tree
pub struct SchemaCatalog {
    root: PathBuf,
    vendor_domain: String,
    index: OnceLock<BTreeMap<String, Entry>>,
    validators: RwLock<HashMap<String, Arc<Validator>>>,
}

impl std::fmt::Debug for SchemaCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaCatalog")
            .field("root", &self.root)
            .field("vendor_domain", &self.vendor_domain)
            .field("loaded", &self.index.get().is_some())
            .finish()
    }
}

impl SchemaCatalog {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            vendor_domain: DEFAULT_VENDOR_DOMAIN.to_string(),
            index: OnceLock::new(),
            validators: RwLock::new(HashMap::new()),
        }
    }

    /// Host whose `$ref` URLs resolve under this catalog's root
    pub fn with_vendor_domain(mut self, domain: impl Into<String>) -> Self {
        self.vendor_domain = domain.into();
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Descriptors whose id starts with `prefix`, ascending by id
    pub fn list_schemas(&self, prefix: &str) -> Result<Vec<&SchemaDescriptor>> {
        Ok(self
            .index()?
            .range(prefix.to_string()..)
            .take_while(|(id, _)| id.starts_with(prefix))
            .map(|(_, entry)| &entry.descriptor)
            .collect())
    }

    /// Look up a descriptor; misses carry close identifiers as suggestions.
    pub fn get_schema(&self, id: &str) -> Result<&SchemaDescriptor> {
        self.entry(id).map(|e| &e.descriptor)
    }

    /// Canonical JSON bytes of a schema
    pub fn schema_bytes(&self, id: &str) -> Result<Vec<u8>> {
        Ok(canonical_bytes(&self.entry(id)?.document))
    }

    pub fn schema_value(&self, id: &str) -> Result<Arc<Value>> {
        Ok(Arc::clone(&self.entry(id)?.document))
    }

    /// Highest version of `category/*/name`
    pub fn latest(&self, category: &str, name: &str) -> Result<&SchemaDescriptor> {
        self.index()?
            .values()
            .map(|e| &e.descriptor)
            .filter(|d| d.category == category && d.name == name)
            .max_by(|a, b| CatalogVersion::parse(&a.version).cmp(&CatalogVersion::parse(&b.version)))
            .ok_or_else(|| FulmenError::not_found("schema", format!("{}/*/{}", category, name)))
    }

    /// Compare a catalog schema against other bytes (JSON or YAML).
    ///
    /// Returns a single "schemas differ" diagnostic on mismatch; use
    /// [`super::diff`] for the full delta.
    pub fn compare_schema(&self, id: &str, other: &[u8]) -> Result<Vec<Diagnostic>> {
        let source = self.schema_bytes(id)?;
        let other = canonical_bytes(&parse_document(other, "comparison schema")?);
        if source == other {
            Ok(Vec::new())
        } else {
            Ok(vec![Diagnostic::error("", "compare", "schemas differ", "compare")])
        }
    }

    /// Compiled validator for a schema, cached for the catalog's lifetime
    pub fn validator_by_id(&self, id: &str) -> Result<Arc<Validator>> {
        if let Some(validator) = self.validators.read().get(id) {
            tracing::trace!(schema_id = id, "validator cache hit");
            return Ok(Arc::clone(validator));
        }

        let entry = self.entry(id)?;
        let compiled = Arc::new(Validator::compile(id, &entry.document, self.resolver_for(&entry.descriptor))?);

        let mut cache = self.validators.write();
        Ok(Arc::clone(cache.entry(id.to_string()).or_insert(compiled)))
    }

    pub fn validate_data_by_id(&self, id: &str, value: &Value) -> Result<Vec<Diagnostic>> {
        Ok(self.validator_by_id(id)?.validate_data(value))
    }

    pub fn validate_json_by_id(&self, id: &str, bytes: &[u8]) -> Result<Vec<Diagnostic>> {
        self.validator_by_id(id)?.validate_json(bytes)
    }

    pub fn validate_file_by_id(&self, id: &str, path: impl AsRef<Path>) -> Result<Vec<Diagnostic>> {
        self.validator_by_id(id)?.validate_file(path)
    }

    /// Check a catalog schema against its metaschema
    pub fn validate_schema_by_id(&self, id: &str) -> Result<Vec<Diagnostic>> {
        let entry = self.entry(id)?;
        Ok(validator::validate_schema_value(
            id,
            &entry.document,
            self.resolver_for(&entry.descriptor),
        ))
    }

    /// Contents of the root `VERSION` file, if present
    pub fn source_version(&self) -> Option<String> {
        fs::read_to_string(self.root.join(VERSION_FILE))
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn resolver_for(&self, descriptor: &SchemaDescriptor) -> CatalogResolver {
        let resolver = CatalogResolver::new(&self.root, &self.vendor_domain);
        match descriptor.path.parent() {
            Some(dir) => resolver.with_base_dir(dir),
            None => resolver,
        }
    }

    fn entry(&self, id: &str) -> Result<&Entry> {
        let index = self.index()?;
        index.get(id).ok_or_else(|| {
            let suggestions = suggest(id, &index.keys().collect::<Vec<_>>(), &SuggestOptions::default())
                .into_iter()
                .map(|s| s.value)
                .collect();
            FulmenError::NotFound {
                kind: "schema",
                key: id.to_string(),
                suggestions,
            }
        })
    }

    fn index(&self) -> Result<&BTreeMap<String, Entry>> {
        if let Some(index) = self.index.get() {
            return Ok(index);
        }
        let built = build_index(&self.root)?;
        Ok(self.index.get_or_init(|| built))
    }
}

fn build_index(root: &Path) -> Result<BTreeMap<String, Entry>> {
    tracing::debug!(root = %root.display(), "indexing schema catalog");
    if !root.is_dir() {
        return Err(FulmenError::not_found("schema catalog root", root.display().to_string()));
    }

    let mut index: BTreeMap<String, Entry> = BTreeMap::new();
    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !(e.depth() == 1 && e.file_type().is_dir() && e.file_name() == META_DIR));

    for entry in walker {
        let entry = entry.map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let format = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => SourceFormat::Json,
            Some("yaml") | Some("yml") => SourceFormat::Yaml,
            _ => continue,
        };

        let relative = path.strip_prefix(root).unwrap_or(path);
        let Some((category, version, name)) = split_identifier(relative) else {
            tracing::warn!(path = %path.display(), "skipping schema outside <category>/<version>/ layout");
            continue;
        };
        let id = format!("{}/{}/{}", category, version, name);

        let bytes = fs::read(path)?;
        let document = match format {
            SourceFormat::Json => serde_json::from_slice::<Value>(&bytes)
                .map_err(|e| FulmenError::parse(path.display().to_string(), e))?,
            SourceFormat::Yaml => serde_yaml::from_slice::<Value>(&bytes)
                .map_err(|e| FulmenError::parse(path.display().to_string(), e))?,
        };
        if !document.is_object() {
            return Err(FulmenError::parse(path.display().to_string(), "schema is not a JSON object"));
        }

        let text = |key: &str| document.get(key).and_then(Value::as_str).map(String::from);
        let descriptor = SchemaDescriptor {
            id: id.clone(),
            category,
            version,
            name,
            path: path.to_path_buf(),
            draft: text("$schema"),
            title: text("title"),
            description: text("description"),
            format,
            checksum: Checksum::of_value(&document),
        };

        if let Some(existing) = index.get(&id) {
            return Err(FulmenError::DuplicateSchemaId {
                id,
                first: existing.descriptor.path.clone(),
                second: path.to_path_buf(),
            });
        }
        index.insert(
            id,
            Entry {
                descriptor,
                document: Arc::new(document),
            },
        );
    }

    tracing::info!(root = %root.display(), schemas = index.len(), "schema catalog loaded");
    Ok(index)
}

/// `(category, version, name)` from a root-relative path
fn split_identifier(relative: &Path) -> Option<(String, String, String)> {
    let segments: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    if segments.len() < 3 {
        return None;
    }

    let (file, dirs) = segments.split_last()?;
    let (version, category) = dirs.split_last()?;
    let stem = Path::new(file).file_stem()?.to_string_lossy().into_owned();
    let name = stem.strip_suffix(".schema").unwrap_or(&stem).to_string();
    Some((category.join("/"), version.clone(), name))
}

/// Locate the catalog root used by [`default_catalog`].
///
/// Precedence: `schemas.root` from configuration, then a `schemas/` directory
/// carrying embedded metaschemas in the working directory or up to four
/// ancestors, then the catalog shipped with this crate.
pub fn discover_root(config: &FulmenConfig) -> PathBuf {
    if let Some(root) = config.schema_root() {
        return root;
    }

    if let Ok(cwd) = std::env::current_dir() {
        for dir in cwd.ancestors().take(MAX_ANCESTORS + 1) {
            if dir.join(ROOT_MARKER).is_dir() {
                return dir.join("schemas");
            }
        }
    }

    tracing::debug!("falling back to bundled schema catalog");
    PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/schemas"))
}

/// Process-wide catalog, located once on first use
pub fn default_catalog() -> &'static SchemaCatalog {
    static DEFAULT: OnceLock<SchemaCatalog> = OnceLock::new();
    DEFAULT.get_or_init(|| {
        let config = FulmenConfig::load().unwrap_or_else(|err| {
            tracing::debug!(error = %err, "configuration unavailable, using defaults");
            FulmenConfig::default()
        });
        SchemaCatalog::new(discover_root(&config)).with_vendor_domain(config.schemas.vendor_domain.clone())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn write(root: &Path, relative: &str, content: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn sample_catalog() -> (TempDir, SchemaCatalog) {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "VERSION", "0.4.2\n");
        write(dir.path(), "meta/draft-07/schema.json", "{}");
        write(
            dir.path(),
            "pathfinder/v1.0.0/path-result.schema.json",
            r#"{"$schema":"https://json-schema.org/draft/2020-12/schema","title":"Path Result","type":"object","required":["relativePath"]}"#,
        );
        write(
            dir.path(),
            "observability/logging/v1.0.0/log-event.schema.yaml",
            "title: Log Event\ntype: object\n",
        );
        write(dir.path(), "config/v1.0.0/app.json", r#"{"type":"object"}"#);
        write(dir.path(), "config/v1.2.0/app.json", r#"{"type":"object","title":"newer"}"#);
        write(dir.path(), "config/v1.10.0/app.json", r#"{"type":"object","title":"newest"}"#);
        write(dir.path(), "README.md", "# not a schema");
        let catalog = SchemaCatalog::new(dir.path());
        (dir, catalog)
    }

    #[test]
    fn test_identifiers_and_metadata() {
        let (_dir, catalog) = sample_catalog();
        let ids: Vec<_> = catalog.list_schemas("").unwrap().iter().map(|d| d.id.clone()).collect();
        assert_eq!(
            ids,
            vec![
                "config/v1.0.0/app",
                "config/v1.10.0/app",
                "config/v1.2.0/app",
                "observability/logging/v1.0.0/log-event",
                "pathfinder/v1.0.0/path-result",
            ]
        );

        let log = catalog.get_schema("observability/logging/v1.0.0/log-event").unwrap();
        assert_eq!(log.category, "observability/logging");
        assert_eq!(log.format, SourceFormat::Yaml);
        assert_eq!(log.title.as_deref(), Some("Log Event"));

        let result = catalog.get_schema("pathfinder/v1.0.0/path-result").unwrap();
        assert_eq!(result.draft.as_deref(), Some("https://json-schema.org/draft/2020-12/schema"));
        assert_eq!(result.name, "path-result");
    }

    #[test]
    fn test_prefix_listing() {
        let (_dir, catalog) = sample_catalog();
        assert_eq!(catalog.list_schemas("config/").unwrap().len(), 3);
        assert_eq!(catalog.list_schemas("pathfinder").unwrap().len(), 1);
        assert!(catalog.list_schemas("zzz").unwrap().is_empty());
    }

    #[test]
    fn test_missing_schema_suggests() {
        let (_dir, catalog) = sample_catalog();
        let err = catalog.get_schema("pathfinder/v1.0.0/path-reslt").unwrap_err();
        match err {
            FulmenError::NotFound { suggestions, .. } => {
                assert_eq!(suggestions, vec!["pathfinder/v1.0.0/path-result".to_string()]);
            }
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn test_duplicate_ids_are_fatal() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "a/v1/x.json", "{}");
        write(dir.path(), "a/v1/x.schema.yaml", "{}");
        let catalog = SchemaCatalog::new(dir.path());
        assert!(matches!(
            catalog.list_schemas(""),
            Err(FulmenError::DuplicateSchemaId { .. })
        ));
    }

    #[test]
    fn test_latest_and_source_version() {
        let (_dir, catalog) = sample_catalog();
        assert_eq!(catalog.latest("config", "app").unwrap().version, "v1.10.0");
        assert!(catalog.latest("config", "nope").is_err());
        assert_eq!(catalog.source_version().as_deref(), Some("0.4.2"));
    }

    #[test]
    fn test_compare_schema() {
        let (_dir, catalog) = sample_catalog();
        let id = "observability/logging/v1.0.0/log-event";
        assert!(catalog.compare_schema(id, br#"{"type":"object","title":"Log Event"}"#).unwrap().is_empty());
        let diffs = catalog.compare_schema(id, b"title: Other\ntype: object\n").unwrap();
        assert_eq!(diffs.len(), 1);
        assert_eq!(diffs[0].message, "schemas differ");
    }

    #[test]
    fn test_validator_cache_and_validation() {
        let (_dir, catalog) = sample_catalog();
        let id = "pathfinder/v1.0.0/path-result";
        let first = catalog.validator_by_id(id).unwrap();
        let second = catalog.validator_by_id(id).unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        let diagnostics = catalog.validate_data_by_id(id, &json!({})).unwrap();
        assert_eq!(diagnostics[0].keyword, "required");
        assert!(catalog.validate_data_by_id(id, &json!({"relativePath": "x"})).unwrap().is_empty());
    }

    #[test]
    fn test_checksum_is_format_independent() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "a/v1/json.json", r#"{"type":"object","title":"T"}"#);
        write(dir.path(), "a/v1/yaml.yaml", "title: T\ntype: object\n");
        let catalog = SchemaCatalog::new(dir.path());
        assert_eq!(
            catalog.get_schema("a/v1/json").unwrap().checksum,
            catalog.get_schema("a/v1/yaml").unwrap().checksum
        );
    }

    #[test]
    fn test_split_identifier() {
        assert_eq!(
            split_identifier(Path::new("a/b/v2/thing.schema.json")),
            Some(("a/b".into(), "v2".into(), "thing".into()))
        );
        assert_eq!(split_identifier(Path::new("v1/thing.json")), None);
    }
}
