//! Offline `$ref` resolution
//!
//! | URL                                           | Resolution                       |
//! |-----------------------------------------------|----------------------------------|
//! | `file://…`                                    | filesystem open                  |
//! | `http(s)://json-schema.org/draft/2020-12/…`   | `meta/draft-2020-12/…`           |
//! | `http(s)://json-schema.org/draft-07/…`        | `meta/draft-07/…`                |
//! | `https://<vendor domain>/…`                   | path under the catalog root      |
//! | `json-schema:///…` (relative, no `$id`)       | path under the referrer's dir    |
//! | anything else                                 | error                            |
//!
//! Metaschema lookups fall back to the copies embedded in the library when
//! the catalog root has no `meta/` directory.
//!
//! `jsonschema` only resolves a reference when validation first reaches it,
//! so [`CatalogResolver::unresolved_references`] walks every reachable
//! `$ref` up front and reports the ones this table cannot serve.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, bail, Context};
use jsonschema::{SchemaResolver, SchemaResolverError};
use serde_json::Value;
use url::Url;

use super::diagnostic::Diagnostic;
use crate::assets;

const META_DIR: &str = "meta";
/// Base `jsonschema` gives documents without an `$id`
const DEFAULT_BASE: &str = "json-schema:///";
const REFERENCE_KEYWORDS: [&str; 2] = ["$ref", "$dynamicRef"];
/// Keywords whose values are instance data, not subschemas
const DATA_KEYWORDS: [&str; 4] = ["const", "default", "enum", "examples"];
/// Keywords whose values map names to subschemas
const SCHEMA_MAP_KEYWORDS: [&str; 5] = ["properties", "patternProperties", "$defs", "definitions", "dependentSchemas"];

/// Resolver bound to one catalog root
#[derive(Debug, Clone)]
pub struct CatalogResolver {
    root: PathBuf,
    vendor_domain: String,
    base_dir: Option<PathBuf>,
}

impl CatalogResolver {
    pub fn new(root: impl Into<PathBuf>, vendor_domain: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            vendor_domain: vendor_domain.into(),
            base_dir: None,
        }
    }

    /// Resolver that only knows the embedded metaschemas
    pub fn embedded() -> Self {
        Self::new(PathBuf::new(), crate::config::DEFAULT_VENDOR_DOMAIN)
    }

    /// Directory that relative references without an `$id` resolve against
    pub fn with_base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(dir.into());
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a reference URL to a document.
    pub fn load(&self, url: &Url) -> anyhow::Result<Value> {
        let mut url = url.clone();
        url.set_fragment(None);
        tracing::debug!(url = %url, "resolving schema reference");

        match url.scheme() {
            "file" => {
                let path = url
                    .to_file_path()
                    .map_err(|_| anyhow!("invalid file URL {}", url))?;
                read_document(&path)
            }
            "json-schema" => {
                let base = self
                    .base_dir
                    .as_deref()
                    .ok_or_else(|| anyhow!("relative reference {} has no base directory", url))?;
                let relative = url.path().trim_start_matches('/');
                read_document(&base.join(relative))
            }
            "http" | "https" => {
                let host = url.host_str().unwrap_or_default();
                let path = url.path().trim_start_matches('/');
                if host == "json-schema.org" {
                    self.load_metaschema(path)
                } else if host == self.vendor_domain && url.scheme() == "https" {
                    read_document(&self.root.join(path))
                } else {
                    bail!("refusing to fetch remote schema {}", url)
                }
            }
            other => bail!("unsupported $ref scheme '{}' in {}", other, url),
        }
    }

    fn load_metaschema(&self, path: &str) -> anyhow::Result<Value> {
        let relative = if let Some(rest) = path.strip_prefix("draft/2020-12/") {
            format!("draft-2020-12/{}", rest)
        } else if let Some(rest) = path.strip_prefix("draft-07/") {
            format!("draft-07/{}", rest)
        } else {
            bail!("no embedded metaschema for json-schema.org/{}", path)
        };
        let relative = if relative.ends_with(".json") {
            relative
        } else {
            format!("{}.json", relative)
        };

        if !self.root.as_os_str().is_empty() {
            let on_disk = self.root.join(META_DIR).join(&relative);
            if on_disk.is_file() {
                return read_document(&on_disk);
            }
        }
        let content = assets::metaschema_str(&relative)
            .ok_or_else(|| anyhow!("metaschema {} is not embedded", relative))?;
        tracing::debug!(metaschema = %relative, "using embedded metaschema");
        Ok(serde_json::from_str(content)?)
    }

    /// Load every external reference reachable from `schema`, following
    /// loaded documents transitively. Each failure becomes a `$ref`
    /// diagnostic pointing at the referring location in `schema`.
    pub(crate) fn unresolved_references(&self, schema: &Value, source: &str) -> Vec<Diagnostic> {
        let base = match Url::parse(DEFAULT_BASE) {
            Ok(base) => base,
            Err(err) => return vec![Diagnostic::error("", "$ref", err.to_string(), source)],
        };
        let mut walk = ReferenceWalk {
            resolver: self,
            source,
            visited: HashSet::new(),
            diagnostics: Vec::new(),
        };
        walk.document(schema, base, None);
        walk.diagnostics
    }
}

struct ReferenceWalk<'a> {
    resolver: &'a CatalogResolver,
    source: &'a str,
    visited: HashSet<Url>,
    diagnostics: Vec<Diagnostic>,
}

impl ReferenceWalk<'_> {
    /// `origin` is the location in the root schema that led here.
    fn document(&mut self, document: &Value, base: Url, origin: Option<&str>) {
        let mut local = HashSet::new();
        local.insert(base.clone());
        collect_ids(document, &base, &mut local);
        self.node(document, &base, "", origin, false, &local);
    }

    fn node(
        &mut self,
        node: &Value,
        base: &Url,
        pointer: &str,
        origin: Option<&str>,
        schema_map: bool,
        local: &HashSet<Url>,
    ) {
        match node {
            Value::Array(items) => {
                for (i, item) in items.iter().enumerate() {
                    self.node(item, base, &format!("{}/{}", pointer, i), origin, false, local);
                }
            }
            Value::Object(map) => {
                let base = if schema_map { base.clone() } else { scoped_base(map, base) };
                if !schema_map {
                    for keyword in REFERENCE_KEYWORDS {
                        if let Some(reference) = map.get(keyword).and_then(Value::as_str) {
                            self.reference(reference, &base, origin.unwrap_or(pointer), local);
                        }
                    }
                }
                for (key, value) in map {
                    if !schema_map && DATA_KEYWORDS.contains(&key.as_str()) {
                        continue;
                    }
                    let child = format!("{}/{}", pointer, escape_pointer(key));
                    let child_map = !schema_map && SCHEMA_MAP_KEYWORDS.contains(&key.as_str());
                    self.node(value, &base, &child, origin, child_map, local);
                }
            }
            _ => {}
        }
    }

    fn reference(&mut self, reference: &str, base: &Url, pointer: &str, local: &HashSet<Url>) {
        if reference.starts_with('#') {
            return;
        }
        let mut url = match base.join(reference) {
            Ok(url) => url,
            Err(err) => {
                self.fail(pointer, format!("invalid reference '{}': {}", reference, err));
                return;
            }
        };
        url.set_fragment(None);
        if local.contains(&url) || !self.visited.insert(url.clone()) {
            return;
        }

        match self.resolver.load(&url) {
            Ok(document) => self.document(&document, url, Some(pointer)),
            Err(err) => self.fail(pointer, format!("cannot resolve {}: {:#}", url, err)),
        }
    }

    fn fail(&mut self, pointer: &str, message: String) {
        tracing::debug!(pointer, %message, "unresolvable schema reference");
        self.diagnostics
            .push(Diagnostic::error(pointer, "$ref", message, self.source));
    }
}

fn scoped_base(map: &serde_json::Map<String, Value>, base: &Url) -> Url {
    map.get("$id")
        .and_then(Value::as_str)
        .filter(|id| !id.starts_with('#'))
        .and_then(|id| base.join(id).ok())
        .map(|mut url| {
            url.set_fragment(None);
            url
        })
        .unwrap_or_else(|| base.clone())
}

/// Every `$id` declared in `node`; references to them stay in-document.
fn collect_ids(node: &Value, base: &Url, out: &mut HashSet<Url>) {
    match node {
        Value::Array(items) => items.iter().for_each(|item| collect_ids(item, base, out)),
        Value::Object(map) => {
            let base = scoped_base(map, base);
            out.insert(base.clone());
            map.values().for_each(|value| collect_ids(value, &base, out));
        }
        _ => {}
    }
}

fn escape_pointer(token: &str) -> String {
    token.replace('~', "~0").replace('/', "~1")
}

impl SchemaResolver for CatalogResolver {
    fn resolve(
        &self,
        _root_schema: &Value,
        url: &Url,
        _original_reference: &str,
    ) -> Result<Arc<Value>, SchemaResolverError> {
        self.load(url).map(Arc::new)
    }
}

fn read_document(path: &Path) -> anyhow::Result<Value> {
    let bytes = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    super::parse_document(&bytes, &path.display().to_string()).map_err(anyhow::Error::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn resolver(root: &Path) -> CatalogResolver {
        CatalogResolver::new(root, "schemas.fulmenhq.dev")
    }

    #[test]
    fn test_embedded_metaschema_fallback() {
        let dir = TempDir::new().unwrap();
        let r = resolver(dir.path());
        let url = Url::parse("https://json-schema.org/draft/2020-12/meta/core#").unwrap();
        let doc = r.load(&url).unwrap();
        assert_eq!(doc["$id"], "https://json-schema.org/draft/2020-12/meta/core");

        let url = Url::parse("http://json-schema.org/draft-07/schema#").unwrap();
        assert!(r.load(&url).unwrap().get("definitions").is_some());
    }

    #[test]
    fn test_vendor_domain_maps_to_root() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("common/v1.0.0");
        fs::create_dir_all(&target).unwrap();
        fs::write(target.join("id.schema.yaml"), "type: string\n").unwrap();

        let r = resolver(dir.path());
        let url = Url::parse("https://schemas.fulmenhq.dev/common/v1.0.0/id.schema.yaml#/x").unwrap();
        assert_eq!(r.load(&url).unwrap()["type"], "string");
    }

    #[test]
    fn test_relative_and_file_refs() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.json"), r#"{"type":"integer"}"#).unwrap();

        let r = resolver(Path::new("/nonexistent")).with_base_dir(dir.path());
        let url = Url::parse("json-schema:///a.json").unwrap();
        assert_eq!(r.load(&url).unwrap()["type"], "integer");

        let file_url = Url::from_file_path(dir.path().join("a.json")).unwrap();
        assert_eq!(r.load(&file_url).unwrap()["type"], "integer");
    }

    #[test]
    fn test_unresolved_references_are_reported_at_the_referrer() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("shared.json"), r#"{"$ref": "missing.json"}"#).unwrap();
        let r = resolver(dir.path()).with_base_dir(dir.path());

        let schema = serde_json::json!({
            "type": "object",
            "properties": {
                "a": {"$ref": "shared.json"},
                "b": {"$ref": "https://example.com/evil.json"},
                "c": {"$ref": "#/$defs/local"},
                "d": {"enum": [{"$ref": "not-a-reference.json"}]}
            },
            "$defs": {"local": {"type": "string"}}
        });
        let diagnostics = r.unresolved_references(&schema, "compile");
        let pointers: Vec<&str> = diagnostics.iter().map(|d| d.pointer.as_str()).collect();
        assert_eq!(pointers, vec!["/properties/a", "/properties/b"]);
        assert!(diagnostics.iter().all(|d| d.keyword == "$ref" && d.source == "compile"));
        assert!(diagnostics[0].message.contains("missing.json"));
    }

    #[test]
    fn test_references_resolve_against_id() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("common/v1.0.0");
        fs::create_dir_all(&target).unwrap();
        fs::write(target.join("id.schema.json"), r#"{"type":"string"}"#).unwrap();

        let schema = serde_json::json!({
            "$id": "https://schemas.fulmenhq.dev/common/v1.0.0/record.schema.json",
            "properties": {
                "id": {"$ref": "id.schema.json"},
                "self": {"$ref": "record.schema.json#/properties/id"}
            }
        });
        assert!(resolver(dir.path()).unresolved_references(&schema, "compile").is_empty());
    }

    #[test]
    fn test_remote_refs_rejected() {
        let r = resolver(Path::new("/nonexistent"));
        for raw in [
            "https://example.com/schema.json",
            "http://schemas.fulmenhq.dev/x.json",
            "ftp://json-schema.org/draft-07/schema",
            "https://json-schema.org/draft-04/schema",
        ] {
            assert!(r.load(&Url::parse(raw).unwrap()).is_err(), "{}", raw);
        }
    }
}
