//! MIME type catalog and content sniffing

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::assets;
use crate::error::Result;

const CATALOG: &str = "foundry/mime-types.yaml";

/// Bytes read from a file for sniffing
pub const SNIFF_LEN: usize = 512;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MimeType {
    pub id: String,
    pub mime: String,
    pub name: String,
    #[serde(default)]
    pub extensions: Vec<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl MimeType {
    /// First listed extension, without a dot
    pub fn canonical_extension(&self) -> Option<&str> {
        self.extensions.first().map(String::as_str)
    }
}

#[derive(Debug, Deserialize)]
struct MimeFile {
    version: String,
    types: Vec<MimeType>,
}

#[derive(Debug)]
pub struct MimeCatalog {
    pub version: String,
    types: Vec<MimeType>,
    by_id: HashMap<String, usize>,
    by_mime: HashMap<String, usize>,
    by_extension: HashMap<String, usize>,
}

impl MimeCatalog {
    fn build(file: MimeFile) -> Self {
        let mut by_id = HashMap::new();
        let mut by_mime = HashMap::new();
        let mut by_extension = HashMap::new();

        for (index, entry) in file.types.iter().enumerate() {
            if by_id.insert(entry.id.to_ascii_lowercase(), index).is_some() {
                assets::load_failure(CATALOG, &format!("duplicate id {}", entry.id));
            }
            by_mime.insert(entry.mime.to_ascii_lowercase(), index);
            for ext in &entry.extensions {
                // first declaration wins when two types share an extension
                by_extension.entry(ext.to_ascii_lowercase()).or_insert(index);
            }
        }

        Self {
            version: file.version,
            types: file.types,
            by_id,
            by_mime,
            by_extension,
        }
    }

    pub fn types(&self) -> &[MimeType] {
        &self.types
    }

    pub fn by_id(&self, id: &str) -> Option<&MimeType> {
        self.by_id.get(&id.trim().to_ascii_lowercase()).map(|&i| &self.types[i])
    }

    /// Parameters such as `; charset=utf-8` are ignored
    pub fn by_mime(&self, mime: &str) -> Option<&MimeType> {
        let essence = mime.split(';').next().unwrap_or_default().trim().to_ascii_lowercase();
        self.by_mime.get(&essence).map(|&i| &self.types[i])
    }

    pub fn by_extension(&self, ext: &str) -> Option<&MimeType> {
        let ext = ext.trim();
        let ext = ext.strip_prefix('.').unwrap_or(ext).to_ascii_lowercase();
        self.by_extension.get(&ext).map(|&i| &self.types[i])
    }
}

pub fn catalog() -> &'static MimeCatalog {
    static CELL: OnceLock<MimeCatalog> = OnceLock::new();
    CELL.get_or_init(|| {
        let catalog = MimeCatalog::build(assets::load_yaml_catalog(CATALOG));
        tracing::debug!(count = catalog.types.len(), "loaded mime catalog");
        catalog
    })
}

pub fn mime_type(id: &str) -> Option<&'static MimeType> {
    catalog().by_id(id)
}

pub fn mime_by_type(mime: &str) -> Option<&'static MimeType> {
    catalog().by_mime(mime)
}

pub fn mime_by_extension(ext: &str) -> Option<&'static MimeType> {
    catalog().by_extension(ext)
}

const MAGIC: &[(&[u8], &str)] = &[
    (b"\x89PNG\r\n\x1a\n", "png"),
    (b"\xff\xd8\xff", "jpeg"),
    (b"GIF87a", "gif"),
    (b"GIF89a", "gif"),
    (b"%PDF-", "pdf"),
    (b"PK\x03\x04", "zip"),
    (b"\x1f\x8b", "gzip"),
];

/// Best-effort MIME detection from leading content.
///
/// Binary signatures are checked first, then text heuristics for the
/// structured formats in the catalog. Returns `None` for empty input.
pub fn detect_mime_type(content: &[u8]) -> Option<&'static MimeType> {
    if content.is_empty() {
        return None;
    }
    for (magic, id) in MAGIC {
        if content.starts_with(magic) {
            return mime_type(id);
        }
    }

    let text = match std::str::from_utf8(content) {
        Ok(text) => text,
        // sniff windows may cut a multi-byte sequence in half
        Err(e) if e.error_len().is_none() => {
            std::str::from_utf8(&content[..e.valid_up_to()]).unwrap_or_default()
        }
        Err(_) => return mime_type("octet-stream"),
    };
    if text.contains('\0') {
        return mime_type("octet-stream");
    }

    mime_type(sniff_text(text.trim_start_matches('\u{feff}')))
}

fn sniff_text(text: &str) -> &'static str {
    let trimmed = text.trim_start();
    let lower = trimmed.get(..trimmed.len().min(64)).unwrap_or_default().to_ascii_lowercase();

    let lines: Vec<&str> = trimmed.lines().take(10).collect();
    if lines.first().is_some_and(|l| is_toml_table(l)) && lines.iter().any(|l| l.contains(" = ")) {
        return "toml";
    }
    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        let lines: Vec<&str> = trimmed.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
        if lines.len() > 1 && lines.iter().all(|l| l.starts_with('{') && l.ends_with('}')) {
            return "ndjson";
        }
        return "json";
    }
    if lower.starts_with("<!doctype html") || lower.starts_with("<html") {
        return "html";
    }
    if lower.starts_with("<?xml") || trimmed.starts_with('<') {
        return "xml";
    }
    if trimmed.starts_with("---") || trimmed.starts_with("%YAML") {
        return "yaml";
    }
    if trimmed.starts_with("# ") || trimmed.starts_with("## ") {
        return "markdown";
    }

    if lines.iter().any(|l| l.contains(" = ")) && !lines.iter().any(|l| is_yaml_mapping_line(l)) {
        return "toml";
    }
    if looks_like_csv(&lines) {
        return "csv";
    }
    if lines.iter().any(|l| is_yaml_mapping_line(l)) {
        return "yaml";
    }
    "text"
}

fn is_toml_table(line: &str) -> bool {
    let line = line.trim();
    line.len() > 2
        && line.starts_with('[')
        && line.ends_with(']')
        && line[1..line.len() - 1]
            .trim_matches(|c| c == '[' || c == ']')
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
}

fn looks_like_csv(lines: &[&str]) -> bool {
    if lines.len() < 2 {
        return false;
    }
    let columns = lines[0].matches(',').count();
    columns > 0 && lines.iter().all(|l| l.matches(',').count() == columns)
}

fn is_yaml_mapping_line(line: &str) -> bool {
    let line = line.trim_start_matches("- ");
    match line.split_once(':') {
        Some((key, rest)) => {
            !key.is_empty()
                && !key.contains(' ')
                && (rest.is_empty() || rest.starts_with(' '))
        }
        None => false,
    }
}

/// [`detect_mime_type`] over the first [`SNIFF_LEN`] bytes of a file
pub fn detect_mime_type_from_file(path: &Path) -> Result<Option<&'static MimeType>> {
    let file = File::open(path)?;
    let mut buf = Vec::with_capacity(SNIFF_LEN);
    file.take(SNIFF_LEN as u64).read_to_end(&mut buf)?;
    Ok(detect_mime_type(&buf))
}
