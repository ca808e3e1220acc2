//! Embedded catalog assets
//!
//! Reference catalogs, the similarity fixture corpus and the JSON Schema
//! metaschemas are compiled into the library so lookups work offline.

use include_dir::{include_dir, Dir};

static ASSETS: Dir<'static> = include_dir!("$CARGO_MANIFEST_DIR/assets");
static METASCHEMAS: Dir<'static> = include_dir!("$CARGO_MANIFEST_DIR/schemas/meta");

/// UTF-8 content of an embedded asset, e.g. `foundry/patterns.yaml`
pub(crate) fn asset_str(path: &str) -> Option<&'static str> {
    ASSETS.get_file(path).and_then(|f| f.contents_utf8())
}

/// UTF-8 content of an embedded metaschema, relative to `meta/`
pub(crate) fn metaschema_str(path: &str) -> Option<&'static str> {
    METASCHEMAS.get_file(path).and_then(|f| f.contents_utf8())
}

/// Load and parse a required embedded YAML catalog.
///
/// Catalogs are required for correct operation, so failure panics with
/// enough platform detail to file a support ticket.
pub(crate) fn load_yaml_catalog<T: serde::de::DeserializeOwned>(path: &str) -> T {
    let content = asset_str(path).unwrap_or_else(|| load_failure(path, "asset missing from build"));
    serde_yaml::from_str(content).unwrap_or_else(|e| load_failure(path, &e.to_string()))
}

pub(crate) fn load_failure(what: &str, reason: &str) -> ! {
    panic!(
        "rsfulmen {}: failed to load embedded catalog {}: {} (os={}, arch={})",
        env!("CARGO_PKG_VERSION"),
        what,
        reason,
        std::env::consts::OS,
        std::env::consts::ARCH,
    )
}
