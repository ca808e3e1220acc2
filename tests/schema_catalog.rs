//! Schema catalog tests against the catalog shipped with the crate

use std::path::PathBuf;

use rsfulmen::schema::{diff_values, SchemaCatalog, SourceFormat};
use rsfulmen::{FulmenError, Severity};
use rstest::rstest;
use serde_json::json;

fn shipped_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("schemas")
}

fn catalog() -> SchemaCatalog {
    SchemaCatalog::new(shipped_root())
}

#[test]
fn test_listing_is_sorted_and_stable() {
    let catalog = catalog();
    let first: Vec<String> = catalog.list_schemas("").unwrap().iter().map(|d| d.id.clone()).collect();
    let second: Vec<String> = catalog.list_schemas("").unwrap().iter().map(|d| d.id.clone()).collect();

    assert_eq!(
        first,
        vec![
            "config/v1.0.0/app-config",
            "observability/logging/v1.0.0/log-event",
            "pathfinder/v1.0.0/path-metadata",
            "pathfinder/v1.0.0/path-result",
        ]
    );
    assert_eq!(first, second);

    // a fresh catalog over the same tree agrees
    let third: Vec<String> = SchemaCatalog::new(shipped_root())
        .list_schemas("")
        .unwrap()
        .iter()
        .map(|d| d.id.clone())
        .collect();
    assert_eq!(first, third);
}

#[test]
fn test_meta_directory_is_not_indexed() {
    let catalog = catalog();
    assert!(catalog.list_schemas("meta").unwrap().is_empty());
    assert_eq!(catalog.list_schemas("pathfinder/").unwrap().len(), 2);
}

#[test]
fn test_descriptor_metadata() {
    let catalog = catalog();
    let descriptor = catalog.get_schema("config/v1.0.0/app-config").unwrap();
    assert_eq!(descriptor.category, "config");
    assert_eq!(descriptor.version, "v1.0.0");
    assert_eq!(descriptor.name, "app-config");
    assert_eq!(descriptor.format, SourceFormat::Yaml);
    assert_eq!(descriptor.title.as_deref(), Some("Application Config"));
    assert!(descriptor.draft.as_deref().unwrap().contains("draft-07"));

    // YAML sources are served as canonical JSON
    let bytes = catalog.schema_bytes("config/v1.0.0/app-config").unwrap();
    assert!(bytes.starts_with(b"{\"$id\":"));
    assert!(descriptor.checksum.verify(&bytes));
}

#[test]
fn test_missing_schema_suggests_neighbours() {
    let err = catalog().get_schema("pathfinder/v1.0.0/path-reslt").unwrap_err();
    match err {
        FulmenError::NotFound { suggestions, .. } => {
            assert_eq!(suggestions.first().map(String::as_str), Some("pathfinder/v1.0.0/path-result"));
        }
        other => panic!("expected NotFound, got {:?}", other),
    }
}

#[test]
fn test_missing_required_property() {
    let diagnostics = catalog()
        .validate_data_by_id("pathfinder/v1.0.0/path-result", &json!({"sourcePath": "/srv/data/a.txt"}))
        .unwrap();
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].keyword, "required");
    assert!(diagnostics[0].message.contains("relativePath"));
    assert_eq!(diagnostics[0].severity, Severity::Error);
}

#[test]
fn test_cross_schema_reference_resolves_locally() {
    let catalog = catalog();
    let payload = json!({
        "relativePath": "a.txt",
        "sourcePath": "/srv/data/a.txt",
        "metadata": {"size": -1, "checksum": "md5:abc"}
    });
    let diagnostics = catalog.validate_data_by_id("pathfinder/v1.0.0/path-result", &payload).unwrap();
    let keywords: Vec<&str> = diagnostics.iter().map(|d| d.keyword.as_str()).collect();
    assert!(keywords.contains(&"minimum"), "{:?}", diagnostics);
    assert!(keywords.contains(&"pattern"), "{:?}", diagnostics);
    assert!(diagnostics.iter().all(|d| d.pointer.starts_with("/metadata/")));
}

#[test]
fn test_validator_is_cached() {
    let catalog = catalog();
    let a = catalog.validator_by_id("observability/logging/v1.0.0/log-event").unwrap();
    let b = catalog.validator_by_id("observability/logging/v1.0.0/log-event").unwrap();
    assert!(std::sync::Arc::ptr_eq(&a, &b));
}

#[rstest]
#[case("config/v1.0.0/app-config")]
#[case("observability/logging/v1.0.0/log-event")]
#[case("pathfinder/v1.0.0/path-metadata")]
#[case("pathfinder/v1.0.0/path-result")]
fn test_shipped_schemas_pass_metaschema(#[case] id: &str) {
    let diagnostics = catalog().validate_schema_by_id(id).unwrap();
    assert!(diagnostics.is_empty(), "{}: {:?}", id, diagnostics);
}

#[rstest]
#[case::json(r#"{"name": "svc", "port": 8080}"#, 0)]
#[case::yaml("name: svc\nlogging:\n  level: info\n", 0)]
#[case::bad_port("name: svc\nport: 70000\n", 1)]
#[case::unknown_key("name: svc\ncolour: blue\n", 1)]
fn test_validate_file_sniffs_format(#[case] content: &str, #[case] expected: usize) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("input.txt");
    std::fs::write(&path, content).unwrap();
    let diagnostics = catalog().validate_file_by_id("config/v1.0.0/app-config", &path).unwrap();
    assert_eq!(diagnostics.len(), expected, "{:?}", diagnostics);
}

#[test]
fn test_compare_schema() {
    let catalog = catalog();
    let id = "pathfinder/v1.0.0/path-metadata";
    let source = catalog.schema_bytes(id).unwrap();
    assert!(catalog.compare_schema(id, &source).unwrap().is_empty());

    let mut changed = (*catalog.schema_value(id).unwrap()).clone();
    changed["title"] = json!("Renamed");
    let diagnostics = catalog
        .compare_schema(id, serde_json::to_string(&changed).unwrap().as_bytes())
        .unwrap();
    assert_eq!(diagnostics.len(), 1);
    assert!(diagnostics[0].message.contains("schemas differ"));

    let delta = diff_values(&catalog.schema_value(id).unwrap(), &changed);
    assert_eq!(delta.len(), 1);
    assert_eq!(delta[0].path, "title");
}

#[test]
fn test_source_version() {
    assert_eq!(catalog().source_version().as_deref(), Some("0.1.0"));
}

#[rstest]
#[case::remote_host("https://example.com/evil.json")]
#[case::missing_file("nope.schema.json")]
fn test_unresolvable_reference_is_a_compile_error(#[case] reference: &str) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pathfinder/v1.0.0/broken.schema.json");
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    let schema = json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "type": "object",
        "properties": {"x": {"$ref": reference}}
    });
    std::fs::write(&path, serde_json::to_vec(&schema).unwrap()).unwrap();

    let catalog = SchemaCatalog::new(dir.path());
    let id = "pathfinder/v1.0.0/broken";

    let err = catalog.validator_by_id(id).unwrap_err();
    assert!(matches!(err, FulmenError::Compilation { .. }));

    let diagnostics = catalog.validate_schema_by_id(id).unwrap();
    assert_eq!(diagnostics.len(), 1, "{:?}", diagnostics);
    assert_eq!(diagnostics[0].pointer, "/properties/x");
    assert_eq!(diagnostics[0].keyword, "$ref");
    assert_eq!(diagnostics[0].source, "compile");

    assert!(catalog.validate_data_by_id(id, &json!({})).is_err());
}
