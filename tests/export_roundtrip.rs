//! Export every shipped schema and check the payload survives unchanged

use std::path::PathBuf;
use std::sync::Arc;

use rsfulmen::schema::{
    export, strip_provenance, validate_exported_schema, ExportContext, ExportFormat, ExportOptions, Identity,
    ProvenanceStyle, SchemaCatalog, PROVENANCE_KEY,
};
use rsfulmen::FulmenError;
use rstest::rstest;
use tempfile::TempDir;

fn catalog() -> SchemaCatalog {
    SchemaCatalog::new(PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("schemas"))
}

#[rstest]
fn test_round_trip(
    #[values(
        "config/v1.0.0/app-config",
        "observability/logging/v1.0.0/log-event",
        "pathfinder/v1.0.0/path-metadata",
        "pathfinder/v1.0.0/path-result"
    )]
    id: &str,
    #[values(ProvenanceStyle::Object, ProvenanceStyle::Comment, ProvenanceStyle::None)] style: ProvenanceStyle,
    #[values("out.json", "out.yaml")] file: &str,
) {
    let catalog = catalog();
    let dir = TempDir::new().unwrap();
    let ctx = ExportContext::new().with_working_root(dir.path());

    let mut options = ExportOptions::new(id, dir.path().join("nested").join(file));
    options.provenance_style = style;
    let result = export(&catalog, &ctx, &options).unwrap();

    let expected_format = if file.ends_with(".yaml") { ExportFormat::Yaml } else { ExportFormat::Json };
    assert_eq!(result.format, expected_format);
    assert_eq!(result.provenance.is_some(), style != ProvenanceStyle::None);

    validate_exported_schema(&catalog, id, &result.path).unwrap();

    // stripping is what makes the comparison pass, not an empty payload
    let raw = std::fs::read_to_string(&result.path).unwrap();
    assert!(!raw.is_empty());
    if style != ProvenanceStyle::None {
        assert!(raw.contains(PROVENANCE_KEY));
    }
}

#[test]
fn test_json_layout_and_provenance_fields() {
    let catalog = catalog();
    let dir = TempDir::new().unwrap();
    let ctx = ExportContext::new().with_working_root(dir.path());

    let mut options = ExportOptions::new("pathfinder/v1.0.0/path-result", dir.path().join("result.json"));
    options.identity_provider = Some(Arc::new(Identity {
        vendor: "acme".to_string(),
        binary: "pathctl".to_string(),
    }));
    options.git_revision = Some("deadbeef".to_string());
    let result = export(&catalog, &ctx, &options).unwrap();

    let raw = std::fs::read_to_string(&result.path).unwrap();
    assert!(raw.ends_with("}\n"));
    assert!(raw.contains("\n  \""), "two-space indentation");

    let mut value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    let provenance = &value[PROVENANCE_KEY];
    assert_eq!(provenance["schema_id"], "pathfinder/v1.0.0/path-result");
    assert_eq!(provenance["source_library_version"], "0.1.0");
    assert_eq!(provenance["git_revision"], "deadbeef");
    assert_eq!(provenance["identity"]["vendor"], "acme");
    let exported_at = provenance["exported_at"].as_str().unwrap();
    assert!(exported_at.ends_with('Z'));
    assert_eq!(exported_at.split('.').nth(1).map(|f| f.len()), Some(10));

    strip_provenance(&mut value);
    assert!(value.get(PROVENANCE_KEY).is_none());
}

#[test]
fn test_comment_style() {
    let catalog = catalog();
    let dir = TempDir::new().unwrap();
    let ctx = ExportContext::new().with_working_root(dir.path());

    let mut options = ExportOptions::new("observability/logging/v1.0.0/log-event", dir.path().join("log.json"));
    options.provenance_style = ProvenanceStyle::Comment;
    let result = export(&catalog, &ctx, &options).unwrap();
    assert_eq!(result.provenance_style, ProvenanceStyle::Comment);

    let value: serde_json::Value = serde_json::from_slice(&std::fs::read(&result.path).unwrap()).unwrap();
    let comment = value["$comment"].as_str().unwrap();
    assert!(comment.starts_with("x-crucible-source: "));
    assert!(comment.contains("schema_id=observability/logging/v1.0.0/log-event"));
    assert!(value.get(PROVENANCE_KEY).is_none());
}

#[test]
fn test_yaml_front_matter() {
    let catalog = catalog();
    let dir = TempDir::new().unwrap();
    let ctx = ExportContext::new().with_working_root(dir.path());

    let options = ExportOptions::new("config/v1.0.0/app-config", dir.path().join("app.yml"));
    let result = export(&catalog, &ctx, &options).unwrap();

    let raw = std::fs::read_to_string(&result.path).unwrap();
    let (front, body) = raw.split_once("---\n").unwrap();
    assert!(front.lines().all(|l| l.starts_with('#')));
    assert!(front.contains(PROVENANCE_KEY));
    assert!(!body.contains(PROVENANCE_KEY));
}

#[test]
fn test_existing_file_is_left_alone() {
    let catalog = catalog();
    let dir = TempDir::new().unwrap();
    let ctx = ExportContext::new().with_working_root(dir.path());
    let target = dir.path().join("taken.json");
    std::fs::write(&target, "original").unwrap();

    let mut options = ExportOptions::new("pathfinder/v1.0.0/path-metadata", &target);
    let err = export(&catalog, &ctx, &options).unwrap_err();
    assert!(matches!(err, FulmenError::FileExists(_)));
    assert_eq!(std::fs::read_to_string(&target).unwrap(), "original");

    options.overwrite = true;
    export(&catalog, &ctx, &options).unwrap();
    validate_exported_schema(&catalog, "pathfinder/v1.0.0/path-metadata", &target).unwrap();
}

#[test]
fn test_path_escape_is_rejected() {
    let catalog = catalog();
    let dir = TempDir::new().unwrap();
    let ctx = ExportContext::new().with_working_root(dir.path().join("inner"));

    let options = ExportOptions::new("pathfinder/v1.0.0/path-metadata", "../escape.json");
    let err = export(&catalog, &ctx, &options).unwrap_err();
    assert!(matches!(err, FulmenError::PathValidation { .. }));
    assert!(!dir.path().join("escape.json").exists());
}

#[test]
fn test_cancelled_context() {
    let catalog = catalog();
    let dir = TempDir::new().unwrap();
    let ctx = ExportContext::new().with_working_root(dir.path());
    ctx.clone().cancel();

    let options = ExportOptions::new("pathfinder/v1.0.0/path-metadata", dir.path().join("x.json"));
    assert!(matches!(export(&catalog, &ctx, &options), Err(FulmenError::Cancelled)));
    assert!(!dir.path().join("x.json").exists());
}

#[test]
fn test_tampered_export_is_reported() {
    let catalog = catalog();
    let dir = TempDir::new().unwrap();
    let ctx = ExportContext::new().with_working_root(dir.path());
    let options = ExportOptions::new("pathfinder/v1.0.0/path-result", dir.path().join("r.json"));
    let result = export(&catalog, &ctx, &options).unwrap();

    let tampered = std::fs::read_to_string(&result.path)
        .unwrap()
        .replace("Path Result", "Path Outcome");
    std::fs::write(&result.path, tampered).unwrap();

    let err = validate_exported_schema(&catalog, "pathfinder/v1.0.0/path-result", &result.path).unwrap_err();
    assert!(matches!(err, FulmenError::ExportMismatch { .. }));
}

#[rstest]
fn test_authored_comment_survives_round_trip(
    #[values(ProvenanceStyle::Object, ProvenanceStyle::Comment, ProvenanceStyle::None)] style: ProvenanceStyle,
    #[values("out.json", "out.yaml")] file: &str,
) {
    let root = TempDir::new().unwrap();
    let path = root.path().join("notes/v1.0.0/annotated.schema.json");
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(
        &path,
        r#"{"$comment": "x-crucible-source: authored by hand", "type": "object"}"#,
    )
    .unwrap();
    let catalog = SchemaCatalog::new(root.path());

    let dir = TempDir::new().unwrap();
    let ctx = ExportContext::new().with_working_root(dir.path());
    let mut options = ExportOptions::new("notes/v1.0.0/annotated", dir.path().join(file));
    options.provenance_style = style;
    let result = export(&catalog, &ctx, &options).unwrap();

    validate_exported_schema(&catalog, "notes/v1.0.0/annotated", &result.path).unwrap();
}
