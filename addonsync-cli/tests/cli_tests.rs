//! Tests for the inspect and check reports.

use addonsync_cli::{check, inspect, scaffold};
use addonsync_pack::ArchiveBuilder;
use addonsync_types::{ContentId, PropertyKind, PropertyValue};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

const GOLEM: &str = r#"{
    "format_version": "1.21.0",
    "minecraft:entity": {
        "description": {
            "identifier": "demo:golem",
            "spawn_category": "creature",
            "properties": {
                "demo:phase": { "type": "int", "range": [0, 4], "default": 1 }
            }
        }
    }
}"#;

#[tokio::test]
async fn inspect_reports_packages_and_schemas() {
    let dir = TempDir::new().unwrap();
    let id = ContentId::random();
    ArchiveBuilder::new("Golems", id)
        .entity("golem.json", GOLEM)
        .write_to(dir.path().join("golems.mcpack"))
        .unwrap();
    std::fs::write(
        dir.path().join("addons.toml"),
        "[addons]\nbehavior_stack = [\"golems.mcpack\", \"gone.mcpack\"]\n",
    )
    .unwrap();

    let report = inspect(dir.path()).await.unwrap();
    assert_eq!(report.requested.len(), 2);
    assert_eq!(report.packages.len(), 1);
    assert_eq!(report.packages[0].id, id);

    assert_eq!(report.schemas.len(), 1);
    let golem = &report.schemas[0];
    assert_eq!(golem.entity_type, "demo:golem");
    assert_eq!(golem.properties[0].kind, PropertyKind::Int);
    assert_eq!(golem.properties[0].default, PropertyValue::Int(1));

    let text = report.to_string();
    assert!(text.contains("1 of 2 packages loaded"));
    assert!(text.contains("#0 demo:phase int = 1 in [0, 4]"));

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["packages"][0]["id"], id.to_string());
}

#[tokio::test]
async fn inspect_initializes_empty_directory() {
    let root = TempDir::new().unwrap();
    let dir = root.path().join("packs");

    let report = inspect(&dir).await.unwrap();
    assert!(report.packages.is_empty());
    assert!(dir.join("addons.toml").is_file());
}

#[test]
fn check_summarizes_archive() {
    let dir = TempDir::new().unwrap();
    let id = ContentId::random();
    let path = dir.path().join("golems.zip");
    ArchiveBuilder::new("Golems", id)
        .script("javascript", "scripts/main.js")
        .entity("golem.json", GOLEM)
        .write_to(&path)
        .unwrap();

    let summary = check(&path).unwrap();
    assert_eq!(summary.id, id);
    assert!(summary.has_scripts);
    assert_eq!(summary.entities[0].properties, vec!["demo:phase"]);
    assert!(summary.to_string().contains("scripts  yes"));
}

#[test]
fn check_reports_load_error_with_path() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.mcpack");
    ArchiveBuilder::new("Broken", ContentId::random())
        .without_manifest()
        .write_to(&path)
        .unwrap();

    let err = check(&path).unwrap_err();
    assert!(format!("{err:#}").contains("broken.mcpack"));
}

#[test]
fn scaffolded_package_passes_check() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("starter.mcpack");

    let id = scaffold(&path, "Starter", Some("scripts/main.js")).unwrap();
    let summary = check(&path).unwrap();
    assert_eq!(summary.id, id);
    assert_eq!(summary.name, "Starter");
    assert!(summary.has_scripts);
    assert!(summary.entities.is_empty());

    let err = scaffold(&path, "Again", None).unwrap_err();
    assert!(err.to_string().contains("already exists"));
}
