//! End-to-end tests for CSV import and export
//!
//! These tests drive the loader with a scripted transport and real files in a
//! temporary directory.

use metaobject_loader::testing::{
    metaobject_node, metaobjects_page, upsert_payload, upsert_rejection, ScriptedTransport,
};
use metaobject_loader::MetaobjectLoader;
use metaobject_sync_csv_source::{export, read_rows, sync, Config};
use serde_json::Value;
use std::fs;
use tempfile::TempDir;

const TEST_CSV_DATA: &str = "handle,name,code
north,North,NO
south,South,SO
bad-east,East,EA
west,West,WE";

fn echo_transport() -> ScriptedTransport {
    ScriptedTransport::with_handler(|_, variables: &Value| {
        let handle = variables["handle"]["handle"].as_str().unwrap_or_default();
        if handle.starts_with("bad") {
            return Ok(upsert_rejection("Code is invalid"));
        }
        let mut node = metaobject_node("region", handle, &[]);
        node["fields"] = variables["metaobject"]["fields"].clone();
        Ok(upsert_payload(node))
    })
}

#[tokio::test]
async fn test_csv_import_upserts_every_row() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("debug")
        .try_init();

    let dir = TempDir::new().unwrap();
    let file = dir.path().join("regions.csv");
    fs::write(&file, TEST_CSV_DATA).unwrap();

    let loader = MetaobjectLoader::new(echo_transport());
    let config = Config {
        file,
        type_name: "region".to_string(),
        ..Config::default()
    };

    let tally = sync(&loader, &config).await.unwrap();

    assert_eq!(tally.upserted, 3);
    assert_eq!(tally.failed, 1);
    assert_eq!(tally.failures[0].handle, "bad-east");
    assert_eq!(tally.failures[0].message, "User errors: Code is invalid");

    let calls = loader.transport().calls();
    assert_eq!(calls.len(), 4);
    assert_eq!(calls[3].variables["handle"]["handle"], "west");
    assert_eq!(calls[3].variables["metaobject"]["fields"][1]["value"], "WE");
}

#[tokio::test]
async fn test_dry_run_sends_nothing() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("regions.csv");
    fs::write(&file, TEST_CSV_DATA).unwrap();

    let loader = MetaobjectLoader::new(echo_transport());
    let config = Config {
        file,
        type_name: "region".to_string(),
        dry_run: true,
        ..Config::default()
    };

    let tally = sync(&loader, &config).await.unwrap();
    assert_eq!(tally.total(), 0);
    assert_eq!(loader.transport().call_count(), 0);
}

#[tokio::test]
async fn test_missing_file_is_fatal() {
    let loader = MetaobjectLoader::new(echo_transport());
    let config = Config {
        file: "/nonexistent/regions.csv".into(),
        type_name: "region".to_string(),
        ..Config::default()
    };

    assert!(sync(&loader, &config).await.is_err());
    assert_eq!(loader.transport().call_count(), 0);
}

#[tokio::test]
async fn test_export_then_reimport() {
    let transport = ScriptedTransport::new();
    transport.push_data(metaobjects_page(
        vec![
            metaobject_node("region", "north", &[("name", "North"), ("code", "NO")]),
            metaobject_node("region", "south", &[("name", "South")]),
        ],
        false,
        None,
    ));
    let loader = MetaobjectLoader::new(transport);

    let dir = TempDir::new().unwrap();
    let file = dir.path().join("export.csv");
    let written = export(&loader, "region", &file, false).await.unwrap();

    assert_eq!(written, 2);
    assert_eq!(
        fs::read_to_string(&file).unwrap(),
        "handle,name,code\nnorth,North,NO\nsouth,South,\n"
    );

    let rows = read_rows(&file, b',').unwrap();
    assert_eq!(rows[0].first(), Some(("handle", "north")));
    assert_eq!(rows[1].get("code"), Some(""));
}
