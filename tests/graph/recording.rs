//! Replaying a recording configured through `factgraph.toml`.

use crate::common::*;
use factgraph::{GraphConfig, RawData, CONFIG_FILE_NAME};
use tempfile::TempDir;

fn config_with_recording(dir: &TempDir, recording: &str) -> GraphConfig {
    let recording_path = dir.path().join("recording.json");
    std::fs::write(&recording_path, recording).unwrap();
    let config_path = dir.path().join(CONFIG_FILE_NAME);
    std::fs::write(
        &config_path,
        format!(
            "[recording]\npath = '{}'\nasset = '//assets/web01'\n",
            recording_path.display()
        ),
    )
    .unwrap();
    GraphConfig::from_file(&config_path).unwrap()
}

const RECORDING: &str = r#"{"assets": [
    {"asset": {"id": "//assets/db01"}, "resources": []},
    {"asset": {"id": "//assets/web01", "name": "web01"},
     "connections": [{"url": "local://", "provider": "network", "connector": "local"}],
     "resources": [
        {"Resource": "file", "ID": "/etc/motd", "Fields": {
            "path": {"type": "string", "value": "/etc/motd"},
            "content": {"type": "string", "value": "recorded motd\n"},
            "exists": {"type": "bool", "value": true}
        }},
        {"Resource": "file", "ID": "/etc/shadow", "Fields": {
            "content": {"type": "string", "error": {"Compute": {
                "resource": "file", "field": "content", "message": "permission denied"}}}
        }}
     ]}
]}"#;

#[test]
fn test_recorded_fields_win_over_the_target() {
    let dir = TempDir::new().unwrap();
    let config = config_with_recording(&dir, RECORDING);
    let client = Client::new(service(&config, &[("/etc/motd", "live motd\n")]));
    let conn = client.connect();

    let id = client.construct(conn, "file", args(&[("path", RawData::string("/etc/motd"))]));
    let content = client.field(conn, "file", &id, "content").into_result().unwrap();
    assert_eq!(content.value.as_str(), Some("recorded motd\n"));

    // size was not recorded and comes from the target
    let size = client.field(conn, "file", &id, "size").into_result().unwrap();
    assert_eq!(size.value.as_int(), Some("live motd\n".len() as i64));
}

#[test]
fn test_recorded_resource_is_found_without_construction() {
    let dir = TempDir::new().unwrap();
    let config = config_with_recording(&dir, RECORDING);
    let client = Client::new(service(&config, &[]));
    let conn = client.connect();

    let exists = client
        .field(conn, "file", "/etc/motd", "exists")
        .into_result()
        .unwrap();
    assert_eq!(exists.value.as_bool(), Some(true));
}

#[test]
fn test_recorded_error_is_replayed() {
    let dir = TempDir::new().unwrap();
    let config = config_with_recording(&dir, RECORDING);
    let client = Client::new(service(&config, &[("/etc/shadow", "root:*:...")]));
    let conn = client.connect();

    let fault = client
        .field(conn, "file", "/etc/shadow", "content")
        .into_result()
        .unwrap_err();
    assert!(fault.message.contains("permission denied"));
}

#[test]
fn test_unknown_asset_fails_the_service() {
    let dir = TempDir::new().unwrap();
    let recording_path = dir.path().join("recording.json");
    std::fs::write(&recording_path, RECORDING).unwrap();
    let config = GraphConfig::from_toml_str(&format!(
        "[recording]\npath = '{}'\nasset = '//assets/nope'\n",
        recording_path.display()
    ))
    .unwrap();

    let err = factgraph::network_service(&config).err().unwrap();
    assert!(err.to_string().contains("//assets/nope"));
}
