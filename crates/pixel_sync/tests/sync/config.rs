use std::time::Duration;

use super::*;

const SERVER_CONFIG: &str = r#"{
    "CanvasRows": 50,
    "CanvasCols": 100,
    "CooldownSeconds": 30,
    "PaletteColors": ["white", "black", "red"],
    "WebSocketAppAddresses": ["ws://localhost:8765/", "ws://localhost:8766/"],
    "FlaskAppAddr": "http://localhost:5000/"
}"#;

#[test]
fn test_server_json_config() {
    let config = SyncConfig::from_json_str(SERVER_CONFIG).unwrap();
    assert_eq!(config.canvas_rows, 50);
    assert_eq!(config.canvas_cols, 100);
    assert_eq!(config.cooldown(), Duration::from_secs(30));
    assert_eq!(config.shard_count(), 2);
    assert_eq!(config.shard_addresses()[1], "ws://localhost:8766/");
    assert_eq!(config.pixel_size, 10);
    assert_eq!(config.palette().unwrap().color_to_code("red").unwrap(), 2);
}

#[test]
fn test_legacy_single_address() {
    let json = r#"{
        "CanvasRows": 2, "CanvasCols": 2, "CooldownSeconds": 0,
        "PaletteColors": ["white"], "WebSocketAppAddr": "ws://localhost:8765/"
    }"#;
    let config = SyncConfig::from_json_str(json).unwrap();
    assert_eq!(config.shard_addresses(), vec!["ws://localhost:8765/".to_string()]);
}

#[test]
fn test_toml_config() {
    let toml = r#"
canvas_rows = 20
canvas_cols = 40
cooldown_seconds = 5
palette_colors = ["white", "black"]
web_socket_app_addresses = ["ws://127.0.0.1:9000/"]
pixel_size = 4
"#;
    let config = SyncConfig::from_toml_str(toml).unwrap();
    assert_eq!(config.canvas_cols, 40);
    assert_eq!(config.pixel_size, 4);
    assert_eq!(config.pointer_mapping().to_coordinate(9.0, 3.0), Some(Coordinate::new(2, 0)));
}

#[test]
fn test_invalid_configs() {
    let base = test_config(10, 10, 1);

    let mut config = base.clone();
    config.canvas_cols = 0;
    assert!(matches!(config.validate(), Err(SyncError::Config(_))));

    let mut config = base.clone();
    config.web_socket_app_addresses.clear();
    assert!(matches!(config.validate(), Err(SyncError::Config(_))));

    let mut config = base.clone();
    config.palette_colors.push("red".into());
    assert!(matches!(config.validate(), Err(SyncError::Config(_))));

    let mut config = base;
    config.pixel_size = 0;
    assert!(matches!(config.validate(), Err(SyncError::Config(_))));

    assert!(matches!(SyncConfig::from_json_str("{"), Err(SyncError::Config(_))));
}

#[test]
fn test_load_from_file() {
    let dir = std::env::temp_dir().join(format!("pixel_sync_config_{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("config.json");
    std::fs::write(&path, SERVER_CONFIG).unwrap();

    let config = SyncConfig::load(&path).unwrap();
    assert_eq!(config.shard_count(), 2);

    assert!(matches!(SyncConfig::load(&dir.join("missing.json")), Err(SyncError::Io(_))));
    std::fs::remove_dir_all(&dir).unwrap();
}
