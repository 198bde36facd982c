// ==========================================
// ConfigManager 集成测试
// ==========================================
// 测试目标: 验证配置文件加载、默认值回退与快照输出
// ==========================================

use kiosk_bulk_import::config::{config_keys, defaults, ConfigManager, ImportConfigReader};
use kiosk_bulk_import::app::AppState;
use serde_json::Value;
use std::io::Write;

fn write_config_file(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(".json")
        .tempfile()
        .expect("Failed to create temp config");
    file.write_all(content.as_bytes())
        .expect("Failed to write temp config");
    file
}

#[test]
fn test_load_from_json_file() {
    let file = write_config_file(
        r#"{
            "zip_spreadsheet_stem": "catalogo",
            "preview_limit": 8,
            "refresh_interval_secs": 60
        }"#,
    );

    let config = ConfigManager::from_json_file(file.path()).expect("config should load");

    assert_eq!(config.zip_spreadsheet_stem(), "catalogo");
    assert_eq!(config.preview_limit(), 8);
    assert_eq!(config.refresh_interval_secs(), 60);
}

#[test]
fn test_missing_file_is_error() {
    let result = ConfigManager::from_json_file("/nonexistent/kiosk-config.json");
    assert!(result.is_err());
}

#[test]
fn test_non_object_file_is_error() {
    let file = write_config_file("[1, 2, 3]");
    assert!(ConfigManager::from_json_file(file.path()).is_err());
}

#[test]
fn test_invalid_values_fall_back_to_defaults() {
    let config = ConfigManager::new()
        .with_value(config_keys::REQUEST_TIMEOUT_SECS, "abc")
        .with_value(config_keys::ZIP_MAX_BYTES, "-1")
        .with_value(config_keys::BACKEND_BASE_URL, "   ");

    assert_eq!(config.request_timeout_secs(), defaults::REQUEST_TIMEOUT_SECS);
    assert_eq!(config.zip_max_bytes(), defaults::ZIP_MAX_BYTES);
    assert_eq!(config.backend_base_url(), defaults::BACKEND_BASE_URL);
}

#[test]
fn test_snapshot_contains_effective_values() {
    let config = ConfigManager::new()
        .with_value(config_keys::BACKEND_BASE_URL, "http://10.0.0.5:3000/api/");

    let snapshot: Value =
        serde_json::from_str(&config.get_config_snapshot().unwrap()).expect("valid json");

    assert_eq!(snapshot[config_keys::BACKEND_BASE_URL], "http://10.0.0.5:3000/api");
    assert_eq!(snapshot[config_keys::ZIP_SPREADSHEET_STEM], "productos");
    assert_eq!(snapshot[config_keys::PREVIEW_LIMIT], "5");
    assert_eq!(snapshot[config_keys::ZIP_MAX_BYTES], "52428800");
}

#[test]
fn test_app_state_rejects_unusable_base_url() {
    let config = ConfigManager::new().with_value(config_keys::BACKEND_BASE_URL, "not a url");
    assert!(AppState::new(config).is_err());
}
