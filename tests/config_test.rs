// Integration tests for configuration loading: file, overrides, validation.

use sensor_blaster::config::{load_config, validate, ConfigError};
use std::collections::HashMap;

fn write_config(contents: &str) -> (tempfile::TempDir, std::path::PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("blaster.toml");
    std::fs::write(&path, contents).unwrap();
    (dir, path)
}

#[test]
fn test_file_then_overrides_then_validate() {
    let (_dir, path) = write_config(
        r#"
        sensor_groups = ["kitchen"]

        [webhook]
        url = "ftp://wrong"
        "#,
    );

    let config = load_config(&path).unwrap();
    assert_eq!(validate(&config).unwrap_err().code(), "invalid_url");

    let env: HashMap<&str, &str> = HashMap::from([
        ("BLASTER_WEBHOOK_URL", "https://usetrmnl.com/api/custom_plugins/1234"),
        ("BLASTER_SENSOR_GROUPS", "kitchen,garden"),
    ]);
    let config = config.with_overrides(|k| env.get(k).map(|v| v.to_string()));

    assert_eq!(validate(&config), Ok(()));
    assert_eq!(config.sensor_groups, vec!["kitchen", "garden"]);
    assert_eq!(config.title(), "TRMNL Blaster (2 groups)");
}

#[test]
fn test_empty_group_list_blocks_activation() {
    let (_dir, path) = write_config(
        r#"
        sensor_groups = []

        [webhook]
        url = "https://usetrmnl.com/api/custom_plugins/1234"
        "#,
    );

    let config = load_config(&path).unwrap();
    assert_eq!(validate(&config), Err(ConfigError::NoSensorGroups));
}

#[test]
fn test_malformed_file_maps_to_unknown() {
    let (_dir, path) = write_config("sensor_groups = \"not a list\"");

    let err: ConfigError = load_config(&path).unwrap_err().into();
    assert_eq!(err.code(), "unknown");
}
