//! Integration tests for settings loading from disk.

use std::fs;

use appdef_settings::{load_files, merge, LoadOptions, Settings, SettingsError};
use serde_yaml::Value;
use tempfile::tempdir;

#[test]
fn test_load_files_merges_in_order() {
    let dir = tempdir().unwrap();
    let base = dir.path().join("settings.yml");
    let prod = dir.path().join("prod.yml");
    fs::write(&base, "front:\n  port: 8080\n  replicas: 1\nimages: [a, b]\n").unwrap();
    fs::write(&prod, "front:\n  replicas: 3\nimages: [c]\n").unwrap();

    let settings = load_files(&[&base, &prod], &LoadOptions::new()).unwrap();
    let env = settings.flatten();

    assert_eq!(env.get("front.port").map(String::as_str), Some("8080"));
    assert_eq!(env.get("front.replicas").map(String::as_str), Some("3"));
    assert_eq!(env.get("images.0").map(String::as_str), Some("c"));
    assert!(!env.contains_key("images.1"));
}

#[test]
fn test_load_files_missing_file_is_io_error() {
    let dir = tempdir().unwrap();
    let missing = dir.path().join("nope.yml");

    let err = load_files(&[missing], &LoadOptions::new()).unwrap_err();
    match err {
        SettingsError::Io(io) => assert_eq!(io.kind(), std::io::ErrorKind::NotFound),
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn test_load_files_aborts_on_parse_failure() {
    let dir = tempdir().unwrap();
    let good = dir.path().join("good.yml");
    let bad = dir.path().join("bad.yml");
    fs::write(&good, "a: 1\n").unwrap();
    fs::write(&bad, "a: [1\n").unwrap();

    let err = load_files(&[&good, &bad], &LoadOptions::new()).unwrap_err();
    assert!(err.to_string().starts_with("failed to read settings"));
}

#[test]
fn test_scalar_leaf_is_left_biased() {
    let overrides = [("front.port", "4242"), ("back.port", "6666")]
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    let file = appdef_settings::load(
        b"front:\n  port: 8484\nback:\n  port: 9090\n  name: db\n",
        &LoadOptions::new(),
    )
    .unwrap();
    let cli = Settings::from_flatten(&overrides).unwrap();

    let all = merge(vec![file, cli]);
    assert_eq!(all.get("front.port").and_then(Value::as_u64), Some(4242));
    assert_eq!(all.get("back.port").and_then(Value::as_u64), Some(6666));
    assert_eq!(all.get("back.name").and_then(Value::as_str), Some("db"));
}
