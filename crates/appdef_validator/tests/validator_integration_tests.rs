//! Integration tests for Compose and application validation.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

use appdef_render::{DriverRegistry, RenderOptions};
use appdef_validator::{validate_app, Validator, ValidatorError};

fn write_app(root: &Path, compose: &str, settings: &str) {
    fs::create_dir_all(root).unwrap();
    fs::write(root.join("metadata.yml"), "version: 0.1.0\nname: demo\n").unwrap();
    fs::write(root.join("docker-compose.yml"), compose).unwrap();
    fs::write(root.join("settings.yml"), settings).unwrap();
}

fn validate(root: &Path) -> Result<(), ValidatorError> {
    let registry = DriverRegistry::with_builtins().unwrap();
    validate_app(
        root,
        &[] as &[&str],
        &BTreeMap::new(),
        &registry,
        &RenderOptions::new(),
    )
}

/// Test validating a Compose file from disk.
#[test]
fn test_validate_file() {
    let temp = tempdir().unwrap();
    let file = temp.path().join("docker-compose.yml");
    fs::write(
        &file,
        "version: \"3.6\"\nservices:\n  db:\n    image: postgres\n    volumes:\n      - data:/var/lib/postgresql/data\n    secrets: [pw]\nvolumes:\n  data:\nsecrets:\n  pw:\n    external: true\n",
    )
    .unwrap();
    Validator::with_defaults().validate_file(&file).unwrap();
}

/// Test that read and parse failures are distinct errors.
#[test]
fn test_validate_file_failures() {
    let temp = tempdir().unwrap();
    let missing = temp.path().join("missing.yml");
    let err = Validator::with_defaults().validate_file(&missing).unwrap_err();
    assert!(matches!(err, ValidatorError::Read { .. }));

    let broken = temp.path().join("broken.yml");
    fs::write(&broken, "services: [\n").unwrap();
    let err = Validator::with_defaults().validate_file(&broken).unwrap_err();
    assert!(matches!(err, ValidatorError::Parse(_)));
}

/// Test validating a correct application.
#[test]
fn test_validate_app_ok() {
    let temp = tempdir().unwrap();
    let root = temp.path().join("demo.dockerapp");
    write_app(
        &root,
        "version: \"3.6\"\nservices:\n  web:\n    image: nginx:${tag}\n    volumes:\n      - /etc/nginx:/etc/nginx:ro\n",
        "tag: latest\n",
    );
    validate(&root).unwrap();
}

/// Test that rule violations are reported against the volume entry as written.
#[test]
fn test_validate_app_rule_violation() {
    let temp = tempdir().unwrap();
    let root = temp.path().join("demo.dockerapp");
    write_app(
        &root,
        "version: \"3.6\"\nservices:\n  web:\n    image: nginx\n    volumes:\n      - ${src}:/data\n",
        "src: ./data\n",
    );
    let err = validate(&root).unwrap_err();
    let message = err.to_string();
    assert!(message.starts_with("Compose file validation failed:"));
    assert!(message.contains(
        "can't use relative path as volume source (\"./data:/data\") in service \"web\""
    ));
}

/// Test that rule violations and load failures are reported together.
#[test]
fn test_validate_app_rule_violation_and_load_error() {
    let temp = tempdir().unwrap();
    let root = temp.path().join("demo.dockerapp");
    write_app(
        &root,
        "version: \"3.6\"\nservices:\n  web:\n    image: nginx\n    deploy:\n      replicas: lots\n    volumes:\n      - ./logs:/logs\n",
        "{}\n",
    );
    let errors = match validate(&root).unwrap_err() {
        ValidatorError::Application(errors) => errors,
        other => panic!("expected application errors, got {:?}", other),
    };
    assert_eq!(errors.len(), 2);
    assert!(errors[0].contains("replicas"));
    assert!(errors[1].contains("(\"./logs:/logs\")"));
}

/// Test that missing files and render failures are reported.
#[test]
fn test_validate_app_failures() {
    let temp = tempdir().unwrap();
    let root = temp.path().join("broken.dockerapp");
    fs::create_dir_all(&root).unwrap();
    fs::write(root.join("metadata.yml"), "version: 0.1.0\nname: demo\n").unwrap();
    let err = validate(&root).unwrap_err();
    assert_eq!(
        err.to_string(),
        "failed to read application settings\nfailed to read application compose"
    );

    let root = temp.path().join("unset.dockerapp");
    write_app(&root, "services:\n  web:\n    image: nginx:${tag}\n", "");
    let err = validate(&root).unwrap_err();
    assert!(err.to_string().contains("required variable tag is missing a value"));
}
