//! Integration tests for Helm chart generation.

use std::collections::BTreeMap;
use std::fs;
use tempfile::tempdir;

use appdef_helm::{helm, HelmError, HelmOptions, StackVersion};
use appdef_render::DriverRegistry;
use appdef_types::App;

const METADATA: &str = "version: 0.1.0\nname: hello\ndescription: Hello world\nmaintainers:\n  - name: dev\n    email: dev@example.com\n";
const COMPOSE: &str = "version: \"3.6\"\nservices:\n  front:\n    image: nginx:${front.tag}\n    deploy:\n      replicas: ${front.replicas}\n    ports:\n      - \"${front.port}:80\"\n";
const SETTINGS: &str = "front:\n  tag: \"1.25\"\n  replicas: 2\n  port: 8080\n  unused: x\nother: 1\n";

fn app() -> App {
    App::new("hello.dockerapp")
        .with_metadata(METADATA)
        .unwrap()
        .with_compose(COMPOSE)
        .with_settings(SETTINGS)
        .unwrap()
}

/// Test generating a template-preserving chart.
#[test]
fn test_helm_template_chart() {
    let temp = tempdir().unwrap();
    let chart_dir = temp.path().join("hello.chart");
    fs::create_dir_all(&chart_dir).unwrap();
    fs::write(chart_dir.join("values.yaml"), "front:\n  port: 80\nglobal: kept\n").unwrap();

    let registry = DriverRegistry::with_builtins().unwrap();
    let mut overrides = BTreeMap::new();
    overrides.insert("front.replicas".to_string(), "3".to_string());
    let out = helm(
        &app(),
        &overrides,
        &registry,
        &HelmOptions::new().with_chart_dir(&chart_dir),
    )
    .unwrap();
    assert_eq!(out, chart_dir);

    let chart: serde_yaml::Value =
        serde_yaml::from_str(&fs::read_to_string(chart_dir.join("Chart.yaml")).unwrap()).unwrap();
    assert_eq!(chart["name"].as_str(), Some("hello"));
    assert_eq!(chart["description"].as_str(), Some("Hello world"));
    assert_eq!(chart["maintainers"][0]["name"].as_str(), Some("dev <dev@example.com>"));

    let values: serde_yaml::Value =
        serde_yaml::from_str(&fs::read_to_string(chart_dir.join("values.yaml")).unwrap()).unwrap();
    assert_eq!(values["front"]["replicas"].as_u64(), Some(3));
    assert_eq!(values["front"]["port"].as_u64(), Some(8080));
    assert_eq!(values["front"]["tag"].as_str(), Some("1.25"));
    assert!(values["front"].get("unused").is_none());
    assert!(values.get("other").is_none());
    assert!(values.get("app").is_none());
    assert_eq!(values["global"].as_str(), Some("kept"));

    let stack = fs::read_to_string(chart_dir.join("templates/stack.yaml")).unwrap();
    assert!(stack.contains("apiVersion: compose.docker.com/v1beta2"));
    assert!(stack.contains("replicas: {{.Values.front.replicas}}"));
    assert!(stack.contains("published: {{.Values.front.port}}"));
    assert!(stack.contains("{{.Values.front.tag}}"));
    assert!(!stack.contains("template_"));
}

/// Test generating a rendered chart with the v1beta1 stack format.
#[test]
fn test_helm_rendered_chart() {
    let temp = tempdir().unwrap();
    let chart_dir = temp.path().join("out");
    let registry = DriverRegistry::with_builtins().unwrap();
    let options = HelmOptions::new()
        .with_render(true)
        .with_stack_version(StackVersion::V1Beta1)
        .with_chart_dir(&chart_dir);

    helm(&app(), &BTreeMap::new(), &registry, &options).unwrap();

    let stack: serde_yaml::Value = serde_yaml::from_str(
        &fs::read_to_string(chart_dir.join("templates/stack.yaml")).unwrap(),
    )
    .unwrap();
    assert_eq!(stack["apiVersion"].as_str(), Some("compose.docker.com/v1beta1"));
    let compose_file = stack["spec"]["composeFile"].as_str().unwrap();
    assert!(compose_file.contains("nginx:1.25"));
    assert!(!compose_file.contains("{{"));
    assert!(!chart_dir.join("values.yaml").exists());
}

/// Test that template mode refuses several compose documents.
#[test]
fn test_helm_multiple_composes() {
    let temp = tempdir().unwrap();
    let app = app().with_compose("services: {}\n");
    let registry = DriverRegistry::with_builtins().unwrap();
    let err = helm(
        &app,
        &BTreeMap::new(),
        &registry,
        &HelmOptions::new().with_chart_dir(temp.path().join("c")),
    )
    .unwrap_err();
    assert!(matches!(err, HelmError::MultipleComposes));
}

/// Test that generated chart files are world readable.
#[cfg(unix)]
#[test]
fn test_helm_file_mode() {
    use std::os::unix::fs::PermissionsExt;

    let temp = tempdir().unwrap();
    let chart_dir = temp.path().join("c");
    let registry = DriverRegistry::with_builtins().unwrap();
    helm(&app(), &BTreeMap::new(), &registry, &HelmOptions::new().with_chart_dir(&chart_dir)).unwrap();
    let mode = fs::metadata(chart_dir.join("Chart.yaml")).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o644);
}
