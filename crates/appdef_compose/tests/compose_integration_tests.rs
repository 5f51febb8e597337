//! Integration tests for the template-preserving Compose model.

use serde_yaml::Value;

use appdef_compose::{load_template, parse_yaml, unquote, ComposeError, OrTemplate};

const TEMPLATE: &str = r#"
version: "3.6"
services:
  front:
    image: nginx:${front.tag}
    command: nginx -g "daemon off;"
    ports:
      - "${front.port}:80"
      - 443
    volumes:
      - ./conf:/etc/nginx/conf.d:ro
    read_only: ${front.readonly}
    stop_grace_period: 1m30s
    deploy:
      replicas: ${front.replicas}
      resources:
        limits:
          memory: 64m
    healthcheck:
      interval: ${front.interval}
      retries: 3
  db:
    image: postgres
    environment:
      - POSTGRES_DB=app
    secrets:
      - db_password
secrets:
  db_password:
    external: true
"#;

/// Test that the Helm conversion keeps every expression as template syntax.
#[test]
fn test_template_conversion() {
    let config = load_template(&parse_yaml(TEMPLATE).unwrap()).unwrap();
    let front = &config.services["front"];
    assert!(front.read_only.as_ref().map(OrTemplate::is_template).unwrap_or(false));
    assert_eq!(front.ports.len(), 2);

    let tree = config.to_template_value().unwrap();
    let front = &tree["services"]["front"];
    assert_eq!(front["image"].as_str(), Some("nginx:{{.Values.front.tag}}"));
    assert_eq!(front["read_only"].as_str(), Some("{{.Values.front.readonly}}"));
    assert_eq!(front["stop_grace_period"].as_str(), Some("1m30s"));
    assert_eq!(front["deploy"]["replicas"].as_str(), Some("{{.Values.front.replicas}}"));
    assert_eq!(
        front["deploy"]["resources"]["limits"]["memory"].as_i64(),
        Some(64 * 1024 * 1024)
    );
    assert_eq!(front["healthcheck"]["retries"].as_u64(), Some(3));
    assert_eq!(front["ports"][0]["published"].as_str(), Some("{{.Values.front.port}}"));
    assert_eq!(front["ports"][0]["target"].as_u64(), Some(80));
    assert_eq!(front["ports"][1]["target"].as_u64(), Some(443));
    assert_eq!(front["volumes"][0]["read_only"].as_bool(), Some(true));
    assert_eq!(front["command"][2].as_str(), Some("daemon off;"));

    let yaml = unquote(&serde_yaml::to_string(&tree).unwrap());
    assert!(yaml.contains("replicas: {{.Values.front.replicas}}"));
    assert!(!yaml.contains("template_"));
}

/// Test that a fully substituted document resolves to concrete values.
#[test]
fn test_resolved_document() {
    let document = TEMPLATE
        .replace("${front.tag}", "1.25")
        .replace("${front.port}", "8080")
        .replace("${front.readonly}", "true")
        .replace("${front.replicas}", "2")
        .replace("${front.interval}", "10s");
    let config = load_template(&parse_yaml(&document).unwrap()).unwrap();
    let tree = config.to_resolved_value().unwrap();

    let front = &tree["services"]["front"];
    assert_eq!(front["read_only"], Value::Bool(true));
    assert_eq!(front["deploy"]["replicas"].as_u64(), Some(2));
    assert_eq!(front["healthcheck"]["interval"].as_str(), Some("10s"));
    assert_eq!(front["ports"][0]["published"].as_u64(), Some(8080));
    assert_eq!(tree["services"]["db"]["environment"]["POSTGRES_DB"].as_str(), Some("app"));
    assert_eq!(tree["secrets"]["db_password"]["external"].as_bool(), Some(true));
}

/// Test that a value that cannot be parsed is reported when resolving.
#[test]
fn test_unresolvable_value() {
    let document = "services:\n  web:\n    image: nginx\n    deploy:\n      replicas: many\n";
    let config = load_template(&parse_yaml(document).unwrap()).unwrap();
    let err = config.to_resolved_value().unwrap_err();
    assert!(matches!(err, ComposeError::Unresolved { ref field, .. } if field == "replicas"));
}
