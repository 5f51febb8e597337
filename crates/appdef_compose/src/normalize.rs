//! Short-form to long-form coercion of service fields.
//!
//! Compose accepts several spellings for many service fields (`"8080:80"` or
//! a mapping for a port, a string or a list for a command). These steps run
//! on the raw tree before typed decoding so the model only sees one shape.

use serde_yaml::{Mapping, Value};
use tracing::debug;

use appdef_settings::{scalar_to_string, value_kind};

use crate::error::{ComposeError, ComposeResult};

const BIND_PROPAGATIONS: &[&str] = &["shared", "rshared", "slave", "rslave", "private", "rprivate"];
const CONSISTENCIES: &[&str] = &["cached", "delegated", "consistent"];

/// Normalize every field of one service in place.
pub fn normalize_service(name: &str, service: &mut Mapping) -> ComposeResult<()> {
    let unset: Vec<Value> = service
        .iter()
        .filter(|(_, value)| value.is_null())
        .map(|(key, _)| key.clone())
        .collect();
    for key in unset {
        service.remove(&key);
    }

    for key in ["command", "entrypoint"] {
        if let Some(value) = service.get_mut(key) {
            *value = shell_command(name, key, value)?;
        }
    }
    for key in ["dns", "dns_search", "env_file", "tmpfs"] {
        if let Some(value) = service.get_mut(key) {
            *value = string_list(name, key, value)?;
        }
    }
    if let Some(value) = service.get_mut("expose") {
        *value = string_list(name, "expose", value)?;
    }
    if let Some(value) = service.get_mut("environment") {
        *value = key_value_mapping(name, "environment", value, true)?;
    }
    if let Some(value) = service.get_mut("labels") {
        *value = key_value_mapping(name, "labels", value, false)?;
    }
    if let Some(value) = service.get_mut("extra_hosts") {
        *value = hosts_list(name, value)?;
    }
    if let Some(value) = service.get_mut("depends_on") {
        if let Value::Mapping(deps) = value {
            *value = Value::Sequence(deps.keys().cloned().collect());
        }
    }
    if let Some(Value::Mapping(deploy)) = service.get_mut("deploy") {
        if let Some(value) = deploy.get_mut("labels") {
            *value = key_value_mapping(name, "deploy.labels", value, false)?;
        }
    }
    if let Some(value) = service.get_mut("ports") {
        *value = ports(name, value)?;
    }
    if let Some(value) = service.get_mut("volumes") {
        *value = volumes(name, value)?;
    }
    for (key, kind) in [("secrets", "secret"), ("configs", "config")] {
        if let Some(value) = service.get_mut(key) {
            *value = file_references(kind, value)?;
        }
    }
    Ok(())
}

fn shell_command(service: &str, key: &str, value: &Value) -> ComposeResult<Value> {
    match value {
        Value::String(s) => shlex::split(s)
            .map(|words| Value::Sequence(words.into_iter().map(Value::String).collect()))
            .ok_or_else(|| {
                ComposeError::Shape(format!(
                    "invalid {} {:?} in service {:?}",
                    key, s, service
                ))
            }),
        Value::Sequence(items) => Ok(stringify_items(items)),
        Value::Null => Ok(Value::Null),
        other => Err(invalid_type(service, key, other)),
    }
}

fn string_list(service: &str, key: &str, value: &Value) -> ComposeResult<Value> {
    match value {
        Value::String(s) => Ok(Value::Sequence(vec![Value::String(s.clone())])),
        Value::Number(_) => Ok(Value::Sequence(vec![Value::String(scalar_to_string(value))])),
        Value::Sequence(items) => Ok(stringify_items(items)),
        Value::Null => Ok(Value::Null),
        other => Err(invalid_type(service, key, other)),
    }
}

fn stringify_items(items: &[Value]) -> Value {
    Value::Sequence(
        items
            .iter()
            .map(|item| match item {
                Value::String(_) => item.clone(),
                other => Value::String(scalar_to_string(other)),
            })
            .collect(),
    )
}

/// `["K=V", "K"]` or `{K: V}` to a mapping of strings. Entries without a
/// value become null when `keep_null` is set and empty strings otherwise.
fn key_value_mapping(
    service: &str,
    key: &str,
    value: &Value,
    keep_null: bool,
) -> ComposeResult<Value> {
    let empty = |keep_null: bool| {
        if keep_null {
            Value::Null
        } else {
            Value::String(String::new())
        }
    };

    let mut out = Mapping::new();
    match value {
        Value::Sequence(items) => {
            for item in items {
                let entry = scalar_to_string(item);
                match entry.split_once('=') {
                    Some((k, v)) => out.insert(k.into(), v.into()),
                    None => out.insert(entry.into(), empty(keep_null)),
                };
            }
        }
        Value::Mapping(entries) => {
            for (k, v) in entries {
                let v = match v {
                    Value::Null => empty(keep_null),
                    other => Value::String(scalar_to_string(other)),
                };
                out.insert(Value::String(scalar_to_string(k)), v);
            }
        }
        Value::Null => return Ok(Value::Null),
        other => return Err(invalid_type(service, key, other)),
    }
    Ok(Value::Mapping(out))
}

fn hosts_list(service: &str, value: &Value) -> ComposeResult<Value> {
    match value {
        Value::Mapping(entries) => Ok(Value::Sequence(
            entries
                .iter()
                .map(|(host, ip)| {
                    Value::String(format!("{}:{}", scalar_to_string(host), scalar_to_string(ip)))
                })
                .collect(),
        )),
        other => string_list(service, "extra_hosts", other),
    }
}

fn file_references(kind: &str, value: &Value) -> ComposeResult<Value> {
    let items = match value {
        Value::Sequence(items) => items,
        Value::Null => return Ok(Value::Null),
        other => {
            return Err(ComposeError::Shape(format!(
                "invalid type {} for {}s",
                value_kind(other),
                kind
            )))
        }
    };
    items
        .iter()
        .map(|item| match item {
            Value::String(source) => {
                let mut long = Mapping::new();
                long.insert("source".into(), Value::String(source.clone()));
                Ok(Value::Mapping(long))
            }
            Value::Mapping(_) => Ok(item.clone()),
            other => Err(ComposeError::Shape(format!(
                "invalid type {} for {}",
                value_kind(other),
                kind
            ))),
        })
        .collect::<ComposeResult<Vec<_>>>()
        .map(Value::Sequence)
}

fn volumes(service: &str, value: &Value) -> ComposeResult<Value> {
    let items = match value {
        Value::Sequence(items) => items,
        Value::Null => return Ok(Value::Null),
        other => return Err(invalid_type(service, "volumes", other)),
    };
    items
        .iter()
        .map(|item| match item {
            Value::String(spec) => parse_volume(spec).map(Value::Mapping),
            Value::Mapping(_) => Ok(item.clone()),
            other => Err(ComposeError::Shape(format!(
                "invalid type {} for service volume",
                value_kind(other)
            ))),
        })
        .collect::<ComposeResult<Vec<_>>>()
        .map(Value::Sequence)
}

/// Parse a short volume spec (`[source:]target[:options]`).
pub fn parse_volume(spec: &str) -> ComposeResult<Mapping> {
    let parts: Vec<&str> = spec.split(':').collect();
    let mut volume = Mapping::new();

    match parts.as_slice() {
        [target] => {
            volume.insert("type".into(), "volume".into());
            volume.insert("target".into(), (*target).into());
        }
        [source, target, rest @ ..] if rest.len() <= 1 => {
            let kind = if is_file_path(source) { "bind" } else { "volume" };
            volume.insert("type".into(), kind.into());
            volume.insert("source".into(), (*source).into());
            volume.insert("target".into(), (*target).into());
            if let Some(options) = rest.first() {
                apply_volume_options(&mut volume, options);
            }
        }
        _ => {
            return Err(ComposeError::Shape(format!(
                "invalid spec: {}: too many colons",
                spec
            )))
        }
    }
    Ok(volume)
}

fn apply_volume_options(volume: &mut Mapping, options: &str) {
    for option in options.split(',') {
        match option {
            "ro" => {
                volume.insert("read_only".into(), Value::Bool(true));
            }
            "rw" => {
                volume.insert("read_only".into(), Value::Bool(false));
            }
            "nocopy" => {
                let mut nested = Mapping::new();
                nested.insert("nocopy".into(), Value::Bool(true));
                volume.insert("volume".into(), Value::Mapping(nested));
            }
            o if BIND_PROPAGATIONS.contains(&o) => {
                let mut nested = Mapping::new();
                nested.insert("propagation".into(), o.into());
                volume.insert("bind".into(), Value::Mapping(nested));
            }
            o if CONSISTENCIES.contains(&o) => {
                volume.insert("consistency".into(), o.into());
            }
            other => debug!("Ignoring unknown volume option {:?}", other),
        }
    }
}

fn is_file_path(source: &str) -> bool {
    source.starts_with('.') || source.starts_with('/') || source.starts_with('~')
}

fn ports(service: &str, value: &Value) -> ComposeResult<Value> {
    let entries = match value {
        Value::Sequence(entries) => entries,
        Value::Null => return Ok(Value::Null),
        other => {
            return Err(ComposeError::Shape(format!(
                "invalid type {} for port in service {:?}",
                value_kind(other),
                service
            )))
        }
    };
    let mut out = Vec::new();
    for entry in entries {
        match entry {
            Value::Number(n) => out.extend(parse_port(&n.to_string())?),
            Value::String(s) => out.extend(parse_port(s)?),
            Value::Mapping(_) => out.push(entry.clone()),
            other => {
                return Err(ComposeError::Shape(format!(
                    "invalid type {} for port",
                    value_kind(other)
                )))
            }
        }
    }
    Ok(Value::Sequence(out))
}

/// Expand a short port spec into one long-form entry per port.
///
/// Accepts `target`, `published:target` and `ip:published:target`, each with
/// an optional `/protocol`. Both sides may be ranges (`3000-3001`). A spec
/// holding a template keeps its parts as strings and may not use ranges.
pub fn parse_port(spec: &str) -> ComposeResult<Vec<Value>> {
    let (ports, protocol) = match spec.split_once('/') {
        Some((ports, protocol)) => (ports, protocol),
        None => (spec, "tcp"),
    };

    if spec.contains('$') {
        if spec.contains('-') {
            return Err(ComposeError::Shape(
                "port range not supported with templated values".to_string(),
            ));
        }
        let parts: Vec<&str> = ports.split(':').collect();
        let (published, target) = match parts.as_slice() {
            [target] => (None, *target),
            [.., published, target] => (Some(*published), *target),
            [] => (None, ""),
        };
        return Ok(vec![port_entry(
            protocol,
            Value::String(target.to_string()),
            published.map(|p| Value::String(p.to_string())),
        )]);
    }

    let parts: Vec<&str> = ports.split(':').collect();
    let (published, target) = match parts.as_slice() {
        [target] => ("", *target),
        [published, target] => (*published, *target),
        [_ip, published, target] => (*published, *target),
        _ => {
            return Err(ComposeError::Shape(format!(
                "invalid port specification: {:?}",
                spec
            )))
        }
    };

    let targets = port_range(target, spec)?;
    let published = if published.is_empty() {
        None
    } else {
        Some(port_range(published, spec)?)
    };
    if let Some(published) = &published {
        if published.len() != targets.len() {
            return Err(ComposeError::Shape(format!(
                "invalid ranges specified for container and host ports: {:?}",
                spec
            )));
        }
    }

    Ok(targets
        .iter()
        .enumerate()
        .map(|(i, target)| {
            port_entry(
                protocol,
                Value::Number((*target).into()),
                published.as_ref().map(|p| Value::Number(p[i].into())),
            )
        })
        .collect())
}

const MAX_PORT: u64 = 65535;

fn port_range(range: &str, spec: &str) -> ComposeResult<Vec<u64>> {
    let invalid = || ComposeError::Shape(format!("invalid port specification: {:?}", spec));
    let parse = |s: &str| match s.trim().parse::<u64>() {
        Ok(port) if port <= MAX_PORT => Ok(port),
        _ => Err(invalid()),
    };
    match range.split_once('-') {
        Some((start, end)) => {
            let (start, end) = (parse(start)?, parse(end)?);
            if end < start {
                return Err(invalid());
            }
            Ok((start..=end).collect())
        }
        None => Ok(vec![parse(range)?]),
    }
}

fn port_entry(protocol: &str, target: Value, published: Option<Value>) -> Value {
    let mut port = Mapping::new();
    port.insert("mode".into(), "ingress".into());
    port.insert("target".into(), target);
    if let Some(published) = published {
        port.insert("published".into(), published);
    }
    port.insert("protocol".into(), protocol.into());
    Value::Mapping(port)
}

fn invalid_type(service: &str, key: &str, value: &Value) -> ComposeError {
    ComposeError::Shape(format!(
        "invalid type {} for {} in service {:?}",
        value_kind(value),
        key,
        service
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn yaml(s: &str) -> Mapping {
        serde_yaml::from_str(s).unwrap()
    }

    #[test]
    fn test_parse_port_forms() {
        let ports = parse_port("8080:80/udp").unwrap();
        assert_eq!(ports.len(), 1);
        assert_eq!(ports[0]["target"].as_u64(), Some(80));
        assert_eq!(ports[0]["published"].as_u64(), Some(8080));
        assert_eq!(ports[0]["protocol"].as_str(), Some("udp"));

        let ports = parse_port("80").unwrap();
        assert!(ports[0].get("published").is_none());

        let ports = parse_port("127.0.0.1:5000:5000").unwrap();
        assert_eq!(ports[0]["published"].as_u64(), Some(5000));
    }

    #[test]
    fn test_parse_port_range() {
        let ports = parse_port("3000-3001:4000-4001").unwrap();
        assert_eq!(ports.len(), 2);
        assert_eq!(ports[1]["target"].as_u64(), Some(4001));
        assert_eq!(ports[1]["published"].as_u64(), Some(3001));
        assert!(parse_port("3000-3002:4000-4001").is_err());
    }

    #[test]
    fn test_parse_port_out_of_range() {
        for spec in ["70000-70002:80000-80002", "1-4000000000:1-4000000000", "65536", "8080:65536"] {
            let err = parse_port(spec).unwrap_err();
            assert_eq!(
                err.to_string(),
                format!("invalid port specification: {:?}", spec),
                "{}",
                spec
            );
        }
        let ports = parse_port("65535:65535").unwrap();
        assert_eq!(ports[0]["target"].as_u64(), Some(65535));
    }

    #[test]
    fn test_parse_templated_port() {
        let ports = parse_port("${web.port}:80").unwrap();
        assert_eq!(ports[0]["published"].as_str(), Some("${web.port}"));
        assert_eq!(ports[0]["target"].as_str(), Some("80"));

        let err = parse_port("${start}-${end}:80").unwrap_err();
        assert_eq!(err.to_string(), "port range not supported with templated values");
    }

    #[test]
    fn test_parse_volume() {
        let v = Value::Mapping(parse_volume("./data:/var/lib/data:ro").unwrap());
        assert_eq!(v["type"].as_str(), Some("bind"));
        assert_eq!(v["read_only"].as_bool(), Some(true));

        let v = Value::Mapping(parse_volume("dbdata:/var/lib/db:nocopy").unwrap());
        assert_eq!(v["type"].as_str(), Some("volume"));
        assert_eq!(v["volume"]["nocopy"].as_bool(), Some(true));

        let v = Value::Mapping(parse_volume("/tmp/cache").unwrap());
        assert_eq!(v["target"].as_str(), Some("/tmp/cache"));
        assert!(v.get("source").is_none());

        assert!(parse_volume("a:b:c:d").is_err());
    }

    #[test]
    fn test_normalize_service() {
        let mut service = yaml(
            "command: echo \"hello world\"\n\
             environment: [A=1, B]\n\
             labels: {tier: 1}\n\
             dns: 8.8.8.8\n\
             secrets: [token]\n\
             ports: [80]\n",
        );
        normalize_service("web", &mut service).unwrap();
        let service = Value::Mapping(service);

        let command: Vec<&str> = service["command"]
            .as_sequence()
            .unwrap()
            .iter()
            .filter_map(Value::as_str)
            .collect();
        assert_eq!(command, vec!["echo", "hello world"]);
        assert_eq!(service["environment"]["A"].as_str(), Some("1"));
        assert!(service["environment"]["B"].is_null());
        assert_eq!(service["labels"]["tier"].as_str(), Some("1"));
        assert_eq!(service["dns"][0].as_str(), Some("8.8.8.8"));
        assert_eq!(service["secrets"][0]["source"].as_str(), Some("token"));
        assert_eq!(service["ports"][0]["target"].as_u64(), Some(80));
    }

    #[test]
    fn test_normalize_rejects_bad_shape() {
        let mut service = yaml("ports: 80\n");
        let err = normalize_service("web", &mut service).unwrap_err();
        assert!(err.to_string().contains("invalid type number for port"));
    }
}
