//! Loading Compose documents into the typed model.

use std::collections::BTreeMap;

use serde_yaml::{Mapping, Value};
use tracing::debug;

use appdef_settings::value_kind;

use crate::error::{ComposeError, ComposeResult};
use crate::normalize::normalize_service;
use crate::types::Config;

/// Service properties that cannot be deployed, with the reason.
pub const FORBIDDEN_PROPERTIES: &[(&str, &str)] = &[
    ("extends", "Support for `extends` is not implemented yet."),
    (
        "volume_driver",
        "Instead of setting the volume driver on the service, define a volume using the top-level `volumes` option and specify the driver there.",
    ),
    (
        "volumes_from",
        "To share a volume between services, define it using the top-level `volumes` option and reference it from each service that shares it using the service-level `volumes` option.",
    ),
    ("cpu_quota", "Set resource limits using deploy.resources"),
    ("cpu_shares", "Set resource limits using deploy.resources"),
    ("cpuset", "Set resource limits using deploy.resources"),
    ("mem_limit", "Set resource limits using deploy.resources"),
    ("memswap_limit", "Set resource limits using deploy.resources"),
];

/// Parse a Compose document into a generic tree. The top level must be a mapping.
pub fn parse_yaml(data: &str) -> ComposeResult<Value> {
    let value: Value = serde_yaml::from_str(data).map_err(ComposeError::Parse)?;
    match value {
        Value::Mapping(_) => Ok(value),
        Value::Null => Ok(Value::Mapping(Mapping::new())),
        other => Err(ComposeError::NotAMapping(value_kind(&other))),
    }
}

/// Load a document without resolving any variable.
///
/// Fields holding a boolean, integer, size or duration keep unparseable
/// strings as template expressions. No schema validation is performed.
pub fn load_template(document: &Value) -> ComposeResult<Config> {
    let mut document = match document {
        Value::Mapping(m) => m.clone(),
        other => return Err(ComposeError::NotAMapping(value_kind(other))),
    };

    validate_forbidden(&document)?;

    if let Some(Value::Mapping(services)) = document.get_mut("services") {
        for (name, service) in services.iter_mut() {
            let name = name.as_str().unwrap_or_default().to_string();
            match service {
                Value::Mapping(service) => normalize_service(&name, service)?,
                Value::Null => *service = Value::Mapping(Mapping::new()),
                other => {
                    return Err(ComposeError::Shape(format!(
                        "service {:?} must be a mapping, found {}",
                        name,
                        value_kind(other)
                    )))
                }
            }
        }
    }

    let config: Config =
        serde_yaml::from_value(Value::Mapping(document)).map_err(ComposeError::Load)?;
    debug!("Loaded template compose with {} services", config.services.len());
    Ok(config)
}

/// Forbidden properties used by any service, with their reasons.
pub fn forbidden_properties(document: &Mapping) -> BTreeMap<String, String> {
    let mut found = BTreeMap::new();
    let Some(Value::Mapping(services)) = document.get("services") else {
        return found;
    };
    for service in services.values() {
        let Value::Mapping(service) = service else { continue };
        for (property, reason) in FORBIDDEN_PROPERTIES {
            if service.contains_key(*property) {
                found.insert(property.to_string(), reason.to_string());
            }
        }
    }
    found
}

fn validate_forbidden(document: &Mapping) -> ComposeResult<()> {
    let forbidden = forbidden_properties(document);
    if forbidden.is_empty() {
        Ok(())
    } else {
        Err(ComposeError::ForbiddenProperties(forbidden))
    }
}
