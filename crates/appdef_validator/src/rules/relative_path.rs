use std::collections::BTreeSet;
use std::path::Path;

use serde_yaml::Value;

use appdef_settings::scalar_to_string;

use super::Rule;

/// Service volumes must be absolute paths or declared named volumes.
#[derive(Debug, Default, Clone)]
pub struct RelativePathRule {
    volumes: BTreeSet<String>,
}

impl RelativePathRule {
    pub fn new() -> Self {
        Self::default()
    }

    fn check_source(&self, source: &str) -> bool {
        Path::new(source).is_absolute() || self.volumes.contains(source)
    }

    fn check_short(&self, spec: &str, service: &str) -> Option<String> {
        let Some((source, _)) = spec.split_once(':') else {
            return Some(format!(
                "invalid volume definition ({:?}) in service {:?}",
                spec, service
            ));
        };
        if self.check_source(source) {
            None
        } else {
            Some(relative_path_error(spec, service))
        }
    }

    fn check_long(&self, volume: &serde_yaml::Mapping, service: &str) -> Option<String> {
        if volume.get("type").and_then(Value::as_str) == Some("tmpfs") {
            return None;
        }
        match volume.get("source") {
            Some(Value::String(source)) if self.check_source(source) => None,
            Some(Value::String(source)) => Some(relative_path_error(source, service)),
            _ => Some(invalid_volume_error(service)),
        }
    }
}

fn relative_path_error(source: &str, service: &str) -> String {
    format!(
        "can't use relative path as volume source ({:?}) in service {:?}",
        source, service
    )
}

fn invalid_volume_error(service: &str) -> String {
    format!("invalid volume in service {:?}", service)
}

impl Rule for RelativePathRule {
    fn collect(&mut self, parent: &str, key: &str, _value: &Value) {
        if parent == "volumes" {
            self.volumes.insert(key.to_string());
        }
    }

    fn accept(&self, parent: &str, key: &str) -> bool {
        key == "volumes"
            && parent
                .strip_prefix("services.")
                .map(|service| !service.is_empty())
                .unwrap_or(false)
    }

    fn validate(&self, parent: &str, _key: &str, value: &Value) -> Vec<String> {
        let service = parent.strip_prefix("services.").unwrap_or(parent);
        match value {
            Value::Sequence(entries) => entries
                .iter()
                .filter_map(|entry| match entry {
                    Value::String(spec) => self.check_short(spec, service),
                    Value::Mapping(volume) => self.check_long(volume, service),
                    _ => Some(invalid_volume_error(service)),
                })
                .collect(),
            Value::Mapping(volume) => self.check_long(volume, service).into_iter().collect(),
            other => vec![format!(
                "invalid volume definition ({:?}) in service {:?}",
                scalar_to_string(other),
                service
            )],
        }
    }
}
