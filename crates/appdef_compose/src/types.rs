//! Typed Compose model shared by the render and Helm pipelines.
//!
//! Every field that holds a boolean, an unsigned integer, a size or a
//! duration is an [`OrTemplate`]. Such fields are read under their Compose
//! name and written under a `template_` prefixed name, so the serialized tree
//! can later be unwrapped into either concrete values or template syntax.
//! Keys the model does not name are kept in `extras` and written back as is.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_yaml::{Mapping, Value};

use appdef_settings::scalar_to_string;

use crate::or_template::{BoolOrTemplate, DurationOrTemplate, UInt64OrTemplate, UnitBytesOrTemplate};

/// A Compose document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(
        default,
        deserialize_with = "scalar_string",
        skip_serializing_if = "String::is_empty"
    )]
    pub version: String,
    #[serde(default)]
    pub services: BTreeMap<String, ServiceConfig>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub networks: BTreeMap<String, Value>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub volumes: BTreeMap<String, Value>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub secrets: BTreeMap<String, Value>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub configs: BTreeMap<String, Value>,
    #[serde(flatten)]
    pub extras: Mapping,
}

/// One service of a Compose document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entrypoint: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_dir: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restart: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_signal: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cap_add: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cap_drop: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dns: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dns_search: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub env_file: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tmpfs: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub expose: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extra_hosts: Vec<String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub environment: BTreeMap<String, Option<String>>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ports: Vec<ServicePortConfig>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub volumes: Vec<ServiceVolumeConfig>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub secrets: Vec<FileReferenceConfig>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub configs: Vec<FileReferenceConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deploy: Option<DeployConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub healthcheck: Option<HealthCheckConfig>,

    #[serde(
        default,
        rename(serialize = "template_init", deserialize = "init"),
        skip_serializing_if = "Option::is_none"
    )]
    pub init: Option<BoolOrTemplate>,
    #[serde(
        default,
        rename(serialize = "template_privileged", deserialize = "privileged"),
        skip_serializing_if = "Option::is_none"
    )]
    pub privileged: Option<BoolOrTemplate>,
    #[serde(
        default,
        rename(serialize = "template_read_only", deserialize = "read_only"),
        skip_serializing_if = "Option::is_none"
    )]
    pub read_only: Option<BoolOrTemplate>,
    #[serde(
        default,
        rename(serialize = "template_stdin_open", deserialize = "stdin_open"),
        skip_serializing_if = "Option::is_none"
    )]
    pub stdin_open: Option<BoolOrTemplate>,
    #[serde(
        default,
        rename(serialize = "template_tty", deserialize = "tty"),
        skip_serializing_if = "Option::is_none"
    )]
    pub tty: Option<BoolOrTemplate>,
    #[serde(
        default,
        rename(serialize = "template_stop_grace_period", deserialize = "stop_grace_period"),
        skip_serializing_if = "Option::is_none"
    )]
    pub stop_grace_period: Option<DurationOrTemplate>,

    #[serde(flatten)]
    pub extras: Mapping,
}

impl ServiceConfig {
    /// An extension field (`x-...`) or any other key outside the model.
    pub fn extra(&self, key: &str) -> Option<&Value> {
        self.extras.get(key)
    }
}

/// Deployment settings of a service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeployConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(
        default,
        rename(serialize = "template_replicas", deserialize = "replicas"),
        skip_serializing_if = "Option::is_none"
    )]
    pub replicas: Option<UInt64OrTemplate>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_config: Option<UpdateConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rollback_config: Option<UpdateConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resources: Option<Resources>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint_mode: Option<String>,
    #[serde(flatten)]
    pub extras: Mapping,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateConfig {
    #[serde(
        default,
        rename(serialize = "template_parallelism", deserialize = "parallelism"),
        skip_serializing_if = "Option::is_none"
    )]
    pub parallelism: Option<UInt64OrTemplate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_action: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<String>,
    #[serde(flatten)]
    pub extras: Mapping,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Resources {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limits: Option<Resource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reservations: Option<Resource>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    #[serde(
        default,
        deserialize_with = "optional_scalar_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub cpus: Option<String>,
    #[serde(
        default,
        rename(serialize = "template_memory", deserialize = "memory"),
        skip_serializing_if = "Option::is_none"
    )]
    pub memory: Option<UnitBytesOrTemplate>,
    #[serde(flatten)]
    pub extras: Mapping,
}

/// Healthcheck settings of a service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HealthCheckConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test: Option<Value>,
    #[serde(
        default,
        rename(serialize = "template_timeout", deserialize = "timeout"),
        skip_serializing_if = "Option::is_none"
    )]
    pub timeout: Option<DurationOrTemplate>,
    #[serde(
        default,
        rename(serialize = "template_interval", deserialize = "interval"),
        skip_serializing_if = "Option::is_none"
    )]
    pub interval: Option<DurationOrTemplate>,
    #[serde(
        default,
        rename(serialize = "template_retries", deserialize = "retries"),
        skip_serializing_if = "Option::is_none"
    )]
    pub retries: Option<UInt64OrTemplate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disable: Option<bool>,
    #[serde(flatten)]
    pub extras: Mapping,
}

/// A published port, always in long form after loading.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServicePortConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(
        default,
        rename(serialize = "template_target", deserialize = "target"),
        skip_serializing_if = "Option::is_none"
    )]
    pub target: Option<UInt64OrTemplate>,
    #[serde(
        default,
        rename(serialize = "template_published", deserialize = "published"),
        skip_serializing_if = "Option::is_none"
    )]
    pub published: Option<UInt64OrTemplate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
}

/// A volume mount, always in long form after loading.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceVolumeConfig {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(
        default,
        rename(serialize = "template_read_only", deserialize = "read_only"),
        skip_serializing_if = "Option::is_none"
    )]
    pub read_only: Option<BoolOrTemplate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consistency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bind: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tmpfs: Option<Value>,
}

/// A service reference to a secret or a config.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileReferenceConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(
        default,
        deserialize_with = "optional_scalar_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub uid: Option<String>,
    #[serde(
        default,
        deserialize_with = "optional_scalar_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub gid: Option<String>,
    #[serde(
        default,
        rename(serialize = "template_mode", deserialize = "mode"),
        skip_serializing_if = "Option::is_none"
    )]
    pub mode: Option<UInt64OrTemplate>,
}

fn scalar_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(scalar_to_string(&Value::deserialize(deserializer)?))
}

fn optional_scalar_string<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        other => Ok(Some(scalar_to_string(&other))),
    }
}
