//! Kubernetes `Stack` objects written to `templates/stack.yaml`.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde_yaml::{Mapping, Value};
use tracing::debug;

use appdef_compose::{load_template, parse_yaml, unquote, Config};

use crate::error::{HelmError, HelmResult};
use crate::output::write_file;

pub const TEMPLATES_DIR: &str = "templates";
pub const STACK_FILE_NAME: &str = "stack.yaml";
pub const STACK_API_GROUP: &str = "compose.docker.com";

/// Version of the `Stack` resource.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StackVersion {
    /// The Compose file is embedded as a string.
    V1Beta1,
    /// The Compose model is embedded as structured data.
    #[default]
    V1Beta2,
}

impl StackVersion {
    pub fn as_str(&self) -> &'static str {
        match self {
            StackVersion::V1Beta1 => "v1beta1",
            StackVersion::V1Beta2 => "v1beta2",
        }
    }

    pub fn api_version(&self) -> String {
        format!("{}/{}", STACK_API_GROUP, self.as_str())
    }
}

impl fmt::Display for StackVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StackVersion {
    type Err = HelmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "v1beta1" => Ok(StackVersion::V1Beta1),
            "v1beta2" => Ok(StackVersion::V1Beta2),
            other => Err(HelmError::InvalidStackVersion(other.to_string())),
        }
    }
}

/// Build a `Stack` object around a Compose tree.
pub fn stack_object(name: &str, version: StackVersion, compose: Value) -> HelmResult<Value> {
    let spec = match version {
        StackVersion::V1Beta2 => compose,
        StackVersion::V1Beta1 => {
            let mut spec = Mapping::new();
            spec.insert(
                "composeFile".into(),
                Value::String(serde_yaml::to_string(&compose)?),
            );
            Value::Mapping(spec)
        }
    };

    let mut metadata = Mapping::new();
    metadata.insert("name".into(), Value::String(name.to_string()));

    let mut stack = Mapping::new();
    stack.insert("kind".into(), "Stack".into());
    stack.insert("apiVersion".into(), Value::String(version.api_version()));
    stack.insert("metadata".into(), Value::Mapping(metadata));
    stack.insert("spec".into(), spec);
    Ok(Value::Mapping(stack))
}

/// Convert a Compose document into a stack template that keeps every
/// variable as a `{{.Values.name}}` expression.
pub fn template_stack(name: &str, compose: &str, version: StackVersion) -> HelmResult<String> {
    let config = load_template(&parse_yaml(compose)?)?;
    let stack = stack_object(name, version, config.to_template_value()?)?;
    Ok(unquote(&serde_yaml::to_string(&stack)?))
}

/// Convert a rendered Compose model into a stack with concrete values.
pub fn rendered_stack(name: &str, config: &Config, version: StackVersion) -> HelmResult<String> {
    let stack = stack_object(name, version, config.to_resolved_value()?)?;
    Ok(serde_yaml::to_string(&stack)?)
}

/// Write `templates/stack.yaml` under the chart directory.
pub fn write_stack(chart_dir: &Path, stack: &str) -> HelmResult<()> {
    let templates = chart_dir.join(TEMPLATES_DIR);
    std::fs::create_dir_all(&templates)?;
    write_file(&templates.join(STACK_FILE_NAME), stack)?;
    debug!("Wrote {:?}", templates.join(STACK_FILE_NAME));
    Ok(())
}
