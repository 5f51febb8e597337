//! Application metadata (`metadata.yml`).

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{TypesError, TypesResult};

/// One of the application's maintainers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Maintainer {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub email: String,
}

impl fmt::Display for Maintainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.email.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{} <{}>", self.name, self.email)
        }
    }
}

/// The content of an application's metadata file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppMetadata {
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub namespace: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub maintainers: Vec<Maintainer>,
}

impl AppMetadata {
    /// Parse and validate raw metadata.
    pub fn load(data: &[u8]) -> TypesResult<Self> {
        let meta: AppMetadata = if data.iter().all(u8::is_ascii_whitespace) {
            AppMetadata::default()
        } else {
            serde_yaml::from_slice(data).map_err(TypesError::MetadataParse)?
        };
        meta.validate()?;
        Ok(meta)
    }

    /// Check the fields every application must declare.
    pub fn validate(&self) -> TypesResult<()> {
        let mut problems = Vec::new();
        if self.name.trim().is_empty() {
            problems.push("- name: name is required");
        }
        if self.version.trim().is_empty() {
            problems.push("- version: version is required");
        }
        if problems.is_empty() {
            Ok(())
        } else {
            Err(TypesError::MetadataInvalid(problems.join("\n")))
        }
    }

    /// Maintainers joined for display.
    pub fn maintainers_display(&self) -> String {
        self.maintainers
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    }
}
