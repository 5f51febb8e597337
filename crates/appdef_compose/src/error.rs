//! Error types for Compose loading and template conversion.

use std::collections::BTreeMap;
use thiserror::Error;

/// Result type alias for Compose operations.
pub type ComposeResult<T> = Result<T, ComposeError>;

/// Errors that can occur while loading or converting a Compose document.
#[derive(Error, Debug)]
pub enum ComposeError {
    #[error("failed to parse compose document: {0}")]
    Parse(#[source] serde_yaml::Error),

    #[error("compose document must be a mapping, found {0}")]
    NotAMapping(&'static str),

    #[error("failed to load template compose: {0}")]
    Load(#[source] serde_yaml::Error),

    #[error("Configuration contains forbidden properties: {}", join_keys(.0))]
    ForbiddenProperties(BTreeMap<String, String>),

    #[error("{0}")]
    Shape(String),

    #[error("Expected a map, got {0}")]
    ExpectedMap(&'static str),

    #[error("unresolved template for {field}: {expression}")]
    Unresolved { field: String, expression: String },

    #[error("invalid duration {0:?}")]
    InvalidDuration(String),

    #[error("invalid size {0:?}")]
    InvalidSize(String),

    #[error("failed to marshal compose document: {0}")]
    Serialize(#[source] serde_yaml::Error),
}

fn join_keys(properties: &BTreeMap<String, String>) -> String {
    properties.keys().cloned().collect::<Vec<_>>().join(", ")
}
