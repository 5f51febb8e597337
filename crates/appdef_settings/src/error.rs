//! Error types for the settings store.

use thiserror::Error;

/// Result type alias for settings operations.
pub type SettingsResult<T> = Result<T, SettingsError>;

/// Errors that can occur while loading, merging or unflattening settings.
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("failed to read settings: {0}")]
    Read(#[source] serde_yaml::Error),

    #[error("failed to read settings: expected a mapping, found {0}")]
    NotAMapping(&'static str),

    #[error("Non-string key {location}: {key}")]
    NonStringKey { location: String, key: String },

    #[error("key {key} is already present and value has a different type ({existing} vs {incoming})")]
    TypeConflict {
        key: String,
        existing: &'static str,
        incoming: &'static str,
    },

    #[error("key {key} already present and not a map ({found})")]
    NotAMap { key: String, found: &'static str },

    #[error("key {key} already present and not a slice ({found})")]
    NotASequence { key: String, found: &'static str },

    #[error("index {index} of key {key} is out of range, the sequence has {len} elements")]
    IndexOutOfRange {
        key: String,
        index: String,
        len: usize,
    },

    #[error("Missing '=' in setting '{0}', expected KEY=VALUE")]
    MissingEquals(String),

    #[error("Duplicate command line setting: '{0}'")]
    DuplicateOverride(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
