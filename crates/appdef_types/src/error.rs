//! Error types for the application package model.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for package operations.
pub type TypesResult<T> = Result<T, TypesError>;

/// Errors that can occur while loading an application package.
#[derive(Error, Debug)]
pub enum TypesError {
    #[error("Application not found at path: {0}")]
    NotFound(PathBuf),

    #[error("failed to read {file}: {source}")]
    ReadFile {
        file: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse application metadata: {0}")]
    MetadataParse(#[source] serde_yaml::Error),

    #[error("failed to validate metadata:\n{0}")]
    MetadataInvalid(String),

    #[error("malformed single-file application: expected 3 documents, found {0}")]
    MalformedSingleFile(usize),

    #[error("{operation}: multiple {what} files is not supported")]
    Unsupported {
        operation: &'static str,
        what: &'static str,
    },

    #[error("failed to load settings: {0}")]
    Settings(#[from] appdef_settings::SettingsError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Directory walk error: {0}")]
    Walk(#[from] walkdir::Error),
}
