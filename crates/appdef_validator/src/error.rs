//! Error types for validation.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for validation operations.
pub type ValidatorResult<T> = Result<T, ValidatorError>;

/// Errors that can occur while validating.
#[derive(Error, Debug)]
pub enum ValidatorError {
    #[error("failed to read compose file {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse compose file: {0}")]
    Parse(#[source] serde_yaml::Error),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{}", .0.join("\n"))]
    Application(Vec<String>),
}

/// Every problem reported by the rules of one validation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub errors: Vec<String>,
}

/// First line of a [`ValidationError`] message.
pub const VALIDATION_BANNER: &str = "Compose file validation failed:";

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts: Vec<String> = self.errors.iter().map(|e| format!("* {}", e)).collect();
        parts.sort();
        write!(f, "{}", VALIDATION_BANNER)?;
        for part in parts {
            write!(f, "\n{}", part)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}
