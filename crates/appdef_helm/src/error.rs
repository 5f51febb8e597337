//! Error types for Helm chart generation.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for Helm operations.
pub type HelmResult<T> = Result<T, HelmError>;

/// Errors that can occur while generating a Helm chart.
#[derive(Error, Debug)]
pub enum HelmError {
    #[error("invalid stack version {0:?}")]
    InvalidStackVersion(String),

    #[error("helm rendering doesn't support multiple composefiles")]
    MultipleComposes,

    #[error("application has no compose file")]
    NoCompose,

    #[error("failed to create Chart directory {path:?}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse existing {file}: {source}")]
    ParseExisting {
        file: &'static str,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("{file} must hold a mapping")]
    NotAMapping { file: &'static str },

    #[error("failed to merge settings: {0}")]
    Settings(#[from] appdef_settings::SettingsError),

    #[error("failed to load template compose: {0}")]
    Compose(#[from] appdef_compose::ComposeError),

    #[error(transparent)]
    Render(#[from] appdef_render::RenderError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}
