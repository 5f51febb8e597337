//! Error types for rendering.

use thiserror::Error;

/// Result type alias for render operations.
pub type RenderResult<T> = Result<T, RenderError>;

/// Errors that can occur while rendering an application.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("the default value syntax is not supported: the characters ':' and '-' are not allowed in variable names. Invalid variable: {0}")]
    DefaultValueSyntax(String),

    #[error("the custom error message syntax is not supported: the characters ':' and '?' are not allowed in variable names. Invalid variable: {0}")]
    CustomErrorSyntax(String),

    #[error("invalid template: {0}")]
    InvalidTemplate(String),

    #[error("required variable {name} is missing a value (in {expression})")]
    MissingVariable { name: String, expression: String },

    #[error("renderer '{0}' not found")]
    UnknownRenderer(String),

    #[error("formatter '{0}' not found")]
    UnknownFormatter(String),

    #[error("driver '{0}' is already registered")]
    DuplicateDriver(String),

    #[error("missing value for {{{{{0}}}}}")]
    MissingKey(String),

    #[error("{0} is not a valid value for x-enabled")]
    InvalidEnabled(String),

    #[error("invalid type ({0}) for x-enabled")]
    InvalidEnabledType(&'static str),

    #[error("driver registry lock poisoned")]
    LockPoisoned,

    #[error("failed to merge settings: {0}")]
    Settings(#[from] appdef_settings::SettingsError),

    #[error("failed to load composefiles: {0}")]
    Compose(#[from] appdef_compose::ComposeError),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
