//! # appdef_validator
//!
//! Compose validation for appdef.
//!
//! The [`Validator`] walks a parsed Compose document twice: every [`Rule`]
//! first collects what it needs (such as declared volume names), then the
//! rules validate the nodes they accept. All problems are reported together
//! in a single [`ValidationError`].
//!
//! ## Example
//!
//! ```rust
//! use appdef_validator::Validator;
//!
//! let document = serde_yaml::from_str(
//!     "services:\n  web:\n    volumes: [\"./src:/app\"]\n",
//! ).unwrap();
//! let err = Validator::with_defaults().validate(&document).unwrap_err();
//! assert!(err.to_string().contains("can't use relative path"));
//! ```

pub mod app;
pub mod error;
pub mod rules;
pub mod validator;

pub use app::validate_app;
pub use error::{ValidationError, ValidatorError, ValidatorResult, VALIDATION_BANNER};
pub use rules::{ExternalSecretsRule, RelativePathRule, Rule};
pub use validator::Validator;
