//! # appdef_render
//!
//! Rendering pipeline for appdef.
//!
//! This crate turns an application package into a fully resolved Compose
//! model. It provides:
//!
//! - **Substitution**: bash-style `$name` / `${name}` replacement that fails on
//!   any missing variable
//! - **Drivers**: a [`DriverRegistry`] of render drivers applied before
//!   substitution and format drivers used to write the result
//! - **`x-enabled`**: services can be switched off from settings
//!
//! ## Example
//!
//! ```rust
//! use std::collections::BTreeMap;
//! use appdef_render::{render, DriverRegistry, RenderOptions};
//! use appdef_types::App;
//!
//! let app = App::new("hello")
//!     .with_metadata("name: hello\nversion: 0.1.0\n").unwrap()
//!     .with_compose("services:\n  web:\n    image: nginx:${tag}\n")
//!     .with_settings("tag: \"1.25\"\n").unwrap();
//!
//! let registry = DriverRegistry::with_builtins().unwrap();
//! let config = render(&app, &BTreeMap::new(), &registry, &RenderOptions::new()).unwrap();
//! assert_eq!(config.services["web"].image.as_deref(), Some("nginx:1.25"));
//! ```

pub mod driver;
pub mod enabled;
pub mod error;
pub mod formatter;
pub mod mustache;
pub mod pipeline;
pub mod substitution;

pub use driver::{DriverRegistry, FormatDriver, RenderDriver, NO_RENDERER};
pub use enabled::{is_enabled, remove_disabled_services, ENABLED_KEY};
pub use error::{RenderError, RenderResult};
pub use formatter::{JsonFormatter, YamlFormatter};
pub use mustache::MustacheRenderer;
pub use pipeline::{
    load_rendered, render, render_document, render_settings, RenderOptions, METADATA_PREFIX,
    RENDERERS_ENV,
};
pub use substitution::{check_syntax, extract_variables, substitute, PATTERN};
