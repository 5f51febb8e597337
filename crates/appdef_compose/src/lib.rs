//! # appdef_compose
//!
//! Template-preserving Compose model for appdef.
//!
//! A Compose document can be loaded without resolving any of its variables:
//! every boolean, integer, size and duration field is an [`OrTemplate`]
//! holding either a parsed value or the raw expression. The same model serves
//! two pipelines:
//!
//! - **Render**: variables are substituted first, then
//!   [`Config::to_resolved_value`] unwraps concrete values and fails on any
//!   field that still holds an expression.
//! - **Helm**: [`Config::to_template_value`] rewrites `$name` and `${name}`
//!   into `{{.Values.name}}` so the chart resolves them at install time.
//!
//! # Example
//!
//! ```rust
//! use appdef_compose::{load_template, parse_yaml, unquote};
//!
//! let doc = parse_yaml("services:\n  web:\n    image: nginx\n    privileged: ${debug}\n").unwrap();
//! let config = load_template(&doc).unwrap();
//! let tree = config.to_template_value().unwrap();
//! let yaml = unquote(&serde_yaml::to_string(&tree).unwrap());
//! assert!(yaml.contains("privileged: {{.Values.debug}}"));
//! ```

pub mod convert;
pub mod error;
pub mod loader;
pub mod normalize;
pub mod or_template;
pub mod types;
pub mod units;

pub use convert::{
    convert_templates, map_values, resolve_templates, to_go_template, unquote, TEMPLATE_PREFIX,
};
pub use error::{ComposeError, ComposeResult};
pub use loader::{forbidden_properties, load_template, parse_yaml, FORBIDDEN_PROPERTIES};
pub use normalize::{normalize_service, parse_port, parse_volume};
pub use or_template::{
    transform_bool, transform_duration, transform_size, transform_uint64, BoolOrTemplate,
    DurationOrTemplate, OrTemplate, TemplateScalar, UInt64OrTemplate, UnitBytesOrTemplate,
};
pub use types::{
    Config, DeployConfig, FileReferenceConfig, HealthCheckConfig, Resource, Resources,
    ServiceConfig, ServicePortConfig, ServiceVolumeConfig, UpdateConfig,
};
pub use units::{parse_duration, ram_in_bytes, Duration, UnitBytes};
