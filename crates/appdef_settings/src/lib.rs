//! # appdef_settings
//!
//! Hierarchical settings store for appdef.
//!
//! Settings are loaded from YAML documents, deep-merged left to right (later
//! sources win, sequences are replaced wholesale) and flattened into the
//! `dotted.key -> string` environment used by variable substitution.
//!
//! ## Example
//!
//! ```rust,no_run
//! use appdef_settings::{load, load_files, parse_overrides, LoadOptions, Settings};
//!
//! let files = load_files(&["settings.yml", "prod.yml"], &LoadOptions::new()).unwrap();
//! let meta = load(b"name: my-app", &LoadOptions::new().with_prefix("app")).unwrap();
//! let overrides = parse_overrides(&["front.port=8080"]).unwrap();
//! let cli = Settings::from_flatten(&overrides).unwrap();
//!
//! let all = files.merge(meta).merge(cli);
//! let env = all.flatten();
//! assert_eq!(env.get("front.port").map(String::as_str), Some("8080"));
//! ```

pub mod error;
pub mod flatten;
pub mod overrides;
pub mod settings;

pub use error::{SettingsError, SettingsResult};
pub use flatten::scalar_to_string;
pub use overrides::parse_overrides;
pub use settings::{
    load, load_file, load_files, load_multiple, merge, value_kind, LoadOptions, Settings,
};
