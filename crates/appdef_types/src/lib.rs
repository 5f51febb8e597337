//! # appdef_types
//!
//! Application package model for appdef.
//!
//! An application package bundles a metadata document, a Compose document and
//! a settings document. Packages are read either from a directory
//! (`metadata.yml`, `docker-compose.yml`, `settings.yml` plus any attachments)
//! or from a single file holding the three documents separated by `---`.
//!
//! # Example
//!
//! ```rust,no_run
//! use appdef_types::App;
//!
//! let app = App::open("hello.dockerapp").unwrap();
//! println!("{} {}", app.metadata().name, app.metadata().version);
//! for attachment in app.attachments() {
//!     println!("{} ({} bytes)", attachment.path, attachment.size);
//! }
//! ```

pub mod app;
pub mod error;
pub mod metadata;

pub use app::{
    app_name_from_dir, App, AppSource, Attachment, APP_EXTENSION, COMPOSE_FILE_NAME,
    METADATA_FILE_NAME, SETTINGS_FILE_NAME, SINGLE_FILE_SEPARATOR,
};
pub use error::{TypesError, TypesResult};
pub use metadata::{AppMetadata, Maintainer};
