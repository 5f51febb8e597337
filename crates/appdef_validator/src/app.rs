//! Validation of a whole application package.

use std::collections::BTreeMap;
use std::path::Path;

use tracing::info;

use appdef_render::{load_rendered, render_document, DriverRegistry, RenderOptions};
use appdef_types::{App, COMPOSE_FILE_NAME, METADATA_FILE_NAME, SETTINGS_FILE_NAME};

use crate::error::{ValidatorError, ValidatorResult};
use crate::validator::Validator;

/// Check that an application loads, renders, and passes the default rules.
///
/// The rules run on the substituted document as written, before short
/// syntax is normalized. Problems from every stage that could run are
/// reported together.
pub fn validate_app<P: AsRef<Path>>(
    path: impl AsRef<Path>,
    settings_files: &[P],
    overrides: &BTreeMap<String, String>,
    registry: &DriverRegistry,
    options: &RenderOptions,
) -> ValidatorResult<()> {
    let path = path.as_ref();
    info!("Validating application {:?}", path);

    let mut errors = missing_files(path);
    let loaded = App::open(path).and_then(|app| app.with_settings_files(settings_files));
    match loaded {
        Ok(app) => match render_document(&app, overrides, registry, options) {
            Ok(document) => {
                if let Err(e) = load_rendered(&document) {
                    errors.push(e.to_string());
                }
                if let Err(e) = Validator::with_defaults().validate(&document) {
                    errors.push(e.to_string());
                }
            }
            Err(e) => errors.push(e.to_string()),
        },
        Err(e) => {
            if errors.is_empty() {
                errors.push(e.to_string());
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ValidatorError::Application(errors))
    }
}

fn missing_files(path: &Path) -> Vec<String> {
    if !path.is_dir() {
        return Vec::new();
    }
    [
        (SETTINGS_FILE_NAME, "settings"),
        (METADATA_FILE_NAME, "metadata"),
        (COMPOSE_FILE_NAME, "compose"),
    ]
    .iter()
    .filter(|(file, _)| !path.join(file).is_file())
    .map(|(_, what)| format!("failed to read application {}", what))
    .collect()
}
