//! The full render pipeline.
//!
//! Settings are assembled from the application's settings files, its metadata
//! (under the `app` key) and command line overrides, in increasing priority.
//! Each Compose document then goes through the selected render drivers and
//! variable substitution before the documents are merged, loaded into the
//! typed model and checked for unresolved values.

use std::collections::BTreeMap;
use std::env;

use serde_yaml::{Mapping, Value};
use tracing::{debug, info, warn};

use appdef_compose::{load_template, parse_yaml, Config};
use appdef_settings::{load, LoadOptions, Settings};
use appdef_types::App;

use crate::driver::DriverRegistry;
use crate::enabled::remove_disabled_services;
use crate::error::{RenderError, RenderResult};
use crate::substitution::substitute;

/// Environment variable selecting the render drivers, comma separated.
pub const RENDERERS_ENV: &str = "APPDEF_RENDERERS";

/// Key under which application metadata is exposed to templates.
pub const METADATA_PREFIX: &str = "app";

/// Options for [`render`].
#[derive(Debug, Clone, Default)]
pub struct RenderOptions {
    /// Render drivers applied before substitution, in order.
    pub renderers: Vec<String>,
}

impl RenderOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_renderers<I, S>(mut self, renderers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.renderers = renderers.into_iter().map(Into::into).collect();
        self
    }

    /// Read the driver list from `APPDEF_RENDERERS`.
    pub fn from_env() -> Self {
        match env::var(RENDERERS_ENV) {
            Ok(value) => Self::new().with_renderers(parse_renderers(&value)),
            Err(_) => Self::new(),
        }
    }
}

fn parse_renderers(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

/// Merge settings files, metadata and overrides into a single document.
pub fn render_settings(app: &App, overrides: &BTreeMap<String, String>) -> RenderResult<Settings> {
    let metadata = load(
        app.metadata_raw(),
        &LoadOptions::new().with_prefix(METADATA_PREFIX),
    )?;
    let overrides = Settings::from_flatten(overrides)?;
    let settings = app.settings().clone().merge(metadata).merge(overrides);

    for key in settings.nil_keys() {
        warn!("Setting {} has no value, it will be substituted as an empty string", key);
    }
    Ok(settings)
}

/// Render an application into a fully resolved Compose model.
pub fn render(
    app: &App,
    overrides: &BTreeMap<String, String>,
    registry: &DriverRegistry,
    options: &RenderOptions,
) -> RenderResult<Config> {
    let document = render_document(app, overrides, registry, options)?;
    load_rendered(&document)
}

/// Apply drivers and substitution to every Compose document and merge the
/// results, without loading them into the typed model.
pub fn render_document(
    app: &App,
    overrides: &BTreeMap<String, String>,
    registry: &DriverRegistry,
    options: &RenderOptions,
) -> RenderResult<Value> {
    let known = registry.drivers();
    if let Some(unknown) = options.renderers.iter().find(|name| !known.contains(name)) {
        return Err(RenderError::UnknownRenderer(unknown.clone()));
    }

    let settings = render_settings(app, overrides)?;
    let environment = settings.flatten();
    info!("Rendering application {}", app.name());

    let mut merged = Mapping::new();
    for (index, compose) in app.composes().iter().enumerate() {
        debug!("Rendering compose document {}", index);
        let document = registry.apply(compose, &settings, &options.renderers)?;
        let document = substitute(&document, &environment)?;
        if let Value::Mapping(mapping) = parse_yaml(&document)? {
            merge_documents(&mut merged, mapping);
        }
    }
    Ok(Value::Mapping(merged))
}

/// Load a substituted document strictly and drop disabled services.
pub fn load_rendered(document: &Value) -> RenderResult<Config> {
    let mut config = load_template(document)?;
    config.to_resolved_value()?;
    remove_disabled_services(&mut config)?;
    info!("Rendered {} services", config.services.len());
    Ok(config)
}

/// Overlay `source` onto `target`. Mappings merge recursively, anything else
/// replaces.
fn merge_documents(target: &mut Mapping, source: Mapping) {
    for (key, value) in source {
        match (target.get_mut(&key), value) {
            (Some(Value::Mapping(existing)), Value::Mapping(incoming)) => {
                merge_documents(existing, incoming)
            }
            (_, value) => {
                target.insert(key, value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_renderers() {
        assert_eq!(parse_renderers("mustache, none,"), vec!["mustache", "none"]);
        assert!(parse_renderers("").is_empty());
    }

    #[test]
    fn test_merge_documents() {
        let mut target: Mapping =
            serde_yaml::from_str("services:\n  web:\n    image: a\n    ports: [80]\n").unwrap();
        let source: Mapping =
            serde_yaml::from_str("services:\n  web:\n    ports: [8080]\n  db:\n    image: b\n")
                .unwrap();
        merge_documents(&mut target, source);
        let target = Value::Mapping(target);
        let web = &target["services"]["web"];
        assert_eq!(web["image"].as_str(), Some("a"));
        assert_eq!(web["ports"], Value::Sequence(vec![Value::Number(8080.into())]));
        assert_eq!(target["services"]["db"]["image"].as_str(), Some("b"));
    }

    #[test]
    fn test_render_settings_priority() {
        let app = App::new("demo")
            .with_metadata("name: demo\nversion: 0.1.0\n")
            .unwrap()
            .with_settings("port: 80\napp:\n  name: shadowed\n")
            .unwrap();
        let mut overrides = BTreeMap::new();
        overrides.insert("port".to_string(), "8080".to_string());

        let settings = render_settings(&app, &overrides).unwrap();
        let flat = settings.flatten();
        assert_eq!(flat["port"], "8080");
        assert_eq!(flat["app.name"], "demo");
        assert_eq!(flat["app.version"], "0.1.0");
    }
}
