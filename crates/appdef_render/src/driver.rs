//! Pluggable render and format drivers.
//!
//! Render drivers rewrite the raw Compose text before variable substitution.
//! Format drivers serialize the rendered document. Both live in a
//! [`DriverRegistry`] built once at startup and shared by reference.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use serde_yaml::Value;
use tracing::debug;

use appdef_settings::Settings;

use crate::error::{RenderError, RenderResult};
use crate::formatter::{JsonFormatter, YamlFormatter};
use crate::mustache::MustacheRenderer;

/// Render driver name that does nothing.
pub const NO_RENDERER: &str = "none";

/// Rewrites a Compose document before variable substitution.
pub trait RenderDriver: Send + Sync {
    fn apply(&self, document: &str, settings: &Settings) -> RenderResult<String>;
}

/// Serializes a rendered Compose document.
pub trait FormatDriver: Send + Sync {
    fn format(&self, document: &Value) -> RenderResult<String>;
}

/// Registered render and format drivers, by name.
#[derive(Default)]
pub struct DriverRegistry {
    renderers: RwLock<BTreeMap<String, Arc<dyn RenderDriver>>>,
    formatters: RwLock<BTreeMap<String, Arc<dyn FormatDriver>>>,
}

impl DriverRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding the `mustache` renderer and the `yaml` and
    /// `json` formatters.
    pub fn with_builtins() -> RenderResult<Self> {
        let registry = Self::new();
        registry.register_renderer("mustache", Arc::new(MustacheRenderer::new()))?;
        registry.register_formatter("yaml", Arc::new(YamlFormatter))?;
        registry.register_formatter("json", Arc::new(JsonFormatter))?;
        Ok(registry)
    }

    /// Register a render driver. Names are unique.
    pub fn register_renderer(
        &self,
        name: impl Into<String>,
        driver: Arc<dyn RenderDriver>,
    ) -> RenderResult<()> {
        let name = name.into();
        let mut renderers = self.renderers.write().map_err(|_| RenderError::LockPoisoned)?;
        if name == NO_RENDERER || renderers.contains_key(&name) {
            return Err(RenderError::DuplicateDriver(name));
        }
        debug!("Registering renderer: {}", name);
        renderers.insert(name, driver);
        Ok(())
    }

    /// Register a format driver. Names are unique.
    pub fn register_formatter(
        &self,
        name: impl Into<String>,
        driver: Arc<dyn FormatDriver>,
    ) -> RenderResult<()> {
        let name = name.into();
        let mut formatters = self.formatters.write().map_err(|_| RenderError::LockPoisoned)?;
        if formatters.contains_key(&name) {
            return Err(RenderError::DuplicateDriver(name));
        }
        debug!("Registering formatter: {}", name);
        formatters.insert(name, driver);
        Ok(())
    }

    /// Sorted render driver names, `none` included.
    pub fn drivers(&self) -> Vec<String> {
        let mut names = vec![NO_RENDERER.to_string()];
        if let Ok(renderers) = self.renderers.read() {
            names.extend(renderers.keys().cloned());
        }
        names.sort();
        names
    }

    /// Sorted format driver names.
    pub fn formatters(&self) -> Vec<String> {
        self.formatters
            .read()
            .map(|formatters| formatters.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Apply the named render drivers in order.
    pub fn apply<S: AsRef<str>>(
        &self,
        document: &str,
        settings: &Settings,
        renderers: &[S],
    ) -> RenderResult<String> {
        let mut rendered = document.to_string();
        for name in renderers {
            let name = name.as_ref();
            if name == NO_RENDERER {
                continue;
            }
            let driver = self
                .renderers
                .read()
                .map_err(|_| RenderError::LockPoisoned)?
                .get(name)
                .cloned()
                .ok_or_else(|| RenderError::UnknownRenderer(name.to_string()))?;
            rendered = driver.apply(&rendered, settings)?;
        }
        Ok(rendered)
    }

    /// Serialize a document with the named format driver.
    pub fn format(&self, name: &str, document: &Value) -> RenderResult<String> {
        let driver = self
            .formatters
            .read()
            .map_err(|_| RenderError::LockPoisoned)?
            .get(name)
            .cloned()
            .ok_or_else(|| RenderError::UnknownFormatter(name.to_string()))?;
        driver.format(document)
    }
}

impl std::fmt::Debug for DriverRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DriverRegistry")
            .field("renderers", &self.drivers())
            .field("formatters", &self.formatters())
            .finish()
    }
}
