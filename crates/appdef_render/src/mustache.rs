//! The `mustache` render driver.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use tracing::debug;

use appdef_settings::Settings;

use crate::driver::RenderDriver;
use crate::error::{RenderError, RenderResult};

static MUSTACHE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_.]*)\s*\}\}").expect("valid mustache pattern")
});

/// Replaces `{{name}}` placeholders with flattened settings.
///
/// Every placeholder must have a value; an unknown key fails the render.
#[derive(Debug, Default, Clone)]
pub struct MustacheRenderer;

impl MustacheRenderer {
    /// Create a new mustache renderer.
    pub fn new() -> Self {
        Self
    }

    /// Render `content` against a flat variable map.
    pub fn render_content(
        &self,
        content: &str,
        variables: &BTreeMap<String, String>,
    ) -> RenderResult<String> {
        let mut missing = None;
        let rendered = MUSTACHE_PATTERN.replace_all(content, |caps: &Captures| {
            let name = &caps[1];
            match variables.get(name) {
                Some(value) => value.clone(),
                None => {
                    missing.get_or_insert_with(|| name.to_string());
                    String::new()
                }
            }
        });
        if let Some(name) = missing {
            return Err(RenderError::MissingKey(name));
        }
        Ok(rendered.into_owned())
    }
}

impl RenderDriver for MustacheRenderer {
    fn apply(&self, document: &str, settings: &Settings) -> RenderResult<String> {
        debug!("Applying mustache renderer");
        self.render_content(document, &settings.flatten())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_content() {
        let renderer = MustacheRenderer::new();
        let mut vars = BTreeMap::new();
        vars.insert("web.image".to_string(), "nginx".to_string());
        vars.insert("tag".to_string(), "1.25".to_string());

        let out = renderer
            .render_content("image: {{web.image}}:{{ tag }}\nuser: ${user}\n", &vars)
            .unwrap();
        assert_eq!(out, "image: nginx:1.25\nuser: ${user}\n");
    }

    #[test]
    fn test_missing_key() {
        let err = MustacheRenderer::new()
            .render_content("{{nope}}", &BTreeMap::new())
            .unwrap_err();
        assert_eq!(err.to_string(), "missing value for {{nope}}");
    }
}
