//! Built-in output formatters.

use serde_yaml::Value;

use crate::driver::FormatDriver;
use crate::error::RenderResult;

/// Writes the document as YAML.
#[derive(Debug, Default, Clone, Copy)]
pub struct YamlFormatter;

impl FormatDriver for YamlFormatter {
    fn format(&self, document: &Value) -> RenderResult<String> {
        Ok(serde_yaml::to_string(document)?)
    }
}

/// Writes the document as indented JSON.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonFormatter;

impl FormatDriver for JsonFormatter {
    fn format(&self, document: &Value) -> RenderResult<String> {
        let mut out = serde_json::to_string_pretty(document)?;
        out.push('\n');
        Ok(out)
    }
}
