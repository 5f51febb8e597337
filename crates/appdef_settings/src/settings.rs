//! Settings loading and deep merge.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};
use tracing::debug;

use crate::error::{SettingsError, SettingsResult};

/// A hierarchical settings document.
///
/// Every key, at every nesting level, is a string. Dotted keys found in a
/// source document (`ssh.user: x`) are expanded into nested mappings when the
/// document is loaded, so two sources using either spelling merge together.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Settings(Mapping);

/// Options for loading a settings document.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Wrap the loaded document under this single top-level key.
    pub prefix: Option<String>,
}

impl LoadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }
}

impl Settings {
    /// Create an empty settings document.
    pub fn new() -> Self {
        Self(Mapping::new())
    }

    /// Build settings from an already string-keyed mapping.
    pub fn from_mapping(mapping: Mapping) -> SettingsResult<Self> {
        let converted = convert_keys(Value::Mapping(mapping), "")?;
        match converted {
            Value::Mapping(m) => Ok(Self(expand_dotted_keys(m))),
            other => Err(SettingsError::NotAMapping(value_kind(&other))),
        }
    }

    /// Borrow the underlying mapping.
    pub fn as_mapping(&self) -> &Mapping {
        &self.0
    }

    /// Consume the settings, returning the underlying mapping.
    pub fn into_mapping(self) -> Mapping {
        self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Top-level keys in document order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().filter_map(Value::as_str)
    }

    /// Look up a value by dotted path (`a.b.c`, `list.0`).
    pub fn get(&self, path: &str) -> Option<&Value> {
        let mut segments = path.split('.');
        let first = segments.next()?;
        let mut current = self.0.get(first)?;
        for segment in segments {
            current = match current {
                Value::Mapping(m) => m.get(segment)?,
                Value::Sequence(s) => s.get(segment.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        Some(current)
    }

    /// Deep-merge `other` on top of `self`.
    ///
    /// Nested mappings merge recursively; any other value in `other`
    /// (scalars and sequences alike) replaces what was there.
    pub fn merge(mut self, other: Settings) -> Settings {
        merge_mapping(&mut self.0, other.0);
        self
    }
}

/// Merge several settings left to right. Later sources win.
pub fn merge<I>(sources: I) -> Settings
where
    I: IntoIterator<Item = Settings>,
{
    sources
        .into_iter()
        .fold(Settings::new(), |acc, next| acc.merge(next))
}

/// Load a single YAML document into settings.
///
/// Only the first document of a multi-document stream is read. An empty
/// document yields empty settings.
pub fn load(data: &[u8], options: &LoadOptions) -> SettingsResult<Settings> {
    let value = if is_blank(data) {
        Value::Null
    } else {
        match serde_yaml::Deserializer::from_slice(data).next() {
            Some(document) => Value::deserialize(document).map_err(SettingsError::Read)?,
            None => Value::Null,
        }
    };

    let mapping = match value {
        Value::Null => Mapping::new(),
        Value::Mapping(m) => m,
        other => return Err(SettingsError::NotAMapping(value_kind(&other))),
    };

    let mut settings = Settings::from_mapping(mapping)?;
    if let Some(prefix) = &options.prefix {
        let mut wrapped = Mapping::new();
        wrapped.insert(Value::String(prefix.clone()), Value::Mapping(settings.0));
        settings = Settings(wrapped);
    }
    Ok(settings)
}

/// Load several in-memory documents and merge them in order.
pub fn load_multiple<D>(datas: &[D], options: &LoadOptions) -> SettingsResult<Settings>
where
    D: AsRef<[u8]>,
{
    let mut merged = Settings::new();
    for data in datas {
        merged = merged.merge(load(data.as_ref(), options)?);
    }
    Ok(merged)
}

/// Load a settings file.
pub fn load_file(path: impl AsRef<Path>, options: &LoadOptions) -> SettingsResult<Settings> {
    let path = path.as_ref();
    debug!("Loading settings from {:?}", path);
    let data = fs::read(path)?;
    load(&data, options)
}

/// Load several settings files and merge them in order.
///
/// The first file that cannot be read or parsed aborts the whole load.
pub fn load_files<P>(paths: &[P], options: &LoadOptions) -> SettingsResult<Settings>
where
    P: AsRef<Path>,
{
    let mut merged = Settings::new();
    for path in paths {
        merged = merged.merge(load_file(path, options)?);
    }
    Ok(merged)
}

/// Human readable name of a YAML value's kind.
pub fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Sequence(_) => "sequence",
        Value::Mapping(_) => "mapping",
        Value::Tagged(_) => "tagged",
    }
}

pub(crate) fn merge_mapping(target: &mut Mapping, source: Mapping) {
    for (key, value) in source {
        match value {
            Value::Mapping(incoming) => match target.get_mut(&key) {
                Some(Value::Mapping(existing)) => merge_mapping(existing, incoming),
                _ => {
                    target.insert(key, Value::Mapping(incoming));
                }
            },
            other => {
                target.insert(key, other);
            }
        }
    }
}

fn is_blank(data: &[u8]) -> bool {
    match std::str::from_utf8(data) {
        Ok(text) => text.lines().all(|line| {
            let line = line.trim();
            line.is_empty() || line.starts_with('#')
        }),
        Err(_) => false,
    }
}

fn convert_keys(value: Value, prefix: &str) -> SettingsResult<Value> {
    match value {
        Value::Mapping(mapping) => {
            let mut converted = Mapping::new();
            for (key, entry) in mapping {
                let name = match key {
                    Value::String(s) => s,
                    other => {
                        let location = if prefix.is_empty() {
                            "at top level".to_string()
                        } else {
                            format!("in {}", prefix)
                        };
                        return Err(SettingsError::NonStringKey {
                            location,
                            key: describe_key(&other),
                        });
                    }
                };
                let child_prefix = if prefix.is_empty() {
                    name.clone()
                } else {
                    format!("{}.{}", prefix, name)
                };
                let entry = convert_keys(entry, &child_prefix)?;
                converted.insert(Value::String(name), entry);
            }
            Ok(Value::Mapping(converted))
        }
        Value::Sequence(items) => items
            .into_iter()
            .enumerate()
            .map(|(index, item)| convert_keys(item, &format!("{}[{}]", prefix, index)))
            .collect::<SettingsResult<Vec<_>>>()
            .map(Value::Sequence),
        Value::Tagged(tagged) => convert_keys(tagged.value, prefix),
        scalar => Ok(scalar),
    }
}

fn describe_key(key: &Value) -> String {
    match key {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => format!("{:?}", s),
        other => format!("<{}>", value_kind(other)),
    }
}

fn expand_dotted_keys(mapping: Mapping) -> Mapping {
    let mut expanded = Mapping::new();
    for (key, value) in mapping {
        let value = match value {
            Value::Mapping(m) => Value::Mapping(expand_dotted_keys(m)),
            other => other,
        };
        let name = key.as_str().unwrap_or_default().to_string();
        let segments: Vec<&str> = name.split('.').collect();
        if segments.len() == 1 || segments.iter().any(|s| s.is_empty()) {
            let mut single = Mapping::new();
            single.insert(key, value);
            merge_mapping(&mut expanded, single);
            continue;
        }

        let nested = segments[1..]
            .iter()
            .rev()
            .fold(value, |inner, segment| {
                let mut m = Mapping::new();
                m.insert(Value::String((*segment).to_string()), inner);
                Value::Mapping(m)
            });
        let mut single = Mapping::new();
        single.insert(Value::String(segments[0].to_string()), nested);
        merge_mapping(&mut expanded, single);
    }
    expanded
}
