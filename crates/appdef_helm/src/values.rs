//! `values.yaml` generation.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde_yaml::{Mapping, Value};
use tracing::debug;

use appdef_render::render_settings;
use appdef_types::App;

use crate::error::HelmResult;
use crate::output::{read_existing, write_file};

pub const VALUES_FILE_NAME: &str = "values.yaml";

/// Write the settings used by the chart templates into `values.yaml`.
///
/// Only settings named in `variables` are written. They are merged onto the
/// existing file, if any.
pub fn make_values(
    app: &App,
    chart_dir: &Path,
    overrides: &BTreeMap<String, String>,
    variables: &BTreeSet<String>,
) -> HelmResult<()> {
    let mut settings = render_settings(app, overrides)?.into_mapping();
    filter_variables(&mut settings, variables, "");

    let mut values = read_existing(chart_dir, VALUES_FILE_NAME)?;
    merge_values(&mut values, settings);
    write_file(
        &chart_dir.join(VALUES_FILE_NAME),
        &serde_yaml::to_string(&values)?,
    )?;
    debug!("Wrote {} with {} top-level keys", VALUES_FILE_NAME, values.len());
    Ok(())
}

/// Drop every leaf whose dotted path is not in `variables`, then every
/// mapping left empty.
pub fn filter_variables(settings: &mut Mapping, variables: &BTreeSet<String>, prefix: &str) {
    settings.retain(|key, value| {
        let path = format!("{}{}", prefix, key.as_str().unwrap_or_default());
        match value {
            Value::Mapping(nested) => {
                filter_variables(nested, variables, &format!("{}.", path));
                !nested.is_empty()
            }
            _ => variables.contains(&path),
        }
    });
}

/// Overlay `source` onto `target`. Nested mappings merge, other values replace.
pub fn merge_values(target: &mut Mapping, source: Mapping) {
    for (key, value) in source {
        match (target.get_mut(&key), value) {
            (Some(Value::Mapping(existing)), Value::Mapping(incoming)) => {
                merge_values(existing, incoming)
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

    fn mapping(yaml: &str) -> Mapping {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_filter_variables() {
        let mut settings = mapping("front:\n  port: 80\n  tag: x\nunused: 1\nempty:\n  nested: 2\n");
        let variables: BTreeSet<String> = ["front.port".to_string()].into_iter().collect();
        filter_variables(&mut settings, &variables, "");
        assert_eq!(settings, mapping("front:\n  port: 80\n"));
    }

    #[test]
    fn test_merge_values() {
        let mut target = mapping("front:\n  port: 80\n  replicas: 2\nextra: kept\n");
        merge_values(&mut target, mapping("front:\n  port: 8080\n"));
        assert_eq!(
            target,
            mapping("front:\n  port: 8080\n  replicas: 2\nextra: kept\n")
        );
    }
}
