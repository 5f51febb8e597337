//! `Chart.yaml` generation.

use std::path::Path;

use serde_yaml::{Mapping, Value};
use tracing::debug;

use appdef_types::AppMetadata;

use crate::error::HelmResult;
use crate::output::{read_existing, write_file};

pub const CHART_FILE_NAME: &str = "Chart.yaml";

/// Write `Chart.yaml` from application metadata.
///
/// Keys already present in the file and not derived from metadata are kept.
pub fn make_chart(meta: &AppMetadata, chart_dir: &Path) -> HelmResult<()> {
    let mut chart = read_existing(chart_dir, CHART_FILE_NAME)?;
    for (key, value) in chart_fields(meta) {
        chart.insert(Value::String(key.to_string()), value);
    }
    write_file(
        &chart_dir.join(CHART_FILE_NAME),
        &serde_yaml::to_string(&chart)?,
    )?;
    debug!("Wrote {} for {}", CHART_FILE_NAME, meta.name);
    Ok(())
}

fn chart_fields(meta: &AppMetadata) -> Vec<(&'static str, Value)> {
    let maintainers = meta
        .maintainers
        .iter()
        .map(|m| {
            let mut entry = Mapping::new();
            entry.insert("name".into(), Value::String(m.to_string()));
            Value::Mapping(entry)
        })
        .collect();
    vec![
        ("name", Value::String(meta.name.clone())),
        ("version", Value::String(meta.version.clone())),
        ("description", Value::String(meta.description.clone())),
        ("keywords", Value::Sequence(Vec::new())),
        ("maintainers", Value::Sequence(maintainers)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use appdef_types::Maintainer;
    use tempfile::tempdir;

    #[test]
    fn test_make_chart_keeps_unrelated_keys() {
        let temp = tempdir().unwrap();
        std::fs::write(
            temp.path().join(CHART_FILE_NAME),
            "apiVersion: v1\nname: old\nhome: https://example.com\n",
        )
        .unwrap();
        let meta = AppMetadata {
            name: "hello".to_string(),
            version: "0.2.0".to_string(),
            description: "Hello".to_string(),
            maintainers: vec![Maintainer {
                name: "dev".to_string(),
                email: "dev@example.com".to_string(),
            }],
            ..Default::default()
        };

        make_chart(&meta, temp.path()).unwrap();

        let chart = Value::Mapping(read_existing(temp.path(), CHART_FILE_NAME).unwrap());
        assert_eq!(chart["name"].as_str(), Some("hello"));
        assert_eq!(chart["version"].as_str(), Some("0.2.0"));
        assert_eq!(chart["home"].as_str(), Some("https://example.com"));
        assert_eq!(chart["apiVersion"].as_str(), Some("v1"));
        assert_eq!(
            chart["maintainers"][0]["name"].as_str(),
            Some("dev <dev@example.com>")
        );
    }
}
