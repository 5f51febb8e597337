//! Inspect command - Show a summary of an application.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Args;
use serde::Serialize;

use appdef_compose::{Config, ServiceConfig, ServicePortConfig};
use appdef_render::render;
use appdef_settings::Settings;
use appdef_types::{App, AppMetadata};

use super::{registry, render_options, SettingsArgs};

#[derive(Args)]
pub struct InspectArgs {
    /// Application directory or single file
    app: PathBuf,

    #[command(flatten)]
    settings: SettingsArgs,

    /// Output format (pretty or json)
    #[arg(long, default_value = "pretty")]
    format: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct ServiceInfo {
    name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    image: String,
    replicas: u64,
    #[serde(skip_serializing_if = "String::is_empty")]
    ports: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct AttachmentInfo {
    path: String,
    size: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct AppInfo {
    metadata: AppMetadata,
    services: Vec<ServiceInfo>,
    networks: Vec<String>,
    volumes: Vec<String>,
    secrets: Vec<String>,
    settings: BTreeMap<String, String>,
    attachments: Vec<AttachmentInfo>,
}

pub fn execute(args: InspectArgs) -> Result<()> {
    let app = args.settings.load_app(&args.app)?;
    let overrides = args.settings.overrides()?;
    let config = render(&app, &overrides, &registry()?, &render_options())?;
    let info = app_info(&app, &config, &overrides)?;

    match args.format.as_str() {
        "pretty" => print!("{}", pretty(&info)),
        "json" => println!("{}", serde_json::to_string_pretty(&info)?),
        other => bail!("unknown format {:?}", other),
    }
    Ok(())
}

fn app_info(app: &App, config: &Config, overrides: &BTreeMap<String, String>) -> Result<AppInfo> {
    let services = config
        .services
        .iter()
        .map(|(name, service)| ServiceInfo {
            name: name.clone(),
            image: service.image.clone().unwrap_or_default(),
            replicas: replicas(service),
            ports: published_ports(&service.ports),
        })
        .collect();

    let settings = app
        .settings()
        .clone()
        .merge(Settings::from_flatten(overrides)?)
        .flatten();

    Ok(AppInfo {
        metadata: app.metadata().clone(),
        services,
        networks: config.networks.keys().cloned().collect(),
        volumes: config.volumes.keys().cloned().collect(),
        secrets: config.secrets.keys().cloned().collect(),
        settings,
        attachments: app
            .attachments()
            .iter()
            .map(|a| AttachmentInfo {
                path: a.path.clone(),
                size: a.size,
            })
            .collect(),
    })
}

fn replicas(service: &ServiceConfig) -> u64 {
    service
        .deploy
        .as_ref()
        .and_then(|deploy| deploy.replicas.as_ref())
        .and_then(|replicas| replicas.value().copied())
        .unwrap_or(1)
}

/// Published ports, sorted, with consecutive ports joined into ranges.
fn published_ports(ports: &[ServicePortConfig]) -> String {
    let mut published: Vec<u64> = ports
        .iter()
        .filter_map(|p| p.published.as_ref().and_then(|v| v.value().copied()))
        .filter(|p| *p > 0)
        .collect();
    published.sort_unstable();

    let mut ranges: Vec<(u64, u64)> = Vec::new();
    for port in published {
        if let Some((_, end)) = ranges.last_mut() {
            if *end + 1 == port {
                *end = port;
                continue;
            }
        }
        ranges.push((port, port));
    }
    ranges
        .iter()
        .map(|(start, end)| {
            if start == end {
                start.to_string()
            } else {
                format!("{}-{}", start, end)
            }
        })
        .collect::<Vec<_>>()
        .join(",")
}

/// Size with four significant digits and a decimal unit (`20B`, `1.5kB`).
fn human_size(size: u64) -> String {
    const UNITS: [&str; 6] = ["B", "kB", "MB", "GB", "TB", "PB"];
    let mut value = size as f64;
    let mut unit = 0;
    while value >= 1000.0 && unit < UNITS.len() - 1 {
        value /= 1000.0;
        unit += 1;
    }
    let digits = if value >= 100.0 {
        1
    } else if value >= 10.0 {
        2
    } else {
        3
    };
    let formatted = format!("{:.*}", digits, value);
    let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
    format!("{}{}", trimmed, UNITS[unit])
}

fn pretty(info: &AppInfo) -> String {
    let mut out = String::new();
    let meta = &info.metadata;
    let _ = writeln!(out, "{} {}", meta.name, meta.version);
    let maintainers = meta.maintainers_display();
    if !maintainers.is_empty() {
        let _ = writeln!(out, "\nMaintained by: {}", maintainers);
    }
    if !meta.description.is_empty() {
        let _ = writeln!(out, "\n{}", meta.description);
    }

    section(
        &mut out,
        &["Service", "Replicas", "Ports", "Image"],
        info.services
            .iter()
            .map(|s| vec![s.name.clone(), s.replicas.to_string(), s.ports.clone(), s.image.clone()])
            .collect(),
    );
    for (title, names) in [
        ("Network", &info.networks),
        ("Volume", &info.volumes),
        ("Secret", &info.secrets),
    ] {
        section(&mut out, &[title], names.iter().map(|n| vec![n.clone()]).collect());
    }
    section(
        &mut out,
        &["Setting", "Value"],
        info.settings
            .iter()
            .map(|(k, v)| vec![k.clone(), v.clone()])
            .collect(),
    );
    section(
        &mut out,
        &["Attachment", "Size"],
        info.attachments
            .iter()
            .map(|a| vec![a.path.clone(), human_size(a.size)])
            .collect(),
    );
    out
}

/// Append an aligned table titled `Headers (n)`. Empty sections are skipped.
fn section(out: &mut String, headers: &[&str], rows: Vec<Vec<String>>) {
    if rows.is_empty() {
        return;
    }
    let plural = if rows.len() > 1 { "s" } else { "" };
    let mut header: Vec<String> = headers.iter().map(|h| h.to_string()).collect();
    header[0] = format!("{}{} ({})", headers[0], plural, rows.len());
    let dashes: Vec<String> = header.iter().map(|h| "-".repeat(h.len())).collect();

    let mut table = vec![header, dashes];
    table.extend(rows);
    let widths: Vec<usize> = (0..headers.len())
        .map(|col| table.iter().map(|row| row[col].len()).max().unwrap_or(0))
        .collect();

    out.push('\n');
    for row in table {
        let mut line = String::new();
        for (col, cell) in row.iter().enumerate() {
            if col + 1 == row.len() {
                line.push_str(cell);
            } else {
                let _ = write!(line, "{:width$} ", cell, width = widths[col]);
            }
        }
        out.push_str(line.trim_end());
        out.push('\n');
    }
}
