//! Render command - Render an application to a Compose file.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use appdef_render::render;

use super::{registry, render_options, write_output, SettingsArgs};

#[derive(Args)]
pub struct RenderArgs {
    /// Application directory or single file
    app: PathBuf,

    #[command(flatten)]
    settings: SettingsArgs,

    /// Output format
    #[arg(long, default_value = "yaml")]
    formatter: String,

    /// Output file, `-` for stdout
    #[arg(short, long, default_value = "-")]
    output: String,
}

pub fn execute(args: RenderArgs) -> Result<()> {
    let app = args.settings.load_app(&args.app)?;
    let overrides = args.settings.overrides()?;
    let registry = registry()?;

    let config = render(&app, &overrides, &registry, &render_options())?;
    let document = config
        .to_resolved_value()
        .context("failed to serialize rendered application")?;
    let output = registry.format(&args.formatter, &document)?;

    info!("Rendered {} with the {} formatter", app.name(), args.formatter);
    write_output(&args.output, &output)
}
