//! Helm command - Generate a Helm chart.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use appdef_helm::{helm, HelmOptions, StackVersion};

use super::{registry, render_options, SettingsArgs};

#[derive(Args)]
pub struct HelmArgs {
    /// Application directory or single file
    app: PathBuf,

    #[command(flatten)]
    settings: SettingsArgs,

    /// Render the application instead of keeping variables as chart values
    #[arg(long)]
    render: bool,

    /// Stack resource version (v1beta1 or v1beta2)
    #[arg(long, default_value = "v1beta2")]
    stack_version: String,

    /// Chart directory, defaults to `<app-name>.chart`
    #[arg(short, long)]
    output: Option<PathBuf>,
}

pub fn execute(args: HelmArgs) -> Result<()> {
    let stack_version: StackVersion = args.stack_version.parse()?;
    let app = args.settings.load_app(&args.app)?;
    let overrides = args.settings.overrides()?;

    let mut options = HelmOptions::new()
        .with_render(args.render)
        .with_stack_version(stack_version)
        .with_render_options(render_options());
    if let Some(dir) = args.output {
        options = options.with_chart_dir(dir);
    }

    let chart_dir = helm(&app, &overrides, &registry()?, &options)?;
    println!("Chart written to {}", chart_dir.display());
    Ok(())
}
