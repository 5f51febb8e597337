//! Validate command - Validate an application.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use appdef_validator::validate_app;

use super::{registry, render_options, SettingsArgs};

#[derive(Args)]
pub struct ValidateArgs {
    /// Application directory or single file
    app: PathBuf,

    #[command(flatten)]
    settings: SettingsArgs,
}

pub fn execute(args: ValidateArgs) -> Result<()> {
    let overrides = args.settings.overrides()?;
    validate_app(
        &args.app,
        &args.settings.settings_files,
        &overrides,
        &registry()?,
        &render_options(),
    )?;
    println!("Validation passed");
    Ok(())
}
