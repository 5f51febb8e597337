//! CLI command definitions.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};

use appdef_render::{DriverRegistry, RenderOptions};
use appdef_settings::parse_overrides;
use appdef_types::App;

pub mod helm;
pub mod inspect;
pub mod render;
pub mod validate;

/// appdef - render parameterized application definitions
#[derive(Parser)]
#[command(name = "appdef")]
#[command(version, about = "Render parameterized Compose application definitions")]
#[command(long_about = r#"
appdef renders an application package (metadata, Compose file and settings)
into a concrete Compose file or a Helm chart.

COMMANDS:
  render    → Render the application with its settings
  helm      → Generate a Helm chart
  validate  → Check metadata, rendering and Compose rules
  inspect   → Show metadata, services, settings and attachments

ENVIRONMENT:
  APPDEF_RENDERERS  Comma-separated render drivers applied before substitution
  RUST_LOG          Log filter

EXIT CODES:
  0 - Success
  1 - General error
  2 - Invalid arguments
  3 - Validation failure
  4 - Render error
"#)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Render the application to a Compose file
    Render(render::RenderArgs),

    /// Generate a Helm chart for the application
    Helm(helm::HelmArgs),

    /// Validate the application
    Validate(validate::ValidateArgs),

    /// Show a summary of the application
    Inspect(inspect::InspectArgs),
}

/// Settings flags shared by every command.
#[derive(Args, Debug, Clone)]
pub struct SettingsArgs {
    /// Override a setting
    #[arg(short = 's', long = "set", value_name = "KEY=VALUE")]
    pub set: Vec<String>,

    /// Additional settings files, applied in order
    #[arg(short = 'f', long = "settings-files", value_name = "FILE")]
    pub settings_files: Vec<PathBuf>,
}

impl SettingsArgs {
    pub fn overrides(&self) -> Result<BTreeMap<String, String>> {
        Ok(parse_overrides(&self.set)?)
    }

    /// Open the application and append the extra settings files.
    pub fn load_app(&self, path: &Path) -> Result<App> {
        App::open(path)
            .and_then(|app| app.with_settings_files(&self.settings_files))
            .with_context(|| format!("failed to load application {:?}", path))
    }
}

pub fn registry() -> Result<DriverRegistry> {
    Ok(DriverRegistry::with_builtins()?)
}

pub fn render_options() -> RenderOptions {
    RenderOptions::from_env()
}

/// Write to a file, or to stdout for `-`.
pub fn write_output(output: &str, contents: &str) -> Result<()> {
    if output == "-" {
        print!("{}", contents);
        Ok(())
    } else {
        std::fs::write(output, contents).with_context(|| format!("failed to write {}", output))
    }
}
