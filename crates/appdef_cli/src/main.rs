//! appdef CLI - Main entry point.
//!
//! Exit codes:
//! - 0: Success
//! - 1: General error
//! - 2: Invalid arguments
//! - 3: Validation failure
//! - 4: Render error

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use appdef_helm::HelmError;
use appdef_render::RenderError;
use appdef_validator::ValidatorError;

mod commands;

use commands::{Cli, Commands};

/// CI-friendly exit codes
pub struct ExitCodes;

impl ExitCodes {
    pub const SUCCESS: u8 = 0;
    pub const GENERAL_ERROR: u8 = 1;
    pub const VALIDATION_FAILURE: u8 = 3;
    pub const RENDER_ERROR: u8 = 4;
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let result = match cli.command {
        Commands::Render(args) => commands::render::execute(args),
        Commands::Helm(args) => commands::helm::execute(args),
        Commands::Validate(args) => commands::validate::execute(args),
        Commands::Inspect(args) => commands::inspect::execute(args),
    };

    match result {
        Ok(()) => ExitCode::from(ExitCodes::SUCCESS),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(categorize_error(&e))
        }
    }
}

fn init_logging(verbose: bool, quiet: bool) {
    let default = if verbose {
        "appdef=debug,warn"
    } else if quiet {
        "error"
    } else {
        "appdef=info,warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    // A second initialization only happens in tests.
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .try_init();
}

/// Map an error to its exit code.
fn categorize_error(e: &anyhow::Error) -> u8 {
    if e.downcast_ref::<ValidatorError>().is_some() {
        return ExitCodes::VALIDATION_FAILURE;
    }
    if e.downcast_ref::<RenderError>().is_some()
        || matches!(e.downcast_ref::<HelmError>(), Some(HelmError::Render(_)))
    {
        return ExitCodes::RENDER_ERROR;
    }
    ExitCodes::GENERAL_ERROR
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_categorize_error() {
        let err = anyhow::Error::new(RenderError::UnknownRenderer("x".to_string()))
            .context("failed to render");
        assert_eq!(categorize_error(&err), ExitCodes::RENDER_ERROR);

        let err: anyhow::Result<()> =
            Err(ValidatorError::Application(vec!["bad".to_string()])).context("validate");
        assert_eq!(categorize_error(&err.unwrap_err()), ExitCodes::VALIDATION_FAILURE);

        let err = anyhow::anyhow!("something else");
        assert_eq!(categorize_error(&err), ExitCodes::GENERAL_ERROR);
    }
}
