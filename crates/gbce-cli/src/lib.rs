//! # GBCE CLI
//!
//! Library half of the `gbce` binary: argument parsing, command dispatch,
//! output rendering and log setup.

pub mod cli;
pub mod commands;
pub mod error;
pub mod logging;
pub mod output;

use crate::cli::Cli;
use crate::error::CliError;

/// Run a parsed command line, printing its envelope to stdout.
///
/// # Errors
/// A failed exchange operation is returned as [`CliError::Operation`] after
/// its envelope has been printed, so the caller can pick the exit code.
pub fn run(cli: &Cli) -> Result<(), CliError> {
    logging::init(cli.log.as_deref())?;

    let Some(report) = commands::run(cli)? else {
        return Ok(());
    };
    output::render(&report.envelope, cli.format, cli.pretty)?;
    report.into_result()
}
