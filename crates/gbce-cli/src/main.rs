use std::process::ExitCode;

use clap::Parser;
use gbce_cli::cli::Cli;

fn main() -> ExitCode {
    let cli = Cli::parse();

    match gbce_cli::run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("error: {error}");
            ExitCode::from(error.exit_code())
        }
    }
}
