//! Tripscript CLI entry point.

use std::process::ExitCode;

use clap::Parser;
use tripscript_cli::{AppError, Cli, commands, telemetry};
use tripscript_core::error::EngineError;

fn main() -> ExitCode {
    let cli = Cli::parse();
    telemetry::init(cli.log_format);

    match execute(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            if let AppError::Engine(EngineError::SchemaValidation(errors)) = &err {
                for error in errors {
                    tracing::error!(path = %error.path, "{}", error.message);
                }
            }
            tracing::error!(error = %err, "command failed");
            ExitCode::from(err.exit_code())
        }
    }
}

fn execute(cli: &Cli) -> Result<(), AppError> {
    let config = cli.config()?;
    let output = commands::run(&cli.command, &config)?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
