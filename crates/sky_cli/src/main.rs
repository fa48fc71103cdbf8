//! skycast CLI - Main entry point.
//!
//! Exit codes:
//! - 0: Success, no failures predicted
//! - 1: General error
//! - 2: Invalid arguments
//! - 3: Failures predicted
//! - 4: Template error
//! - 5: Account or identity error

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use sky_account::AccountError;
use sky_forecast::ForecastError;
use sky_template::TemplateError;

mod commands;

use commands::{Cli, Commands, PredictedFailures};

/// CI-friendly exit codes
pub struct ExitCodes;

impl ExitCodes {
    pub const SUCCESS: u8 = 0;
    pub const GENERAL_ERROR: u8 = 1;
    pub const INVALID_ARGS: u8 = 2;
    pub const PREDICTED_FAILURES: u8 = 3;
    pub const TEMPLATE_ERROR: u8 = 4;
    pub const ACCOUNT_ERROR: u8 = 5;
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.debug);

    let result = match cli.command {
        Commands::Forecast(args) => commands::forecast::execute(args).await,
        Commands::Estimate(args) => commands::estimate::execute(args).await,
    };

    match result {
        Ok(()) => ExitCode::from(ExitCodes::SUCCESS),
        Err(e) => {
            let exit_code = categorize_error(&e);
            // The report already explains predicted failures
            if exit_code != ExitCodes::PREDICTED_FAILURES {
                eprintln!("❌ Error: {:#}", e);
            }
            ExitCode::from(exit_code)
        }
    }
}

/// Logs go to stderr so that report output on stdout stays parseable.
fn init_logging(debug: bool) {
    let default = if debug {
        "warn,sky_cli=debug,sky_forecast=debug,sky_account=debug,sky_template=debug"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    let log_result = tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .try_init();

    if log_result.is_err() {
        // Logging already initialized, continue
    }
}

/// Categorize error to determine exit code
fn categorize_error(e: &anyhow::Error) -> u8 {
    for cause in e.chain() {
        if cause.downcast_ref::<PredictedFailures>().is_some() {
            return ExitCodes::PREDICTED_FAILURES;
        }
        if let Some(err) = cause.downcast_ref::<TemplateError>() {
            return match err {
                TemplateError::InvalidPair(_) => ExitCodes::INVALID_ARGS,
                _ => ExitCodes::TEMPLATE_ERROR,
            };
        }
        if cause.downcast_ref::<AccountError>().is_some() {
            return ExitCodes::ACCOUNT_ERROR;
        }
        if let Some(err) = cause.downcast_ref::<ForecastError>() {
            return match err {
                ForecastError::Identity(_) | ForecastError::Account(_) => ExitCodes::ACCOUNT_ERROR,
                ForecastError::CheckExecution { .. } => ExitCodes::GENERAL_ERROR,
                _ => ExitCodes::TEMPLATE_ERROR,
            };
        }
    }

    let msg = e.to_string().to_lowercase();
    if msg.contains("invalid argument") {
        ExitCodes::INVALID_ARGS
    } else {
        ExitCodes::GENERAL_ERROR
    }
}
