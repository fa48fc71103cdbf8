//! CLI command definitions.

use clap::{Parser, Subcommand};
use thiserror::Error;

pub mod estimate;
pub mod forecast;

/// skycast - predict deployment failures before they happen
#[derive(Parser)]
#[command(name = "skycast")]
#[command(version, about = "skycast - predict stack deployment failures before deploying")]
#[command(long_about = r#"
skycast inspects a template and the state of the target account and
predicts which resources would fail to deploy, without changing anything.

COMMANDS:
  forecast  → Run every check against the account and report failures
  estimate  → Print how long the stack operation is expected to take

EXIT CODES:
  0 - Success, no failures predicted
  1 - General error
  2 - Invalid arguments
  3 - Failures predicted
  4 - Template error
  5 - Account or identity error
"#)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Predict deployment failures for a template
    Forecast(forecast::ForecastArgs),

    /// Estimate how long deploying a template will take
    Estimate(estimate::EstimateArgs),
}

/// The forecast ran and predicted at least one failure.
#[derive(Error, Debug)]
#[error("{failed} checks failed out of {total} total checks")]
pub struct PredictedFailures {
    pub failed: usize,
    pub total: usize,
}
