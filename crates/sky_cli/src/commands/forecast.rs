//! Forecast command - predict deployment failures for a template.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use sky_account::AccountSnapshot;
use sky_forecast::{ForecastOptions, ForecastReport, Forecaster};
use sky_template::{DeployConfig, DeployConfigFile, Template};

use super::PredictedFailures;

#[derive(Args)]
pub struct ForecastArgs {
    /// Template to forecast
    template: PathBuf,

    /// Target stack name (defaults to the template file name)
    stack_name: Option<String>,

    /// Account snapshot describing the target account
    #[arg(long, env = "SKYCAST_ACCOUNT")]
    account: PathBuf,

    /// Skip permission checks
    #[arg(long)]
    skip_iam: bool,

    /// Show passing checks as well as failures
    #[arg(short, long)]
    all: bool,

    /// Role to evaluate permissions for (defaults to the caller)
    #[arg(long)]
    role_arn: Option<String>,

    /// Only check resources of this type
    #[arg(long = "type")]
    resource_type: Option<String>,

    /// Template parameters as key=value pairs
    #[arg(long, value_delimiter = ',')]
    params: Vec<String>,

    /// Stack tags as key=value pairs
    #[arg(long, value_delimiter = ',')]
    tags: Vec<String>,

    /// Deploy config file with Parameters and Tags
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output format (text, json)
    #[arg(long, default_value = "text", value_parser = ["text", "json"])]
    format: String,
}

pub async fn execute(args: ForecastArgs) -> Result<()> {
    info!("Forecasting {:?}", args.template);

    let template = Template::from_file(&args.template)
        .with_context(|| format!("Failed to load template {:?}", args.template))?;

    let stack_name = match args.stack_name.clone().or_else(|| template.base_name()) {
        Some(name) => name,
        None => anyhow::bail!("Invalid argument: no stack name given"),
    };

    let account = AccountSnapshot::from_file(&args.account)
        .with_context(|| format!("Failed to load account snapshot {:?}", args.account))?;

    let mut options = ForecastOptions::new(&stack_name).skip_permissions(args.skip_iam);
    if let Some(type_name) = &args.resource_type {
        options = options.type_filter(type_name);
    }
    if let Some(role_arn) = &args.role_arn {
        options = options.role_arn(role_arn);
    }

    let forecaster = Forecaster::new(Arc::new(account), options);
    let stack = forecaster.describe_stack().await?;

    let previous = stack.as_ref().map(|s| s.parameters.clone()).unwrap_or_default();
    let config = deploy_config(&args, &template, &previous)?;

    let report = forecaster
        .forecast(&template, stack.as_ref(), &config)
        .await
        .context("Forecast aborted")?;

    output(&report, &args)?;

    if report.passed() {
        Ok(())
    } else {
        Err(PredictedFailures {
            failed: report.forecast.num_failed(),
            total: report.forecast.num_checked(),
        }
        .into())
    }
}

fn deploy_config(
    args: &ForecastArgs,
    template: &Template,
    previous: &BTreeMap<String, String>,
) -> Result<DeployConfig> {
    let file = args
        .config
        .as_ref()
        .map(DeployConfigFile::from_file)
        .transpose()
        .context("Failed to load deploy config")?;
    let params = DeployConfig::parse_pairs(&args.params).context("Invalid argument: --params")?;
    let tags = DeployConfig::parse_pairs(&args.tags).context("Invalid argument: --tags")?;

    Ok(DeployConfig::resolve(
        template,
        file.as_ref(),
        params,
        tags,
        previous,
    ))
}

fn output(report: &ForecastReport, args: &ForecastArgs) -> Result<()> {
    if args.format == "json" {
        let json = serde_json::to_string_pretty(report).context("Failed to serialize report")?;
        println!("{}", json);
    } else {
        print!("{}", report.render(args.all));
    }
    Ok(())
}
