//! Estimate command - print the expected duration of a stack operation.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use sky_forecast::{estimate, format_estimate, total_estimate, Action};
use sky_template::{Node, Template};

#[derive(Args)]
pub struct EstimateArgs {
    /// Template to estimate
    template: PathBuf,

    /// Estimate an update of an existing stack instead of a create
    #[arg(long)]
    update: bool,

    /// List the estimate of every resource
    #[arg(short, long)]
    all: bool,

    /// Output format (text, json)
    #[arg(long, default_value = "text", value_parser = ["text", "json"])]
    format: String,
}

#[derive(Serialize)]
struct ResourceEstimate {
    logical_id: String,
    type_name: String,
    seconds: u64,
}

#[derive(Serialize)]
struct EstimateOutput {
    action: Action,
    total_seconds: u64,
    resources: Vec<ResourceEstimate>,
}

pub async fn execute(args: EstimateArgs) -> Result<()> {
    let template = Template::from_file(&args.template)
        .with_context(|| format!("Failed to load template {:?}", args.template))?;

    let action = Action::infer(args.update);
    let resources: Vec<ResourceEstimate> = template
        .resources()
        .map(|r| {
            r.entries()
                .map(|(key, resource)| {
                    let type_name = resource
                        .get("Type")
                        .and_then(Node::as_str)
                        .unwrap_or_default()
                        .to_string();
                    ResourceEstimate {
                        logical_id: key.as_str().unwrap_or_default().to_string(),
                        seconds: estimate(&type_name, action),
                        type_name,
                    }
                })
                .collect()
        })
        .unwrap_or_default();

    let output = EstimateOutput {
        action,
        total_seconds: total_estimate(&template, args.update),
        resources,
    };

    if args.format == "json" {
        let json = serde_json::to_string_pretty(&output).context("Failed to serialize estimate")?;
        println!("{}", json);
        return Ok(());
    }

    if args.all {
        for resource in &output.resources {
            println!(
                "{} {} - {}",
                resource.type_name,
                resource.logical_id,
                format_estimate(resource.seconds)
            );
        }
        println!();
    }
    println!(
        "Estimated time to {}: {}",
        output.action,
        format_estimate(output.total_seconds)
    );
    Ok(())
}
