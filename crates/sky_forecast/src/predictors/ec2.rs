//! EC2 predictors: instances, launch configurations and security groups.

use std::net::{Ipv4Addr, Ipv6Addr};

use async_trait::async_trait;
use sky_account::AccountProbe;
use sky_template::Node;
use tracing::warn;

use crate::context::ResourceContext;
use crate::error::ForecastResult;
use crate::forecast::Forecast;
use crate::registry::Predictor;

/// Values that are resolved by the service at deploy time and cannot be
/// looked up ahead of it.
fn is_dynamic(value: &str) -> bool {
    value.starts_with("{{resolve:")
}

/// Image and key pair checks shared by instances and launch configurations.
async fn check_image_and_key_pair(
    ctx: &ResourceContext<'_>,
    account: &dyn AccountProbe,
) -> ForecastResult<Forecast> {
    let mut forecast = Forecast::new(&ctx.type_name, &ctx.logical_id);

    let image = ctx.property("ImageId");
    if let Some(image_id) = image.and_then(Node::as_str).filter(|v| !is_dynamic(v)) {
        let line = ctx.line_of(image);
        match account.image_exists(image_id).await {
            Ok(true) => forecast.pass(line, format!("Image {} exists", image_id)),
            Ok(false) => forecast.fail(line, format!("Image {} does not exist", image_id)),
            Err(e) => {
                warn!("Image check for {} could not run: {}", ctx.logical_id, e);
                forecast.unknown(line, format!("Unable to check image {}: {}", image_id, e));
            }
        }
    }

    let key = ctx.property("KeyName");
    if let Some(key_name) = key.and_then(Node::as_str).filter(|v| !is_dynamic(v)) {
        let line = ctx.line_of(key);
        match account.key_pair_exists(key_name).await {
            Ok(true) => forecast.pass(line, format!("Key pair {} exists", key_name)),
            Ok(false) => forecast.fail(line, format!("Key pair {} does not exist", key_name)),
            Err(e) => {
                warn!("Key pair check for {} could not run: {}", ctx.logical_id, e);
                forecast.unknown(line, format!("Unable to check key pair {}: {}", key_name, e));
            }
        }
    }

    if forecast.is_empty() {
        forecast.pass(ctx.line, "No image or key pair to check");
    }
    Ok(forecast)
}

/// Checks an `AWS::EC2::Instance`: its image and key pair must exist.
pub struct InstancePredictor;

#[async_trait]
impl Predictor for InstancePredictor {
    fn resource_type(&self) -> &str {
        "AWS::EC2::Instance"
    }

    fn description(&self) -> &str {
        "instance image and key pair"
    }

    async fn predict(
        &self,
        ctx: &ResourceContext<'_>,
        account: &dyn AccountProbe,
    ) -> ForecastResult<Forecast> {
        check_image_and_key_pair(ctx, account).await
    }
}

/// Checks an `AWS::AutoScaling::LaunchConfiguration` the same way as an instance.
pub struct LaunchConfigurationPredictor;

#[async_trait]
impl Predictor for LaunchConfigurationPredictor {
    fn resource_type(&self) -> &str {
        "AWS::AutoScaling::LaunchConfiguration"
    }

    fn description(&self) -> &str {
        "launch configuration image and key pair"
    }

    async fn predict(
        &self,
        ctx: &ResourceContext<'_>,
        account: &dyn AccountProbe,
    ) -> ForecastResult<Forecast> {
        check_image_and_key_pair(ctx, account).await
    }
}

const INGRESS_PEERS: &[&str] = &[
    "CidrIp",
    "CidrIpv6",
    "SourcePrefixListId",
    "SourceSecurityGroupId",
    "SourceSecurityGroupName",
];

const EGRESS_PEERS: &[&str] = &[
    "CidrIp",
    "CidrIpv6",
    "DestinationPrefixListId",
    "DestinationSecurityGroupId",
];

fn valid_cidr(cidr: &str, v6: bool) -> bool {
    let Some((addr, prefix)) = cidr.split_once('/') else {
        return false;
    };
    let Ok(prefix) = prefix.parse::<u8>() else {
        return false;
    };
    if v6 {
        addr.parse::<Ipv6Addr>().is_ok() && prefix <= 128
    } else {
        addr.parse::<Ipv4Addr>().is_ok() && prefix <= 32
    }
}

/// Check one ingress or egress rule.
fn check_rule(
    forecast: &mut Forecast,
    ctx: &ResourceContext<'_>,
    rule: &Node,
    direction: &str,
    peers: &[&str],
) {
    // The rule's first key marks the sequence item
    let line = ctx.line_of(rule.entries().next().map(|(key, _)| key));

    let present = peers.iter().filter(|p| rule.get(p).is_some()).count();
    if present == 1 {
        forecast.pass(line, format!("{} rule has exactly one peer", direction));
    } else {
        forecast.fail(
            line,
            format!(
                "{} rule must have exactly one of {}, found {}",
                direction,
                peers.join(", "),
                present
            ),
        );
    }

    for (property, v6) in [("CidrIp", false), ("CidrIpv6", true)] {
        let node = rule.get(property);
        if let Some(cidr) = node.and_then(Node::as_str) {
            let cidr_line = ctx.line_of(node);
            if valid_cidr(cidr, v6) {
                forecast.pass(cidr_line, format!("{} {} is valid", property, cidr));
            } else {
                forecast.fail(
                    cidr_line,
                    format!("{} {} is not a valid CIDR block", property, cidr),
                );
            }
        }
    }

    let from = rule.get("FromPort").and_then(Node::as_i64);
    let to = rule.get("ToPort").and_then(Node::as_i64);
    if let (Some(from), Some(to)) = (from, to) {
        if from <= to {
            forecast.pass(line, format!("Port range {}-{} is valid", from, to));
        } else {
            forecast.fail(line, format!("FromPort {} is greater than ToPort {}", from, to));
        }
    }
}

/// Checks the inline rules of an `AWS::EC2::SecurityGroup`.
pub struct SecurityGroupPredictor;

#[async_trait]
impl Predictor for SecurityGroupPredictor {
    fn resource_type(&self) -> &str {
        "AWS::EC2::SecurityGroup"
    }

    fn description(&self) -> &str {
        "security group rules"
    }

    async fn predict(
        &self,
        ctx: &ResourceContext<'_>,
        _account: &dyn AccountProbe,
    ) -> ForecastResult<Forecast> {
        let mut forecast = Forecast::new(&ctx.type_name, &ctx.logical_id);

        for (property, direction, peers) in [
            ("SecurityGroupIngress", "Ingress", INGRESS_PEERS),
            ("SecurityGroupEgress", "Egress", EGRESS_PEERS),
        ] {
            let rules = ctx
                .property(property)
                .and_then(Node::as_sequence)
                .unwrap_or_default();
            for rule in rules.iter().filter(|r| r.is_mapping()) {
                check_rule(&mut forecast, ctx, rule, direction, peers);
            }
        }

        if forecast.is_empty() {
            forecast.pass(ctx.line, "No inline rules to check");
        }
        Ok(forecast)
    }
}
