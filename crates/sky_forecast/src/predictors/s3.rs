//! S3 bucket and bucket policy predictors.

use async_trait::async_trait;
use regex::Regex;
use sky_account::AccountProbe;
use sky_template::Node;
use tracing::{debug, warn};

use crate::context::ResourceContext;
use crate::error::{ForecastError, ForecastResult};
use crate::forecast::Forecast;
use crate::registry::Predictor;

const BUCKET_NAME_PATTERN: &str = r"^[a-z0-9][a-z0-9.-]{1,61}[a-z0-9]$";
const IP_ADDRESS_PATTERN: &str = r"^\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3}$";

/// Reason a bucket name would be rejected, if any.
fn invalid_bucket_name(name: &str) -> ForecastResult<Option<&'static str>> {
    let compile = |pattern| {
        Regex::new(pattern).map_err(|e| ForecastError::check("bucket name", e.to_string()))
    };

    if !compile(BUCKET_NAME_PATTERN)?.is_match(name) {
        return Ok(Some(
            "must be 3-63 lowercase letters, digits, dots or hyphens, starting and ending with a letter or digit",
        ));
    }
    if name.contains("..") {
        return Ok(Some("must not contain two adjacent periods"));
    }
    if compile(IP_ADDRESS_PATTERN)?.is_match(name) {
        return Ok(Some("must not be formatted as an IP address"));
    }
    if name.starts_with("xn--") || name.ends_with("-s3alias") {
        return Ok(Some("uses a reserved prefix or suffix"));
    }
    Ok(None)
}

/// Checks an `AWS::S3::Bucket`.
///
/// The explicit name must be valid. When the stack already has the bucket
/// under another name, the update replaces it, which fails unless the old
/// bucket is empty.
pub struct BucketPredictor;

#[async_trait]
impl Predictor for BucketPredictor {
    fn resource_type(&self) -> &str {
        "AWS::S3::Bucket"
    }

    fn description(&self) -> &str {
        "bucket naming and replacement"
    }

    async fn predict(
        &self,
        ctx: &ResourceContext<'_>,
        account: &dyn AccountProbe,
    ) -> ForecastResult<Forecast> {
        let mut forecast = Forecast::new(&ctx.type_name, &ctx.logical_id);
        let name_node = ctx.property("BucketName");
        let line = ctx.line_of(name_node);

        let Some(name_node) = name_node else {
            forecast.pass(ctx.line, "Bucket name will be generated");
            return Ok(forecast);
        };
        // Intrinsics such as Fn::Sub are only known at deploy time
        let Some(name) = name_node.as_str() else {
            forecast.pass(line, "Bucket name is computed at deploy time");
            return Ok(forecast);
        };

        match invalid_bucket_name(name)? {
            Some(reason) => forecast.fail(line, format!("Bucket name {} {}", name, reason)),
            None => forecast.pass(line, "Bucket name is valid"),
        }

        if let Some(current) = ctx.physical_id().filter(|current| *current != name) {
            debug!("Bucket {} would be replaced by {}", current, name);
            match account.bucket_is_empty(current).await {
                Ok(true) => forecast.pass(
                    line,
                    format!("Bucket {} can be replaced because it is empty", current),
                ),
                Ok(false) => forecast.fail(
                    line,
                    format!("Renaming replaces bucket {}, which is not empty", current),
                ),
                Err(e) => {
                    warn!("Contents check for bucket {} could not run: {}", current, e);
                    forecast.unknown(
                        line,
                        format!("Unable to check whether bucket {} is empty: {}", current, e),
                    );
                }
            }
        }

        Ok(forecast)
    }
}

/// Principal values of every statement in a policy document.
fn principal_nodes(document: &Node) -> Vec<&Node> {
    let statements: Vec<&Node> = match document.get("Statement") {
        Some(s) if s.is_mapping() => vec![s],
        Some(s) => s.as_sequence().map(|items| items.iter().collect()).unwrap_or_default(),
        None => Vec::new(),
    };

    let mut principals = Vec::new();
    for statement in statements {
        match statement.find(&["Principal", "AWS"]) {
            Some(node) if node.is_scalar() => principals.push(node),
            Some(node) => principals.extend(node.as_sequence().unwrap_or_default()),
            None => {}
        }
    }
    principals
}

/// Checks an `AWS::S3::BucketPolicy`: every AWS principal must exist.
pub struct BucketPolicyPredictor;

#[async_trait]
impl Predictor for BucketPolicyPredictor {
    fn resource_type(&self) -> &str {
        "AWS::S3::BucketPolicy"
    }

    fn description(&self) -> &str {
        "bucket policy principals"
    }

    async fn predict(
        &self,
        ctx: &ResourceContext<'_>,
        account: &dyn AccountProbe,
    ) -> ForecastResult<Forecast> {
        let mut forecast = Forecast::new(&ctx.type_name, &ctx.logical_id);

        let principals = ctx
            .property("PolicyDocument")
            .map(principal_nodes)
            .unwrap_or_default();

        for node in principals {
            // Intrinsics other than resolved refs cannot be checked here
            let Some(value) = node.as_str() else { continue };
            if value == "*" {
                continue;
            }
            let arn = if value.len() == 12 && value.chars().all(|c| c.is_ascii_digit()) {
                format!("arn:{}:iam::{}:root", ctx.identity.partition, value)
            } else {
                value.to_string()
            };

            let line = ctx.line_of(Some(node));
            match account.principal_exists(&arn).await {
                Ok(true) => forecast.pass(line, format!("Principal {} exists", arn)),
                Ok(false) => forecast.fail(line, format!("Principal {} does not exist", arn)),
                Err(e) => {
                    warn!("Principal check for {} could not run: {}", arn, e);
                    forecast.unknown(line, format!("Unable to check principal {}: {}", arn, e));
                }
            }
        }

        if forecast.is_empty() {
            forecast.pass(ctx.line, "No principals to check");
        }
        Ok(forecast)
    }
}
