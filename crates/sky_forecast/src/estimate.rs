//! Deployment time estimates.

use sky_template::Template;
use tracing::debug;

use crate::context::Action;

/// Seconds a type takes to create and to update when nothing is known about it.
pub const DEFAULT_ESTIMATE_SECONDS: u64 = 1;

/// (type, create seconds, update seconds)
const ESTIMATES: &[(&str, u64, u64)] = &[
    ("AWS::S3::Bucket", 22, 5),
    ("AWS::S3::BucketPolicy", 3, 3),
    ("AWS::IAM::Role", 20, 5),
    ("AWS::IAM::Policy", 18, 5),
    ("AWS::SQS::Queue", 62, 5),
    ("AWS::SNS::Topic", 12, 3),
    ("AWS::DynamoDB::Table", 25, 10),
    ("AWS::Lambda::Function", 10, 5),
    ("AWS::Logs::LogGroup", 3, 2),
    ("AWS::EC2::Instance", 35, 20),
    ("AWS::EC2::SecurityGroup", 7, 4),
    ("AWS::EC2::VPC", 15, 5),
    ("AWS::EC2::Subnet", 6, 5),
    ("AWS::RDS::DBCluster", 600, 300),
    ("AWS::RDS::DBInstance", 480, 300),
    ("AWS::AutoScaling::LaunchConfiguration", 3, 3),
    ("AWS::AutoScaling::AutoScalingGroup", 60, 60),
    ("AWS::ECR::Repository", 3, 2),
    ("AWS::CloudFront::Distribution", 300, 300),
    ("AWS::SecretsManager::Secret", 4, 3),
];

/// Expected seconds to perform `action` on a resource of `type_name`.
pub fn estimate(type_name: &str, action: Action) -> u64 {
    match ESTIMATES.iter().find(|(t, _, _)| *t == type_name) {
        Some((_, create, update)) => match action {
            Action::Create => *create,
            Action::Update => *update,
        },
        None => {
            debug!("No estimate for {} {}, using default", type_name, action);
            DEFAULT_ESTIMATE_SECONDS
        }
    }
}

/// Sum of the estimates of every resource in the template.
///
/// The action is inferred once from `stack_exists` and applies to all
/// resources. Resources without a readable Type count with the default.
pub fn total_estimate(template: &Template, stack_exists: bool) -> u64 {
    let action = Action::infer(stack_exists);
    let Some(resources) = template.resources() else {
        return 0;
    };

    resources
        .entries()
        .map(|(_, resource)| match resource.get("Type").and_then(|t| t.as_str()) {
            Some(type_name) => estimate(type_name, action),
            None => DEFAULT_ESTIMATE_SECONDS,
        })
        .sum()
}

/// Human readable duration: `"N seconds"` below a minute,
/// `"M minutes, S seconds"` otherwise.
pub fn format_estimate(seconds: u64) -> String {
    if seconds < 60 {
        format!("{} seconds", seconds)
    } else {
        format!("{} minutes, {} seconds", seconds / 60, seconds % 60)
    }
}
