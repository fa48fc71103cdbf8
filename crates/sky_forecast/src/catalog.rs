//! Static knowledge about resource types.
//!
//! For each known type: which property carries an explicit physical name,
//! the ARN pattern of the resource, and the authorization actions needed to
//! create or update it. Types missing from the table fall back to names
//! derived from the type identifier.

use sky_account::CallerIdentity;
use sky_template::Node;
use tracing::debug;

use crate::context::Action;

/// Catalog entry for one resource type.
#[derive(Debug, Clone, Copy)]
pub struct TypeSpec {
    pub type_name: &'static str,
    /// Property holding an explicit physical name, if the type has one
    pub name_property: Option<&'static str>,
    /// ARN with `{partition}`, `{region}`, `{account}` and `{name}` placeholders
    pub arn_pattern: &'static str,
    pub create_actions: &'static [&'static str],
    pub update_actions: &'static [&'static str],
}

impl TypeSpec {
    pub fn actions(&self, action: Action) -> &'static [&'static str] {
        match action {
            Action::Create => self.create_actions,
            Action::Update => self.update_actions,
        }
    }
}

const CATALOG: &[TypeSpec] = &[
    TypeSpec {
        type_name: "AWS::S3::Bucket",
        name_property: Some("BucketName"),
        arn_pattern: "arn:{partition}:s3:::{name}",
        create_actions: &["s3:CreateBucket", "s3:PutBucketTagging"],
        update_actions: &["s3:PutBucketTagging", "s3:PutBucketPolicy"],
    },
    TypeSpec {
        type_name: "AWS::S3::BucketPolicy",
        name_property: None,
        arn_pattern: "arn:{partition}:s3:::*",
        create_actions: &["s3:PutBucketPolicy", "s3:GetBucketPolicy"],
        update_actions: &["s3:PutBucketPolicy", "s3:GetBucketPolicy"],
    },
    TypeSpec {
        type_name: "AWS::IAM::Role",
        name_property: Some("RoleName"),
        arn_pattern: "arn:{partition}:iam::{account}:role/{name}",
        create_actions: &["iam:CreateRole", "iam:PutRolePolicy", "iam:AttachRolePolicy"],
        update_actions: &["iam:UpdateRole", "iam:PutRolePolicy", "iam:AttachRolePolicy"],
    },
    TypeSpec {
        type_name: "AWS::SQS::Queue",
        name_property: Some("QueueName"),
        arn_pattern: "arn:{partition}:sqs:{region}:{account}:{name}",
        create_actions: &["sqs:CreateQueue", "sqs:TagQueue"],
        update_actions: &["sqs:SetQueueAttributes"],
    },
    TypeSpec {
        type_name: "AWS::SNS::Topic",
        name_property: Some("TopicName"),
        arn_pattern: "arn:{partition}:sns:{region}:{account}:{name}",
        create_actions: &["sns:CreateTopic", "sns:TagResource"],
        update_actions: &["sns:SetTopicAttributes"],
    },
    TypeSpec {
        type_name: "AWS::DynamoDB::Table",
        name_property: Some("TableName"),
        arn_pattern: "arn:{partition}:dynamodb:{region}:{account}:table/{name}",
        create_actions: &["dynamodb:CreateTable", "dynamodb:DescribeTable"],
        update_actions: &["dynamodb:UpdateTable", "dynamodb:DescribeTable"],
    },
    TypeSpec {
        type_name: "AWS::Lambda::Function",
        name_property: Some("FunctionName"),
        arn_pattern: "arn:{partition}:lambda:{region}:{account}:function:{name}",
        create_actions: &["lambda:CreateFunction", "iam:PassRole"],
        update_actions: &["lambda:UpdateFunctionCode", "lambda:UpdateFunctionConfiguration"],
    },
    TypeSpec {
        type_name: "AWS::Logs::LogGroup",
        name_property: Some("LogGroupName"),
        arn_pattern: "arn:{partition}:logs:{region}:{account}:log-group:{name}",
        create_actions: &["logs:CreateLogGroup", "logs:PutRetentionPolicy"],
        update_actions: &["logs:PutRetentionPolicy"],
    },
    TypeSpec {
        type_name: "AWS::EC2::Instance",
        name_property: None,
        arn_pattern: "arn:{partition}:ec2:{region}:{account}:instance/*",
        create_actions: &["ec2:RunInstances", "ec2:CreateTags"],
        update_actions: &["ec2:ModifyInstanceAttribute"],
    },
    TypeSpec {
        type_name: "AWS::EC2::SecurityGroup",
        name_property: Some("GroupName"),
        arn_pattern: "arn:{partition}:ec2:{region}:{account}:security-group/*",
        create_actions: &["ec2:CreateSecurityGroup", "ec2:AuthorizeSecurityGroupIngress"],
        update_actions: &["ec2:AuthorizeSecurityGroupIngress", "ec2:RevokeSecurityGroupIngress"],
    },
    TypeSpec {
        type_name: "AWS::RDS::DBCluster",
        name_property: Some("DBClusterIdentifier"),
        arn_pattern: "arn:{partition}:rds:{region}:{account}:cluster:{name}",
        create_actions: &["rds:CreateDBCluster", "rds:AddTagsToResource"],
        update_actions: &["rds:ModifyDBCluster"],
    },
    TypeSpec {
        type_name: "AWS::AutoScaling::LaunchConfiguration",
        name_property: Some("LaunchConfigurationName"),
        arn_pattern: "arn:{partition}:autoscaling:{region}:{account}:launchConfiguration:*:launchConfigurationName/{name}",
        create_actions: &["autoscaling:CreateLaunchConfiguration"],
        update_actions: &[
            "autoscaling:CreateLaunchConfiguration",
            "autoscaling:DeleteLaunchConfiguration",
        ],
    },
    TypeSpec {
        type_name: "AWS::ECR::Repository",
        name_property: Some("RepositoryName"),
        arn_pattern: "arn:{partition}:ecr:{region}:{account}:repository/{name}",
        create_actions: &["ecr:CreateRepository"],
        update_actions: &["ecr:PutLifecyclePolicy", "ecr:SetRepositoryPolicy"],
    },
    TypeSpec {
        type_name: "AWS::SecretsManager::Secret",
        name_property: Some("Name"),
        arn_pattern: "arn:{partition}:secretsmanager:{region}:{account}:secret:{name}*",
        create_actions: &["secretsmanager:CreateSecret", "secretsmanager:TagResource"],
        update_actions: &["secretsmanager:UpdateSecret"],
    },
    TypeSpec {
        type_name: "AWS::SSM::Parameter",
        name_property: Some("Name"),
        arn_pattern: "arn:{partition}:ssm:{region}:{account}:parameter/{name}",
        create_actions: &["ssm:PutParameter"],
        update_actions: &["ssm:PutParameter"],
    },
    TypeSpec {
        type_name: "AWS::KMS::Alias",
        name_property: Some("AliasName"),
        arn_pattern: "arn:{partition}:kms:{region}:{account}:{name}",
        create_actions: &["kms:CreateAlias"],
        update_actions: &["kms:UpdateAlias"],
    },
];

/// Catalog entry for a type.
pub fn lookup(type_name: &str) -> Option<&'static TypeSpec> {
    CATALOG.iter().find(|entry| entry.type_name == type_name)
}

/// All catalogued type names.
pub fn known_types() -> impl Iterator<Item = &'static str> {
    CATALOG.iter().map(|entry| entry.type_name)
}

/// Explicit physical name declared in the (resolved) properties.
///
/// `None` when the type has no naming property, the property is absent, or
/// its value is not a literal (an unresolved reference, for instance).
pub fn identifier(type_name: &str, properties: Option<&Node>) -> Option<String> {
    let property = lookup(type_name)?.name_property?;
    properties?
        .get(property)?
        .as_str()
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// The node holding the explicit physical name, for line attribution.
pub fn identifier_node<'n>(type_name: &str, properties: Option<&'n Node>) -> Option<&'n Node> {
    let property = lookup(type_name)?.name_property?;
    properties?.get(property)
}

/// Authorization actions required to perform `action` on `type_name`.
///
/// Uncatalogued `Vendor::Service::Resource` types map to
/// `service:CreateResource` / `service:UpdateResource`. Anything that does
/// not have three parts needs no actions.
pub fn required_actions(type_name: &str, action: Action) -> Vec<String> {
    if let Some(entry) = lookup(type_name) {
        return entry.actions(action).iter().map(|a| a.to_string()).collect();
    }

    let parts: Vec<&str> = type_name.split("::").collect();
    match parts.as_slice() {
        [_, service, resource] if !service.is_empty() && !resource.is_empty() => {
            let verb = match action {
                Action::Create => "Create",
                Action::Update => "Update",
            };
            let derived = format!("{}:{}{}", service.to_ascii_lowercase(), verb, resource);
            debug!("Derived action {} for uncatalogued type {}", derived, type_name);
            vec![derived]
        }
        _ => Vec::new(),
    }
}

/// ARN the resource is expected to have, used as the resource of
/// authorization checks. Unknown names become `*`.
pub fn resource_arn(type_name: &str, name: Option<&str>, identity: &CallerIdentity) -> String {
    match lookup(type_name) {
        Some(entry) => entry
            .arn_pattern
            .replace("{partition}", &identity.partition)
            .replace("{region}", &identity.region)
            .replace("{account}", &identity.account)
            .replace("{name}", name.unwrap_or("*")),
        None => "*".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity() -> CallerIdentity {
        CallerIdentity::parse("arn:aws:iam::123456789012:role/Deployer", "eu-west-1").unwrap()
    }

    #[test]
    fn test_identifier_from_name_property() {
        let props = Node::mapping(
            3,
            vec![(Node::scalar(3, "BucketName"), Node::scalar(3, "web-assets"))],
        );
        assert_eq!(identifier("AWS::S3::Bucket", Some(&props)).as_deref(), Some("web-assets"));
        assert_eq!(identifier("AWS::S3::Bucket", None), None);
        assert_eq!(identifier("AWS::EC2::Instance", Some(&props)), None);
        assert_eq!(identifier("AWS::Made::Up", Some(&props)), None);
    }

    #[test]
    fn test_identifier_ignores_unresolved_reference() {
        let props = Node::mapping(
            3,
            vec![(Node::scalar(3, "QueueName"), Node::reference(3, "Missing"))],
        );
        assert_eq!(identifier("AWS::SQS::Queue", Some(&props)), None);
    }

    #[test]
    fn test_required_actions() {
        assert_eq!(
            required_actions("AWS::S3::Bucket", Action::Create),
            vec!["s3:CreateBucket", "s3:PutBucketTagging"]
        );
        assert_eq!(
            required_actions("AWS::Events::Rule", Action::Update),
            vec!["events:UpdateRule"]
        );
        assert!(required_actions("Custom::Thing", Action::Create).is_empty());
    }

    #[test]
    fn test_resource_arn() {
        let id = identity();
        assert_eq!(resource_arn("AWS::S3::Bucket", Some("logs"), &id), "arn:aws:s3:::logs");
        assert_eq!(
            resource_arn("AWS::SQS::Queue", None, &id),
            "arn:aws:sqs:eu-west-1:123456789012:*"
        );
        assert_eq!(resource_arn("AWS::Made::Up", Some("x"), &id), "*");
    }

    #[test]
    fn test_catalog_has_no_duplicates() {
        let mut names: Vec<_> = known_types().collect();
        let total = names.len();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), total);
    }
}
