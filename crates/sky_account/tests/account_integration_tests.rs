//! Integration tests for account snapshots.

use std::fs;

use sky_account::{
    AccountError, AccountProbe, AccountSnapshot, ActionRule, AuthorizationDecision, CallerIdentity,
};
use tempfile::tempdir;

const SNAPSHOT: &str = r#"caller_arn: arn:aws:iam::123456789012:role/Deployer
region: eu-west-1
stacks:
  - name: web
    parameters:
      Env: prod
    resources:
      - logical_id: Assets
        type_name: AWS::S3::Bucket
        physical_id: web-assets
resources:
  AWS::S3::Bucket: [shared-logs]
non_empty_buckets: [web-assets]
denied:
  - action: "iam:*"
images: [ami-0abc]
key_pairs: [ops]
engine_versions:
  aurora-mysql: ["8.0.mysql_aurora.3.05.2"]
"#;

fn load() -> AccountSnapshot {
    let dir = tempdir().unwrap();
    let path = dir.path().join("account.yaml");
    fs::write(&path, SNAPSHOT).unwrap();
    AccountSnapshot::from_file(&path).unwrap()
}

#[tokio::test]
async fn test_snapshot_identity() {
    let account = load();
    let identity = CallerIdentity::resolve(&account).await.unwrap();
    assert_eq!(identity.account, "123456789012");
    assert_eq!(identity.region, "eu-west-1");
    assert_eq!(identity.partition, "aws");
}

#[tokio::test]
async fn test_snapshot_malformed_identity() {
    let account = AccountSnapshot::new("arn:aws:iam::123456789012", "us-east-1");
    let err = CallerIdentity::resolve(&account).await.unwrap_err();
    assert!(matches!(err, AccountError::MalformedArn(_)));

    let account = AccountSnapshot::new("", "us-east-1");
    let err = CallerIdentity::resolve(&account).await.unwrap_err();
    assert!(matches!(err, AccountError::Identity(_)));
}

#[tokio::test]
async fn test_snapshot_existence_and_ownership() {
    let account = load();
    assert!(account.resource_exists("AWS::S3::Bucket", "shared-logs").await.unwrap());
    assert!(account.resource_exists("AWS::S3::Bucket", "web-assets").await.unwrap());
    assert!(!account.resource_exists("AWS::S3::Bucket", "fresh").await.unwrap());

    assert!(account
        .stack_owns_resource("web", "AWS::S3::Bucket", "web-assets")
        .await
        .unwrap());
    assert!(!account
        .stack_owns_resource("web", "AWS::S3::Bucket", "shared-logs")
        .await
        .unwrap());

    let stack = account.describe_stack("web").await.unwrap().unwrap();
    assert_eq!(stack.parameters.get("Env").map(String::as_str), Some("prod"));
    assert!(account.describe_stack("missing").await.unwrap().is_none());
}

#[tokio::test]
async fn test_snapshot_authorization() {
    let account = load();
    let role = "arn:aws:iam::123456789012:role/Deployer";

    let decision = account
        .evaluate_authorization(role, "iam:CreateRole", "*")
        .await
        .unwrap();
    assert_eq!(decision, AuthorizationDecision::ExplicitDeny);

    let decision = account
        .evaluate_authorization(role, "s3:CreateBucket", "arn:aws:s3:::x")
        .await
        .unwrap();
    assert_eq!(decision, AuthorizationDecision::Allowed);
}

#[tokio::test]
async fn test_snapshot_allow_list() {
    let mut account = AccountSnapshot::new("arn:aws:iam::1:role/R", "us-east-1");
    account.allowed.push(ActionRule::new("s3:*").on("arn:aws:s3:::web-*"));

    let allowed = account
        .evaluate_authorization("r", "s3:CreateBucket", "arn:aws:s3:::web-assets")
        .await
        .unwrap();
    assert!(allowed.is_allowed());

    let denied = account
        .evaluate_authorization("r", "s3:CreateBucket", "arn:aws:s3:::other")
        .await
        .unwrap();
    assert_eq!(denied, AuthorizationDecision::ImplicitDeny);
}

#[tokio::test]
async fn test_snapshot_type_specific_queries() {
    let account = load();
    assert!(!account.bucket_is_empty("web-assets").await.unwrap());
    assert!(account.bucket_is_empty("shared-logs").await.unwrap());
    assert!(account.image_exists("ami-0abc").await.unwrap());
    assert!(!account.key_pair_exists("dev").await.unwrap());
    assert!(account
        .principal_exists("arn:aws:iam::123456789012:root")
        .await
        .unwrap());
    assert!(!account
        .principal_exists("arn:aws:iam::999999999999:root")
        .await
        .unwrap());
    assert!(account
        .engine_version_available("aurora-mysql", "8.0.mysql_aurora.3.05.2")
        .await
        .unwrap());
    assert!(!account
        .engine_version_available("aurora-mysql", "5.6")
        .await
        .unwrap());
    assert!(account.engine_version_available("postgres", "16.1").await.unwrap());
}

#[test]
fn test_snapshot_missing_file() {
    let dir = tempdir().unwrap();
    let result = AccountSnapshot::from_file(dir.path().join("absent.yaml"));
    assert!(matches!(result, Err(AccountError::SnapshotNotFound(_))));
}
