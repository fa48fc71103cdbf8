//! Mock account probe for testing.
//!
//! Provides a configurable implementation of the [`AccountProbe`] trait that
//! records every call and can be told to fail specific operations, so the
//! forecast engine can be exercised without an account.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::error::{AccountError, AccountResult};
use crate::probe::{AccountProbe, AuthorizationDecision, StackDescriptor};

/// Captured call information for verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedCall {
    pub method: String,
    pub args: Vec<String>,
}

#[derive(Default)]
struct MockState {
    caller_arn: String,
    region: String,
    stacks: Vec<StackDescriptor>,
    existing: HashSet<(String, String)>,
    denied_actions: HashSet<String>,
    non_empty_buckets: HashSet<String>,
    principals: HashSet<String>,
    images: HashSet<String>,
    key_pairs: HashSet<String>,
    engine_versions: BTreeMap<String, Vec<String>>,
    failures: HashMap<String, String>,
}

/// Mock account probe.
///
/// By default the caller is `arn:aws:iam::123456789012:role/Deployer` in
/// `us-east-1`, nothing exists and every action is allowed.
#[derive(Clone)]
pub struct MockAccount {
    state: Arc<RwLock<MockState>>,
    captured_calls: Arc<RwLock<Vec<CapturedCall>>>,
}

impl Default for MockAccount {
    fn default() -> Self {
        Self::new()
    }
}

impl MockAccount {
    pub const DEFAULT_CALLER: &'static str = "arn:aws:iam::123456789012:role/Deployer";

    pub fn new() -> Self {
        let state = MockState {
            caller_arn: Self::DEFAULT_CALLER.to_string(),
            region: "us-east-1".to_string(),
            ..Default::default()
        };
        Self {
            state: Arc::new(RwLock::new(state)),
            captured_calls: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub fn with_caller_arn(self, arn: impl Into<String>) -> Self {
        self.state.write().caller_arn = arn.into();
        self
    }

    pub fn with_region(self, region: impl Into<String>) -> Self {
        self.state.write().region = region.into();
        self
    }

    pub fn with_stack(self, stack: StackDescriptor) -> Self {
        self.state.write().stacks.push(stack);
        self
    }

    /// Mark a resource as existing in the account, outside any stack.
    pub fn with_existing(
        self,
        type_name: impl Into<String>,
        identifier: impl Into<String>,
    ) -> Self {
        self.state
            .write()
            .existing
            .insert((type_name.into(), identifier.into()));
        self
    }

    /// Deny an authorization action for every resource.
    pub fn deny(self, action: impl Into<String>) -> Self {
        self.state.write().denied_actions.insert(action.into());
        self
    }

    pub fn with_non_empty_bucket(self, bucket: impl Into<String>) -> Self {
        self.state.write().non_empty_buckets.insert(bucket.into());
        self
    }

    pub fn with_principal(self, arn: impl Into<String>) -> Self {
        self.state.write().principals.insert(arn.into());
        self
    }

    pub fn with_image(self, image_id: impl Into<String>) -> Self {
        self.state.write().images.insert(image_id.into());
        self
    }

    pub fn with_key_pair(self, key_name: impl Into<String>) -> Self {
        self.state.write().key_pairs.insert(key_name.into());
        self
    }

    pub fn with_engine_versions(self, engine: impl Into<String>, versions: Vec<String>) -> Self {
        self.state.write().engine_versions.insert(engine.into(), versions);
        self
    }

    /// Make every call to `method` fail with an API error.
    pub fn fail_on(self, method: impl Into<String>, message: impl Into<String>) -> Self {
        self.state.write().failures.insert(method.into(), message.into());
        self
    }

    /// Get all captured calls.
    pub fn get_calls(&self) -> Vec<CapturedCall> {
        self.captured_calls.read().clone()
    }

    /// Get the number of calls made.
    pub fn call_count(&self) -> usize {
        self.captured_calls.read().len()
    }

    /// Check if a specific method was called.
    pub fn was_called(&self, method: &str) -> bool {
        self.captured_calls.read().iter().any(|c| c.method == method)
    }

    /// Get calls to a specific method.
    pub fn get_method_calls(&self, method: &str) -> Vec<CapturedCall> {
        self.captured_calls
            .read()
            .iter()
            .filter(|c| c.method == method)
            .cloned()
            .collect()
    }

    /// Clear all captured calls.
    pub fn clear_calls(&self) {
        self.captured_calls.write().clear();
    }

    /// Record a call and return the configured failure for it, if any.
    fn record(&self, method: &str, args: &[&str]) -> AccountResult<()> {
        self.captured_calls.write().push(CapturedCall {
            method: method.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
        });
        match self.state.read().failures.get(method) {
            Some(message) => Err(AccountError::api(method, message.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl AccountProbe for MockAccount {
    async fn caller_arn(&self) -> AccountResult<String> {
        self.record("caller_arn", &[])?;
        Ok(self.state.read().caller_arn.clone())
    }

    fn region(&self) -> String {
        self.state.read().region.clone()
    }

    async fn describe_stack(&self, stack_name: &str) -> AccountResult<Option<StackDescriptor>> {
        self.record("describe_stack", &[stack_name])?;
        Ok(self
            .state
            .read()
            .stacks
            .iter()
            .find(|s| s.name == stack_name)
            .cloned())
    }

    async fn resource_exists(&self, type_name: &str, identifier: &str) -> AccountResult<bool> {
        self.record("resource_exists", &[type_name, identifier])?;
        let state = self.state.read();
        let key = (type_name.to_string(), identifier.to_string());
        Ok(state.existing.contains(&key)
            || state.stacks.iter().any(|s| s.owns(type_name, identifier)))
    }

    async fn evaluate_authorization(
        &self,
        role_arn: &str,
        action: &str,
        resource_arn: &str,
    ) -> AccountResult<AuthorizationDecision> {
        self.record("evaluate_authorization", &[role_arn, action, resource_arn])?;
        if self.state.read().denied_actions.contains(action) {
            Ok(AuthorizationDecision::ImplicitDeny)
        } else {
            Ok(AuthorizationDecision::Allowed)
        }
    }

    async fn bucket_is_empty(&self, bucket: &str) -> AccountResult<bool> {
        self.record("bucket_is_empty", &[bucket])?;
        Ok(!self.state.read().non_empty_buckets.contains(bucket))
    }

    async fn principal_exists(&self, principal_arn: &str) -> AccountResult<bool> {
        self.record("principal_exists", &[principal_arn])?;
        Ok(self.state.read().principals.contains(principal_arn))
    }

    async fn image_exists(&self, image_id: &str) -> AccountResult<bool> {
        self.record("image_exists", &[image_id])?;
        Ok(self.state.read().images.contains(image_id))
    }

    async fn key_pair_exists(&self, key_name: &str) -> AccountResult<bool> {
        self.record("key_pair_exists", &[key_name])?;
        Ok(self.state.read().key_pairs.contains(key_name))
    }

    async fn engine_version_available(&self, engine: &str, version: &str) -> AccountResult<bool> {
        self.record("engine_version_available", &[engine, version])?;
        Ok(match self.state.read().engine_versions.get(engine) {
            Some(versions) => versions.iter().any(|v| v == version),
            None => true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_defaults() {
        let mock = MockAccount::new();
        assert_eq!(mock.caller_arn().await.unwrap(), MockAccount::DEFAULT_CALLER);
        assert_eq!(mock.region(), "us-east-1");
        assert!(!mock.resource_exists("AWS::S3::Bucket", "b").await.unwrap());
        assert!(mock
            .evaluate_authorization("r", "s3:CreateBucket", "*")
            .await
            .unwrap()
            .is_allowed());
    }

    #[tokio::test]
    async fn test_mock_records_calls() {
        let mock = MockAccount::new().with_existing("AWS::S3::Bucket", "taken");
        assert!(mock.resource_exists("AWS::S3::Bucket", "taken").await.unwrap());
        assert!(mock.was_called("resource_exists"));
        assert_eq!(mock.call_count(), 1);
        assert_eq!(
            mock.get_method_calls("resource_exists")[0].args,
            vec!["AWS::S3::Bucket".to_string(), "taken".to_string()]
        );

        mock.clear_calls();
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn test_mock_failure_injection() {
        let mock = MockAccount::new().fail_on("evaluate_authorization", "throttled");
        let err = mock
            .evaluate_authorization("r", "s3:CreateBucket", "*")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AccountError::Api { ref operation, .. } if operation == "evaluate_authorization"
        ));
        // Other methods are unaffected
        assert!(mock.caller_arn().await.is_ok());
    }

    #[tokio::test]
    async fn test_mock_stack_ownership() {
        let mock = MockAccount::new().with_stack(
            StackDescriptor::new("web").with_resource("Assets", "AWS::S3::Bucket", "web-assets"),
        );
        assert!(mock
            .stack_owns_resource("web", "AWS::S3::Bucket", "web-assets")
            .await
            .unwrap());
        assert!(!mock
            .stack_owns_resource("other", "AWS::S3::Bucket", "web-assets")
            .await
            .unwrap());
    }
}
