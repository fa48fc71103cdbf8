//! Account probe trait and types.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::AccountResult;

/// A resource owned by a deployed stack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackResource {
    pub logical_id: String,
    pub type_name: String,
    pub physical_id: String,
}

/// Descriptor of a stack that already exists in the account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackDescriptor {
    pub name: String,
    #[serde(default)]
    pub status: String,
    /// Parameter values used by the last deployment
    #[serde(default)]
    pub parameters: BTreeMap<String, String>,
    #[serde(default)]
    pub resources: Vec<StackResource>,
}

impl StackDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: "CREATE_COMPLETE".to_string(),
            parameters: BTreeMap::new(),
            resources: Vec::new(),
        }
    }

    pub fn with_parameter(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.insert(name.into(), value.into());
        self
    }

    pub fn with_resource(
        mut self,
        logical_id: impl Into<String>,
        type_name: impl Into<String>,
        physical_id: impl Into<String>,
    ) -> Self {
        self.resources.push(StackResource {
            logical_id: logical_id.into(),
            type_name: type_name.into(),
            physical_id: physical_id.into(),
        });
        self
    }

    /// Physical id of a resource in this stack.
    pub fn physical_id(&self, logical_id: &str) -> Option<&str> {
        self.resources
            .iter()
            .find(|r| r.logical_id == logical_id)
            .map(|r| r.physical_id.as_str())
    }

    /// Whether this stack owns a resource with the given type and identifier.
    pub fn owns(&self, type_name: &str, identifier: &str) -> bool {
        self.resources
            .iter()
            .any(|r| r.type_name == type_name && r.physical_id == identifier)
    }
}

/// Outcome of evaluating one authorization action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthorizationDecision {
    Allowed,
    ImplicitDeny,
    ExplicitDeny,
}

impl AuthorizationDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, AuthorizationDecision::Allowed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AuthorizationDecision::Allowed => "allowed",
            AuthorizationDecision::ImplicitDeny => "implicitDeny",
            AuthorizationDecision::ExplicitDeny => "explicitDeny",
        }
    }
}

impl std::fmt::Display for AuthorizationDecision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Read-only view of an account.
///
/// Every method is a query; nothing here mutates the account. An `Err`
/// means the query itself failed (network, throttling, missing
/// credentials), never that the answer was "no".
#[async_trait]
pub trait AccountProbe: Send + Sync {
    /// ARN of the identity making the calls.
    async fn caller_arn(&self) -> AccountResult<String>;

    /// Region the probe is configured for.
    fn region(&self) -> String;

    /// Describe a stack, `None` if it does not exist.
    async fn describe_stack(&self, stack_name: &str) -> AccountResult<Option<StackDescriptor>>;

    /// Whether a resource of this type and identifier exists anywhere in the account.
    async fn resource_exists(&self, type_name: &str, identifier: &str) -> AccountResult<bool>;

    /// Whether the named stack owns the resource.
    async fn stack_owns_resource(
        &self,
        stack_name: &str,
        type_name: &str,
        identifier: &str,
    ) -> AccountResult<bool> {
        Ok(self
            .describe_stack(stack_name)
            .await?
            .map(|stack| stack.owns(type_name, identifier))
            .unwrap_or(false))
    }

    /// Ask the policy evaluation service whether `role_arn` may perform
    /// `action` on `resource_arn`.
    async fn evaluate_authorization(
        &self,
        role_arn: &str,
        action: &str,
        resource_arn: &str,
    ) -> AccountResult<AuthorizationDecision>;

    async fn bucket_is_empty(&self, bucket: &str) -> AccountResult<bool>;

    async fn principal_exists(&self, principal_arn: &str) -> AccountResult<bool>;

    async fn image_exists(&self, image_id: &str) -> AccountResult<bool>;

    async fn key_pair_exists(&self, key_name: &str) -> AccountResult<bool>;

    async fn engine_version_available(&self, engine: &str, version: &str) -> AccountResult<bool>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stack_descriptor_lookup() {
        let stack = StackDescriptor::new("web")
            .with_resource("Bucket", "AWS::S3::Bucket", "web-assets")
            .with_parameter("Env", "prod");

        assert_eq!(stack.physical_id("Bucket"), Some("web-assets"));
        assert_eq!(stack.physical_id("Queue"), None);
        assert!(stack.owns("AWS::S3::Bucket", "web-assets"));
        assert!(!stack.owns("AWS::SQS::Queue", "web-assets"));
    }

    #[test]
    fn test_decision_display() {
        assert!(AuthorizationDecision::Allowed.is_allowed());
        assert!(!AuthorizationDecision::ExplicitDeny.is_allowed());
        assert_eq!(AuthorizationDecision::ImplicitDeny.to_string(), "implicitDeny");
    }
}
