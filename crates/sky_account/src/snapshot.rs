//! Offline account snapshot.
//!
//! An [`AccountSnapshot`] is a YAML or JSON description of the state of an
//! account: who the caller is, which stacks and named resources exist, and
//! which authorization actions are denied. It answers every
//! [`AccountProbe`] query locally, which makes forecasts reproducible in CI
//! and usable without live credentials.
//!
//! ```yaml
//! caller_arn: arn:aws:iam::123456789012:role/Deployer
//! region: us-east-1
//! stacks:
//!   - name: web
//!     resources:
//!       - logical_id: Assets
//!         type_name: AWS::S3::Bucket
//!         physical_id: web-assets
//! resources:
//!   AWS::S3::Bucket: [web-assets, shared-logs]
//! non_empty_buckets: [web-assets]
//! denied:
//!   - action: "iam:*"
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{AccountError, AccountResult};
use crate::probe::{AccountProbe, AuthorizationDecision, StackDescriptor};

/// An authorization statement. `action` and `resource` accept `*` wildcards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionRule {
    pub action: String,
    #[serde(default = "wildcard")]
    pub resource: String,
}

fn wildcard() -> String {
    "*".to_string()
}

impl ActionRule {
    pub fn new(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            resource: wildcard(),
        }
    }

    pub fn on(mut self, resource: impl Into<String>) -> Self {
        self.resource = resource.into();
        self
    }

    fn matches(&self, action: &str, resource: &str) -> AccountResult<bool> {
        Ok(wildcard_match(&self.action, action)? && wildcard_match(&self.resource, resource)?)
    }
}

/// Case-insensitive match of `value` against a pattern where `*` matches
/// any run of characters and `?` matches one character.
pub fn wildcard_match(pattern: &str, value: &str) -> AccountResult<bool> {
    let mut expr = String::from("(?i)^");
    for ch in pattern.chars() {
        match ch {
            '*' => expr.push_str(".*"),
            '?' => expr.push('.'),
            other => expr.push_str(&regex::escape(&other.to_string())),
        }
    }
    expr.push('$');

    let re = Regex::new(&expr)
        .map_err(|e| AccountError::InvalidPattern(format!("{}: {}", pattern, e)))?;
    Ok(re.is_match(value))
}

/// Static description of an account.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccountSnapshot {
    pub caller_arn: String,
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub stacks: Vec<StackDescriptor>,
    /// Existing named resources, keyed by resource type
    #[serde(default)]
    pub resources: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub non_empty_buckets: Vec<String>,
    /// When non-empty, only these actions are allowed
    #[serde(default)]
    pub allowed: Vec<ActionRule>,
    /// Explicit denials; these win over `allowed`
    #[serde(default)]
    pub denied: Vec<ActionRule>,
    #[serde(default)]
    pub principals: Vec<String>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub key_pairs: Vec<String>,
    /// Available versions per database engine. Engines not listed are not checked.
    #[serde(default)]
    pub engine_versions: BTreeMap<String, Vec<String>>,
}

impl AccountSnapshot {
    pub fn new(caller_arn: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            caller_arn: caller_arn.into(),
            region: region.into(),
            ..Default::default()
        }
    }

    /// Load a snapshot from a YAML or JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> AccountResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(AccountError::SnapshotNotFound(path.to_path_buf()));
        }
        debug!("Reading account snapshot from {:?}", path);

        let content = fs::read_to_string(path)?;
        let snapshot: Self = if path.extension().map_or(false, |ext| ext == "json") {
            serde_json::from_str(&content)?
        } else {
            serde_yaml::from_str(&content)?
        };
        Ok(snapshot)
    }

    /// The account id embedded in the caller ARN, if well formed.
    fn caller_account(&self) -> Option<&str> {
        self.caller_arn.split(':').nth(4)
    }
}

#[async_trait]
impl AccountProbe for AccountSnapshot {
    async fn caller_arn(&self) -> AccountResult<String> {
        if self.caller_arn.is_empty() {
            return Err(AccountError::Identity(
                "account snapshot has no caller_arn".to_string(),
            ));
        }
        Ok(self.caller_arn.clone())
    }

    fn region(&self) -> String {
        self.region.clone()
    }

    async fn describe_stack(&self, stack_name: &str) -> AccountResult<Option<StackDescriptor>> {
        Ok(self.stacks.iter().find(|s| s.name == stack_name).cloned())
    }

    async fn resource_exists(&self, type_name: &str, identifier: &str) -> AccountResult<bool> {
        let listed = self
            .resources
            .get(type_name)
            .map_or(false, |ids| ids.iter().any(|id| id == identifier));
        let in_stack = self.stacks.iter().any(|s| s.owns(type_name, identifier));
        Ok(listed || in_stack)
    }

    async fn evaluate_authorization(
        &self,
        role_arn: &str,
        action: &str,
        resource_arn: &str,
    ) -> AccountResult<AuthorizationDecision> {
        debug!("Evaluating {} on {} for {}", action, resource_arn, role_arn);

        for rule in &self.denied {
            if rule.matches(action, resource_arn)? {
                return Ok(AuthorizationDecision::ExplicitDeny);
            }
        }

        if self.allowed.is_empty() {
            return Ok(AuthorizationDecision::Allowed);
        }

        for rule in &self.allowed {
            if rule.matches(action, resource_arn)? {
                return Ok(AuthorizationDecision::Allowed);
            }
        }

        Ok(AuthorizationDecision::ImplicitDeny)
    }

    async fn bucket_is_empty(&self, bucket: &str) -> AccountResult<bool> {
        Ok(!self.non_empty_buckets.iter().any(|b| b == bucket))
    }

    async fn principal_exists(&self, principal_arn: &str) -> AccountResult<bool> {
        if self.principals.iter().any(|p| p == principal_arn) {
            return Ok(true);
        }
        // The caller's own account root always exists
        Ok(match self.caller_account() {
            Some(account) => principal_arn.ends_with(&format!(":iam::{}:root", account)),
            None => false,
        })
    }

    async fn image_exists(&self, image_id: &str) -> AccountResult<bool> {
        Ok(self.images.iter().any(|i| i == image_id))
    }

    async fn key_pair_exists(&self, key_name: &str) -> AccountResult<bool> {
        Ok(self.key_pairs.iter().any(|k| k == key_name))
    }

    async fn engine_version_available(&self, engine: &str, version: &str) -> AccountResult<bool> {
        Ok(match self.engine_versions.get(engine) {
            Some(versions) => versions.iter().any(|v| v == version),
            None => true,
        })
    }
}
