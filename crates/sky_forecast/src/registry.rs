//! Predictor trait and registry.
//!
//! A predictor holds the checks specific to one resource type. The registry
//! maps type identifiers to predictors; a type with no predictor is normal
//! and only receives the generic checks.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use sky_account::AccountProbe;
use tracing::{debug, warn};

use crate::checks::{check_existence, check_permissions};
use crate::context::ResourceContext;
use crate::error::{ForecastError, ForecastResult};
use crate::forecast::Forecast;
use crate::predictors;

/// Type-specific checks for one resource type.
///
/// A predictor receives a context whose properties are already resolved and
/// returns the messages for that resource only. It must contribute at least
/// one message when it returns `Ok`.
#[async_trait]
pub trait Predictor: Send + Sync {
    /// The resource type identifier this predictor handles.
    fn resource_type(&self) -> &str;

    /// Short description used in logs.
    fn description(&self) -> &str;

    async fn predict(
        &self,
        ctx: &ResourceContext<'_>,
        account: &dyn AccountProbe,
    ) -> ForecastResult<Forecast>;
}

/// A registry of predictors keyed by resource type.
#[derive(Default)]
pub struct PredictorRegistry {
    predictors: HashMap<String, Arc<dyn Predictor>>,
}

impl PredictorRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            predictors: HashMap::new(),
        }
    }

    /// Registry holding every built-in predictor.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        for predictor in predictors::builtin() {
            registry.register(predictor);
        }
        registry
    }

    /// Register a predictor under its `resource_type()`.
    ///
    /// A predictor already registered for the same type is replaced.
    pub fn register(&mut self, predictor: Arc<dyn Predictor>) {
        let type_name = predictor.resource_type().to_string();
        debug!("Registering predictor: {}", type_name);
        self.predictors.insert(type_name, predictor);
    }

    /// Register a predictor under a different type identifier.
    pub fn register_as(&mut self, type_name: impl Into<String>, predictor: Arc<dyn Predictor>) {
        let type_name = type_name.into();
        debug!("Registering predictor as: {}", type_name);
        self.predictors.insert(type_name, predictor);
    }

    pub fn get(&self, type_name: &str) -> Option<Arc<dyn Predictor>> {
        self.predictors.get(type_name).cloned()
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.predictors.contains_key(type_name)
    }

    /// Registered type identifiers, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.predictors.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.predictors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.predictors.is_empty()
    }

    /// Run every check for one resource, in order: reference resolution,
    /// existence, permissions (unless skipped), then the registered
    /// predictor if there is one.
    ///
    /// A predictor error that is not fatal becomes one unknown entry. Fatal
    /// errors propagate.
    pub async fn dispatch(
        &self,
        ctx: ResourceContext<'_>,
        account: &dyn AccountProbe,
        skip_permissions: bool,
    ) -> ForecastResult<Forecast> {
        let ctx = ctx.resolve();
        let mut forecast = Forecast::new(&ctx.type_name, &ctx.logical_id);

        debug!("Checking existence of {}", ctx.logical_id);
        forecast.append(check_existence(&ctx, account).await);

        if skip_permissions {
            debug!("Skipping permission checks for {}", ctx.logical_id);
        } else {
            forecast.append(check_permissions(&ctx, account).await);
        }

        if let Some(predictor) = self.get(&ctx.type_name) {
            debug!("Running predictor for {}: {}", ctx.type_name, predictor.description());
            match predictor.predict(&ctx, account).await {
                Ok(predicted) => forecast.append(predicted),
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    warn!("Predictor for {} failed on {}: {}", ctx.type_name, ctx.logical_id, e);
                    forecast.unknown(ctx.line, unknown_condition(predictor.description(), &e));
                }
            }
        }

        Ok(forecast)
    }
}

fn unknown_condition(description: &str, error: &ForecastError) -> String {
    format!("Unable to check {}: {}", description, error)
}

impl std::fmt::Debug for PredictorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PredictorRegistry")
            .field("predictors", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forecast::Outcome;
    use sky_account::{CallerIdentity, MockAccount};
    use sky_template::{DeployConfig, Node};

    struct FixedPredictor {
        type_name: String,
        fail_with: Option<fn() -> ForecastError>,
    }

    #[async_trait]
    impl Predictor for FixedPredictor {
        fn resource_type(&self) -> &str {
            &self.type_name
        }

        fn description(&self) -> &str {
            "fixed rule"
        }

        async fn predict(
            &self,
            ctx: &ResourceContext<'_>,
            _account: &dyn AccountProbe,
        ) -> ForecastResult<Forecast> {
            if let Some(make) = self.fail_with {
                return Err(make());
            }
            let mut forecast = Forecast::new(&ctx.type_name, &ctx.logical_id);
            forecast.pass(ctx.line, "fixed rule holds");
            Ok(forecast)
        }
    }

    fn fixed(type_name: &str) -> Arc<dyn Predictor> {
        Arc::new(FixedPredictor {
            type_name: type_name.to_string(),
            fail_with: None,
        })
    }

    async fn dispatch_one(
        registry: &PredictorRegistry,
        type_name: &str,
        account: &MockAccount,
        skip_permissions: bool,
    ) -> ForecastResult<Forecast> {
        let identity = CallerIdentity::parse(MockAccount::DEFAULT_CALLER, "us-east-1").unwrap();
        let config = DeployConfig::new();
        let ctx = ResourceContext {
            logical_id: "Thing".into(),
            type_name: type_name.into(),
            line: 2,
            properties: Some(Node::mapping(3, Vec::new())),
            stack_name: "app".into(),
            stack: None,
            config: &config,
            identity: &identity,
            role_arn: identity.arn.clone(),
        };
        registry.dispatch(ctx, account, skip_permissions).await
    }

    #[test]
    fn test_register_and_lookup() {
        let mut registry = PredictorRegistry::new();
        assert!(registry.is_empty());

        registry.register(fixed("AWS::SQS::Queue"));
        registry.register_as("AWS::SNS::Topic", fixed("AWS::SQS::Queue"));

        assert_eq!(registry.len(), 2);
        assert!(registry.contains("AWS::SNS::Topic"));
        assert!(registry.get("AWS::S3::Bucket").is_none());
        assert_eq!(registry.names(), vec!["AWS::SNS::Topic", "AWS::SQS::Queue"]);
    }

    #[test]
    fn test_last_registration_wins() {
        let mut registry = PredictorRegistry::new();
        registry.register(fixed("AWS::SQS::Queue"));
        registry.register(fixed("AWS::SQS::Queue"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_defaults_registered() {
        let registry = PredictorRegistry::with_defaults();
        for type_name in [
            "AWS::S3::Bucket",
            "AWS::S3::BucketPolicy",
            "AWS::EC2::Instance",
            "AWS::AutoScaling::LaunchConfiguration",
            "AWS::EC2::SecurityGroup",
            "AWS::RDS::DBCluster",
        ] {
            assert!(registry.contains(type_name), "missing {}", type_name);
        }
    }

    #[tokio::test]
    async fn test_dispatch_generic_only() {
        let registry = PredictorRegistry::new();
        let account = MockAccount::new();

        let forecast = dispatch_one(&registry, "AWS::SQS::Queue", &account, false)
            .await
            .unwrap();
        // existence + two catalogued actions
        assert_eq!(forecast.num_checked(), 3);

        let forecast = dispatch_one(&registry, "AWS::SQS::Queue", &account, true)
            .await
            .unwrap();
        assert_eq!(forecast.num_checked(), 1);
    }

    #[tokio::test]
    async fn test_dispatch_runs_predictor_last() {
        let mut registry = PredictorRegistry::new();
        registry.register(fixed("AWS::SQS::Queue"));
        let account = MockAccount::new();

        let forecast = dispatch_one(&registry, "AWS::SQS::Queue", &account, true)
            .await
            .unwrap();
        let conditions: Vec<_> = forecast.passed.iter().map(|m| m.condition.as_str()).collect();
        assert_eq!(conditions, vec!["Does not exist", "fixed rule holds"]);
    }

    #[tokio::test]
    async fn test_recoverable_predictor_error_is_unknown() {
        let mut registry = PredictorRegistry::new();
        registry.register(Arc::new(FixedPredictor {
            type_name: "AWS::SQS::Queue".into(),
            fail_with: Some(|| ForecastError::check("fixed rule", "timeout")),
        }));
        let account = MockAccount::new();

        let forecast = dispatch_one(&registry, "AWS::SQS::Queue", &account, true)
            .await
            .unwrap();
        assert_eq!(forecast.num_passed(), 1);
        assert_eq!(forecast.num_failed(), 1);
        assert_eq!(forecast.failed[0].outcome, Outcome::Unknown);
    }

    #[tokio::test]
    async fn test_fatal_predictor_error_propagates() {
        let mut registry = PredictorRegistry::new();
        registry.register(Arc::new(FixedPredictor {
            type_name: "AWS::SQS::Queue".into(),
            fail_with: Some(|| ForecastError::MissingResources),
        }));
        let account = MockAccount::new();

        let result = dispatch_one(&registry, "AWS::SQS::Queue", &account, true).await;
        assert!(matches!(result, Err(ForecastError::MissingResources)));
    }
}
