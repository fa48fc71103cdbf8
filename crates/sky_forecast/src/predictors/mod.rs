//! Built-in type-specific predictors.

pub mod ec2;
pub mod rds;
pub mod s3;

use std::sync::Arc;

use crate::registry::Predictor;

pub use ec2::{InstancePredictor, LaunchConfigurationPredictor, SecurityGroupPredictor};
pub use rds::DbClusterPredictor;
pub use s3::{BucketPolicyPredictor, BucketPredictor};

/// Every predictor shipped with the engine.
pub fn builtin() -> Vec<Arc<dyn Predictor>> {
    vec![
        Arc::new(BucketPredictor),
        Arc::new(BucketPolicyPredictor),
        Arc::new(InstancePredictor),
        Arc::new(LaunchConfigurationPredictor),
        Arc::new(SecurityGroupPredictor),
        Arc::new(DbClusterPredictor),
    ]
}

#[cfg(test)]
pub(crate) mod test_support {
    use sky_account::{CallerIdentity, MockAccount, StackDescriptor};
    use sky_template::{DeployConfig, Template};

    use crate::context::ResourceContext;

    /// Owned pieces a context borrows from.
    pub struct Fixture {
        pub template: Template,
        pub config: DeployConfig,
        pub identity: CallerIdentity,
        pub stack: Option<StackDescriptor>,
    }

    impl Fixture {
        /// Parse a template whose first resource is the one under test.
        pub fn new(yaml: &str) -> Self {
            Self {
                template: Template::parse(yaml).unwrap(),
                config: DeployConfig::new(),
                identity: CallerIdentity::parse(MockAccount::DEFAULT_CALLER, "us-east-1").unwrap(),
                stack: None,
            }
        }

        pub fn with_stack(mut self, stack: StackDescriptor) -> Self {
            self.stack = Some(stack);
            self
        }

        pub fn context(&self) -> ResourceContext<'_> {
            let resources = self.template.resources().unwrap();
            let (key, resource) = resources.entries().next().unwrap();
            ResourceContext {
                logical_id: key.as_str().unwrap().to_string(),
                type_name: resource.get("Type").and_then(|t| t.as_str()).unwrap().to_string(),
                line: key.line,
                properties: resource.get("Properties").cloned(),
                stack_name: "app".into(),
                stack: self.stack.as_ref(),
                config: &self.config,
                identity: &self.identity,
                role_arn: self.identity.arn.clone(),
            }
            .resolve()
        }
    }
}
