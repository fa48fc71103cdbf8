//! Per-resource forecast context.

use serde::{Deserialize, Serialize};

use sky_account::{CallerIdentity, StackDescriptor};
use sky_template::{DeployConfig, Node};

use crate::resolver::resolve_refs;

/// The stack operation being forecast.
///
/// Inferred only from whether the target stack exists. Deletes are not
/// forecast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Create,
    Update,
}

impl Action {
    pub fn infer(stack_exists: bool) -> Self {
        if stack_exists {
            Action::Update
        } else {
            Action::Create
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Create => "create",
            Action::Update => "update",
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Everything a check needs to know about one resource.
///
/// Built once per resource per run and dropped when the resource's checks
/// complete. `properties` is an owned copy, never the template's own node.
#[derive(Debug, Clone)]
pub struct ResourceContext<'a> {
    pub logical_id: String,
    pub type_name: String,
    /// Line of the logical id in the template
    pub line: usize,
    pub properties: Option<Node>,
    pub stack_name: String,
    /// The existing stack, when there is one
    pub stack: Option<&'a StackDescriptor>,
    pub config: &'a DeployConfig,
    pub identity: &'a CallerIdentity,
    /// Role used for authorization checks
    pub role_arn: String,
}

impl<'a> ResourceContext<'a> {
    pub fn stack_exists(&self) -> bool {
        self.stack.is_some()
    }

    pub fn action(&self) -> Action {
        Action::infer(self.stack_exists())
    }

    /// Substitute deploy-time parameter values into the properties.
    pub fn resolve(mut self) -> Self {
        if let Some(props) = &self.properties {
            self.properties = Some(resolve_refs(props, &self.config.params));
        }
        self
    }

    pub fn property(&self, name: &str) -> Option<&Node> {
        self.properties.as_ref().and_then(|p| p.get(name))
    }

    /// A property's value, if it is a literal scalar.
    pub fn property_str(&self, name: &str) -> Option<&str> {
        self.property(name).and_then(Node::as_str)
    }

    /// Line to attribute a message about `node` to, falling back to the
    /// resource's own line.
    pub fn line_of(&self, node: Option<&Node>) -> usize {
        match node {
            Some(n) if n.line > 0 => n.line,
            _ => self.line,
        }
    }

    /// Physical id of this resource in the existing stack.
    pub fn physical_id(&self) -> Option<&str> {
        self.stack.and_then(|s| s.physical_id(&self.logical_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_infer() {
        assert_eq!(Action::infer(false), Action::Create);
        assert_eq!(Action::infer(true), Action::Update);
        assert_eq!(Action::Update.to_string(), "update");
    }

    #[test]
    fn test_resolve_and_lookup() {
        let identity =
            CallerIdentity::parse("arn:aws:iam::123456789012:role/Deployer", "us-east-1").unwrap();
        let config = DeployConfig::new().with_param("Name", "jobs");
        let stack =
            StackDescriptor::new("app").with_resource("Queue", "AWS::SQS::Queue", "jobs-old");
        let props = Node::mapping(
            7,
            vec![(Node::scalar(7, "QueueName"), Node::reference(7, "Name"))],
        );

        let ctx = ResourceContext {
            logical_id: "Queue".into(),
            type_name: "AWS::SQS::Queue".into(),
            line: 5,
            properties: Some(props),
            stack_name: "app".into(),
            stack: Some(&stack),
            config: &config,
            identity: &identity,
            role_arn: identity.arn.clone(),
        };

        assert_eq!(ctx.property_str("QueueName"), None);
        let ctx = ctx.resolve();
        assert_eq!(ctx.property_str("QueueName"), Some("jobs"));
        assert_eq!(ctx.line_of(ctx.property("QueueName")), 7);
        assert_eq!(ctx.line_of(ctx.property("Missing")), 5);
        assert_eq!(ctx.action(), Action::Update);
        assert_eq!(ctx.physical_id(), Some("jobs-old"));
    }
}
