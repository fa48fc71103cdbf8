//! Authorization check.
//!
//! Each authorization action the catalog lists for the resource's type and
//! the run's action is evaluated against the effective role. One message is
//! produced per action.

use sky_account::AccountProbe;
use tracing::{debug, warn};

use crate::catalog;
use crate::context::ResourceContext;
use crate::forecast::Forecast;

/// Evaluate every required authorization action for the resource.
///
/// If the policy evaluation service itself fails, the entries gathered so
/// far for this resource are dropped and replaced by a single unknown entry.
/// Nothing outside this resource is affected.
pub async fn check_permissions(ctx: &ResourceContext<'_>, account: &dyn AccountProbe) -> Forecast {
    let mut forecast = Forecast::new(&ctx.type_name, &ctx.logical_id);

    let actions = catalog::required_actions(&ctx.type_name, ctx.action());
    if actions.is_empty() {
        debug!("No authorization actions known for {}", ctx.type_name);
        return forecast;
    }

    let identifier = catalog::identifier(&ctx.type_name, ctx.properties.as_ref());
    let resource_arn = catalog::resource_arn(&ctx.type_name, identifier.as_deref(), ctx.identity);
    debug!(
        "Evaluating {} actions for {} on {} as {}",
        actions.len(),
        ctx.logical_id,
        resource_arn,
        ctx.role_arn
    );

    for action in &actions {
        match account
            .evaluate_authorization(&ctx.role_arn, action, &resource_arn)
            .await
        {
            Ok(decision) if decision.is_allowed() => {
                forecast.pass(ctx.line, format!("{} is allowed", action));
            }
            Ok(decision) => {
                forecast.fail(
                    ctx.line,
                    format!("{} is not allowed for {} ({})", action, ctx.role_arn, decision),
                );
            }
            Err(e) => {
                warn!("Unable to check permissions for {}: {}", ctx.logical_id, e);
                let mut degraded = Forecast::new(&ctx.type_name, &ctx.logical_id);
                degraded.unknown(ctx.line, format!("Unable to check permissions: {}", e));
                return degraded;
            }
        }
    }

    forecast
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forecast::Outcome;
    use sky_account::{CallerIdentity, MockAccount};
    use sky_template::DeployConfig;

    async fn run(type_name: &str, account: &MockAccount) -> Forecast {
        let identity = CallerIdentity::parse(MockAccount::DEFAULT_CALLER, "us-east-1").unwrap();
        let config = DeployConfig::new();
        let ctx = ResourceContext {
            logical_id: "Res".into(),
            type_name: type_name.into(),
            line: 9,
            properties: None,
            stack_name: "app".into(),
            stack: None,
            config: &config,
            identity: &identity,
            role_arn: identity.arn.clone(),
        };
        check_permissions(&ctx, account).await
    }

    #[tokio::test]
    async fn test_one_entry_per_action() {
        let account = MockAccount::new().deny("sqs:TagQueue");
        let forecast = run("AWS::SQS::Queue", &account).await;

        assert_eq!(forecast.num_checked(), 2);
        assert_eq!(forecast.num_passed(), 1);
        assert!(forecast.failed[0].condition.starts_with("sqs:TagQueue is not allowed"));
        assert_eq!(account.get_method_calls("evaluate_authorization").len(), 2);
    }

    #[tokio::test]
    async fn test_no_actions_no_entries() {
        let account = MockAccount::new();
        let forecast = run("Custom::Widget", &account).await;
        assert!(forecast.is_empty());
        assert!(!account.was_called("evaluate_authorization"));
    }

    #[tokio::test]
    async fn test_api_failure_collapses_to_unknown() {
        let account = MockAccount::new().fail_on("evaluate_authorization", "rate exceeded");
        let forecast = run("AWS::IAM::Role", &account).await;

        assert_eq!(forecast.num_checked(), 1);
        assert_eq!(forecast.failed[0].outcome, Outcome::Unknown);
        assert!(forecast.failed[0].condition.contains("rate exceeded"));
    }
}
