//! The forecast pipeline.
//!
//! Walks the template's resources in document order and runs every check
//! for one resource before moving to the next. Structural problems and an
//! unresolvable caller identity abort the run before any resource is
//! checked; everything else is confined to the resource it happened on.

use std::sync::Arc;

use chrono::Utc;
use sky_account::{AccountProbe, CallerIdentity, StackDescriptor};
use sky_template::{DeployConfig, Node, Template};
use tracing::{debug, info};
use uuid::Uuid;

use crate::context::{Action, ResourceContext};
use crate::error::{ForecastError, ForecastResult};
use crate::estimate::total_estimate;
use crate::forecast::Forecast;
use crate::registry::PredictorRegistry;
use crate::report::{ForecastReport, ForecastSummary};

/// Options for a forecast run.
#[derive(Debug, Clone, Default)]
pub struct ForecastOptions {
    pub stack_name: String,
    pub skip_permissions: bool,
    /// Only check resources of this type
    pub type_filter: Option<String>,
    /// Role to evaluate permissions for, instead of the caller
    pub role_arn: Option<String>,
}

impl ForecastOptions {
    pub fn new(stack_name: impl Into<String>) -> Self {
        Self {
            stack_name: stack_name.into(),
            ..Default::default()
        }
    }

    pub fn skip_permissions(mut self, skip: bool) -> Self {
        self.skip_permissions = skip;
        self
    }

    /// Restrict checks to one type. An empty string means no filter.
    pub fn type_filter(mut self, type_name: impl Into<String>) -> Self {
        let type_name = type_name.into();
        self.type_filter = (!type_name.is_empty()).then_some(type_name);
        self
    }

    pub fn role_arn(mut self, role_arn: impl Into<String>) -> Self {
        let role_arn = role_arn.into();
        self.role_arn = (!role_arn.is_empty()).then_some(role_arn);
        self
    }

    fn includes(&self, type_name: &str) -> bool {
        self.type_filter.as_deref().map_or(true, |t| t == type_name)
    }
}

/// A resource entry that passed structural validation.
struct ResourceEntry<'t> {
    logical_id: String,
    line: usize,
    type_name: String,
    node: &'t Node,
}

/// Check that the template has resources and that each one has a Type.
fn validate(template: &Template) -> ForecastResult<Vec<ResourceEntry<'_>>> {
    let resources = template
        .resources()
        .filter(|r| r.is_mapping())
        .ok_or(ForecastError::MissingResources)?;

    let mut entries = Vec::new();
    for (key, node) in resources.entries() {
        let logical_id = key.as_str().unwrap_or_default().to_string();
        if !node.is_mapping() {
            return Err(ForecastError::InvalidResource {
                logical_id,
                line: key.line,
            });
        }
        let type_name = node
            .get("Type")
            .and_then(Node::as_str)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ForecastError::MissingType {
                logical_id: logical_id.clone(),
                line: key.line,
            })?;
        entries.push(ResourceEntry {
            logical_id,
            line: key.line,
            type_name: type_name.to_string(),
            node,
        });
    }

    if entries.is_empty() {
        return Err(ForecastError::EmptyResources);
    }
    Ok(entries)
}

/// Runs forecasts against one account.
pub struct Forecaster {
    account: Arc<dyn AccountProbe>,
    registry: PredictorRegistry,
    options: ForecastOptions,
}

impl Forecaster {
    /// Create a forecaster with the built-in predictors.
    pub fn new(account: Arc<dyn AccountProbe>, options: ForecastOptions) -> Self {
        Self {
            account,
            registry: PredictorRegistry::with_defaults(),
            options,
        }
    }

    pub fn with_registry(mut self, registry: PredictorRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn registry(&self) -> &PredictorRegistry {
        &self.registry
    }

    pub fn options(&self) -> &ForecastOptions {
        &self.options
    }

    /// Look up the target stack.
    pub async fn describe_stack(&self) -> ForecastResult<Option<StackDescriptor>> {
        let stack = self.account.describe_stack(&self.options.stack_name).await?;
        debug!(
            "Stack {} exists: {}",
            self.options.stack_name,
            stack.is_some()
        );
        Ok(stack)
    }

    /// Forecast deploying `template` as the target stack.
    ///
    /// `stack` is the existing stack, if any; it decides whether the run
    /// forecasts a create or an update.
    pub async fn forecast(
        &self,
        template: &Template,
        stack: Option<&StackDescriptor>,
        config: &DeployConfig,
    ) -> ForecastResult<ForecastReport> {
        let started_at = Utc::now();
        let run_id = Uuid::new_v4();
        let action = Action::infer(stack.is_some());
        info!(
            "Forecasting {} of stack {} ({})",
            action, self.options.stack_name, run_id
        );

        let entries = validate(template)?;

        let identity = CallerIdentity::resolve(self.account.as_ref())
            .await
            .map_err(ForecastError::Identity)?;
        let role_arn = self
            .options
            .role_arn
            .clone()
            .unwrap_or_else(|| identity.arn.clone());

        let mut forecast = Forecast::default();
        let mut resources_checked = 0;

        for entry in entries {
            if !self.options.includes(&entry.type_name) {
                debug!("Not running checks for {} ({})", entry.logical_id, entry.type_name);
                continue;
            }

            info!("Checking {}: {}", entry.type_name, entry.logical_id);
            let ctx = ResourceContext {
                logical_id: entry.logical_id,
                type_name: entry.type_name,
                line: entry.line,
                properties: entry.node.get("Properties").cloned(),
                stack_name: self.options.stack_name.clone(),
                stack,
                config,
                identity: &identity,
                role_arn: role_arn.clone(),
            };

            let resource_forecast = self
                .registry
                .dispatch(ctx, self.account.as_ref(), self.options.skip_permissions)
                .await?;
            forecast.append(resource_forecast);
            resources_checked += 1;
        }

        let total_seconds = total_estimate(template, stack.is_some());
        debug!("Total estimate: {} seconds", total_seconds);

        let summary = ForecastSummary::from_forecast(&forecast, resources_checked);
        info!(
            "Forecast complete: {}/{} checks passed",
            summary.passed_checks, summary.total_checks
        );

        Ok(ForecastReport {
            run_id,
            stack_name: self.options.stack_name.clone(),
            action,
            forecast,
            total_seconds,
            started_at,
            completed_at: Utc::now(),
            summary,
        })
    }
}

impl std::fmt::Debug for Forecaster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Forecaster")
            .field("registry", &self.registry)
            .field("options", &self.options)
            .finish()
    }
}
