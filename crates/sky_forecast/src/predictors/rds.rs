//! RDS cluster predictor.

use async_trait::async_trait;
use sky_account::AccountProbe;
use sky_template::Node;
use tracing::warn;

use crate::context::ResourceContext;
use crate::error::ForecastResult;
use crate::forecast::Forecast;
use crate::registry::Predictor;

/// Checks an `AWS::RDS::DBCluster`.
///
/// A master password cannot be supplied when the service manages it, and
/// the requested engine version must be offered in the region.
pub struct DbClusterPredictor;

#[async_trait]
impl Predictor for DbClusterPredictor {
    fn resource_type(&self) -> &str {
        "AWS::RDS::DBCluster"
    }

    fn description(&self) -> &str {
        "cluster password and engine version"
    }

    async fn predict(
        &self,
        ctx: &ResourceContext<'_>,
        account: &dyn AccountProbe,
    ) -> ForecastResult<Forecast> {
        let mut forecast = Forecast::new(&ctx.type_name, &ctx.logical_id);

        let password = ctx.property("MasterUserPassword");
        let managed = ctx.property("ManageMasterUserPassword");
        let conflict = password.is_some() && managed.and_then(Node::as_bool) == Some(true);
        if conflict {
            forecast.fail(
                ctx.line_of(managed),
                "MasterUserPassword cannot be set when ManageMasterUserPassword is true",
            );
        } else {
            forecast.pass(
                ctx.line_of(password.or(managed)),
                "Master password settings are consistent",
            );
        }

        let engine = ctx.property_str("Engine");
        let version_node = ctx.property("EngineVersion");
        if let (Some(engine), Some(version)) = (engine, version_node.and_then(Node::as_str)) {
            let line = ctx.line_of(version_node);
            match account.engine_version_available(engine, version).await {
                Ok(true) => forecast.pass(line, format!("{} {} is available", engine, version)),
                Ok(false) => forecast.fail(
                    line,
                    format!("{} {} is not available in {}", engine, version, ctx.identity.region),
                ),
                Err(e) => {
                    warn!("Engine version check for {} could not run: {}", ctx.logical_id, e);
                    forecast.unknown(
                        line,
                        format!("Unable to check {} {} availability: {}", engine, version, e),
                    );
                }
            }
        }

        Ok(forecast)
    }
}
