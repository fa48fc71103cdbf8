//! Collision check for explicitly named resources.
//!
//! A resource with an explicit physical name collides with anything of the
//! same type and name that already exists outside the target stack.

use sky_account::AccountProbe;
use tracing::{debug, warn};

use crate::catalog;
use crate::context::ResourceContext;
use crate::forecast::Forecast;

pub const DOES_NOT_EXIST: &str = "Does not exist";
pub const ALREADY_EXISTS: &str = "Already exists";
pub const OWNED_BY_STACK: &str = "Exists and is owned by the stack";

/// Check that creating or updating the resource will not collide with an
/// existing one. Always contributes exactly one message.
pub async fn check_existence(ctx: &ResourceContext<'_>, account: &dyn AccountProbe) -> Forecast {
    let mut forecast = Forecast::new(&ctx.type_name, &ctx.logical_id);

    let Some(identifier) = catalog::identifier(&ctx.type_name, ctx.properties.as_ref()) else {
        debug!("{} has no explicit name, nothing can collide", ctx.logical_id);
        forecast.pass(ctx.line, DOES_NOT_EXIST);
        return forecast;
    };

    let name_node = catalog::identifier_node(&ctx.type_name, ctx.properties.as_ref());
    let line = ctx.line_of(name_node);

    let exists = match account.resource_exists(&ctx.type_name, &identifier).await {
        Ok(exists) => exists,
        Err(e) => {
            warn!("Existence check for {} could not run: {}", ctx.logical_id, e);
            forecast.unknown(
                line,
                format!("Unable to check whether {} exists: {}", identifier, e),
            );
            return forecast;
        }
    };

    if !exists {
        forecast.pass(ctx.line, DOES_NOT_EXIST);
        return forecast;
    }

    if !ctx.stack_exists() {
        forecast.fail(line, ALREADY_EXISTS);
        return forecast;
    }

    match account
        .stack_owns_resource(&ctx.stack_name, &ctx.type_name, &identifier)
        .await
    {
        Ok(true) => forecast.pass(line, OWNED_BY_STACK),
        Ok(false) => forecast.fail(line, ALREADY_EXISTS),
        Err(e) => {
            warn!("Ownership check for {} could not run: {}", ctx.logical_id, e);
            forecast.unknown(
                line,
                format!("Unable to check whether the stack owns {}: {}", identifier, e),
            );
        }
    }

    forecast
}
