//! Caller identity.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{AccountError, AccountResult};
use crate::probe::AccountProbe;

/// The environment derived from the caller's ARN.
///
/// ARNs have the form `arn:partition:service:region:account:resource`.
/// IAM ARNs leave the region empty, so the region comes from the probe's
/// configuration instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallerIdentity {
    pub arn: String,
    pub partition: String,
    pub region: String,
    pub account: String,
}

impl CallerIdentity {
    /// Parse a caller ARN. Anything other than six `:`-separated tokens is rejected.
    pub fn parse(arn: &str, region: impl Into<String>) -> AccountResult<Self> {
        let tokens: Vec<&str> = arn.split(':').collect();
        if tokens.len() != 6 || tokens[0] != "arn" {
            return Err(AccountError::MalformedArn(arn.to_string()));
        }

        Ok(Self {
            arn: arn.to_string(),
            partition: tokens[1].to_string(),
            region: region.into(),
            account: tokens[4].to_string(),
        })
    }

    /// Ask the probe who is calling and parse the answer.
    pub async fn resolve(probe: &dyn AccountProbe) -> AccountResult<Self> {
        let arn = probe
            .caller_arn()
            .await
            .map_err(|e| AccountError::Identity(e.to_string()))?;
        debug!("Caller arn: {}", arn);
        Self::parse(&arn, probe.region())
    }
}
