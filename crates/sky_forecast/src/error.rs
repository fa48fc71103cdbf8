//! Error types for the forecast engine.

use thiserror::Error;

use sky_account::AccountError;
use sky_template::TemplateError;

/// Result type alias for forecast operations.
pub type ForecastResult<T> = Result<T, ForecastError>;

/// Errors that can occur while forecasting.
///
/// Structural and identity errors abort the whole run. Errors raised while
/// executing a single check are scoped to the resource being checked and
/// end up in that resource's forecast as an unknown outcome.
#[derive(Error, Debug)]
pub enum ForecastError {
    #[error("Expected to find a Resources section in the template")]
    MissingResources,

    #[error("The Resources section of the template is empty")]
    EmptyResources,

    #[error("Expected {logical_id} (line {line}) to have a Type")]
    MissingType { logical_id: String, line: usize },

    #[error("Resource {logical_id} (line {line}) must be a mapping")]
    InvalidResource { logical_id: String, line: usize },

    #[error("Unable to resolve caller identity: {0}")]
    Identity(AccountError),

    #[error("Check {check} could not be executed: {message}")]
    CheckExecution { check: String, message: String },

    #[error("Account error: {0}")]
    Account(#[from] AccountError),

    #[error("Template error: {0}")]
    Template(#[from] TemplateError),
}

impl ForecastError {
    pub fn check(check: impl Into<String>, message: impl Into<String>) -> Self {
        Self::CheckExecution {
            check: check.into(),
            message: message.into(),
        }
    }

    /// Whether this error must abort the whole run rather than a single check.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            ForecastError::CheckExecution { .. } | ForecastError::Account(_)
        )
    }
}
