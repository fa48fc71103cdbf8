//! Error types for the account module.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for account operations.
pub type AccountResult<T> = Result<T, AccountError>;

/// Errors that can occur while querying account state.
#[derive(Error, Debug)]
pub enum AccountError {
    #[error("Unexpected number of tokens in caller arn: {0}")]
    MalformedArn(String),

    #[error("Unable to resolve caller identity: {0}")]
    Identity(String),

    #[error("Account API call {operation} failed: {message}")]
    Api { operation: String, message: String },

    #[error("Invalid action pattern: {0}")]
    InvalidPattern(String),

    #[error("Account snapshot not found: {0}")]
    SnapshotNotFound(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AccountError {
    pub fn api(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Api {
            operation: operation.into(),
            message: message.into(),
        }
    }
}
