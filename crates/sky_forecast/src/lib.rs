//! # sky_forecast
//!
//! Deployment failure forecasting for skycast.
//!
//! Given a parsed template, the target stack (if it exists) and the deploy
//! configuration, the forecaster predicts which resources will fail to
//! deploy and how long the operation will take, without changing anything
//! in the account.
//!
//! # Architecture
//!
//! - **Resolver**: substitutes deploy-time parameter values into a copy of
//!   each resource's properties
//! - **Checks**: existence and permission checks run for every resource
//! - **Registry**: maps resource types to type-specific predictors
//! - **Estimate**: static per-type durations
//! - **Pipeline**: walks resources in document order and builds the report
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use sky_account::AccountSnapshot;
//! use sky_forecast::{ForecastOptions, Forecaster};
//! use sky_template::{DeployConfig, Template};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let template = Template::from_file("web.yaml")?;
//!     let account = Arc::new(AccountSnapshot::from_file("account.yaml")?);
//!
//!     let forecaster = Forecaster::new(account, ForecastOptions::new("web"));
//!     let stack = forecaster.describe_stack().await?;
//!     let config = DeployConfig::new().with_param("Env", "prod");
//!
//!     let report = forecaster.forecast(&template, stack.as_ref(), &config).await?;
//!     print!("{}", report.render(false));
//!     Ok(())
//! }
//! ```

pub mod catalog;
pub mod checks;
pub mod context;
pub mod error;
pub mod estimate;
pub mod forecast;
pub mod pipeline;
pub mod predictors;
pub mod registry;
pub mod report;
pub mod resolver;

pub use context::{Action, ResourceContext};
pub use error::{ForecastError, ForecastResult};
pub use estimate::{estimate, format_estimate, total_estimate};
pub use forecast::{CheckMessage, Forecast, Outcome};
pub use pipeline::{ForecastOptions, Forecaster};
pub use registry::{Predictor, PredictorRegistry};
pub use report::{ForecastReport, ForecastSummary};
pub use resolver::resolve_refs;
