//! # sky_account
//!
//! Read-only access to account state for skycast.
//!
//! This crate provides:
//! - **AccountProbe**: the queries the forecast engine makes against an
//!   account (existence, stack ownership, authorization, per-type lookups)
//! - **CallerIdentity**: partition/region/account derived from the caller ARN
//! - **AccountSnapshot**: an offline, file-backed account description
//! - **MockAccount**: a recording mock for tests
//!
//! ## Example
//!
//! ```rust,no_run
//! use sky_account::{AccountProbe, AccountSnapshot, CallerIdentity};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let account = AccountSnapshot::from_file("account.yaml")?;
//!     let identity = CallerIdentity::resolve(&account).await?;
//!     println!("Forecasting as {} in {}", identity.arn, identity.region);
//!
//!     if account.resource_exists("AWS::S3::Bucket", "web-assets").await? {
//!         println!("web-assets is taken");
//!     }
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod identity;
pub mod mock;
pub mod probe;
pub mod snapshot;

pub use error::{AccountError, AccountResult};
pub use identity::CallerIdentity;
pub use mock::{CapturedCall, MockAccount};
pub use probe::{AccountProbe, AuthorizationDecision, StackDescriptor, StackResource};
pub use snapshot::{wildcard_match, AccountSnapshot, ActionRule};
