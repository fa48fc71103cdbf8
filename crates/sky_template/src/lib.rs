//! # sky_template
//!
//! Template model for skycast.
//!
//! This crate provides:
//! - **Line-annotated nodes**: every node of a parsed template keeps the
//!   1-based source line it came from, so checks can point at it
//! - **Template loading**: YAML or JSON templates from text or files
//! - **Deploy configuration**: resolved parameter and tag values merged from
//!   the command line, a config file, the previous stack and template defaults
//!
//! ## Example
//!
//! ```rust,no_run
//! use sky_template::{DeployConfig, Template};
//!
//! let template = Template::from_file("stack.yaml")?;
//! let config = DeployConfig::new().with_param("Env", "dev");
//!
//! if let Some(resources) = template.resources() {
//!     for (key, _resource) in resources.entries() {
//!         println!("{} at line {}", key.as_str().unwrap_or_default(), key.line);
//!     }
//! }
//! # Ok::<(), sky_template::TemplateError>(())
//! ```

pub mod deploy_config;
pub mod error;
pub mod node;
pub mod template;

pub use deploy_config::{ConfigValue, DeployConfig, DeployConfigFile};
pub use error::{TemplateError, TemplateResult};
pub use node::{Node, NodeValue};
pub use template::Template;
