//! Deploy configuration: resolved parameter and tag values.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{TemplateError, TemplateResult};
use crate::template::Template;

/// A scalar value in a config file. Numbers and booleans are accepted
/// and rendered back as strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConfigValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigValue::Text(s) => write!(f, "{}", s),
            ConfigValue::Integer(i) => write!(f, "{}", i),
            ConfigValue::Float(x) => write!(f, "{}", x),
            ConfigValue::Boolean(b) => write!(f, "{}", b),
        }
    }
}

/// On-disk deploy configuration (`--config`).
///
/// ```yaml
/// Parameters:
///   Env: prod
/// Tags:
///   team: platform
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeployConfigFile {
    #[serde(rename = "Parameters", default)]
    pub parameters: BTreeMap<String, ConfigValue>,
    #[serde(rename = "Tags", default)]
    pub tags: BTreeMap<String, ConfigValue>,
}

impl DeployConfigFile {
    /// Load a config file. The format is chosen by extension
    /// (`.json`, `.toml`, anything else is read as YAML).
    pub fn from_file(path: impl AsRef<Path>) -> TemplateResult<Self> {
        let path = path.as_ref();
        debug!("Reading deploy config from {:?}", path);

        let content = fs::read_to_string(path)?;
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();

        let file: Self = match ext.as_str() {
            "json" => serde_json::from_str(&content)?,
            "toml" => toml::from_str(&content)?,
            _ => serde_yaml::from_str(&content)?,
        };
        Ok(file)
    }
}

/// Resolved deploy-time parameters and tags.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeployConfig {
    pub params: BTreeMap<String, String>,
    pub tags: BTreeMap<String, String>,
}

impl DeployConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    pub fn with_tag(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(name.into(), value.into());
        self
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    /// Parse `key=value` pairs as given on the command line.
    pub fn parse_pairs<S: AsRef<str>>(pairs: &[S]) -> TemplateResult<BTreeMap<String, String>> {
        let mut map = BTreeMap::new();
        for pair in pairs {
            let pair = pair.as_ref();
            let (key, value) = pair
                .split_once('=')
                .ok_or_else(|| TemplateError::InvalidPair(pair.to_string()))?;
            if key.trim().is_empty() {
                return Err(TemplateError::InvalidPair(pair.to_string()));
            }
            map.insert(key.trim().to_string(), value.to_string());
        }
        Ok(map)
    }

    /// Merge every source of parameter and tag values.
    ///
    /// Precedence, highest first: command line, config file, the previous
    /// values of an existing stack, template defaults. Tags only come from
    /// the command line and the config file. Parameters without a value
    /// anywhere are left out.
    pub fn resolve(
        template: &Template,
        file: Option<&DeployConfigFile>,
        cli_params: BTreeMap<String, String>,
        cli_tags: BTreeMap<String, String>,
        previous: &BTreeMap<String, String>,
    ) -> Self {
        let mut params = template.parameter_defaults();

        for (name, value) in previous {
            params.insert(name.clone(), value.clone());
        }

        let mut tags = BTreeMap::new();
        if let Some(file) = file {
            for (name, value) in &file.parameters {
                params.insert(name.clone(), value.to_string());
            }
            for (name, value) in &file.tags {
                tags.insert(name.clone(), value.to_string());
            }
        }

        params.extend(cli_params);
        tags.extend(cli_tags);

        debug!("Resolved {} parameters and {} tags", params.len(), tags.len());
        Self { params, tags }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pairs() {
        let map = DeployConfig::parse_pairs(&["Env=prod", "Url=a=b"]).unwrap();
        assert_eq!(map.get("Env").map(String::as_str), Some("prod"));
        assert_eq!(map.get("Url").map(String::as_str), Some("a=b"));
    }

    #[test]
    fn test_parse_pairs_rejects_missing_separator() {
        let err = DeployConfig::parse_pairs(&["Env"]).unwrap_err();
        assert!(matches!(err, TemplateError::InvalidPair(p) if p == "Env"));
        assert!(DeployConfig::parse_pairs(&["=x"]).is_err());
    }

    #[test]
    fn test_resolve_precedence() {
        let template = Template::parse(
            "Parameters:\n  A:\n    Default: template\n  B:\n    Default: template\n  C:\n    Default: template\n  D:\n    Default: template\nResources: {}\n",
        )
        .unwrap();
        let file = DeployConfigFile {
            parameters: BTreeMap::from([
                ("B".to_string(), ConfigValue::Text("file".into())),
                ("C".to_string(), ConfigValue::Integer(3)),
            ]),
            tags: BTreeMap::from([("team".to_string(), ConfigValue::Text("infra".into()))]),
        };
        let previous = BTreeMap::from([
            ("C".to_string(), "previous".to_string()),
            ("D".to_string(), "previous".to_string()),
        ]);
        let cli = BTreeMap::from([("B".to_string(), "cli".to_string())]);

        let config = DeployConfig::resolve(&template, Some(&file), cli, BTreeMap::new(), &previous);

        assert_eq!(config.param("A"), Some("template"));
        assert_eq!(config.param("B"), Some("cli"));
        assert_eq!(config.param("C"), Some("3"));
        assert_eq!(config.param("D"), Some("previous"));
        assert_eq!(config.tags.get("team").map(String::as_str), Some("infra"));
    }
}
