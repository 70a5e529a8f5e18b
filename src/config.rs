//! Agent configuration
//!
//! The config file is YAML with a single `environment` mapping:
//!
//! ```yaml
//! environment:
//!   ELASTIC_APM_SERVER_URLS: "http://apm-server:8200"
//!   ELASTIC_APM_LOG_LEVEL: "debug"
//! ```
//!
//! Entries are held in a `BTreeMap`, so variables are always injected in
//! lexicographic order of their names. Scalar values are taken as written
//! (`PORT: 8080` injects `"8080"`). A variable without a value (`NAME:` or
//! `NAME: ~`) is rejected; write `NAME: ""` for an empty string.

use std::collections::BTreeMap;
use std::path::Path;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use tracing::debug;

use crate::{Error, Result};

/// Configuration for agent injection
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    /// Environment variables injected into every application container
    #[serde(default, deserialize_with = "non_null_values")]
    pub environment: BTreeMap<String, String>,
}

impl AgentConfig {
    /// Create an empty configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an environment variable
    pub fn with_env(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.environment.insert(name.into(), value.into());
        self
    }

    /// Parse configuration from YAML
    ///
    /// An empty document yields an empty configuration.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(yaml).map_err(|e| Error::config(format!("invalid agent config: {e}")))
    }

    /// Load configuration from a YAML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!("failed to read {}: {}", path.display(), e))
        })?;
        let config = Self::from_yaml(&content)?;
        debug!(
            path = %path.display(),
            variables = config.environment.len(),
            "Loaded agent config"
        );
        Ok(config)
    }
}

/// Reject `NAME:` / `NAME: ~` entries instead of injecting them as `""` / `"~"`
fn non_null_values<'de, D>(
    deserializer: D,
) -> std::result::Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    BTreeMap::<String, Option<String>>::deserialize(deserializer)?
        .into_iter()
        .map(|(name, value)| match value {
            Some(value) => Ok((name, value)),
            None => Err(D::Error::custom(format!(
                "environment.{name} has no value, use \"\" for an empty string"
            ))),
        })
        .collect()
}
