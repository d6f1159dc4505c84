//! Base configuration shared by every request a service issues.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Base URL, default headers and default query parameters.
///
/// The configuration is read-only once a service owns it and is shared by all
/// in-flight requests.
///
/// # Example
///
/// ```
/// use courier_net::NetworkConfig;
///
/// let config = NetworkConfig::new("https://api.themoviedb.org")
///     .with_header("Accept", "application/json")
///     .with_query_parameter("api_key", "secret")
///     .with_query_parameter("language", "en");
///
/// assert_eq!(config.base_url(), "https://api.themoviedb.org");
/// ```
///
/// The same configuration can be loaded from TOML:
///
/// ```toml
/// base_url = "https://api.themoviedb.org"
///
/// [headers]
/// Accept = "application/json"
///
/// [query_parameters]
/// api_key = "secret"
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    base_url: String,
    headers: BTreeMap<String, String>,
    query_parameters: BTreeMap<String, String>,
}

impl NetworkConfig {
    /// Create a configuration with the given base URL and no defaults.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Add a header sent with every request.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Add a query parameter appended to every request.
    pub fn with_query_parameter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query_parameters.insert(key.into(), value.into());
        self
    }

    /// The base URL relative paths are joined onto.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Default headers.
    pub fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    /// Default query parameters.
    pub fn query_parameters(&self) -> &BTreeMap<String, String> {
        &self.query_parameters
    }

    /// Parse a configuration from a TOML document.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    /// Load a configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&source)
    }
}
