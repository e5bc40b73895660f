//! Application configuration stored as TOML.

use crate::catalog::{Category, CategoryCatalog};
use crate::submission::TransportError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:5000";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("could not serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("api_base_url must not be empty")]
    EmptyBaseUrl,
    #[error("could not build http client: {0}")]
    Client(TransportError),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Root of the classification service, without the `/analyze` suffix.
    pub api_base_url: String,
    /// Optional upper bound per request. Unset means the network stack decides.
    pub request_timeout_secs: Option<u64>,
    /// Replaces the built-in catalog when present.
    pub categories: Option<Vec<Category>>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout_secs: None,
            categories: None,
        }
    }
}

impl AppConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(raw)?)
    }

    /// Loads `path`; a missing file yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(raw) => Self::from_toml_str(&raw),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::info!("no config at {}, using defaults", path.display());
                Ok(Self::default())
            }
            Err(source) => Err(ConfigError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let io_err = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let raw = toml::to_string_pretty(self)?;
        fs::write(path, raw).map_err(io_err)?;
        Ok(())
    }

    /// Replaces the base URL when `value` is set and not blank.
    pub fn with_base_url_override(mut self, value: Option<String>) -> Self {
        if let Some(url) = value.filter(|v| !v.trim().is_empty()) {
            self.api_base_url = url.trim().to_string();
        }
        self
    }

    /// Base URL without trailing slashes.
    pub fn base_url(&self) -> Result<&str, ConfigError> {
        let trimmed = self.api_base_url.trim().trim_end_matches('/');
        if trimmed.is_empty() {
            return Err(ConfigError::EmptyBaseUrl);
        }
        Ok(trimmed)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    pub fn catalog(&self) -> CategoryCatalog {
        match &self.categories {
            Some(categories) => CategoryCatalog::new(categories.clone()),
            None => CategoryCatalog::builtin(),
        }
    }
}
