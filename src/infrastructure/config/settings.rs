//! Application configuration loading and validation.
//!
//! Provides the main [`Config`] struct that aggregates all settings.
//! Configuration is loaded from a TOML file with environment variable
//! overrides. The vCenter password is only ever read from
//! `VCENTER_PASSWORD`, never from the file.
//!
//! # Example
//!
//! ```no_run
//! use release_tagger::infrastructure::config::settings::Config;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load("config.toml")?;
//!     config.init_logging();
//!     Ok(())
//! }
//! ```

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use url::Url;

use super::logging::LoggingConfig;
use crate::application::{ReconcileSettings, DEFAULT_CATALOG_URL};
use crate::domain::{DEFAULT_CATEGORY, DEFAULT_SENTINEL_TAG};
use crate::error::{ConfigError, Result};

/// Environment variable holding the vCenter password.
pub const PASSWORD_ENV: &str = "VCENTER_PASSWORD";
/// Environment variable overriding `vcenter.url`.
pub const URL_ENV: &str = "VCENTER_URL";
/// Environment variable overriding `vcenter.username`.
pub const USERNAME_ENV: &str = "VCENTER_USERNAME";

/// Management endpoint connection settings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct VcenterConfig {
    /// Base URL, e.g. `https://vcenter.lab.local`.
    pub url: String,
    pub username: String,
    /// Loaded from `VCENTER_PASSWORD` only.
    #[serde(skip)]
    pub password: Option<String>,
    /// Skip TLS certificate validation for the endpoint.
    pub insecure: bool,
    /// Per-request HTTP timeout.
    pub timeout_secs: Option<u64>,
}

impl VcenterConfig {
    /// Parsed endpoint URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is unset or malformed.
    pub fn endpoint(&self) -> Result<Url> {
        if self.url.trim().is_empty() {
            return Err(ConfigError::MissingField {
                field: "vcenter.url",
            }
            .into());
        }
        Url::parse(self.url.trim()).map_err(|e| {
            ConfigError::InvalidValue {
                field: "vcenter.url",
                reason: e.to_string(),
            }
            .into()
        })
    }

    /// Username and password for the session.
    ///
    /// # Errors
    ///
    /// Returns an error if either is missing.
    pub fn credentials(&self) -> Result<(&str, &str)> {
        if self.username.is_empty() {
            return Err(ConfigError::MissingField {
                field: "vcenter.username",
            }
            .into());
        }
        let password = self
            .password
            .as_deref()
            .ok_or(ConfigError::MissingField {
                field: PASSWORD_ENV,
            })?;
        Ok((&self.username, password))
    }

    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

/// Release catalog settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Local path or http(s) URL.
    pub location: String,
    /// Validate TLS certificates when fetching over https.
    pub verify_tls: bool,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            location: DEFAULT_CATALOG_URL.to_string(),
            verify_tls: false,
        }
    }
}

/// Tag naming settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TaggingConfig {
    pub category: String,
    pub sentinel_tag: String,
    pub category_description: String,
}

impl Default for TaggingConfig {
    fn default() -> Self {
        let settings = ReconcileSettings::default();
        Self {
            category: DEFAULT_CATEGORY.to_string(),
            sentinel_tag: DEFAULT_SENTINEL_TAG.to_string(),
            category_description: settings.category_description,
        }
    }
}

/// Main application configuration.
///
/// Every section is optional; an empty file yields the defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub vcenter: VcenterConfig,
    pub catalog: CatalogConfig,
    pub tagging: TaggingConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Parse configuration from TOML content, applying environment overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is malformed or validation fails.
    #[allow(clippy::result_large_err)]
    pub fn parse_toml(content: &str) -> Result<Self> {
        Self::parse_with_env(content, |key| std::env::var(key).ok())
    }

    /// Parse with a caller-supplied environment lookup.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is malformed or validation fails.
    #[allow(clippy::result_large_err)]
    pub fn parse_with_env(content: &str, env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config: Self = toml::from_str(content).map_err(ConfigError::Parse)?;
        config.apply_env(env);
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, the TOML is malformed,
    /// or validation fails.
    #[allow(clippy::result_large_err)]
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        Self::parse_toml(&content)
    }

    /// Load `path` if it exists, otherwise start from defaults.
    ///
    /// Used for the implicit default location; an explicitly named file
    /// that is missing should go through [`Config::load`] instead.
    ///
    /// # Errors
    ///
    /// Returns an error if an existing file cannot be parsed or validated.
    #[allow(clippy::result_large_err)]
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            Self::load(path)
        } else {
            Self::parse_toml("")
        }
    }

    fn apply_env(&mut self, env: impl Fn(&str) -> Option<String>) {
        if let Some(url) = env(URL_ENV).filter(|v| !v.is_empty()) {
            self.vcenter.url = url;
        }
        if let Some(username) = env(USERNAME_ENV).filter(|v| !v.is_empty()) {
            self.vcenter.username = username;
        }
        self.vcenter.password = env(PASSWORD_ENV);
    }

    #[allow(clippy::result_large_err)]
    fn validate(&self) -> Result<()> {
        if !self.vcenter.url.is_empty() {
            self.vcenter.endpoint()?;
        }
        if self.vcenter.timeout_secs == Some(0) {
            return Err(ConfigError::InvalidValue {
                field: "vcenter.timeout_secs",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        if self.catalog.location.trim().is_empty() {
            return Err(ConfigError::MissingField {
                field: "catalog.location",
            }
            .into());
        }
        if self.tagging.category.trim().is_empty() {
            return Err(ConfigError::MissingField {
                field: "tagging.category",
            }
            .into());
        }
        if self.tagging.sentinel_tag.trim().is_empty() {
            return Err(ConfigError::MissingField {
                field: "tagging.sentinel_tag",
            }
            .into());
        }
        if self.tagging.sentinel_tag.contains(char::is_whitespace) {
            return Err(ConfigError::InvalidValue {
                field: "tagging.sentinel_tag",
                reason: "must not contain whitespace".to_string(),
            }
            .into());
        }
        if !matches!(self.logging.format.as_str(), "pretty" | "json") {
            return Err(ConfigError::InvalidValue {
                field: "logging.format",
                reason: format!("expected 'pretty' or 'json', got '{}'", self.logging.format),
            }
            .into());
        }
        Ok(())
    }

    /// Settings handed to the reconciler.
    #[must_use]
    pub fn reconcile_settings(&self) -> ReconcileSettings {
        ReconcileSettings {
            default_catalog: self.catalog.location.clone(),
            sentinel_tag: self.tagging.sentinel_tag.clone(),
            category_description: self.tagging.category_description.clone(),
        }
    }

    /// Initialize the global tracing subscriber.
    pub fn init_logging(&self) {
        self.logging.init();
    }
}
