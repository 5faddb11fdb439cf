//! Client configuration.
//!
//! Sources are layered: built-in defaults, then an optional TOML file, then
//! `ONRAMP_*` environment variables.
//!
//! ```toml
//! base_url = "https://api.onramp.dev"
//! service_key = "sk_live_..."
//! environment = "development"
//! request_timeout_secs = 30
//! resource_timeout_secs = 60
//! detailed_logging = false
//! ```

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use onramp_core::Secret;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{OnrampError, Result};

/// Base URL used when none is configured.
pub const DEFAULT_BASE_URL: &str = "https://api.onramp.dev";

/// Prefix of the environment variables read by [`ClientConfig::apply_env`].
pub const ENV_PREFIX: &str = "ONRAMP";

/// SDK version sent in the `X-SDK-Version` header.
pub const SDK_VERSION: &str = env!("CARGO_PKG_VERSION");

const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
const DEFAULT_RESOURCE_TIMEOUT_SECS: u64 = 60;

/// Deployment environment reported to the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Production,
    Development,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Production => "production",
            Self::Development => "development",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = OnrampError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "production" | "prod" => Ok(Self::Production),
            "development" | "dev" => Ok(Self::Development),
            other => Err(OnrampError::Configuration(format!(
                "unknown environment: {}",
                other
            ))),
        }
    }
}

/// Configuration for [`OnrampClient`](crate::OnrampClient).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Backend base URL.
    pub base_url: String,

    /// Static application credential for service-key endpoints.
    pub service_key: Option<Secret>,

    /// Environment marker sent on every call.
    pub environment: Environment,

    /// Idle timeout between reads of one call.
    pub request_timeout_secs: u64,

    /// Total timeout of one call.
    pub resource_timeout_secs: u64,

    /// Log request and response bodies at debug level.
    pub detailed_logging: bool,

    /// Overrides the default `OnrampSDK/<version>` user agent.
    pub user_agent: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            service_key: None,
            environment: Environment::default(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            resource_timeout_secs: DEFAULT_RESOURCE_TIMEOUT_SECS,
            detailed_logging: false,
            user_agent: None,
        }
    }
}

impl ClientConfig {
    /// Load configuration: defaults, then `path` (or the default config file
    /// when `None`), then environment variables.
    ///
    /// A missing file is not an error; an unreadable or invalid one is.
    #[cfg(feature = "config-file")]
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => Some(path.to_path_buf()),
            None => default_config_path(),
        };

        let config = match path {
            Some(path) if path.exists() => Self::from_file(&path)?,
            Some(path) => {
                tracing::debug!("No config file at {:?}, using defaults", path);
                Self::default()
            }
            None => Self::default(),
        };

        let config = config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML config file.
    #[cfg(feature = "config-file")]
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            OnrampError::Configuration(format!("failed to read config file {:?}: {}", path, e))
        })?;
        let config = Self::from_toml_str(&content).map_err(|e| match e {
            OnrampError::Configuration(msg) => {
                OnrampError::Configuration(format!("{} ({:?})", msg, path))
            }
            other => other,
        })?;
        tracing::debug!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Parse TOML configuration text.
    #[cfg(feature = "config-file")]
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| {
            OnrampError::Configuration(format!("failed to parse config file: {}", e))
        })
    }

    /// Overlay `ONRAMP_*` environment variables.
    pub fn apply_env(self) -> Self {
        self.apply_env_with(|key| std::env::var(key).ok())
    }

    /// Overlay variables from `lookup`, keyed by full variable name.
    ///
    /// Recognised: `ONRAMP_BASE_URL`, `ONRAMP_SERVICE_KEY`,
    /// `ONRAMP_ENVIRONMENT`, `ONRAMP_DETAILED_LOGGING`. Unparseable values are
    /// ignored with a warning.
    pub fn apply_env_with<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| {
            lookup(&format!("{}_{}", ENV_PREFIX, name)).filter(|v| !v.trim().is_empty())
        };

        if let Some(base_url) = var("BASE_URL") {
            self.base_url = base_url;
        }
        if let Some(key) = var("SERVICE_KEY") {
            self.service_key = Some(Secret::new(key));
        }
        if let Some(raw) = var("ENVIRONMENT") {
            match raw.parse() {
                Ok(environment) => self.environment = environment,
                Err(e) => tracing::warn!("Ignoring {}_ENVIRONMENT: {}", ENV_PREFIX, e),
            }
        }
        if let Some(raw) = var("DETAILED_LOGGING") {
            match raw.trim().to_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => self.detailed_logging = true,
                "0" | "false" | "no" | "off" => self.detailed_logging = false,
                other => tracing::warn!("Ignoring {}_DETAILED_LOGGING={}", ENV_PREFIX, other),
            }
        }
        self
    }

    /// Check the configuration is usable.
    pub fn validate(&self) -> Result<()> {
        self.parsed_base_url()?;
        if self.request_timeout_secs == 0 || self.resource_timeout_secs == 0 {
            return Err(OnrampError::Configuration(
                "timeouts must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// The base URL, parsed and normalized to end with `/`.
    pub fn parsed_base_url(&self) -> Result<Url> {
        let raw = if self.base_url.trim().is_empty() {
            DEFAULT_BASE_URL
        } else {
            self.base_url.trim()
        };

        let mut url = Url::parse(raw).map_err(|e| {
            OnrampError::Configuration(format!("invalid base URL {:?}: {}", raw, e))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(OnrampError::Configuration(format!(
                "base URL must be http or https, got {:?}",
                url.scheme()
            )));
        }
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }
        Ok(url)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn resource_timeout(&self) -> Duration {
        Duration::from_secs(self.resource_timeout_secs)
    }

    /// The user agent sent on every call.
    pub fn user_agent(&self) -> String {
        self.user_agent
            .clone()
            .unwrap_or_else(|| format!("OnrampSDK/{}", SDK_VERSION))
    }
}

/// Default config file location (`<config dir>/onramp/config.toml`).
#[cfg(feature = "config-file")]
pub fn default_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("dev", "onramp", "onramp")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.environment, Environment::Production);
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.resource_timeout(), Duration::from_secs(60));
        assert!(!config.detailed_logging);
        assert_eq!(config.user_agent(), format!("OnrampSDK/{}", SDK_VERSION));
    }

    #[test]
    fn test_base_url_normalization() {
        let config = ClientConfig {
            base_url: "http://localhost:8080/backend".to_string(),
            ..Default::default()
        };
        assert_eq!(config.parsed_base_url().unwrap().as_str(), "http://localhost:8080/backend/");

        let blank = ClientConfig {
            base_url: "  ".to_string(),
            ..Default::default()
        };
        assert_eq!(blank.parsed_base_url().unwrap().as_str(), "https://api.onramp.dev/");
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        let config = ClientConfig {
            base_url: "ftp://example.com".to_string(),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(OnrampError::Configuration(_))));

        let config = ClientConfig {
            base_url: "not a url".to_string(),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(OnrampError::Configuration(_))));
    }

    #[test]
    fn test_env_overlay() {
        let config = ClientConfig::default().apply_env_with(lookup(&[
            ("ONRAMP_BASE_URL", "http://127.0.0.1:9000"),
            ("ONRAMP_SERVICE_KEY", "sk_test"),
            ("ONRAMP_ENVIRONMENT", "dev"),
            ("ONRAMP_DETAILED_LOGGING", "true"),
        ]));

        assert_eq!(config.base_url, "http://127.0.0.1:9000");
        assert_eq!(config.service_key.as_ref().map(Secret::expose), Some("sk_test"));
        assert_eq!(config.environment, Environment::Development);
        assert!(config.detailed_logging);
    }

    #[test]
    fn test_env_overlay_ignores_garbage() {
        let config = ClientConfig::default().apply_env_with(lookup(&[
            ("ONRAMP_ENVIRONMENT", "staging"),
            ("ONRAMP_DETAILED_LOGGING", "maybe"),
            ("ONRAMP_BASE_URL", ""),
        ]));
        assert_eq!(config, ClientConfig::default());
    }

    #[cfg(feature = "config-file")]
    #[test]
    fn test_toml_parsing_with_defaults() {
        let config = ClientConfig::from_toml_str(
            r#"
            base_url = "https://staging.onramp.dev"
            environment = "development"
            service_key = "sk_staging"
            "#,
        )
        .unwrap();

        assert_eq!(config.base_url, "https://staging.onramp.dev");
        assert_eq!(config.environment, Environment::Development);
        assert_eq!(config.request_timeout_secs, 30);
        assert_eq!(config.service_key.unwrap().expose(), "sk_staging");
    }

    #[cfg(feature = "config-file")]
    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "base_url = \"http://localhost:3000\"\ndetailed_logging = true\n")
            .unwrap();

        let config = ClientConfig::from_file(&path).unwrap();
        assert_eq!(config.base_url, "http://localhost:3000");
        assert!(config.detailed_logging);
    }

    #[cfg(feature = "config-file")]
    #[test]
    fn test_invalid_file_is_configuration_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "base_url = [not toml").unwrap();

        assert!(matches!(
            ClientConfig::from_file(&path),
            Err(OnrampError::Configuration(_))
        ));
    }

    #[cfg(feature = "config-file")]
    #[test]
    fn test_missing_explicit_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = ClientConfig::load(Some(&dir.path().join("absent.toml"))).unwrap();
        assert_eq!(config.request_timeout_secs, 30);
    }
}
