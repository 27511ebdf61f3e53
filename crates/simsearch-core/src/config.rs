//! Application configuration.
//!
//! Configuration is read from `~/.config/simsearch/config.json` (platform
//! equivalent via `dirs`) and then overridden by `SORACOM_*` environment
//! variables. It is never written back: the only session state is the
//! in-memory `Credentials`.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::api::ClientOptions;
use crate::auth::{Coverage, Endpoints};

/// Application name used for config/cache directory paths
pub const APP_NAME: &str = "simsearch";

/// Config file name
const CONFIG_FILE: &str = "config.json";

pub const ENV_COVERAGE: &str = "SORACOM_COVERAGE";
pub const ENV_AUTH_KEY_ID: &str = "SORACOM_AUTH_KEY_ID";
pub const ENV_AUTH_KEY: &str = "SORACOM_AUTH_KEY";
pub const ENV_ENDPOINT_GLOBAL: &str = "SORACOM_ENDPOINT_GLOBAL";
pub const ENV_ENDPOINT_JAPAN: &str = "SORACOM_ENDPOINT_JAPAN";

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    /// Default coverage selector for the login form ("g" or "jp")
    pub coverage: Option<String>,
    /// Auth key id to prefill. The secret is never part of the config.
    pub auth_key_id: Option<String>,
    pub global_endpoint: Option<String>,
    pub japan_endpoint: Option<String>,
    pub max_pages: Option<usize>,
    pub request_timeout_secs: Option<u64>,
}

impl Config {
    /// Load the config file (defaults if missing) and apply env overrides.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_file()?;
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    fn load_file() -> Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            let config = serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse config file {}", path.display()))?;
            debug!(path = %path.display(), "Config loaded");
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Override fields from environment lookups. Empty values are ignored.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get(ENV_COVERAGE) {
            self.coverage = Some(v);
        }
        if let Some(v) = get(ENV_AUTH_KEY_ID) {
            self.auth_key_id = Some(v);
        }
        if let Some(v) = get(ENV_ENDPOINT_GLOBAL) {
            self.global_endpoint = Some(v);
        }
        if let Some(v) = get(ENV_ENDPOINT_JAPAN) {
            self.japan_endpoint = Some(v);
        }
    }

    pub fn default_coverage(&self) -> Coverage {
        self.coverage
            .as_deref()
            .map(Coverage::from_selector)
            .unwrap_or_default()
    }

    pub fn endpoints(&self) -> Endpoints {
        let defaults = Endpoints::default();
        Endpoints::new(
            self.global_endpoint.clone().unwrap_or(defaults.global),
            self.japan_endpoint.clone().unwrap_or(defaults.japan),
        )
    }

    pub fn client_options(&self) -> ClientOptions {
        let defaults = ClientOptions::default();
        ClientOptions {
            endpoints: self.endpoints(),
            timeout: self
                .request_timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
            max_pages: self.max_pages.unwrap_or(defaults.max_pages),
        }
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Directory for log files
    pub fn log_dir() -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.default_coverage(), Coverage::Global);
        assert_eq!(config.endpoints(), Endpoints::default());

        let options = config.client_options();
        assert_eq!(options.max_pages, crate::api::DEFAULT_MAX_PAGES);
        assert_eq!(options.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_parse_config_file() {
        let json = r#"{"coverage": "jp", "auth_key_id": "keyId-abc", "max_pages": 5, "request_timeout_secs": 10}"#;
        let config: Config = serde_json::from_str(json).expect("Failed to parse config JSON");
        assert_eq!(config.default_coverage(), Coverage::Japan);
        assert_eq!(config.auth_key_id.as_deref(), Some("keyId-abc"));

        let options = config.client_options();
        assert_eq!(options.max_pages, 5);
        assert_eq!(options.timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config {
            coverage: Some("g".to_string()),
            auth_key_id: Some("from-file".to_string()),
            ..Config::default()
        };
        config.apply_env(lookup(&[
            (ENV_COVERAGE, "jp"),
            (ENV_AUTH_KEY_ID, "from-env"),
            (ENV_ENDPOINT_GLOBAL, "http://localhost:9000/g/"),
        ]));

        assert_eq!(config.default_coverage(), Coverage::Japan);
        assert_eq!(config.auth_key_id.as_deref(), Some("from-env"));

        let endpoints = config.endpoints();
        assert_eq!(endpoints.global, "http://localhost:9000/g");
        assert_eq!(endpoints.japan, "https://api.soracom.io/v1");
    }

    #[test]
    fn test_empty_env_values_ignored() {
        let mut config = Config {
            auth_key_id: Some("from-file".to_string()),
            ..Config::default()
        };
        config.apply_env(lookup(&[(ENV_AUTH_KEY_ID, "  ")]));
        assert_eq!(config.auth_key_id.as_deref(), Some("from-file"));
    }
}
