//! Configuration management for bank-link.

use crate::{CoreError, CoreResult, Paths};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use url::Url;

/// Default backend API URL (can be overridden at compile time via BANK_LINK_API_URL env var).
pub const DEFAULT_API_URL: &str = match option_env!("BANK_LINK_API_URL") {
    Some(url) => url,
    None => "https://api.bank-link.dev",
};

/// Default publishable key (can be overridden at compile time via BANK_LINK_PUBLISHABLE_KEY env var).
pub const DEFAULT_PUBLISHABLE_KEY: &str = match option_env!("BANK_LINK_PUBLISHABLE_KEY") {
    Some(key) => key,
    None => "pk_test_placeholder",
};

/// Default return target handed to the backend when bootstrapping a session.
///
/// Points at the loopback listener so a CLI host can observe the redirect.
pub const DEFAULT_RETURN_URL: &str = "http://127.0.0.1:9876/link/return";

/// Default upper bound on how long the browser flow may take.
pub const DEFAULT_AUTH_TIMEOUT_SECS: u64 = 600;

/// Longest browser flow a config may ask for (one day).
pub const MAX_AUTH_TIMEOUT_SECS: u64 = 24 * 60 * 60;

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Main bank-link configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Backend API base URL.
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// Publishable API key (public, safe to expose).
    #[serde(default = "default_publishable_key")]
    pub publishable_key: String,
    /// Return target forwarded to the backend as `app_return_url`.
    #[serde(default = "default_return_url")]
    pub return_url: String,
    /// Browser flow timeout in seconds.
    #[serde(default = "default_auth_timeout_secs")]
    pub auth_timeout_secs: u64,
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_publishable_key() -> String {
    DEFAULT_PUBLISHABLE_KEY.to_string()
}

fn default_return_url() -> String {
    DEFAULT_RETURN_URL.to_string()
}

fn default_auth_timeout_secs() -> u64 {
    DEFAULT_AUTH_TIMEOUT_SECS
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            api_url: default_api_url(),
            publishable_key: default_publishable_key(),
            return_url: default_return_url(),
            auth_timeout_secs: DEFAULT_AUTH_TIMEOUT_SECS,
        }
    }
}

impl Config {
    /// Create a new Config with default values, then override from environment.
    pub fn new() -> Self {
        let mut config = Self::default();
        config.load_from_env();
        config
    }

    /// Load configuration from the config file, falling back to defaults,
    /// then apply environment overrides.
    pub fn load(paths: &Paths) -> CoreResult<Self> {
        let config_path = paths.config_file();

        let mut config = if config_path.exists() {
            Self::load_from_file(&config_path)?
        } else {
            Self::default()
        };

        config.load_from_env();
        config.validate()?;

        Ok(config)
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &Path) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| CoreError::io(path, e))?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Save configuration to a file.
    pub fn save(&self, paths: &Paths) -> CoreResult<()> {
        paths.ensure_dirs()?;
        let content = serde_json::to_string_pretty(self)?;
        let config_path = paths.config_file();
        std::fs::write(&config_path, content).map_err(|e| CoreError::io(config_path, e))
    }

    /// Override configuration from environment variables.
    fn load_from_env(&mut self) {
        if let Some(log_level) = non_empty_env("BANK_LINK_LOG_LEVEL") {
            self.log_level = log_level;
        }
        if let Some(return_url) = non_empty_env("BANK_LINK_RETURN_URL") {
            self.return_url = return_url;
        }
        if let Some(secs) =
            non_empty_env("BANK_LINK_AUTH_TIMEOUT_SECS").and_then(|raw| raw.parse::<u64>().ok())
        {
            self.auth_timeout_secs = secs;
        }
    }

    /// Reject values the linking flow cannot run with.
    pub fn validate(&self) -> CoreResult<()> {
        self.api_url()?;
        self.return_url()?;
        if self.publishable_key.trim().is_empty() {
            return Err(CoreError::Config {
                field: "publishable_key",
                reason: "must not be empty".to_string(),
            });
        }
        if self.auth_timeout_secs == 0 {
            return Err(CoreError::Config {
                field: "auth_timeout_secs",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.auth_timeout_secs > MAX_AUTH_TIMEOUT_SECS {
            return Err(CoreError::Config {
                field: "auth_timeout_secs",
                reason: format!("must be at most {}", MAX_AUTH_TIMEOUT_SECS),
            });
        }
        Ok(())
    }

    /// Get the API URL as a parsed URL.
    pub fn api_url(&self) -> CoreResult<Url> {
        Url::parse(&self.api_url).map_err(|source| CoreError::InvalidUrl {
            field: "api_url",
            source,
        })
    }

    /// Get the return target as a parsed URL.
    pub fn return_url(&self) -> CoreResult<Url> {
        Url::parse(&self.return_url).map_err(|source| CoreError::InvalidUrl {
            field: "return_url",
            source,
        })
    }

    /// Browser flow timeout.
    pub fn auth_timeout(&self) -> Duration {
        Duration::from_secs(self.auth_timeout_secs)
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|raw| raw.trim().to_string())
        .filter(|value| !value.is_empty())
}
