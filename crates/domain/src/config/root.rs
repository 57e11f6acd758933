use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use super::errors::ConfigError;
use super::logging::LoggingConfig;
use super::proxy::ProxyConfig;

const LOCAL_CONFIG_PATH: &str = "dns-retry.toml";
const SYSTEM_CONFIG_PATH: &str = "/etc/dns-retry/config.toml";

/// Main configuration structure for dns-retry
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    /// Listener address, upstream timeouts and nameservers
    #[serde(default)]
    pub proxy: ProxyConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from file or use defaults
    ///
    /// Priority order:
    /// 1. Explicitly provided path
    /// 2. dns-retry.toml in current directory
    /// 3. /etc/dns-retry/config.toml
    /// 4. Default configuration
    ///
    /// Command-line overrides are applied on top. Defaulting against the host
    /// resolver file is left to [`ProxyConfig::apply_defaults`].
    pub fn load(path: Option<&str>, cli_overrides: CliOverrides) -> Result<Self, ConfigError> {
        let mut config = match path.or_else(|| Self::get_config_path()) {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };

        config.apply_cli_overrides(cli_overrides);
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::FileRead(path.to_string(), e.to_string()))?;
        toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    fn apply_cli_overrides(&mut self, overrides: CliOverrides) {
        if let Some(bind) = overrides.bind_address {
            self.proxy.bind_address = bind;
        }
        if let Some(nameservers) = overrides.nameservers.filter(|n| !n.is_empty()) {
            self.proxy.nameservers = nameservers;
        }
        if let Some(timeout) = overrides.read_timeout {
            self.proxy.read_timeout = timeout;
        }
        if let Some(timeout) = overrides.write_timeout {
            self.proxy.write_timeout = timeout;
        }
        if let Some(level) = overrides.log_level {
            self.logging.level = level;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.proxy.validate()?;
        self.logging.validate()
    }

    /// Get the path to the configuration file that would be loaded by default
    pub fn get_config_path() -> Option<&'static str> {
        [LOCAL_CONFIG_PATH, SYSTEM_CONFIG_PATH]
            .into_iter()
            .find(|p| Path::new(p).exists())
    }
}

/// Command-line overrides for configuration
#[derive(Debug, Default)]
pub struct CliOverrides {
    pub bind_address: Option<String>,
    pub nameservers: Option<Vec<String>>,
    pub read_timeout: Option<Duration>,
    pub write_timeout: Option<Duration>,
    pub log_level: Option<String>,
}
