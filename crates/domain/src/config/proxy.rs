use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use super::errors::ConfigError;
use super::resolv_conf::{self, DEFAULT_RESOLV_CONF};

pub const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:53";

/// Applied to unset (zero) read and write timeouts.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(1);

/// Forwarding proxy configuration.
///
/// Assembled once at startup, defaulted with [`ProxyConfig::apply_defaults`]
/// and shared read-only afterwards. The order of `nameservers` is the
/// failover priority.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ProxyConfig {
    /// Address the listener binds, as `host:port`
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Upstream read timeout; written as milliseconds, zero means unset
    #[serde(default, rename = "read_timeout_ms", with = "duration_ms")]
    pub read_timeout: Duration,

    /// Upstream write timeout; written as milliseconds, zero means unset
    #[serde(default, rename = "write_timeout_ms", with = "duration_ms")]
    pub write_timeout: Duration,

    /// Upstream nameservers as `host:port`, tried in order
    #[serde(default)]
    pub nameservers: Vec<String>,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            read_timeout: Duration::ZERO,
            write_timeout: Duration::ZERO,
            nameservers: Vec::new(),
        }
    }
}

impl ProxyConfig {
    /// Fills unset timeouts and, when no nameserver was configured, loads the
    /// host's default resolver list from `/etc/resolv.conf`.
    pub fn apply_defaults(&mut self) -> Result<(), ConfigError> {
        self.apply_defaults_from(Path::new(DEFAULT_RESOLV_CONF))
    }

    /// Same as [`ProxyConfig::apply_defaults`] with an explicit resolver file.
    ///
    /// A missing resolver file leaves the nameserver list empty. Any other
    /// read or parse failure is returned.
    pub fn apply_defaults_from(&mut self, resolv_conf: &Path) -> Result<(), ConfigError> {
        if self.read_timeout.is_zero() {
            self.read_timeout = DEFAULT_TIMEOUT;
        }
        if self.write_timeout.is_zero() {
            self.write_timeout = DEFAULT_TIMEOUT;
        }
        if self.nameservers.is_empty() {
            if let Some(servers) = resolv_conf::read_nameservers(resolv_conf)? {
                self.nameservers = servers;
            }
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !is_host_port(&self.bind_address) {
            return Err(ConfigError::Validation(format!(
                "Invalid bind address '{}' (expected host:port)",
                self.bind_address
            )));
        }

        for nameserver in &self.nameservers {
            if !is_host_port(nameserver) {
                return Err(ConfigError::Validation(format!(
                    "Invalid nameserver '{}' (expected host:port)",
                    nameserver
                )));
            }
        }

        Ok(())
    }
}

/// Splits a comma separated nameserver list, dropping blank items.
pub fn parse_nameserver_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// `host:port` with a numeric port; IPv6 hosts must be bracketed.
fn is_host_port(value: &str) -> bool {
    let Some((host, port)) = value.rsplit_once(':') else {
        return false;
    };
    if host.is_empty() || port.parse::<u16>().is_err() {
        return false;
    }
    match host.strip_prefix('[') {
        Some(inner) => inner.ends_with(']') && inner.len() > 1,
        None => !host.contains(':'),
    }
}

fn default_bind_address() -> String {
    DEFAULT_BIND_ADDRESS.to_string()
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
