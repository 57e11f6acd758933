//! dns-retry domain layer
pub mod config;
pub mod errors;
pub mod transport;

pub use config::{parse_nameserver_list, CliOverrides, Config, ConfigError, LoggingConfig, ProxyConfig};
pub use errors::DomainError;
pub use transport::Transport;
