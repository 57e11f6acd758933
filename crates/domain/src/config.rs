pub mod errors;
pub mod logging;
pub mod proxy;
pub mod resolv_conf;
pub mod root;

pub use errors::ConfigError;
pub use logging::LoggingConfig;
pub use proxy::{parse_nameserver_list, ProxyConfig, DEFAULT_BIND_ADDRESS, DEFAULT_TIMEOUT};
pub use root::{CliOverrides, Config};
