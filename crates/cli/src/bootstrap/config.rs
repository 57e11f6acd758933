use dns_retry_domain::{CliOverrides, Config};

/// Loads, defaults and validates the configuration. Runs before logging is
/// initialized, so failures are reported through the returned error only.
pub fn load_config(path: Option<&str>, overrides: CliOverrides) -> anyhow::Result<Config> {
    let mut config = Config::load(path, overrides)?;
    config.proxy.apply_defaults()?;
    config.validate()?;
    Ok(config)
}
