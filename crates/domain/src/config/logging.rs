use serde::{Deserialize, Serialize};

use super::errors::ConfigError;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl LoggingConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let level = self.level.to_ascii_lowercase();
        if LOG_LEVELS.contains(&level.as_str()) {
            Ok(())
        } else {
            Err(ConfigError::Validation(format!(
                "Unknown log level '{}' (expected one of {})",
                self.level,
                LOG_LEVELS.join(", ")
            )))
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}
