//! # Configuration
//!
//! Runtime settings for job execution and the sling executable, plus the
//! declarative YAML job format.
//!
//! Settings resolve in three layers: built-in defaults, an optional YAML file,
//! and `TASKER_ELT__`-prefixed environment variables (see [`loader`]).
//! [`EltConfig::from_env`] is the lighter path used when no file is involved.

pub mod declarative;
pub mod loader;

pub use declarative::{SlingAssetConfig, SlingJobSpec, SlingResourceConfig};
pub use loader::ConfigLoader;

use serde::{Deserialize, Serialize};

use crate::constants::env;
use crate::error::{EltError, Result};

/// How the sling executable is located and bounded
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlingSettings {
    pub executable: String,
    pub timeout_seconds: u64,
}

impl Default for SlingSettings {
    fn default() -> Self {
        Self {
            executable: "sling".to_string(),
            timeout_seconds: 3600,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventSettings {
    /// Capacity of the run event broadcast channel
    pub channel_capacity: usize,
}

impl Default for EventSettings {
    fn default() -> Self {
        Self {
            channel_capacity: 1000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EltConfig {
    pub environment: String,
    pub sling: SlingSettings,
    pub events: EventSettings,
    /// `pretty` or `json`
    pub log_format: String,
}

impl Default for EltConfig {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            sling: SlingSettings::default(),
            events: EventSettings::default(),
            log_format: "pretty".to_string(),
        }
    }
}

impl EltConfig {
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(environment) = std::env::var(env::ENVIRONMENT) {
            config.environment = environment;
        }

        if let Ok(executable) = std::env::var(env::SLING_EXECUTABLE) {
            config.sling.executable = executable;
        }

        if let Ok(timeout) = std::env::var(env::SLING_TIMEOUT_SECONDS) {
            config.sling.timeout_seconds = timeout.parse().map_err(|e| {
                EltError::configuration(format!("Invalid sling timeout_seconds: {e}"))
            })?;
        }

        if let Ok(capacity) = std::env::var(env::EVENT_CHANNEL_CAPACITY) {
            config.events.channel_capacity = capacity.parse().map_err(|e| {
                EltError::configuration(format!("Invalid events channel_capacity: {e}"))
            })?;
        }

        if let Ok(format) = std::env::var(env::LOG_FORMAT) {
            config.log_format = format;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.sling.executable.trim().is_empty() {
            return Err(EltError::configuration("sling.executable must not be empty"));
        }
        if self.sling.timeout_seconds == 0 {
            return Err(EltError::configuration(
                "sling.timeout_seconds must be greater than zero",
            ));
        }
        if self.events.channel_capacity == 0 {
            return Err(EltError::configuration(
                "events.channel_capacity must be greater than zero",
            ));
        }
        if !matches!(self.log_format.as_str(), "pretty" | "json") {
            return Err(EltError::configuration(format!(
                "log_format must be 'pretty' or 'json', got '{}'",
                self.log_format
            )));
        }
        Ok(())
    }
}
