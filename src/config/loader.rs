//! Configuration Loader
//!
//! Layers built-in defaults, an optional YAML file and prefixed environment
//! variables into an [`EltConfig`] using the `config` crate.

use config::{Config, Environment, File, FileFormat};
use std::path::{Path, PathBuf};
use tracing::debug;

use super::EltConfig;
use crate::constants::env;
use crate::error::{EltError, Result};

#[derive(Debug, Clone)]
pub struct ConfigLoader {
    file: Option<PathBuf>,
    env_prefix: String,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self {
            file: None,
            env_prefix: env::CONFIG_PREFIX.to_string(),
        }
    }
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// YAML file layered over the defaults; it must exist when set
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file = Some(path.into());
        self
    }

    /// Prefix for overrides such as `<PREFIX>__SLING__EXECUTABLE`
    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    pub fn load(&self) -> Result<EltConfig> {
        let mut builder = Config::builder().add_source(Config::try_from(&EltConfig::default())?);

        if let Some(path) = &self.file {
            ensure_file(path)?;
            debug!(path = %path.display(), "Loading configuration file");
            builder = builder.add_source(File::from(path.as_path()).format(FileFormat::Yaml).required(true));
        }

        builder = builder.add_source(
            Environment::with_prefix(&self.env_prefix)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config: EltConfig = builder.build()?.try_deserialize()?;
        config.validate()?;

        debug!(
            environment = %config.environment,
            sling_executable = %config.sling.executable,
            sling_timeout_seconds = config.sling.timeout_seconds,
            "Configuration loaded successfully"
        );
        Ok(config)
    }
}

impl EltConfig {
    /// Defaults, then `path`, then `TASKER_ELT__*` environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let loader = ConfigLoader::new();
        match path {
            Some(path) => loader.with_file(path).load(),
            None => loader.load(),
        }
    }
}

fn ensure_file(path: &Path) -> Result<()> {
    let metadata = std::fs::metadata(path).map_err(|e| {
        EltError::configuration(format!(
            "Cannot read configuration file {}: {e}",
            path.display()
        ))
    })?;
    if !metadata.is_file() {
        return Err(EltError::configuration(format!(
            "Configuration path {} must point to a regular file",
            path.display()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_without_file() {
        let config = ConfigLoader::new()
            .with_env_prefix("TASKER_ELT_LOADER_DEFAULTS_TEST")
            .load()
            .unwrap();
        assert_eq!(config, EltConfig::default());
    }

    #[test]
    fn test_yaml_file_overrides_defaults() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(
            file,
            "environment: test\nsling:\n  executable: /opt/sling/bin/sling\n  timeout_seconds: 120\n"
        )
        .unwrap();

        let config = ConfigLoader::new()
            .with_file(file.path())
            .with_env_prefix("TASKER_ELT_LOADER_FILE_TEST")
            .load()
            .unwrap();

        assert_eq!(config.environment, "test");
        assert_eq!(config.sling.executable, "/opt/sling/bin/sling");
        assert_eq!(config.sling.timeout_seconds, 120);
        assert_eq!(config.events.channel_capacity, 1000);
    }

    #[test]
    fn test_environment_overrides_defaults() {
        std::env::set_var("TASKER_ELT_LOADER_ENV_TEST__SLING__TIMEOUT_SECONDS", "45");
        let config = ConfigLoader::new()
            .with_env_prefix("TASKER_ELT_LOADER_ENV_TEST")
            .load()
            .unwrap();
        std::env::remove_var("TASKER_ELT_LOADER_ENV_TEST__SLING__TIMEOUT_SECONDS");

        assert_eq!(config.sling.timeout_seconds, 45);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let err = ConfigLoader::new()
            .with_file("/nonexistent/tasker-elt.yaml")
            .load()
            .unwrap_err();
        assert!(matches!(err, EltError::Configuration(_)));
    }
}
