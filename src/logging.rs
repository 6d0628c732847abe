//! # Structured Logging Module
//!
//! Environment-aware structured logging for job runs and the sling child
//! processes they drive.

use chrono::Utc;
use std::sync::OnceLock;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};
use uuid::Uuid;

use crate::config::EltConfig;
use crate::constants::env;

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Output format for the console layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl LogFormat {
    fn from_env() -> Self {
        std::env::var(env::LOG_FORMAT)
            .map(|value| Self::from_name(&value))
            .unwrap_or(Self::Pretty)
    }

    /// `json` selects JSON lines; anything else is pretty console output
    pub fn from_name(name: &str) -> Self {
        match name {
            "json" => Self::Json,
            _ => Self::Pretty,
        }
    }
}

/// Environment and format the subscriber is installed with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingSettings {
    pub environment: String,
    pub format: LogFormat,
}

impl LoggingSettings {
    /// Settings from `TASKER_ELT_ENV` and `TASKER_ELT_LOG_FORMAT`
    pub fn from_env() -> Self {
        Self {
            environment: get_environment(),
            format: LogFormat::from_env(),
        }
    }
}

impl From<&EltConfig> for LoggingSettings {
    fn from(config: &EltConfig) -> Self {
        Self {
            environment: config.environment.clone(),
            format: LogFormat::from_name(&config.log_format),
        }
    }
}

/// Initialize structured logging with environment-specific configuration
///
/// `RUST_LOG` takes precedence over the per-environment default level.
pub fn init_structured_logging() {
    init_with_settings(LoggingSettings::from_env());
}

/// Initialize structured logging from loaded configuration
///
/// The config's `environment` and `log_format` are applied as given; only the
/// first initialization in a process takes effect.
pub fn init_structured_logging_with(config: &EltConfig) {
    init_with_settings(LoggingSettings::from(config));
}

fn init_with_settings(settings: LoggingSettings) {
    LOGGER_INITIALIZED.get_or_init(|| {
        let LoggingSettings { environment, format } = settings;
        let log_level = get_log_level(&environment);

        let filter = || {
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level))
        };

        let layer = match format {
            LogFormat::Json => fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_ansi(false)
                .json()
                .with_filter(filter())
                .boxed(),
            LogFormat::Pretty => fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_level(true)
                .with_ansi(true)
                .with_filter(filter())
                .boxed(),
        };

        // A global subscriber may already be installed by the embedding application
        if tracing_subscriber::registry().with(layer).try_init().is_err() {
            tracing::debug!("Global tracing subscriber already initialized - continuing with existing subscriber");
        }

        tracing::info!(
            environment = %environment,
            format = ?format,
            "STRUCTURED LOGGING: Initialized"
        );
    });
}

/// Get current environment from environment variables
pub fn get_environment() -> String {
    std::env::var(env::ENVIRONMENT)
        .or_else(|_| std::env::var("APP_ENV"))
        .unwrap_or_else(|_| "development".to_string())
}

/// Get log level based on environment
fn get_log_level(environment: &str) -> &'static str {
    match environment {
        "test" => "debug",
        "development" => "debug",
        "production" => "info",
        _ => "debug",
    }
}

/// Log structured data for job-level operations
pub fn log_job_operation(
    operation: &str,
    job_name: &str,
    run_id: Uuid,
    status: &str,
    details: Option<&str>,
) {
    tracing::info!(
        operation = %operation,
        job = %job_name,
        run_id = %run_id,
        status = %status,
        details = details,
        timestamp = %Utc::now().to_rfc3339(),
        "JOB_OPERATION"
    );
}

/// Log structured data for asset step operations
pub fn log_asset_operation(
    operation: &str,
    step_key: &str,
    run_id: Uuid,
    status: &str,
    details: Option<&str>,
) {
    tracing::info!(
        operation = %operation,
        step = %step_key,
        run_id = %run_id,
        status = %status,
        details = details,
        timestamp = %Utc::now().to_rfc3339(),
        "ASSET_OPERATION"
    );
}

/// Log error with full context
pub fn log_error(component: &str, operation: &str, error: &str, context: Option<&str>) {
    tracing::error!(
        component = %component,
        operation = %operation,
        error = %error,
        context = context,
        timestamp = %Utc::now().to_rfc3339(),
        "ERROR"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_mapping() {
        assert_eq!(get_log_level("test"), "debug");
        assert_eq!(get_log_level("development"), "debug");
        assert_eq!(get_log_level("production"), "info");
        assert_eq!(get_log_level("unknown"), "debug");
    }

    #[test]
    fn test_settings_from_config() {
        let config = EltConfig {
            environment: "production".to_string(),
            log_format: "json".to_string(),
            ..EltConfig::default()
        };

        let settings = LoggingSettings::from(&config);

        assert_eq!(settings.format, LogFormat::Json);
        assert_eq!(settings.environment, "production");
        assert_eq!(get_log_level(&settings.environment), "info");
    }

    #[test]
    fn test_log_format_names() {
        assert_eq!(LogFormat::from_name("json"), LogFormat::Json);
        assert_eq!(LogFormat::from_name("pretty"), LogFormat::Pretty);
    }

    #[test]
    fn test_init_is_idempotent() {
        init_structured_logging();
        init_structured_logging();
        log_job_operation("execute", "sling_job", Uuid::nil(), "started", None);
    }
}
