use std::collections::BTreeMap;
use std::sync::Arc;
use uuid::Uuid;

use super::events::{EventLog, LogLevel, RunEventType};
use crate::assets::AssetKey;
use crate::error::{EltError, Result};
use crate::resources::{Resource, ResourceDefinitions};

/// Everything an asset computation can see while it runs
#[derive(Debug, Clone)]
pub struct AssetExecutionContext {
    step_key: String,
    asset_keys: Vec<AssetKey>,
    resources: Arc<ResourceDefinitions>,
    log: EventLog,
    tags: Arc<BTreeMap<String, String>>,
}

impl AssetExecutionContext {
    pub(crate) fn new(
        step_key: impl Into<String>,
        asset_keys: Vec<AssetKey>,
        resources: Arc<ResourceDefinitions>,
        log: EventLog,
        tags: Arc<BTreeMap<String, String>>,
    ) -> Self {
        Self {
            step_key: step_key.into(),
            asset_keys,
            resources,
            log,
            tags,
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.log.run_id()
    }

    pub fn job_name(&self) -> &str {
        self.log.job_name()
    }

    pub fn step_key(&self) -> &str {
        &self.step_key
    }

    pub fn asset_keys(&self) -> &[AssetKey] {
        &self.asset_keys
    }

    /// The single asset being materialized; errors for multi-asset steps
    pub fn asset_key(&self) -> Result<&AssetKey> {
        match self.asset_keys.as_slice() {
            [key] => Ok(key),
            keys => Err(EltError::validation(format!(
                "Step '{}' materializes {} assets; use asset_keys() instead",
                self.step_key,
                keys.len()
            ))),
        }
    }

    pub fn resource<R: Resource>(&self, key: &str) -> Result<Arc<R>> {
        self.resources.get::<R>(key)
    }

    pub fn tags(&self) -> &BTreeMap<String, String> {
        &self.tags
    }

    /// Record a message in the run's event log and mirror it to tracing
    pub fn log(&self, level: LogLevel, message: impl Into<String>) {
        let message = message.into();
        match level {
            LogLevel::Debug => tracing::debug!(run_id = %self.run_id(), step = %self.step_key, "{message}"),
            LogLevel::Info => tracing::info!(run_id = %self.run_id(), step = %self.step_key, "{message}"),
            LogLevel::Warn => tracing::warn!(run_id = %self.run_id(), step = %self.step_key, "{message}"),
            LogLevel::Error => tracing::error!(run_id = %self.run_id(), step = %self.step_key, "{message}"),
        }
        self.log.record(
            Some(&self.step_key),
            RunEventType::LogMessage { level },
            message,
        );
    }

    pub fn info(&self, message: impl Into<String>) {
        self.log(LogLevel::Info, message);
    }

    pub fn warn(&self, message: impl Into<String>) {
        self.log(LogLevel::Warn, message);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.log(LogLevel::Error, message);
    }
}
