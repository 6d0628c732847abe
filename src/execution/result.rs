use std::collections::BTreeMap;
use std::time::Duration;
use uuid::Uuid;

use super::events::{RunEvent, RunEventType};
use super::states::{RunStatus, StepState};
use crate::assets::{AssetCheckResult, AssetKey, MaterializeResult};

/// Outcome of [`JobDefinition::execute_in_process`](crate::job::JobDefinition::execute_in_process)
#[derive(Debug, Clone)]
pub struct ExecuteInProcessResult {
    pub(crate) run_id: Uuid,
    pub(crate) job_name: String,
    pub(crate) status: RunStatus,
    pub(crate) events: Vec<RunEvent>,
    pub(crate) step_states: BTreeMap<AssetKey, StepState>,
    pub(crate) duration: Duration,
}

impl ExecuteInProcessResult {
    /// Whether the run finished and every step succeeded
    pub fn success(&self) -> bool {
        self.status.is_success()
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn job_name(&self) -> &str {
        &self.job_name
    }

    pub fn status(&self) -> RunStatus {
        self.status
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn all_events(&self) -> &[RunEvent] {
        &self.events
    }

    pub fn events_for_step<'a>(&'a self, step_key: &'a str) -> impl Iterator<Item = &'a RunEvent> {
        self.events
            .iter()
            .filter(move |event| event.step_key.as_deref() == Some(step_key))
    }

    pub fn asset_materializations(&self) -> Vec<&MaterializeResult> {
        self.events
            .iter()
            .filter_map(|event| match &event.event_type {
                RunEventType::AssetMaterialization { materialization } => Some(materialization),
                _ => None,
            })
            .collect()
    }

    pub fn materialization_for(&self, key: &AssetKey) -> Option<&MaterializeResult> {
        self.asset_materializations()
            .into_iter()
            .find(|materialization| materialization.asset_key.as_ref() == Some(key))
    }

    pub fn asset_check_evaluations(&self) -> Vec<&AssetCheckResult> {
        self.events
            .iter()
            .filter_map(|event| match &event.event_type {
                RunEventType::AssetCheckEvaluation { check } => Some(check),
                _ => None,
            })
            .collect()
    }

    pub fn step_state(&self, key: &AssetKey) -> Option<StepState> {
        self.step_states.get(key).copied()
    }

    /// Error message of the first failed step, if any
    pub fn failure_message(&self) -> Option<&str> {
        self.events.iter().find_map(|event| match &event.event_type {
            RunEventType::StepFailure { error } => Some(error.as_str()),
            _ => None,
        })
    }

    /// Captured log lines for a step, in order
    pub fn logs_for_step<'a>(&'a self, step_key: &'a str) -> Vec<&'a str> {
        self.events_for_step(step_key)
            .filter(|event| matches!(event.event_type, RunEventType::LogMessage { .. }))
            .map(|event| event.message.as_str())
            .collect()
    }
}
