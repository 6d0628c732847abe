use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::JobDefinition;
use crate::assets::{AssetKey, AssetsDefinition, MaterializeResult};
use crate::error::{EltError, Result};
use crate::execution::{
    AssetExecutionContext, EventLog, ExecuteInProcessResult, RunEventType, RunStatus, StepState,
};
use crate::logging::{log_asset_operation, log_error, log_job_operation};

/// Per-run execution options
#[derive(Debug, Clone)]
pub struct ExecuteOptions {
    /// Return the first step failure as an error instead of a failed result
    pub raise_on_error: bool,
    /// Tags made visible to every asset context
    pub tags: BTreeMap<String, String>,
}

impl Default for ExecuteOptions {
    fn default() -> Self {
        Self {
            raise_on_error: true,
            tags: BTreeMap::new(),
        }
    }
}

impl ExecuteOptions {
    pub fn raise_on_error(mut self, raise: bool) -> Self {
        self.raise_on_error = raise;
        self
    }

    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }
}

struct StepFailure {
    asset_key: AssetKey,
    message: String,
}

#[instrument(skip_all, fields(job = %job.name))]
pub(super) async fn execute(
    job: &JobDefinition,
    options: ExecuteOptions,
) -> Result<ExecuteInProcessResult> {
    let run_id = Uuid::new_v4();
    let started = Instant::now();
    let log = EventLog::new(run_id, job.name.clone(), job.publisher.clone());
    let tags = Arc::new(options.tags);
    let graph = &job.graph;

    let mut status = RunStatus::NotStarted;
    transition(&mut status, RunStatus::Started);
    log.record(
        None,
        RunEventType::RunStart,
        format!("Started execution of run for \"{}\"", job.name),
    );
    log_job_operation("execute", &job.name, run_id, &status.to_string(), None);

    let mut step_states: BTreeMap<AssetKey, StepState> = graph
        .asset_keys()
        .into_iter()
        .map(|key| (key.clone(), StepState::Pending))
        .collect();
    let mut definition_states = vec![StepState::Pending; graph.ordered_indices().len()];
    let mut first_failure: Option<StepFailure> = None;

    for &index in graph.ordered_indices() {
        let definition = graph.definition(index);
        let step_key = definition.name().to_string();

        let blocked = graph
            .upstream_of(index)
            .iter()
            .any(|&up| !definition_states[up].satisfies_dependencies());
        if blocked {
            definition_states[index] = StepState::Skipped;
            set_states(&mut step_states, definition, StepState::Skipped);
            log.record(
                Some(&step_key),
                RunEventType::StepSkipped {
                    reason: "upstream step did not complete".to_string(),
                },
                format!("Skipping step \"{step_key}\" because an upstream step did not complete"),
            );
            log_asset_operation("skip", &step_key, run_id, "skipped", None);
            continue;
        }

        definition_states[index] = StepState::InProgress;
        set_states(&mut step_states, definition, StepState::InProgress);
        log.record(
            Some(&step_key),
            RunEventType::StepStart,
            format!("Started execution of step \"{step_key}\""),
        );

        let context = AssetExecutionContext::new(
            step_key.clone(),
            definition.keys().cloned().collect(),
            Arc::clone(&job.resources),
            log.clone(),
            Arc::clone(&tags),
        );

        let step_started = Instant::now();
        let outcome = match definition.compute().execute(&context).await {
            Ok(results) => normalize_results(definition, results),
            Err(err) => Err(err),
        };
        let duration_ms = step_started.elapsed().as_millis() as u64;

        match outcome {
            Ok(materializations) => {
                for materialization in materializations {
                    record_materialization(&log, &step_key, materialization);
                }
                definition_states[index] = StepState::Complete;
                set_states(&mut step_states, definition, StepState::Complete);
                log.record(
                    Some(&step_key),
                    RunEventType::StepSuccess { duration_ms },
                    format!("Finished execution of step \"{step_key}\" in {duration_ms}ms"),
                );
                log_asset_operation("materialize", &step_key, run_id, "complete", None);
            }
            Err(err) => {
                let message = err.to_string();
                definition_states[index] = StepState::Failed;
                set_states(&mut step_states, definition, StepState::Failed);
                log.record(
                    Some(&step_key),
                    RunEventType::StepFailure {
                        error: message.clone(),
                    },
                    format!("Execution of step \"{step_key}\" failed"),
                );
                log_error("job_executor", "materialize", &message, Some(&step_key));
                if first_failure.is_none() {
                    first_failure = Some(StepFailure {
                        asset_key: definition
                            .keys()
                            .next()
                            .cloned()
                            .unwrap_or_else(|| AssetKey::from(step_key.as_str())),
                        message,
                    });
                }
            }
        }
    }

    match &first_failure {
        None => {
            transition(&mut status, RunStatus::Success);
            log.record(
                None,
                RunEventType::RunSuccess,
                format!("Finished execution of run for \"{}\"", job.name),
            );
        }
        Some(failure) => {
            transition(&mut status, RunStatus::Failure);
            log.record(
                None,
                RunEventType::RunFailure {
                    error: failure.message.clone(),
                },
                format!("Execution of run for \"{}\" failed", job.name),
            );
        }
    }

    let duration = started.elapsed();
    log_job_operation(
        "execute",
        &job.name,
        run_id,
        &status.to_string(),
        Some(&format!("{}ms", duration.as_millis())),
    );

    let result = ExecuteInProcessResult {
        run_id,
        job_name: job.name.clone(),
        status,
        events: log.snapshot(),
        step_states,
        duration,
    };

    match first_failure {
        Some(failure) if options.raise_on_error => Err(EltError::StepFailed {
            job_name: job.name.clone(),
            asset_key: failure.asset_key,
            message: failure.message,
        }),
        _ => Ok(result),
    }
}

fn transition(status: &mut RunStatus, next: RunStatus) {
    if !status.can_transition_to(next) {
        warn!(from = %status, to = %next, "Unexpected run status transition");
    }
    *status = next;
}

fn set_states(
    states: &mut BTreeMap<AssetKey, StepState>,
    definition: &AssetsDefinition,
    state: StepState,
) {
    for key in definition.keys() {
        states.insert(key.clone(), state);
    }
}

/// Attribute unkeyed results, reject foreign keys, and add implicit materializations
fn normalize_results(
    definition: &AssetsDefinition,
    results: Vec<MaterializeResult>,
) -> Result<Vec<MaterializeResult>> {
    let keys: Vec<&AssetKey> = definition.keys().collect();
    let mut normalized: Vec<MaterializeResult> = Vec::with_capacity(keys.len());

    for mut result in results {
        let key = match (&result.asset_key, keys.as_slice()) {
            (Some(key), _) => key.clone(),
            (None, [only]) => (*only).clone(),
            (None, _) => {
                return Err(EltError::validation(format!(
                    "Step '{}' produces multiple assets; materialize results must name their asset key",
                    definition.name()
                )))
            }
        };
        if !keys.contains(&&key) {
            return Err(EltError::validation(format!(
                "Step '{}' reported a materialization for {key}, which it does not produce",
                definition.name()
            )));
        }
        if normalized
            .iter()
            .any(|existing| existing.asset_key.as_ref() == Some(&key))
        {
            return Err(EltError::validation(format!(
                "Step '{}' reported {key} more than once",
                definition.name()
            )));
        }
        result.asset_key = Some(key);
        normalized.push(result);
    }

    for key in keys {
        if !normalized
            .iter()
            .any(|result| result.asset_key.as_ref() == Some(key))
        {
            normalized.push(MaterializeResult::for_asset(key.clone()));
        }
    }

    Ok(normalized)
}

fn record_materialization(log: &EventLog, step_key: &str, materialization: MaterializeResult) {
    let asset_key = materialization.asset_key.clone();
    let checks = materialization.check_results.clone();

    info!(
        step = %step_key,
        asset = %asset_key.as_ref().map(AssetKey::to_user_string).unwrap_or_default(),
        "Materialized asset"
    );
    log.record(
        Some(step_key),
        RunEventType::AssetMaterialization {
            materialization,
        },
        format!(
            "Materialized value {}",
            asset_key
                .as_ref()
                .map(AssetKey::to_user_string)
                .unwrap_or_default()
        ),
    );

    for mut check in checks {
        if check.asset_key.is_none() {
            check.asset_key = asset_key.clone();
        }
        let message = format!(
            "Asset check '{}' {}",
            check.check_name,
            if check.passed { "passed" } else { "failed" }
        );
        log.record(
            Some(step_key),
            RunEventType::AssetCheckEvaluation { check },
            message,
        );
    }
}
