//! # Jobs
//!
//! A job is a named set of assets plus the resources they need. Building a
//! job validates the asset graph up front; executing it runs every asset once,
//! upstream before downstream, and records the run in an event log.
//!
//! Dependencies on assets that are not part of the job are treated as
//! external upstreams: they constrain nothing and are never executed.

mod executor;
mod graph;

pub use executor::ExecuteOptions;
pub use graph::AssetGraph;

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

use crate::assets::{AssetKey, AssetsDefinition};
use crate::error::{EltError, Result};
use crate::execution::{EventPublisher, ExecuteInProcessResult};
use crate::resources::ResourceDefinitions;

/// Validated set of assets and resources, ready to execute
#[derive(Clone)]
pub struct JobDefinition {
    name: String,
    graph: Arc<AssetGraph>,
    resources: Arc<ResourceDefinitions>,
    publisher: EventPublisher,
}

/// Assemble `assets` into a job whose steps can resolve `resource_defs`
pub fn build_assets_job(
    name: impl Into<String>,
    assets: Vec<AssetsDefinition>,
    resource_defs: ResourceDefinitions,
) -> Result<JobDefinition> {
    let name = name.into();
    if name.trim().is_empty() {
        return Err(EltError::validation("Job name must not be empty"));
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(EltError::validation(format!(
            "Job name '{name}' may only contain letters, digits, '_' and '-'"
        )));
    }
    if assets.is_empty() {
        return Err(EltError::validation(format!(
            "Job '{name}' must contain at least one asset"
        )));
    }

    for definition in &assets {
        let missing: Vec<&str> = definition
            .required_resource_keys()
            .iter()
            .map(String::as_str)
            .filter(|key| !resource_defs.contains(key))
            .collect();
        if !missing.is_empty() {
            return Err(EltError::validation(format!(
                "Asset step '{}' in job '{name}' requires resources {missing:?} which were not provided; available: {:?}",
                definition.name(),
                resource_defs.keys().collect::<Vec<_>>()
            )));
        }
    }

    let graph = AssetGraph::new(assets)?;

    info!(
        job = %name,
        assets = graph.len(),
        external_deps = graph.external_dependencies().len(),
        resources = %resource_defs.describe(),
        "Built assets job"
    );

    Ok(JobDefinition {
        name,
        graph: Arc::new(graph),
        resources: Arc::new(resource_defs),
        publisher: EventPublisher::default(),
    })
}

impl JobDefinition {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn graph(&self) -> &AssetGraph {
        &self.graph
    }

    pub fn asset_keys(&self) -> Vec<&AssetKey> {
        self.graph.asset_keys()
    }

    pub fn external_dependencies(&self) -> &BTreeSet<AssetKey> {
        self.graph.external_dependencies()
    }

    pub fn resources(&self) -> &ResourceDefinitions {
        &self.resources
    }

    /// Replace the publisher run events are broadcast on
    pub fn with_event_publisher(mut self, publisher: EventPublisher) -> Self {
        self.publisher = publisher;
        self
    }

    pub fn event_publisher(&self) -> &EventPublisher {
        &self.publisher
    }

    /// Execute every asset in this process, failing with the first step error
    pub async fn execute_in_process(&self) -> Result<ExecuteInProcessResult> {
        self.execute_in_process_with(ExecuteOptions::default()).await
    }

    pub async fn execute_in_process_with(
        &self,
        options: ExecuteOptions,
    ) -> Result<ExecuteInProcessResult> {
        debug!(job = %self.name, raise_on_error = options.raise_on_error, "Executing job in process");
        executor::execute(self, options).await
    }
}

impl fmt::Debug for JobDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobDefinition")
            .field("name", &self.name)
            .field("assets", &self.graph.asset_keys())
            .field("resources", &self.resources)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::{AssetCompute, AssetSpec, FnCompute, MaterializeResult};
    use crate::execution::AssetExecutionContext;

    fn noop() -> Arc<dyn AssetCompute> {
        Arc::new(FnCompute(|_ctx: AssetExecutionContext| async {
            Ok(Vec::<MaterializeResult>::new())
        }))
    }

    fn asset(key: &str) -> AssetsDefinition {
        AssetsDefinition::new(key, vec![AssetSpec::new(key)], noop()).unwrap()
    }

    #[test]
    fn test_missing_resource_is_rejected() {
        let definition = asset("tbl").with_required_resource("sling_resource");
        let err = build_assets_job("sling_job", vec![definition], ResourceDefinitions::new())
            .unwrap_err();
        assert!(err.to_string().contains("sling_resource"), "got: {err}");
    }

    #[test]
    fn test_job_name_validation() {
        assert!(build_assets_job("", vec![asset("a")], ResourceDefinitions::new()).is_err());
        assert!(build_assets_job("bad name", vec![asset("a")], ResourceDefinitions::new()).is_err());
        assert!(build_assets_job("good_name-1", vec![asset("a")], ResourceDefinitions::new()).is_ok());
    }

    #[test]
    fn test_empty_job_is_rejected() {
        assert!(build_assets_job("job", vec![], ResourceDefinitions::new()).is_err());
    }
}
