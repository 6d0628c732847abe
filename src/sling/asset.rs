use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

use super::resource::{SlingInvocation, SlingResource};
use super::{ReplicationRequest, SlingMode};
use crate::assets::{AssetCompute, AssetSpec, AssetsDefinition, MaterializeResult};
use crate::constants::{DEFAULT_SLING_RESOURCE_KEY, SLING_COMPUTE_KIND};
use crate::error::Result;
use crate::execution::AssetExecutionContext;
use crate::pipes::PipesClient;

/// Arguments to [`build_sling_asset`] beyond the asset spec
#[derive(Debug, Clone)]
pub struct SlingAssetOptions {
    pub source_stream: String,
    pub target_object: String,
    pub mode: SlingMode,
    pub primary_key: Vec<String>,
    pub update_key: Option<String>,
    pub source_options: BTreeMap<String, Value>,
    pub target_options: BTreeMap<String, Value>,
    pub sling_resource_key: String,
}

impl SlingAssetOptions {
    pub fn new(source_stream: impl Into<String>, target_object: impl Into<String>) -> Self {
        Self {
            source_stream: source_stream.into(),
            target_object: target_object.into(),
            mode: SlingMode::default(),
            primary_key: Vec::new(),
            update_key: None,
            source_options: BTreeMap::new(),
            target_options: BTreeMap::new(),
            sling_resource_key: DEFAULT_SLING_RESOURCE_KEY.to_string(),
        }
    }

    pub fn mode(mut self, mode: SlingMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn primary_key<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.primary_key = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn update_key(mut self, column: impl Into<String>) -> Self {
        self.update_key = Some(column.into());
        self
    }

    pub fn source_option(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.source_options.insert(key.into(), value.into());
        self
    }

    pub fn target_option(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.target_options.insert(key.into(), value.into());
        self
    }

    pub fn sling_resource_key(mut self, key: impl Into<String>) -> Self {
        self.sling_resource_key = key.into();
        self
    }

    fn request(&self) -> ReplicationRequest {
        ReplicationRequest {
            source_stream: self.source_stream.clone(),
            target_object: self.target_object.clone(),
            mode: self.mode,
            primary_key: self.primary_key.clone(),
            update_key: self.update_key.clone(),
            source_options: self.source_options.clone(),
            target_options: self.target_options.clone(),
        }
    }
}

struct SlingAssetCompute {
    resource_key: String,
    request: ReplicationRequest,
}

#[async_trait::async_trait]
impl AssetCompute for SlingAssetCompute {
    async fn execute(&self, context: &AssetExecutionContext) -> Result<Vec<MaterializeResult>> {
        let resource = context.resource::<SlingResource>(&self.resource_key)?;
        let invocation = SlingInvocation {
            resource,
            request: self.request.clone(),
        };
        let completed = invocation.run(context, None).await?;
        Ok(vec![completed.get_materialize_result()?])
    }
}

/// Bind `asset_spec` to a sling replication run through the resource at `sling_resource_key`
///
/// The request is validated up front so a job never starts with a replication
/// the tool would reject.
pub fn build_sling_asset(
    asset_spec: AssetSpec,
    options: SlingAssetOptions,
) -> Result<AssetsDefinition> {
    let request = options.request();
    request.validate()?;

    let mut spec = asset_spec;
    if spec.compute_kind.is_none() {
        spec.compute_kind = Some(SLING_COMPUTE_KIND.to_string());
    }
    let name = format!("sling_{}", spec.key.path().join("_"));

    let compute = Arc::new(SlingAssetCompute {
        resource_key: options.sling_resource_key.clone(),
        request,
    });

    Ok(AssetsDefinition::new(name, vec![spec], compute)?
        .with_required_resource(options.sling_resource_key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::AssetKey;

    fn spec() -> AssetSpec {
        AssetSpec::new(["main", "tbl"])
            .with_group_name("etl")
            .with_description("ETL Test")
            .with_dep("foo")
    }

    #[test]
    fn test_build_sling_asset_shape() {
        let asset = build_sling_asset(
            spec(),
            SlingAssetOptions::new("file:///data/test.csv", "main.tbl")
                .mode(SlingMode::Incremental)
                .primary_key(["SPECIES_CODE"]),
        )
        .unwrap();

        assert_eq!(asset.name(), "sling_main_tbl");
        assert_eq!(
            asset.keys().cloned().collect::<Vec<_>>(),
            vec![AssetKey::from(["main", "tbl"])]
        );
        assert!(asset.required_resource_keys().contains("sling_resource"));
        assert_eq!(asset.specs()[0].compute_kind.as_deref(), Some("sling"));
        assert_eq!(
            asset.dependency_keys().into_iter().collect::<Vec<_>>(),
            vec![AssetKey::from("foo")]
        );
    }

    #[test]
    fn test_custom_resource_key_and_compute_kind() {
        let asset = build_sling_asset(
            spec().with_compute_kind("elt"),
            SlingAssetOptions::new("file:///data/test.csv", "main.tbl")
                .sling_resource_key("warehouse_loader"),
        )
        .unwrap();

        assert!(asset.required_resource_keys().contains("warehouse_loader"));
        assert_eq!(asset.specs()[0].compute_kind.as_deref(), Some("elt"));
    }

    #[test]
    fn test_incremental_without_keys_is_rejected() {
        let result = build_sling_asset(
            spec(),
            SlingAssetOptions::new("file:///data/test.csv", "main.tbl").mode(SlingMode::Incremental),
        );
        assert!(result.is_err());
    }
}
