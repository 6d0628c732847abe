use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use super::{AssetKey, AssetSpec, MaterializeResult};
use crate::error::{EltError, Result};
use crate::execution::AssetExecutionContext;

/// Computation that produces one or more assets
///
/// Implementations return one [`MaterializeResult`] per produced asset. A
/// result without an asset key is attributed to the definition's only asset.
#[async_trait::async_trait]
pub trait AssetCompute: Send + Sync {
    async fn execute(&self, context: &AssetExecutionContext) -> Result<Vec<MaterializeResult>>;
}

/// Specs bound to the computation that materializes them
#[derive(Clone)]
pub struct AssetsDefinition {
    name: String,
    specs: Vec<AssetSpec>,
    compute: Arc<dyn AssetCompute>,
    required_resource_keys: BTreeSet<String>,
}

impl AssetsDefinition {
    pub fn new(
        name: impl Into<String>,
        specs: Vec<AssetSpec>,
        compute: Arc<dyn AssetCompute>,
    ) -> Result<Self> {
        let name = name.into();
        if specs.is_empty() {
            return Err(EltError::validation(format!(
                "Assets definition '{name}' must declare at least one asset spec"
            )));
        }
        let mut seen = BTreeSet::new();
        for spec in &specs {
            spec.key.validate().map_err(|e| {
                EltError::validation(format!("Assets definition '{name}' has an invalid key: {e}"))
            })?;
            for dep in &spec.deps {
                dep.validate().map_err(|e| {
                    EltError::validation(format!(
                        "Asset {} in '{name}' has an invalid dependency: {e}",
                        spec.key
                    ))
                })?;
            }
            if !seen.insert(spec.key.clone()) {
                return Err(EltError::validation(format!(
                    "Assets definition '{name}' declares asset {} twice",
                    spec.key
                )));
            }
        }
        Ok(Self {
            name,
            specs,
            compute,
            required_resource_keys: BTreeSet::new(),
        })
    }

    pub fn with_required_resource(mut self, key: impl Into<String>) -> Self {
        self.required_resource_keys.insert(key.into());
        self
    }

    /// Step name used in run events
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn specs(&self) -> &[AssetSpec] {
        &self.specs
    }

    pub fn keys(&self) -> impl Iterator<Item = &AssetKey> {
        self.specs.iter().map(|spec| &spec.key)
    }

    pub fn spec_for(&self, key: &AssetKey) -> Option<&AssetSpec> {
        self.specs.iter().find(|spec| &spec.key == key)
    }

    pub fn required_resource_keys(&self) -> &BTreeSet<String> {
        &self.required_resource_keys
    }

    /// Upstream keys declared by any spec, excluding assets this definition produces itself
    pub fn dependency_keys(&self) -> BTreeSet<AssetKey> {
        let own: BTreeSet<&AssetKey> = self.keys().collect();
        self.specs
            .iter()
            .flat_map(|spec| spec.deps.iter())
            .filter(|dep| !own.contains(dep))
            .cloned()
            .collect()
    }

    pub(crate) fn compute(&self) -> Arc<dyn AssetCompute> {
        Arc::clone(&self.compute)
    }
}

impl fmt::Debug for AssetsDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssetsDefinition")
            .field("name", &self.name)
            .field("keys", &self.keys().collect::<Vec<_>>())
            .field("required_resource_keys", &self.required_resource_keys)
            .finish()
    }
}

/// Adapter turning an async closure into an [`AssetCompute`]
pub struct FnCompute<F>(pub F);

#[async_trait::async_trait]
impl<F, Fut> AssetCompute for FnCompute<F>
where
    F: Fn(AssetExecutionContext) -> Fut + Send + Sync,
    Fut: std::future::Future<Output = Result<Vec<MaterializeResult>>> + Send,
{
    async fn execute(&self, context: &AssetExecutionContext) -> Result<Vec<MaterializeResult>> {
        (self.0)(context.clone()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop() -> Arc<dyn AssetCompute> {
        Arc::new(FnCompute(|_ctx: AssetExecutionContext| async {
            Ok(Vec::<MaterializeResult>::new())
        }))
    }

    #[test]
    fn test_dependency_keys_exclude_own_assets() {
        let definition = AssetsDefinition::new(
            "multi",
            vec![
                AssetSpec::new("a").with_dep("upstream"),
                AssetSpec::new("b").with_dep("a"),
            ],
            noop(),
        )
        .unwrap();

        let deps: Vec<_> = definition.dependency_keys().into_iter().collect();
        assert_eq!(deps, vec![AssetKey::from("upstream")]);
    }

    #[test]
    fn test_rejects_empty_and_duplicate_specs() {
        assert!(AssetsDefinition::new("empty", vec![], noop()).is_err());
        assert!(AssetsDefinition::new(
            "dupe",
            vec![AssetSpec::new("a"), AssetSpec::new("a")],
            noop()
        )
        .is_err());
    }

    #[test]
    fn test_rejects_empty_keys_and_deps() {
        assert!(AssetsDefinition::new("blank", vec![AssetSpec::new("")], noop()).is_err());
        assert!(
            AssetsDefinition::new("none", vec![AssetSpec::new(Vec::<String>::new())], noop())
                .is_err()
        );
        let err = AssetsDefinition::new(
            "bad_dep",
            vec![AssetSpec::new("a").with_dep(["main", " "])],
            noop(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("invalid dependency"), "got: {err}");
    }

    #[test]
    fn test_required_resources() {
        let definition = AssetsDefinition::new("a", vec![AssetSpec::new("a")], noop())
            .unwrap()
            .with_required_resource("sling_resource");
        assert!(definition.required_resource_keys().contains("sling_resource"));
    }
}
