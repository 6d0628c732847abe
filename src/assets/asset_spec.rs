use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::result::{Metadata, MetadataValue};
use super::AssetKey;

pub const DEFAULT_GROUP_NAME: &str = "default";

/// Declarative description of an asset: what it is called, where it sits and what it depends on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetSpec {
    pub key: AssetKey,
    #[serde(default)]
    pub deps: Vec<AssetKey>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub metadata: Metadata,
    #[serde(default)]
    pub group_name: Option<String>,
    #[serde(default)]
    pub compute_kind: Option<String>,
    #[serde(default)]
    pub owners: Vec<String>,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
}

impl AssetSpec {
    pub fn new(key: impl Into<AssetKey>) -> Self {
        Self {
            key: key.into(),
            deps: Vec::new(),
            description: None,
            metadata: Metadata::new(),
            group_name: None,
            compute_kind: None,
            owners: Vec::new(),
            tags: BTreeMap::new(),
        }
    }

    pub fn with_group_name(mut self, group_name: impl Into<String>) -> Self {
        self.group_name = Some(group_name.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_dep(mut self, dep: impl Into<AssetKey>) -> Self {
        let dep = dep.into();
        if !self.deps.contains(&dep) {
            self.deps.push(dep);
        }
        self
    }

    pub fn with_deps<I, K>(self, deps: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<AssetKey>,
    {
        deps.into_iter().fold(self, |spec, dep| spec.with_dep(dep))
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<MetadataValue>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn with_compute_kind(mut self, compute_kind: impl Into<String>) -> Self {
        self.compute_kind = Some(compute_kind.into());
        self
    }

    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.owners.push(owner.into());
        self
    }

    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    /// Group name, falling back to the default group
    pub fn effective_group_name(&self) -> &str {
        self.group_name.as_deref().unwrap_or(DEFAULT_GROUP_NAME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spec_builder() {
        let spec = AssetSpec::new(["main", "tbl"])
            .with_group_name("etl")
            .with_description("ETL Test")
            .with_deps(["foo"]);

        assert_eq!(spec.key.to_user_string(), "main/tbl");
        assert_eq!(spec.effective_group_name(), "etl");
        assert_eq!(spec.description.as_deref(), Some("ETL Test"));
        assert_eq!(spec.deps, vec![AssetKey::from("foo")]);
    }

    #[test]
    fn test_duplicate_deps_collapse() {
        let spec = AssetSpec::new("tbl").with_dep("foo").with_dep("foo");
        assert_eq!(spec.deps.len(), 1);
    }

    #[test]
    fn test_default_group() {
        assert_eq!(AssetSpec::new("tbl").effective_group_name(), DEFAULT_GROUP_NAME);
    }
}
