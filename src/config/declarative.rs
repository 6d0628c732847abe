//! Declarative YAML description of a sling job.
//!
//! ```yaml
//! job: sling_job
//! resources:
//!   sling_resource:
//!     source: { type: file }
//!     target: { type: sqlite, connection_string: "sqlite:///tmp/sqlite.db" }
//! assets:
//!   - key: [main, tbl]
//!     group_name: etl
//!     description: ETL Test
//!     deps: [foo]
//!     source_stream: file:///data/test.csv
//!     target_object: main.tbl
//!     mode: incremental
//!     primary_key: [SPECIES_CODE]
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;

use super::EltConfig;
use crate::assets::{AssetKey, AssetSpec};
use crate::constants::DEFAULT_SLING_RESOURCE_KEY;
use crate::error::{EltError, Result};
use crate::execution::EventPublisher;
use crate::job::{build_assets_job, JobDefinition};
use crate::resources::ResourceDefinitions;
use crate::sling::{
    build_sling_asset, SlingAssetOptions, SlingMode, SlingResource, SlingSourceConnection,
    SlingTargetConnection,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SlingResourceConfig {
    pub source: SlingSourceConnection,
    pub target: SlingTargetConnection,
    /// Overrides the configured sling executable for this resource
    #[serde(default)]
    pub executable: Option<String>,
    #[serde(default)]
    pub timeout_seconds: Option<u64>,
    #[serde(default)]
    pub env: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SlingAssetConfig {
    pub key: AssetKey,
    #[serde(default)]
    pub group_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub deps: Vec<AssetKey>,
    #[serde(default)]
    pub owners: Vec<String>,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
    #[serde(default)]
    pub compute_kind: Option<String>,
    pub source_stream: String,
    pub target_object: String,
    #[serde(default)]
    pub mode: SlingMode,
    #[serde(default)]
    pub primary_key: Vec<String>,
    #[serde(default)]
    pub update_key: Option<String>,
    #[serde(default)]
    pub source_options: BTreeMap<String, Value>,
    #[serde(default)]
    pub target_options: BTreeMap<String, Value>,
    #[serde(default = "default_resource_key")]
    pub sling_resource_key: String,
}

fn default_resource_key() -> String {
    DEFAULT_SLING_RESOURCE_KEY.to_string()
}

impl SlingAssetConfig {
    fn spec(&self) -> AssetSpec {
        AssetSpec {
            key: self.key.clone(),
            deps: self.deps.clone(),
            description: self.description.clone(),
            metadata: Default::default(),
            group_name: self.group_name.clone(),
            compute_kind: self.compute_kind.clone(),
            owners: self.owners.clone(),
            tags: self.tags.clone(),
        }
    }

    fn options(&self) -> SlingAssetOptions {
        SlingAssetOptions {
            source_stream: self.source_stream.clone(),
            target_object: self.target_object.clone(),
            mode: self.mode,
            primary_key: self.primary_key.clone(),
            update_key: self.update_key.clone(),
            source_options: self.source_options.clone(),
            target_options: self.target_options.clone(),
            sling_resource_key: self.sling_resource_key.clone(),
        }
    }
}

/// A whole job: named sling resources and the assets replicated through them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SlingJobSpec {
    pub job: String,
    pub resources: BTreeMap<String, SlingResourceConfig>,
    pub assets: Vec<SlingAssetConfig>,
}

impl SlingJobSpec {
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            EltError::configuration(format!("Cannot read job file {}: {e}", path.display()))
        })?;
        Self::from_yaml_str(&contents)
    }

    /// Build the job, applying `config` for sling invocation defaults
    pub fn into_job(self, config: &EltConfig) -> Result<JobDefinition> {
        let mut resources = ResourceDefinitions::new();
        for (key, resource_config) in self.resources {
            let mut settings = config.sling.clone();
            if let Some(executable) = resource_config.executable {
                settings.executable = executable;
            }
            if let Some(timeout) = resource_config.timeout_seconds {
                settings.timeout_seconds = timeout;
            }
            let resource = resource_config.env.into_iter().fold(
                SlingResource::from_settings(resource_config.source, resource_config.target, &settings),
                |resource, (k, v)| resource.with_env(k, v),
            );
            resources.insert(key, resource);
        }

        let assets = self
            .assets
            .iter()
            .map(|asset| build_sling_asset(asset.spec(), asset.options()))
            .collect::<Result<Vec<_>>>()?;

        Ok(build_assets_job(self.job, assets, resources)?
            .with_event_publisher(EventPublisher::new(config.events.channel_capacity)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    const JOB_YAML: &str = r#"
job: sling_job
resources:
  sling_resource:
    source:
      type: file
    target:
      type: sqlite
      connection_string: "sqlite:///tmp/sqlite.db"
    timeout_seconds: 30
assets:
  - key: [main, tbl]
    group_name: etl
    description: ETL Test
    deps: [foo]
    source_stream: file:///data/test.csv
    target_object: main.tbl
    mode: incremental
    primary_key: [SPECIES_CODE]
"#;

    #[test]
    fn test_parse_job_yaml() {
        let spec = SlingJobSpec::from_yaml_str(JOB_YAML).unwrap();
        assert_eq!(spec.job, "sling_job");
        assert_eq!(spec.assets[0].key, AssetKey::from(["main", "tbl"]));
        assert_eq!(spec.assets[0].mode, SlingMode::Incremental);
        assert_eq!(spec.assets[0].sling_resource_key, "sling_resource");
        assert_eq!(spec.resources["sling_resource"].source.conn_type, "file");
    }

    #[test]
    fn test_into_job_applies_overrides() {
        let job = SlingJobSpec::from_yaml_str(JOB_YAML)
            .unwrap()
            .into_job(&EltConfig::default())
            .unwrap();

        assert_eq!(job.name(), "sling_job");
        assert_eq!(job.asset_keys(), vec![&AssetKey::from(["main", "tbl"])]);
        assert!(job.external_dependencies().contains(&AssetKey::from("foo")));

        let resource = job.resources().get::<SlingResource>("sling_resource").unwrap();
        assert_eq!(resource.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_string_keys_and_deps() {
        let yaml = JOB_YAML.replace("key: [main, tbl]", "key: main/tbl");
        let spec = SlingJobSpec::from_yaml_str(&yaml).unwrap();
        assert_eq!(spec.assets[0].key, AssetKey::from(["main", "tbl"]));
        assert_eq!(spec.assets[0].deps, vec![AssetKey::from("foo")]);
    }

    #[test]
    fn test_empty_key_is_rejected() {
        let yaml = JOB_YAML.replace("key: [main, tbl]", "key: []");
        assert!(SlingJobSpec::from_yaml_str(&yaml).is_err());
    }

    #[test]
    fn test_unknown_fields_are_rejected() {
        let yaml = JOB_YAML.replace("group_name: etl", "group: etl");
        assert!(SlingJobSpec::from_yaml_str(&yaml).is_err());
    }

    #[test]
    fn test_missing_resource_reference() {
        let yaml = JOB_YAML.replace("sling_resource:", "other_resource:");
        let err = SlingJobSpec::from_yaml_str(&yaml)
            .unwrap()
            .into_job(&EltConfig::default())
            .unwrap_err();
        assert!(err.to_string().contains("sling_resource"));
    }
}
