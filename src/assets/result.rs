//! Outcomes reported by asset computations.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::AssetKey;

/// Typed metadata attached to specs, materializations and check results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum MetadataValue {
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Path(String),
    Url(String),
    Json(serde_json::Value),
}

impl fmt::Display for MetadataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(v) | Self::Path(v) | Self::Url(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Json(v) => write!(f, "{v}"),
        }
    }
}

impl From<&str> for MetadataValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for MetadataValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for MetadataValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<u64> for MetadataValue {
    fn from(value: u64) -> Self {
        Self::Int(i64::try_from(value).unwrap_or(i64::MAX))
    }
}

impl From<f64> for MetadataValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for MetadataValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<serde_json::Value> for MetadataValue {
    fn from(value: serde_json::Value) -> Self {
        Self::Json(value)
    }
}

pub type Metadata = BTreeMap<String, MetadataValue>;

/// Severity of a failed asset check
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetCheckSeverity {
    Warn,
    #[default]
    Error,
}

/// Result of evaluating a data-quality check against an asset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetCheckResult {
    pub asset_key: Option<AssetKey>,
    pub check_name: String,
    pub passed: bool,
    pub severity: AssetCheckSeverity,
    pub metadata: Metadata,
}

impl AssetCheckResult {
    pub fn new(check_name: impl Into<String>, passed: bool) -> Self {
        Self {
            asset_key: None,
            check_name: check_name.into(),
            passed,
            severity: AssetCheckSeverity::default(),
            metadata: Metadata::new(),
        }
    }

    pub fn for_asset(mut self, asset_key: AssetKey) -> Self {
        self.asset_key = Some(asset_key);
        self
    }

    pub fn with_severity(mut self, severity: AssetCheckSeverity) -> Self {
        self.severity = severity;
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<MetadataValue>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// Result of materializing an asset
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MaterializeResult {
    /// May be omitted when the computation produces exactly one asset
    pub asset_key: Option<AssetKey>,
    pub metadata: Metadata,
    pub check_results: Vec<AssetCheckResult>,
    pub data_version: Option<String>,
}

impl MaterializeResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_asset(asset_key: AssetKey) -> Self {
        Self {
            asset_key: Some(asset_key),
            ..Self::default()
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<MetadataValue>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn with_check_result(mut self, check: AssetCheckResult) -> Self {
        self.check_results.push(check);
        self
    }

    pub fn with_data_version(mut self, version: impl Into<String>) -> Self {
        self.data_version = Some(version.into());
        self
    }

    /// Integer metadata lookup, e.g. `rows_written`
    pub fn metadata_int(&self, key: &str) -> Option<i64> {
        match self.metadata.get(key) {
            Some(MetadataValue::Int(v)) => Some(*v),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_materialize_result_builder() {
        let result = MaterializeResult::for_asset(AssetKey::from("main/tbl"))
            .with_metadata("rows_written", 3_u64)
            .with_metadata("target_object", "main.tbl")
            .with_check_result(AssetCheckResult::new("row_count_positive", true));

        assert_eq!(result.metadata_int("rows_written"), Some(3));
        assert_eq!(result.metadata_int("target_object"), None);
        assert_eq!(result.check_results.len(), 1);
    }

    #[test]
    fn test_metadata_serde() {
        let value = MetadataValue::Int(3);
        let json = serde_json::to_string(&value).unwrap();
        assert_eq!(json, r#"{"type":"int","value":3}"#);
    }

    #[test]
    fn test_metadata_display() {
        assert_eq!(MetadataValue::from("main.tbl").to_string(), "main.tbl");
        assert_eq!(MetadataValue::from(true).to_string(), "true");
    }
}
