use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use super::SlingMode;
use crate::error::{EltError, Result};

/// One stream to copy from the source connection into a target object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplicationRequest {
    /// Source stream, e.g. `file:///data/test.csv` or `public.orders`
    pub source_stream: String,
    /// Target object, e.g. `main.tbl`
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
}

impl ReplicationRequest {
    pub fn new(source_stream: impl Into<String>, target_object: impl Into<String>) -> Self {
        Self {
            source_stream: source_stream.into(),
            target_object: target_object.into(),
            mode: SlingMode::default(),
            primary_key: Vec::new(),
            update_key: None,
            source_options: BTreeMap::new(),
            target_options: BTreeMap::new(),
        }
    }

    pub fn with_mode(mut self, mode: SlingMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_primary_key<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.primary_key = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_update_key(mut self, column: impl Into<String>) -> Self {
        self.update_key = Some(column.into());
        self
    }

    pub fn with_source_option(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.source_options.insert(key.into(), value.into());
        self
    }

    pub fn with_target_option(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.target_options.insert(key.into(), value.into());
        self
    }

    /// Reject requests the tool would refuse anyway
    pub fn validate(&self) -> Result<()> {
        if self.source_stream.trim().is_empty() {
            return Err(EltError::validation("source_stream must not be empty"));
        }
        if self.target_object.trim().is_empty() {
            return Err(EltError::validation("target_object must not be empty"));
        }
        if self.primary_key.iter().any(|column| column.trim().is_empty()) {
            return Err(EltError::validation("primary_key columns must not be empty"));
        }
        if self.mode.is_incremental() && self.primary_key.is_empty() && self.update_key.is_none() {
            return Err(EltError::validation(format!(
                "{} mode requires a primary_key or update_key",
                self.mode
            )));
        }
        Ok(())
    }

    /// Replication config passed to `sling run -c`, referencing connections by env var name
    pub fn to_sling_config(&self, source_conn: &str, target_conn: &str) -> Value {
        let mut source = Map::new();
        source.insert("conn".to_string(), Value::String(source_conn.to_string()));
        source.insert(
            "stream".to_string(),
            Value::String(self.source_stream.clone()),
        );
        if !self.primary_key.is_empty() {
            source.insert(
                "primary_key".to_string(),
                Value::Array(
                    self.primary_key
                        .iter()
                        .cloned()
                        .map(Value::String)
                        .collect(),
                ),
            );
        }
        if let Some(update_key) = &self.update_key {
            source.insert("update_key".to_string(), Value::String(update_key.clone()));
        }
        if !self.source_options.is_empty() {
            source.insert(
                "options".to_string(),
                Value::Object(self.source_options.clone().into_iter().collect()),
            );
        }

        let mut target = Map::new();
        target.insert("conn".to_string(), Value::String(target_conn.to_string()));
        target.insert(
            "object".to_string(),
            Value::String(self.target_object.clone()),
        );
        if !self.target_options.is_empty() {
            target.insert(
                "options".to_string(),
                Value::Object(self.target_options.clone().into_iter().collect()),
            );
        }

        serde_json::json!({
            "source": source,
            "target": target,
            "mode": self.mode.as_str(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> ReplicationRequest {
        ReplicationRequest::new("file:///data/test.csv", "main.tbl")
            .with_mode(SlingMode::Incremental)
            .with_primary_key(["SPECIES_CODE"])
    }

    #[test]
    fn test_config_shape() {
        let config = request().to_sling_config("SRC", "TGT");
        assert_eq!(
            config,
            serde_json::json!({
                "source": {
                    "conn": "SRC",
                    "stream": "file:///data/test.csv",
                    "primary_key": ["SPECIES_CODE"]
                },
                "target": {"conn": "TGT", "object": "main.tbl"},
                "mode": "incremental"
            })
        );
    }

    #[test]
    fn test_options_and_update_key() {
        let config = request()
            .with_update_key("updated_at")
            .with_source_option("header", true)
            .with_target_option("column_casing", "snake")
            .to_sling_config("SRC", "TGT");

        assert_eq!(config["source"]["update_key"], "updated_at");
        assert_eq!(config["source"]["options"]["header"], true);
        assert_eq!(config["target"]["options"]["column_casing"], "snake");
    }

    #[test]
    fn test_validation() {
        assert!(request().validate().is_ok());
        assert!(ReplicationRequest::new("", "main.tbl").validate().is_err());
        assert!(ReplicationRequest::new("file:///x.csv", "main.tbl")
            .with_mode(SlingMode::Incremental)
            .validate()
            .is_err());
        assert!(ReplicationRequest::new("file:///x.csv", "main.tbl")
            .validate()
            .is_ok());
    }
}
