//! # Resources
//!
//! Named, configured objects made available to asset computations.
//!
//! A job owns a [`ResourceDefinitions`] map; each asset declares the keys it
//! requires and looks the concrete type up at execution time.

use serde_json::Value;
use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::error::{EltError, Result};

/// A configured object shared with asset computations during a run
pub trait Resource: Send + Sync + 'static {
    /// Human-readable type name used in logs and mismatch errors
    fn resource_type(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Loggable summary of the resource; must not include credentials
    fn describe(&self) -> Value {
        Value::Null
    }
}

#[derive(Clone)]
struct ResourceEntry {
    resource_type: &'static str,
    description: Value,
    instance: Arc<dyn Any + Send + Sync>,
}

/// Resources keyed by the name assets use to request them
#[derive(Clone, Default)]
pub struct ResourceDefinitions {
    entries: BTreeMap<String, ResourceEntry>,
}

impl ResourceDefinitions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_resource<R: Resource>(mut self, key: impl Into<String>, resource: R) -> Self {
        self.insert(key, resource);
        self
    }

    /// Register a resource, replacing any previous entry under the same key
    pub fn insert<R: Resource>(&mut self, key: impl Into<String>, resource: R) {
        let entry = ResourceEntry {
            resource_type: resource.resource_type(),
            description: resource.describe(),
            instance: Arc::new(resource),
        };
        self.entries.insert(key.into(), entry);
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Typed lookup of a registered resource
    pub fn get<R: Resource>(&self, key: &str) -> Result<Arc<R>> {
        let entry = self
            .entries
            .get(key)
            .ok_or_else(|| EltError::ResourceNotFound {
                key: key.to_string(),
            })?;

        Arc::clone(&entry.instance)
            .downcast::<R>()
            .map_err(|_| EltError::ResourceTypeMismatch {
                key: key.to_string(),
                expected: std::any::type_name::<R>(),
            })
    }

    /// Summary of every resource, keyed by resource key
    pub fn describe(&self) -> Value {
        let map = self
            .entries
            .iter()
            .map(|(key, entry)| {
                (
                    key.clone(),
                    serde_json::json!({
                        "type": entry.resource_type,
                        "config": entry.description,
                    }),
                )
            })
            .collect::<serde_json::Map<_, _>>();
        Value::Object(map)
    }
}

impl fmt::Debug for ResourceDefinitions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(
                self.entries
                    .iter()
                    .map(|(key, entry)| (key, entry.resource_type)),
            )
            .finish()
    }
}

impl<R: Resource> FromIterator<(String, R)> for ResourceDefinitions {
    fn from_iter<I: IntoIterator<Item = (String, R)>>(iter: I) -> Self {
        let mut definitions = Self::new();
        for (key, resource) in iter {
            definitions.insert(key, resource);
        }
        definitions
    }
}
