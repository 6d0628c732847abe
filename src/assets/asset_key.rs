use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

use crate::error::{EltError, Result};

/// Hierarchical identifier of an asset, e.g. `["main", "tbl"]`
///
/// Deserializes from either a list of components or a `/`-separated string,
/// so `key: [main, tbl]` and `key: main/tbl` are equivalent.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct AssetKey(Vec<String>);

#[derive(Deserialize)]
#[serde(untagged)]
enum AssetKeyRepr {
    Path(String),
    Parts(Vec<String>),
}

impl AssetKey {
    /// Build a key from path components, rejecting empty keys and empty components
    pub fn try_new<I, S>(path: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let key = Self(path.into_iter().map(Into::into).collect());
        key.validate()?;
        Ok(key)
    }

    /// Check the key has at least one component and no blank components
    pub fn validate(&self) -> Result<()> {
        if self.0.is_empty() {
            return Err(EltError::validation("Asset key must have at least one component"));
        }
        if let Some(position) = self.0.iter().position(|part| part.trim().is_empty()) {
            return Err(EltError::validation(format!(
                "Asset key component {position} is empty in {:?}",
                self.0
            )));
        }
        Ok(())
    }

    pub fn path(&self) -> &[String] {
        &self.0
    }

    /// Slash-joined form used in logs and error messages
    pub fn to_user_string(&self) -> String {
        self.0.join("/")
    }

    /// Dotted form matching how the key reads as a database object name
    pub fn to_object_name(&self) -> String {
        self.0.join(".")
    }

    pub fn with_prefix<S: Into<String>>(&self, prefix: S) -> Self {
        let mut path = Vec::with_capacity(self.0.len() + 1);
        path.push(prefix.into());
        path.extend(self.0.iter().cloned());
        Self(path)
    }

    pub fn last(&self) -> &str {
        // try_new guarantees at least one component
        self.0.last().map(String::as_str).unwrap_or_default()
    }
}

impl fmt::Display for AssetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_user_string())
    }
}

impl<'de> Deserialize<'de> for AssetKey {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let key = match AssetKeyRepr::deserialize(deserializer)? {
            AssetKeyRepr::Path(path) => Self::from(path.as_str()),
            AssetKeyRepr::Parts(parts) => Self(parts),
        };
        key.validate().map_err(serde::de::Error::custom)?;
        Ok(key)
    }
}

impl From<&str> for AssetKey {
    /// Split on `/`; empty components are dropped so `"a//b"` becomes `["a", "b"]`
    fn from(value: &str) -> Self {
        let parts: Vec<String> = value
            .split('/')
            .filter(|part| !part.is_empty())
            .map(str::to_string)
            .collect();
        if parts.is_empty() {
            Self(vec![value.to_string()])
        } else {
            Self(parts)
        }
    }
}

impl From<String> for AssetKey {
    fn from(value: String) -> Self {
        Self::from(value.as_str())
    }
}

impl From<Vec<String>> for AssetKey {
    fn from(value: Vec<String>) -> Self {
        Self(value)
    }
}

impl From<Vec<&str>> for AssetKey {
    fn from(value: Vec<&str>) -> Self {
        Self(value.into_iter().map(str::to_string).collect())
    }
}

impl<const N: usize> From<[&str; N]> for AssetKey {
    fn from(value: [&str; N]) -> Self {
        Self(value.iter().map(|s| s.to_string()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_string_round_trip() {
        let key = AssetKey::from(["main", "tbl"]);
        assert_eq!(key.to_user_string(), "main/tbl");
        assert_eq!(AssetKey::from("main/tbl"), key);
        assert_eq!(key.to_object_name(), "main.tbl");
        assert_eq!(key.last(), "tbl");
    }

    #[test]
    fn test_single_component_key() {
        let key = AssetKey::from("foo");
        assert_eq!(key.path(), &["foo".to_string()]);
    }

    #[test]
    fn test_try_new_rejects_empty() {
        assert!(AssetKey::try_new(Vec::<String>::new()).is_err());
        assert!(AssetKey::try_new(["main", " "]).is_err());
        assert!(AssetKey::try_new(["main", "tbl"]).is_ok());
    }

    #[test]
    fn test_prefix() {
        let key = AssetKey::from("tbl").with_prefix("main");
        assert_eq!(key, AssetKey::from(["main", "tbl"]));
    }

    #[test]
    fn test_serde_is_a_list() {
        let key = AssetKey::from(["main", "tbl"]);
        let json = serde_json::to_string(&key).unwrap();
        assert_eq!(json, r#"["main","tbl"]"#);
        let parsed: AssetKey = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, key);
    }

    #[test]
    fn test_deserialize_from_path_string() {
        let parsed: AssetKey = serde_yaml::from_str("main/tbl").unwrap();
        assert_eq!(parsed, AssetKey::from(["main", "tbl"]));

        let deps: Vec<AssetKey> = serde_yaml::from_str("[foo, [main, tbl]]").unwrap();
        assert_eq!(deps, vec![AssetKey::from("foo"), AssetKey::from(["main", "tbl"])]);
    }

    #[test]
    fn test_deserialize_rejects_empty_keys() {
        assert!(serde_yaml::from_str::<AssetKey>("[]").is_err());
        assert!(serde_yaml::from_str::<AssetKey>("[main, '']").is_err());
        assert!(serde_yaml::from_str::<AssetKey>("''").is_err());
        assert!(serde_json::from_str::<AssetKey>(r#""""#).is_err());
    }

    #[test]
    fn test_validate_unchecked_keys() {
        assert!(AssetKey::from(Vec::<String>::new()).validate().is_err());
        assert!(AssetKey::from("").validate().is_err());
        assert!(AssetKey::from("main/tbl").validate().is_ok());
    }
}
