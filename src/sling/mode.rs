use serde::{Deserialize, Serialize};
use std::fmt;

/// Replication strategy understood by the sling CLI
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SlingMode {
    /// Merge new or changed rows, keyed by the primary key
    #[serde(rename = "incremental")]
    Incremental,
    /// Truncate the target table, then load
    #[serde(rename = "truncate")]
    Truncate,
    /// Drop and recreate the target table, then load
    #[default]
    #[serde(rename = "full-refresh")]
    FullRefresh,
    /// Append the full source with a snapshot timestamp
    #[serde(rename = "snapshot")]
    Snapshot,
    /// Reload a bounded range of the update key
    #[serde(rename = "backfill")]
    Backfill,
}

impl SlingMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Incremental => "incremental",
            Self::Truncate => "truncate",
            Self::FullRefresh => "full-refresh",
            Self::Snapshot => "snapshot",
            Self::Backfill => "backfill",
        }
    }

    /// Modes that reconcile rows against existing target data
    pub fn is_incremental(&self) -> bool {
        matches!(self, Self::Incremental | Self::Backfill)
    }
}

impl fmt::Display for SlingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SlingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('_', "-").as_str() {
            "incremental" => Ok(Self::Incremental),
            "truncate" => Ok(Self::Truncate),
            "full-refresh" => Ok(Self::FullRefresh),
            "snapshot" => Ok(Self::Snapshot),
            "backfill" => Ok(Self::Backfill),
            _ => Err(format!("Invalid sling mode: {s}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_spelling() {
        assert_eq!(SlingMode::Incremental.to_string(), "incremental");
        assert_eq!(SlingMode::FullRefresh.to_string(), "full-refresh");
        assert_eq!(
            serde_json::to_string(&SlingMode::FullRefresh).unwrap(),
            "\"full-refresh\""
        );
    }

    #[test]
    fn test_mode_parsing_is_lenient() {
        assert_eq!("INCREMENTAL".parse::<SlingMode>().unwrap(), SlingMode::Incremental);
        assert_eq!("full_refresh".parse::<SlingMode>().unwrap(), SlingMode::FullRefresh);
        assert!("merge".parse::<SlingMode>().is_err());
    }

    #[test]
    fn test_incremental_classification() {
        assert!(SlingMode::Incremental.is_incremental());
        assert!(!SlingMode::Truncate.is_incremental());
    }
}
