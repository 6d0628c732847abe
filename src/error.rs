use crate::assets::AssetKey;

/// Errors produced while building or executing ELT jobs
#[derive(Debug, thiserror::Error)]
pub enum EltError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Resource not found: {key}")]
    ResourceNotFound { key: String },

    #[error("Resource '{key}' is not a {expected}")]
    ResourceTypeMismatch { key: String, expected: &'static str },

    #[error("ELT executable not found: {executable}")]
    ExecutableNotFound { executable: String },

    #[error("Replication failed with exit code {exit_code:?}: {stderr_tail}")]
    ReplicationFailed {
        exit_code: Option<i32>,
        stderr_tail: String,
    },

    #[error("Replication timed out after {seconds}s")]
    Timeout { seconds: u64 },

    #[error("Pipes error: {0}")]
    Pipes(String),

    #[error("Step for asset {asset_key} failed in job '{job_name}': {message}")]
    StepFailed {
        job_name: String,
        asset_key: AssetKey,
        message: String,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl EltError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Whether retrying the same invocation could plausibly succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::Io(_))
    }
}

impl From<serde_json::Error> for EltError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for EltError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<config::ConfigError> for EltError {
    fn from(err: config::ConfigError) -> Self {
        Self::Configuration(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, EltError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = EltError::ResourceNotFound {
            key: "sling_resource".to_string(),
        };
        assert_eq!(err.to_string(), "Resource not found: sling_resource");

        let err = EltError::StepFailed {
            job_name: "sling_job".to_string(),
            asset_key: AssetKey::from("main/tbl"),
            message: "boom".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Step for asset main/tbl failed in job 'sling_job': boom"
        );
    }

    #[test]
    fn test_transient_classification() {
        assert!(EltError::Timeout { seconds: 5 }.is_transient());
        assert!(!EltError::validation("bad").is_transient());
        assert!(!EltError::ReplicationFailed {
            exit_code: Some(1),
            stderr_tail: String::new()
        }
        .is_transient());
    }

    #[test]
    fn test_serde_json_conversion() {
        let parse_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: EltError = parse_err.into();
        assert!(matches!(err, EltError::Serialization(_)));
    }
}
