use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle of a single job run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Run created but not yet started
    #[default]
    NotStarted,
    /// Steps are executing
    Started,
    /// Every step completed successfully
    Success,
    /// At least one step failed
    Failure,
}

impl RunStatus {
    /// Check if this is a terminal state (no further transitions allowed)
    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Success | Self::Failure)
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    /// Whether `next` is a legal transition from this status
    pub fn can_transition_to(&self, next: RunStatus) -> bool {
        match (self, next) {
            (Self::NotStarted, Self::Started) => true,
            (Self::Started, Self::Success | Self::Failure) => true,
            _ => false,
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotStarted => write!(f, "not_started"),
            Self::Started => write!(f, "started"),
            Self::Success => write!(f, "success"),
            Self::Failure => write!(f, "failure"),
        }
    }
}

impl std::str::FromStr for RunStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "not_started" => Ok(Self::NotStarted),
            "started" => Ok(Self::Started),
            "success" => Ok(Self::Success),
            "failure" => Ok(Self::Failure),
            _ => Err(format!("Invalid run status: {s}")),
        }
    }
}

/// Per-asset step state within a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepState {
    /// Waiting for upstream steps
    #[default]
    Pending,
    /// Step is currently being executed
    InProgress,
    /// Step completed successfully
    Complete,
    /// Step failed with an error
    Failed,
    /// Step was not run because an upstream step failed
    Skipped,
}

impl StepState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete | Self::Failed | Self::Skipped)
    }

    /// Check if this step satisfies dependencies for downstream steps
    pub fn satisfies_dependencies(&self) -> bool {
        matches!(self, Self::Complete)
    }
}

impl fmt::Display for StepState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::InProgress => write!(f, "in_progress"),
            Self::Complete => write!(f, "complete"),
            Self::Failed => write!(f, "failed"),
            Self::Skipped => write!(f, "skipped"),
        }
    }
}
