//! Run event log and broadcast publisher.
//!
//! ```rust
//! use tasker_elt::execution::{EventLog, EventPublisher, RunEventType};
//!
//! # tokio_test::block_on(async {
//! let publisher = EventPublisher::default();
//! let mut receiver = publisher.subscribe();
//!
//! let log = EventLog::new(uuid::Uuid::new_v4(), "sling_job", publisher);
//! log.record(None, RunEventType::RunStart, "Started execution of run");
//!
//! let event = receiver.recv().await.unwrap();
//! assert_eq!(event.event_type.name(), "run_start");
//! assert_eq!(log.len(), 1);
//! # });
//! ```

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::assets::{AssetCheckResult, MaterializeResult};

/// Severity of a log message captured during a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

/// Kind of run event, with its payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum RunEventType {
    RunStart,
    RunSuccess,
    RunFailure { error: String },
    StepStart,
    StepSuccess { duration_ms: u64 },
    StepFailure { error: String },
    StepSkipped { reason: String },
    AssetMaterialization { materialization: MaterializeResult },
    AssetCheckEvaluation { check: AssetCheckResult },
    LogMessage { level: LogLevel },
}

impl RunEventType {
    pub fn name(&self) -> &'static str {
        match self {
            Self::RunStart => "run_start",
            Self::RunSuccess => "run_success",
            Self::RunFailure { .. } => "run_failure",
            Self::StepStart => "step_start",
            Self::StepSuccess { .. } => "step_success",
            Self::StepFailure { .. } => "step_failure",
            Self::StepSkipped { .. } => "step_skipped",
            Self::AssetMaterialization { .. } => "asset_materialization",
            Self::AssetCheckEvaluation { .. } => "asset_check_evaluation",
            Self::LogMessage { .. } => "log_message",
        }
    }
}

/// A single entry in a run's event log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunEvent {
    pub run_id: Uuid,
    pub job_name: String,
    /// Step the event belongs to; `None` for run-level events
    pub step_key: Option<String>,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub event_type: RunEventType,
}

impl RunEvent {
    pub fn is_step_event(&self) -> bool {
        self.step_key.is_some()
    }
}

/// Broadcast publisher for run events
#[derive(Debug, Clone)]
pub struct EventPublisher {
    sender: broadcast::Sender<RunEvent>,
}

impl EventPublisher {
    /// Create a new event publisher with the specified channel capacity
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publish an event; having no subscribers is not an error
    pub fn publish(&self, event: RunEvent) {
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RunEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventPublisher {
    fn default() -> Self {
        Self::new(1000)
    }
}

/// Append-only event log shared by the executor and asset contexts of one run
#[derive(Debug, Clone)]
pub struct EventLog {
    run_id: Uuid,
    job_name: String,
    events: Arc<Mutex<Vec<RunEvent>>>,
    publisher: EventPublisher,
}

impl EventLog {
    pub fn new(run_id: Uuid, job_name: impl Into<String>, publisher: EventPublisher) -> Self {
        Self {
            run_id,
            job_name: job_name.into(),
            events: Arc::new(Mutex::new(Vec::new())),
            publisher,
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn job_name(&self) -> &str {
        &self.job_name
    }

    pub fn record(
        &self,
        step_key: Option<&str>,
        event_type: RunEventType,
        message: impl Into<String>,
    ) -> RunEvent {
        let event = RunEvent {
            run_id: self.run_id,
            job_name: self.job_name.clone(),
            step_key: step_key.map(str::to_string),
            message: message.into(),
            timestamp: Utc::now(),
            event_type,
        };
        self.events.lock().push(event.clone());
        self.publisher.publish(event.clone());
        event
    }

    pub fn snapshot(&self) -> Vec<RunEvent> {
        self.events.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }
}
