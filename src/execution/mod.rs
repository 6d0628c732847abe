//! # Execution
//!
//! Run-scoped state shared between the job executor and asset computations:
//! the [`AssetExecutionContext`] handed to each step, the run's event log,
//! run and step states, and the [`ExecuteInProcessResult`] returned to callers.

pub mod context;
pub mod events;
pub mod result;
pub mod states;

pub use context::AssetExecutionContext;
pub use events::{EventLog, EventPublisher, LogLevel, RunEvent, RunEventType};
pub use result::ExecuteInProcessResult;
pub use states::{RunStatus, StepState};
