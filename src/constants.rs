//! Shared names used across the crate.

/// Resource key `build_sling_asset` expects unless told otherwise
pub const DEFAULT_SLING_RESOURCE_KEY: &str = "sling_resource";

/// Compute kind recorded on sling-backed assets
pub const SLING_COMPUTE_KIND: &str = "sling";

/// Environment variables read by the crate or handed to child processes
pub mod env {
    /// Deployment environment (development, test, production)
    pub const ENVIRONMENT: &str = "TASKER_ELT_ENV";

    /// `json` switches log output to JSON lines
    pub const LOG_FORMAT: &str = "TASKER_ELT_LOG_FORMAT";

    pub const SLING_EXECUTABLE: &str = "TASKER_ELT_SLING_EXECUTABLE";

    pub const SLING_TIMEOUT_SECONDS: &str = "TASKER_ELT_SLING_TIMEOUT_SECONDS";

    pub const EVENT_CHANNEL_CAPACITY: &str = "TASKER_ELT_EVENT_CHANNEL_CAPACITY";

    /// Prefix for layered overrides read by the `config` crate, e.g. `TASKER_ELT__SLING__EXECUTABLE`
    pub const CONFIG_PREFIX: &str = "TASKER_ELT";

    /// Per-session variable holding the source connection JSON; session id is appended
    pub const SOURCE_CONNECTION_PREFIX: &str = "TASKER_ELT_SOURCE_";

    /// Per-session variable holding the target connection JSON; session id is appended
    pub const TARGET_CONNECTION_PREFIX: &str = "TASKER_ELT_TARGET_";

    /// Run id exposed to the child process
    pub const RUN_ID: &str = "TASKER_ELT_RUN_ID";

    /// JSON-encoded pipes extras exposed to the child process
    pub const PIPES_EXTRAS: &str = "TASKER_ELT_PIPES_EXTRAS";
}
