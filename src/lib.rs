#![allow(clippy::doc_markdown)] // Allow technical terms like SQLite, YAML in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Tasker ELT
//!
//! Asset-oriented orchestration of embedded ELT replications.
//!
//! ## Overview
//!
//! Tables produced by an extract-load tool are modelled as **assets**. Each
//! asset is declared with an [`AssetSpec`](assets::AssetSpec), bound to a
//! replication through the external `sling` CLI with
//! [`build_sling_asset`](sling::build_sling_asset), and collected into a
//! **job** with the **resources** it needs. Executing the job runs every
//! replication, upstream before downstream, and returns a result with the
//! run's success flag, materializations and event log.
//!
//! Data movement itself (incremental merges, connector protocols, SQLite
//! writes) stays inside the external tool; this crate owns configuration,
//! invocation, ordering and reporting.
//!
//! ## Module Organization
//!
//! - [`assets`] - Asset keys, specs, definitions and materialization results
//! - [`sling`] - Sling connections, resource wrapper and asset builder
//! - [`job`] - Job building, asset graph validation and in-process execution
//! - [`execution`] - Run context, events and results
//! - [`pipes`] - Results reported back from external processes
//! - [`resources`] - Named resources shared with asset computations
//! - [`config`] - Runtime settings and declarative YAML jobs
//! - [`logging`] - Structured logging setup
//! - [`error`] - Structured error handling
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use tasker_elt::assets::AssetSpec;
//! use tasker_elt::job::build_assets_job;
//! use tasker_elt::resources::ResourceDefinitions;
//! use tasker_elt::sling::{
//!     build_sling_asset, SlingAssetOptions, SlingMode, SlingResource, SlingSourceConnection,
//!     SlingTargetConnection,
//! };
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! tasker_elt::logging::init_structured_logging();
//!
//! let sling_resource = SlingResource::new(
//!     SlingSourceConnection::new("file"),
//!     SlingTargetConnection::new("sqlite").with_connection_string("sqlite:///tmp/sqlite.db"),
//! );
//!
//! let asset_spec = AssetSpec::new(["main", "tbl"])
//!     .with_group_name("etl")
//!     .with_description("ETL Test")
//!     .with_dep("foo");
//!
//! let asset_def = build_sling_asset(
//!     asset_spec,
//!     SlingAssetOptions::new("file:///data/test.csv", "main.tbl")
//!         .mode(SlingMode::Incremental)
//!         .primary_key(["SPECIES_CODE"]),
//! )?;
//!
//! let sling_job = build_assets_job(
//!     "sling_job",
//!     vec![asset_def],
//!     ResourceDefinitions::new().with_resource("sling_resource", sling_resource),
//! )?;
//!
//! let result = sling_job.execute_in_process().await?;
//! assert!(result.success());
//! # Ok(())
//! # }
//! ```

pub mod assets;
pub mod config;
pub mod constants;
pub mod error;
pub mod execution;
pub mod job;
pub mod logging;
pub mod pipes;
pub mod resources;
pub mod sling;

pub use assets::{AssetKey, AssetSpec, AssetsDefinition, MaterializeResult};
pub use config::{EltConfig, SlingJobSpec};
pub use error::{EltError, Result};
pub use execution::{ExecuteInProcessResult, RunStatus};
pub use job::{build_assets_job, ExecuteOptions, JobDefinition};
pub use resources::ResourceDefinitions;
pub use sling::{
    build_sling_asset, SlingAssetOptions, SlingMode, SlingResource, SlingSourceConnection,
    SlingTargetConnection,
};
