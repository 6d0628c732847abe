//! # Sling Integration
//!
//! Embedded ELT through the external `sling` CLI.
//!
//! - [`SlingResource`] pairs a source and target connection and runs
//!   replications as child processes.
//! - [`build_sling_asset`] turns an [`AssetSpec`](crate::assets::AssetSpec)
//!   into an asset whose materialization is one replication.
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
//! # async fn example() -> tasker_elt::Result<()> {
//! let sling_resource = SlingResource::new(
//!     SlingSourceConnection::new("file"),
//!     SlingTargetConnection::new("sqlite").with_connection_string("sqlite:///tmp/sqlite.db"),
//! );
//!
//! let asset = build_sling_asset(
//!     AssetSpec::new(["main", "tbl"]).with_group_name("etl").with_dep("foo"),
//!     SlingAssetOptions::new("file:///data/test.csv", "main.tbl")
//!         .mode(SlingMode::Incremental)
//!         .primary_key(["SPECIES_CODE"]),
//! )?;
//!
//! let job = build_assets_job(
//!     "sling_job",
//!     vec![asset],
//!     ResourceDefinitions::new().with_resource("sling_resource", sling_resource),
//! )?;
//! let result = job.execute_in_process().await?;
//! assert!(result.success());
//! # Ok(())
//! # }
//! ```

pub mod asset;
pub mod connection;
pub mod mode;
pub mod output;
pub mod replication;
pub mod resource;

pub use asset::{build_sling_asset, SlingAssetOptions};
pub use connection::{SlingSourceConnection, SlingTargetConnection};
pub use mode::SlingMode;
pub use replication::ReplicationRequest;
pub use resource::{OutputLine, OutputStream, SlingInvocation, SlingResource, SyncSummary};
