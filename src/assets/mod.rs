//! # Assets
//!
//! Keys, specs and definitions for the tables a job produces.
//!
//! An [`AssetSpec`] describes an asset declaratively; an [`AssetsDefinition`]
//! binds one or more specs to the [`AssetCompute`] that materializes them and
//! names the resources that computation needs.

pub mod asset_key;
pub mod asset_spec;
pub mod definition;
pub mod result;

pub use asset_key::AssetKey;
pub use asset_spec::{AssetSpec, DEFAULT_GROUP_NAME};
pub use definition::{AssetCompute, AssetsDefinition, FnCompute};
pub use result::{
    AssetCheckResult, AssetCheckSeverity, MaterializeResult, Metadata, MetadataValue,
};
