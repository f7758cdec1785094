//! Build orchestration: the frozen environment, the per-session asset
//! builder, and the finished asset record.
//!
//! An [`Environment`] snapshots load paths, registries, the version string,
//! and the cache. An [`AssetBuilder`] session runs builds against that
//! snapshot: dependency-graph cache probe, resolution, per-file processing,
//! require bundling, digesting, and storage.

#![warn(missing_docs)]

pub mod asset;
pub mod environment;
pub mod error;
pub mod loader;

pub use asset::Asset;
pub use environment::{Environment, EnvironmentBuilder};
pub use error::BuildError;
pub use loader::AssetBuilder;
