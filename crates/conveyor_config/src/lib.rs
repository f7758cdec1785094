//! Parsing and validation of `conveyor.toml` pipeline configuration files.
//!
//! This crate reads the pipeline configuration file and produces a
//! strongly-typed [`PipelineConfig`]: load paths, the pipeline version
//! string, cache settings, and the digest algorithm.

#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod types;

pub use error::ConfigError;
pub use loader::{load_config, load_config_from_str};
pub use types::*;
