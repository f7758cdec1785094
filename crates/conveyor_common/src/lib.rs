//! Shared foundational types used across the Conveyor asset pipeline.
//!
//! This crate provides the canonical asset identity URI, cache-dependency
//! tokens, and the percent-escaping helpers both are built on.

#![warn(missing_docs)]

pub mod dependency;
pub mod escape;
pub mod uri;

pub use dependency::CacheDependency;
pub use uri::{AssetUri, UriError};
