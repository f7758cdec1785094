//! The cache store: a uniform fetch/get/set contract over pluggable
//! backends, plus the dependency-graph cache-validation protocol.
//!
//! Cached values are only ever trusted through content digests, never file
//! modification times: an entry is valid iff re-digesting every recorded
//! dependency reproduces the digest stored with it.

#![warn(missing_docs)]

pub mod backend;
pub mod depgraph;
pub mod error;
pub mod store;

pub use backend::{Backend, FsBackend, MemoryBackend, NullBackend};
pub use depgraph::{DepGraphCache, DepGraphEntry};
pub use error::CacheError;
pub use store::CacheStore;
