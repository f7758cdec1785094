//! Deterministic hashing of structured values, files, and directories.
//!
//! Every cache key and asset identity in the pipeline bottoms out here. The
//! engine guarantees that structurally equal values hash identically no matter
//! what order they were built in, on any machine, in any process.

#![warn(missing_docs)]

pub mod digest;
pub mod engine;
pub mod error;
pub mod value;

pub use digest::{AlgorithmName, Digest, HashAlgorithm};
pub use engine::DigestEngine;
pub use error::DigestError;
pub use value::DigestValue;
