//! The build-level error taxonomy.
//!
//! Every stage of a build funnels its failures into [`BuildError`], so
//! callers match on one enum regardless of which crate raised the problem.

use std::path::PathBuf;

use conveyor_cache::CacheError;
use conveyor_common::UriError;
use conveyor_digest::DigestError;
use conveyor_graph::GraphError;
use conveyor_pipeline::PipelineError;
use conveyor_resolve::ResolveError;

/// Errors that can occur while building an asset.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// Logical-path resolution failed.
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// A processor stage or transformer lookup failed.
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    /// Directive parsing or bundle linearization failed.
    #[error(transparent)]
    Graph(#[from] GraphError),

    /// A file or directory could not be digested.
    #[error(transparent)]
    Digest(#[from] DigestError),

    /// A cache write failed.
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// An asset URI string could not be parsed.
    #[error(transparent)]
    Uri(#[from] UriError),

    /// An I/O error occurred while reading a source file.
    #[error("failed to read {path}: {source}")]
    Io {
        /// The path that could not be read.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// A required file's content type does not match the bundle's.
    #[error("{path} has content type {found}, expected {expected}")]
    ContentTypeMismatch {
        /// The offending file.
        path: PathBuf,
        /// The bundle's content type.
        expected: String,
        /// The file's actual content type.
        found: String,
    },

    /// A build pinned to a content id produced different content.
    ///
    /// The pinned version no longer exists; serving the freshly built
    /// content under the old id would be silent corruption.
    #[error("content id {id} not found for {uri}")]
    VersionNotFound {
        /// The requested asset URI.
        uri: String,
        /// The pinned id that could not be reproduced.
        id: String,
    },
}
