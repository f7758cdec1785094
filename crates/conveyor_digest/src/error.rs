//! Error types for digest computation.

use std::path::PathBuf;

/// Errors that can occur while computing digests.
#[derive(Debug, thiserror::Error)]
pub enum DigestError {
    /// An I/O error occurred while reading a file or directory listing.
    #[error("digest I/O error at {path}: {source}")]
    Io {
        /// The path that caused the error.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// A value cannot be hashed with a stable representation.
    ///
    /// Hashing fails fast instead of silently producing an unstable digest.
    #[error("cannot digest unsupported value: {0}")]
    UnsupportedValue(String),

    /// The path is neither a regular file nor a directory.
    #[error("cannot digest {path}: not a regular file or directory")]
    UnsupportedFileType {
        /// The offending path.
        path: PathBuf,
    },
}
