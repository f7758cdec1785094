//! Error types for path resolution.

use std::path::PathBuf;

/// Errors that can occur while resolving a logical path.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    /// No candidate file matched the logical path and accept list.
    #[error("could not find file '{0}'")]
    FileNotFound(String),

    /// An absolute path was requested that is not contained in any load path.
    #[error("file {0} is outside the configured load paths")]
    FileOutsidePaths(PathBuf),

    /// An I/O error occurred while listing a directory.
    #[error("resolution I/O error at {path}: {source}")]
    Io {
        /// The path that caused the error.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_display() {
        let err = ResolveError::FileNotFound("app.js".to_string());
        assert_eq!(err.to_string(), "could not find file 'app.js'");
    }

    #[test]
    fn outside_paths_display() {
        let err = ResolveError::FileOutsidePaths(PathBuf::from("/etc/passwd"));
        assert!(err.to_string().contains("/etc/passwd"));
        assert!(err.to_string().contains("outside"));
    }
}
