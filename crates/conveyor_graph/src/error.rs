//! Error types for directive parsing and bundling.

use std::path::PathBuf;

/// Errors that can occur while parsing directives or ordering a bundle.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    /// A directive name has no handler in the directive table.
    ///
    /// Unknown directives are rejected when the header is parsed, not when
    /// the directive would run.
    #[error("unknown directive '{name}' on line {line}")]
    UnknownDirective {
        /// The unrecognized directive name.
        name: String,
        /// One-based source line of the directive.
        line: usize,
    },

    /// A directive is missing its required argument.
    #[error("directive '{name}' on line {line} requires an argument")]
    MissingArgument {
        /// The directive name.
        name: String,
        /// One-based source line of the directive.
        line: usize,
    },

    /// A file transitively requires itself before its evaluation closes.
    #[error("circular dependency: {0} is required while still being processed")]
    CircularDependency(PathBuf),

    /// An I/O error occurred while expanding a directory require.
    #[error("directive I/O error at {path}: {source}")]
    Io {
        /// The path that caused the error.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },
}
