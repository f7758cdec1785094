//! Cache-dependency tokens recorded in an asset's dependency set.
//!
//! A dependency is either the content/listing digest of a path on disk
//! (`file-digest:<path>`) or an opaque token such as an environment version
//! string. Tokens are resolved to digests only at cache-validation time and
//! are never cached as assets themselves.

use std::fmt;
use std::path::{Path, PathBuf};

/// One entry of an asset's cache-dependency set.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CacheDependency {
    /// The digest of a file's bytes, or of a directory's sorted entry names.
    FileDigest(PathBuf),

    /// An opaque token whose digest is the digest of the token string itself,
    /// e.g. `env-version:1.4.0`.
    Opaque(String),
}

impl CacheDependency {
    /// Creates a file-digest dependency on the given path.
    pub fn file_digest(path: impl Into<PathBuf>) -> Self {
        Self::FileDigest(path.into())
    }

    /// Parses a dependency token from its string form.
    ///
    /// Anything without the `file-digest:` prefix is treated as opaque.
    pub fn parse(token: &str) -> Self {
        match token.strip_prefix("file-digest:") {
            Some(path) => Self::FileDigest(PathBuf::from(path)),
            None => Self::Opaque(token.to_string()),
        }
    }

    /// The file path this dependency tracks, if it is a file digest.
    pub fn as_path(&self) -> Option<&Path> {
        match self {
            Self::FileDigest(path) => Some(path),
            Self::Opaque(_) => None,
        }
    }
}

impl fmt::Display for CacheDependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FileDigest(path) => write!(f, "file-digest:{}", path.display()),
            Self::Opaque(token) => f.write_str(token),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_digest_roundtrip() {
        let dep = CacheDependency::file_digest("/srv/assets/app.js");
        let text = dep.to_string();
        assert_eq!(text, "file-digest:/srv/assets/app.js");
        assert_eq!(CacheDependency::parse(&text), dep);
    }

    #[test]
    fn opaque_token_roundtrip() {
        let dep = CacheDependency::parse("env-version:1.4.0");
        assert_eq!(dep, CacheDependency::Opaque("env-version:1.4.0".into()));
        assert_eq!(dep.to_string(), "env-version:1.4.0");
    }

    #[test]
    fn as_path_only_for_file_digests() {
        assert!(CacheDependency::file_digest("/a").as_path().is_some());
        assert!(CacheDependency::parse("env-version:1").as_path().is_none());
    }
}
