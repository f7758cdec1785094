//! The canonical asset identity URI.
//!
//! Every asset build result is named by an [`AssetUri`]: an absolute source
//! filename plus the parameters that select a particular build variant
//! (target content type, named pipeline, content encoding, pinned content id).
//! Two URIs that differ only in `id` denote different historical versions of
//! the same logical asset.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::escape;

/// Errors produced while parsing an asset URI string.
#[derive(Debug, thiserror::Error)]
pub enum UriError {
    /// The string does not start with the `file://` scheme.
    #[error("asset URI must use the file:// scheme: {0}")]
    MissingScheme(String),

    /// A percent escape was malformed or decoded to invalid UTF-8.
    #[error("invalid percent escape in {0}")]
    InvalidEscape(String),

    /// The query string contained a parameter this pipeline does not know.
    #[error("unknown asset URI parameter '{0}'")]
    UnknownParam(String),
}

/// Identity of one asset build variant.
///
/// The string form is `file://<percent-escaped-path>?<key>=<value>&...`.
/// Boolean parameters serialize as bare keys with no value. Parameters are
/// written in a fixed order so the string form is stable and safe to digest.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssetUri {
    /// Absolute path of the source file.
    pub filename: PathBuf,

    /// Requested target content type, e.g. `application/javascript`.
    pub content_type: Option<String>,

    /// Named pipeline variant, e.g. `self` for an unbundled build.
    pub pipeline: Option<String>,

    /// Content encoding such as `gzip`. Distinct from a charset.
    pub encoding: Option<String>,

    /// Skip require-directive bundling for this build.
    pub skip_bundle: bool,

    /// Logical-path alias recorded when the file resolved through `index.*`.
    pub index_alias: Option<String>,

    /// Pinned content id. When set, a build whose freshly computed id
    /// differs must fail rather than silently serve different content.
    pub id: Option<String>,
}

impl AssetUri {
    /// Creates a URI for the given source file with no parameters set.
    pub fn from_filename(filename: impl Into<PathBuf>) -> Self {
        Self {
            filename: filename.into(),
            content_type: None,
            pipeline: None,
            encoding: None,
            skip_bundle: false,
            index_alias: None,
            id: None,
        }
    }

    /// Returns a copy with the target content type set.
    pub fn with_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Returns a copy with the pipeline variant set.
    pub fn with_pipeline(mut self, pipeline: impl Into<String>) -> Self {
        self.pipeline = Some(pipeline.into());
        self
    }

    /// Returns a copy with the content id pinned.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Returns a copy with the pinned id cleared.
    pub fn without_id(mut self) -> Self {
        self.id = None;
        self
    }

    /// The source filename as a path.
    pub fn path(&self) -> &Path {
        &self.filename
    }

    /// Parses the string form of an asset URI.
    pub fn parse(input: &str) -> Result<Self, UriError> {
        let rest = input
            .strip_prefix("file://")
            .ok_or_else(|| UriError::MissingScheme(input.to_string()))?;

        let (raw_path, raw_query) = match rest.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (rest, None),
        };

        let mut uri = Self::from_filename(escape::unescape(raw_path)?);

        if let Some(query) = raw_query {
            for pair in query.split('&').filter(|p| !p.is_empty()) {
                let (key, value) = match pair.split_once('=') {
                    Some((key, value)) => (key, Some(escape::unescape(value)?)),
                    None => (pair, None),
                };
                match (key, value) {
                    ("type", Some(v)) => uri.content_type = Some(v),
                    ("pipeline", Some(v)) => uri.pipeline = Some(v),
                    ("encoding", Some(v)) => uri.encoding = Some(v),
                    ("index_alias", Some(v)) => uri.index_alias = Some(v),
                    ("id", Some(v)) => uri.id = Some(v),
                    ("skip_bundle", None) => uri.skip_bundle = true,
                    _ => return Err(UriError::UnknownParam(key.to_string())),
                }
            }
        }

        Ok(uri)
    }
}

impl fmt::Display for AssetUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "file://{}",
            escape::escape_path(&self.filename.to_string_lossy())
        )?;

        let mut sep = '?';
        let mut param = |f: &mut fmt::Formatter<'_>, text: String| {
            let result = write!(f, "{sep}{text}");
            sep = '&';
            result
        };

        if let Some(t) = &self.content_type {
            param(f, format!("type={}", escape::escape_query(t)))?;
        }
        if let Some(p) = &self.pipeline {
            param(f, format!("pipeline={}", escape::escape_query(p)))?;
        }
        if let Some(e) = &self.encoding {
            param(f, format!("encoding={}", escape::escape_query(e)))?;
        }
        if self.skip_bundle {
            param(f, "skip_bundle".to_string())?;
        }
        if let Some(a) = &self.index_alias {
            param(f, format!("index_alias={}", escape::escape_query(a)))?;
        }
        if let Some(id) = &self.id {
            param(f, format!("id={}", escape::escape_query(id)))?;
        }
        Ok(())
    }
}

impl FromStr for AssetUri {
    type Err = UriError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_bare_filename() {
        let uri = AssetUri::parse("file:///srv/assets/app.js").unwrap();
        assert_eq!(uri.filename, PathBuf::from("/srv/assets/app.js"));
        assert!(uri.content_type.is_none());
        assert!(!uri.skip_bundle);
    }

    #[test]
    fn parse_full_query() {
        let uri = AssetUri::parse(
            "file:///srv/assets/app.js?type=application/javascript&pipeline=self&encoding=gzip&skip_bundle&id=abc123",
        )
        .unwrap();
        assert_eq!(uri.content_type.as_deref(), Some("application/javascript"));
        assert_eq!(uri.pipeline.as_deref(), Some("self"));
        assert_eq!(uri.encoding.as_deref(), Some("gzip"));
        assert!(uri.skip_bundle);
        assert_eq!(uri.id.as_deref(), Some("abc123"));
    }

    #[test]
    fn display_roundtrip() {
        let uri = AssetUri::from_filename("/srv/assets/app.js")
            .with_type("application/javascript")
            .with_id("deadbeef");
        let text = uri.to_string();
        assert_eq!(AssetUri::parse(&text).unwrap(), uri);
    }

    #[test]
    fn boolean_param_serializes_bare() {
        let mut uri = AssetUri::from_filename("/a/b.js");
        uri.skip_bundle = true;
        assert_eq!(uri.to_string(), "file:///a/b.js?skip_bundle");
    }

    #[test]
    fn path_escaping_roundtrip() {
        let uri = AssetUri::from_filename("/srv/my assets/caf\u{00e9}.js");
        let text = uri.to_string();
        assert!(!text.contains(' '));
        assert_eq!(AssetUri::parse(&text).unwrap(), uri);
    }

    #[test]
    fn unknown_param_is_rejected() {
        let err = AssetUri::parse("file:///a.js?bogus=1").unwrap_err();
        assert!(matches!(err, UriError::UnknownParam(name) if name == "bogus"));
    }

    #[test]
    fn missing_scheme_is_rejected() {
        assert!(AssetUri::parse("/srv/assets/app.js").is_err());
    }

    #[test]
    fn same_file_different_id_are_distinct() {
        let a = AssetUri::from_filename("/a.js").with_id("one");
        let b = AssetUri::from_filename("/a.js").with_id("two");
        assert_ne!(a, b);
        assert_eq!(a.clone().without_id(), b.without_id());
    }
}
