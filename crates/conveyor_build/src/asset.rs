//! The finished asset record.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// One fully built asset.
///
/// Assets are immutable snapshots: every field is computed during the build
/// and never changes afterward. The record is what the cache stores and what
/// callers receive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    /// Fully resolved asset URI string, id included.
    pub uri: String,

    /// Absolute path of the source file.
    pub filename: PathBuf,

    /// Logical path relative to the load path, engine extensions removed,
    /// e.g. `lib/app.js` for `lib/app.coffee`.
    pub logical_path: String,

    /// Content type of the built content.
    pub content_type: Option<String>,

    /// The built content. Bytes, not text: an `encoding=gzip` build is
    /// binary.
    pub source: Vec<u8>,

    /// Hex digest of the built content.
    pub digest: String,

    /// Content id: hex digest over the content, the processor cache keys,
    /// and every dependency digest. Two equal ids mean byte-identical
    /// builds.
    pub id: String,

    /// `ni:` integrity URI for subresource integrity checks.
    pub integrity: Option<String>,

    /// Cache-dependency tokens recorded during the build, in first-recorded
    /// order.
    pub dependencies: Vec<String>,

    /// Extra metadata left behind by processors.
    pub metadata: BTreeMap<String, serde_json::Value>,
}

impl Asset {
    /// The built content as UTF-8 text.
    ///
    /// Only meaningful for identity-encoded assets; a gzip build is not
    /// valid UTF-8.
    pub fn source_str(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.source)
    }

    /// The content length in bytes.
    pub fn len(&self) -> usize {
        self.source.len()
    }

    /// Returns `true` if the built content is empty.
    pub fn is_empty(&self) -> bool {
        self.source.is_empty()
    }

    /// The logical path with the content id spliced in before the format
    /// extension: `app.js` becomes `app-<id>.js`.
    pub fn digest_path(&self) -> String {
        let path = Path::new(&self.logical_path);
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) => {
                let stem = &self.logical_path[..self.logical_path.len() - ext.len() - 1];
                format!("{stem}-{}.{ext}", self.id)
            }
            None => format!("{}-{}", self.logical_path, self.id),
        }
    }
}
