//! Content encodings applied to finished asset bytes.
//!
//! Encodings are distinct from charsets: they wrap the final byte stream
//! (the `encoding` asset URI parameter), so they run after the text
//! pipeline, not inside it.

use std::io::Write;

use flate2::write::GzEncoder;
use flate2::Compression;

use crate::error::PipelineError;

/// Applies a named content encoding to asset bytes.
///
/// `identity` (or no encoding) returns the input unchanged; `gzip`
/// compresses with a fixed compression level so output bytes are stable
/// across builds.
pub fn encode(encoding: &str, data: &[u8]) -> Result<Vec<u8>, PipelineError> {
    match encoding {
        "identity" => Ok(data.to_vec()),
        "gzip" => gzip(data),
        other => Err(PipelineError::Encoding {
            encoding: other.to_string(),
            reason: "unsupported encoding".to_string(),
        }),
    }
}

fn gzip(data: &[u8]) -> Result<Vec<u8>, PipelineError> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(data)
        .and_then(|_| encoder.finish())
        .map_err(|e| PipelineError::Encoding {
            encoding: "gzip".to_string(),
            reason: e.to_string(),
        })
}
