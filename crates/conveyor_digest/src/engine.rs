//! The digest engine: hashes structured values, file contents, and
//! directory listings.

use std::path::{Path, PathBuf};

use rayon::prelude::*;

use crate::digest::{Digest, HashAlgorithm};
use crate::error::DigestError;
use crate::value::DigestValue;

/// Deterministic hashing over a selected algorithm.
///
/// The same engine configuration produces identical digests for identical
/// inputs regardless of machine, process, or call order. There is no hidden
/// mutable state: an engine is a plain value and cheap to copy.
#[derive(Debug, Clone, Copy, Default)]
pub struct DigestEngine {
    algorithm: HashAlgorithm,
}

impl DigestEngine {
    /// Creates an engine using the given hash algorithm.
    pub fn new(algorithm: HashAlgorithm) -> Self {
        Self { algorithm }
    }

    /// The algorithm this engine hashes with.
    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// Hashes a structured value via its canonical token stream.
    pub fn digest(&self, value: &DigestValue) -> Digest {
        let mut tokens = Vec::new();
        value.write_tokens(&mut tokens);
        self.digest_bytes(&tokens)
    }

    /// Hashes raw bytes with no token framing.
    pub fn digest_bytes(&self, data: &[u8]) -> Digest {
        let mut hasher = self.algorithm.hasher();
        hasher.update(data);
        hasher.finalize()
    }

    /// Digests a path.
    ///
    /// A regular file digests its raw bytes. A directory digests the sorted
    /// list of its immediate entry names — intentionally shallow: a change
    /// two levels deep is invisible unless the nested file is tracked as its
    /// own dependency. Several call sites rely on directory digests being
    /// cheap, so this does not recurse.
    pub fn file_digest(&self, path: &Path) -> Result<Digest, DigestError> {
        let meta = std::fs::metadata(path).map_err(|e| DigestError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        if meta.is_file() {
            let content = std::fs::read(path).map_err(|e| DigestError::Io {
                path: path.to_path_buf(),
                source: e,
            })?;
            Ok(self.digest_bytes(&content))
        } else if meta.is_dir() {
            let mut names: Vec<String> = std::fs::read_dir(path)
                .map_err(|e| DigestError::Io {
                    path: path.to_path_buf(),
                    source: e,
                })?
                .filter_map(|entry| entry.ok())
                .map(|entry| entry.file_name().to_string_lossy().into_owned())
                .collect();
            names.sort();
            let listing = DigestValue::Seq(names.into_iter().map(DigestValue::Str).collect());
            Ok(self.digest(&listing))
        } else {
            Err(DigestError::UnsupportedFileType {
                path: path.to_path_buf(),
            })
        }
    }

    /// Digests an ordered list of paths.
    ///
    /// Per-path digests are computed in parallel but always combined in the
    /// given input order, never completion order, so the result stays
    /// deterministic.
    pub fn files_digest(&self, paths: &[PathBuf]) -> Result<Digest, DigestError> {
        let digests: Vec<Digest> = paths
            .par_iter()
            .map(|path| self.file_digest(path))
            .collect::<Result<Vec<_>, _>>()?;
        let value = DigestValue::Seq(
            digests
                .into_iter()
                .map(|d| DigestValue::Bytes(d.as_bytes().to_vec()))
                .collect(),
        );
        Ok(self.digest(&value))
    }
}
