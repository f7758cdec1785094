//! Cache backends: the key/value contract and the bundled implementations.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use conveyor_digest::DigestEngine;
use serde::{Deserialize, Serialize};

use crate::error::CacheError;

/// Magic bytes identifying a Conveyor cache artifact.
const ARTIFACT_MAGIC: [u8; 4] = *b"CNVY";

/// Current artifact format version. Increment on breaking changes to the
/// header or payload format.
const ARTIFACT_FORMAT_VERSION: u32 = 1;

/// The backend key/value contract.
///
/// Backends must support concurrent `get`/`set` from multiple workers.
/// Setting the same key twice with different values is undefined behavior:
/// callers must guarantee the generator for a given key is referentially
/// transparent.
pub trait Backend: Send + Sync {
    /// Returns the stored value, or `None` on a miss.
    fn get(&self, key: &str) -> Option<Vec<u8>>;

    /// Stores a value under the key.
    fn set(&self, key: &str, value: &[u8]) -> Result<(), CacheError>;
}

/// In-process backend backed by a hash map.
#[derive(Default)]
pub struct MemoryBackend {
    entries: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryBackend {
    /// Creates an empty in-memory backend.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Backend for MemoryBackend {
    fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.entries
            .lock()
            .expect("memory backend lock poisoned")
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<(), CacheError> {
        self.entries
            .lock()
            .expect("memory backend lock poisoned")
            .insert(key.to_string(), value.to_vec());
        Ok(())
    }
}

/// Backend that stores nothing: every read misses, every write is dropped.
#[derive(Default)]
pub struct NullBackend;

impl NullBackend {
    /// Creates the null backend.
    pub fn new() -> Self {
        Self
    }
}

impl Backend for NullBackend {
    fn get(&self, _key: &str) -> Option<Vec<u8>> {
        None
    }

    fn set(&self, _key: &str, _value: &[u8]) -> Result<(), CacheError> {
        Ok(())
    }
}

/// Header prepended to every on-disk artifact for validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ArtifactHeader {
    /// Magic bytes: must be `b"CNVY"`.
    magic: [u8; 4],

    /// Artifact format version.
    format_version: u32,

    /// Hex digest of the payload for integrity checks.
    checksum: String,
}

/// Filesystem backend storing one validated binary file per key.
///
/// Keys are arbitrary strings, so each is digested into a fixed-width hex
/// name and sharded into a two-character subdirectory. Reads are fail-safe:
/// a missing file, bad magic, version mismatch, or checksum failure is a
/// cache miss, never an error.
pub struct FsBackend {
    root: PathBuf,
    engine: DigestEngine,
}

impl FsBackend {
    /// Creates a filesystem backend rooted at the given directory.
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            engine: DigestEngine::default(),
        }
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        let name = self.engine.digest_bytes(key.as_bytes()).to_hex();
        self.root.join(&name[..2]).join(format!("{name}.bin"))
    }
}

impl Backend for FsBackend {
    fn get(&self, key: &str) -> Option<Vec<u8>> {
        let raw = std::fs::read(self.entry_path(key)).ok()?;

        // 4-byte header length, then the bincode header, then the payload.
        if raw.len() < 4 {
            return None;
        }
        let header_len = u32::from_le_bytes(raw[..4].try_into().ok()?) as usize;
        if raw.len() < 4 + header_len {
            return None;
        }

        let header: ArtifactHeader =
            bincode::serde::decode_from_slice(&raw[4..4 + header_len], bincode::config::standard())
                .ok()?
                .0;
        if header.magic != ARTIFACT_MAGIC || header.format_version != ARTIFACT_FORMAT_VERSION {
            return None;
        }

        let payload = &raw[4 + header_len..];
        if self.engine.digest_bytes(payload).to_hex() != header.checksum {
            return None;
        }
        Some(payload.to_vec())
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<(), CacheError> {
        let path = self.entry_path(key);
        let dir = path.parent().expect("entry path always has a shard parent");
        std::fs::create_dir_all(dir).map_err(|e| CacheError::Io {
            path: dir.to_path_buf(),
            source: e,
        })?;

        let header = ArtifactHeader {
            magic: ARTIFACT_MAGIC,
            format_version: ARTIFACT_FORMAT_VERSION,
            checksum: self.engine.digest_bytes(value).to_hex(),
        };
        let header_bytes = bincode::serde::encode_to_vec(&header, bincode::config::standard())
            .map_err(|e| CacheError::Serialization {
                reason: e.to_string(),
            })?;

        let mut output = Vec::with_capacity(4 + header_bytes.len() + value.len());
        output.extend_from_slice(&(header_bytes.len() as u32).to_le_bytes());
        output.extend_from_slice(&header_bytes);
        output.extend_from_slice(value);

        std::fs::write(&path, &output).map_err(|e| CacheError::Io { path, source: e })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_backend_roundtrip() {
        let backend = MemoryBackend::new();
        assert!(backend.get("k").is_none());
        backend.set("k", b"value").unwrap();
        assert_eq!(backend.get("k").unwrap(), b"value");
    }

    #[test]
    fn null_backend_always_misses() {
        let backend = NullBackend::new();
        backend.set("k", b"value").unwrap();
        assert!(backend.get("k").is_none());
    }

    #[test]
    fn fs_backend_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FsBackend::new(dir.path());
        backend.set("asset:file:///srv/app.js", b"payload").unwrap();
        assert_eq!(backend.get("asset:file:///srv/app.js").unwrap(), b"payload");
    }

    #[test]
    fn fs_backend_missing_key_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FsBackend::new(dir.path());
        assert!(backend.get("nope").is_none());
    }

    #[test]
    fn fs_backend_corrupt_file_is_a_miss() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FsBackend::new(dir.path());
        backend.set("k", b"payload").unwrap();

        let path = backend.entry_path("k");
        std::fs::write(&path, b"garbage").unwrap();
        assert!(backend.get("k").is_none());
    }

    #[test]
    fn fs_backend_tampered_payload_is_a_miss() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FsBackend::new(dir.path());
        backend.set("k", b"payload").unwrap();

        let path = backend.entry_path("k");
        let mut raw = std::fs::read(&path).unwrap();
        let len = raw.len();
        raw[len - 1] ^= 0xff;
        std::fs::write(&path, &raw).unwrap();
        assert!(backend.get("k").is_none());
    }

    #[test]
    fn fs_backend_keys_with_unsafe_characters() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FsBackend::new(dir.path());
        let key = "dep-graph:file:///srv/a b/caf\u{00e9}.js?type=text/css";
        backend.set(key, b"x").unwrap();
        assert_eq!(backend.get(key).unwrap(), b"x");
    }
}
