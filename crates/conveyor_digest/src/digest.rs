//! Digest bytes, the selectable hash algorithm, and derived encodings.

use std::fmt;

use base64::Engine as _;
use serde::{Deserialize, Serialize};
use sha2::Digest as _;

/// Hash algorithm used to produce new digests.
///
/// SHA-256 is the default; the wider variants are available for callers that
/// need longer fingerprints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HashAlgorithm {
    /// SHA-256 (32-byte digests). The default.
    Sha256,
    /// SHA-384 (48-byte digests).
    Sha384,
    /// SHA-512 (64-byte digests).
    Sha512,
}

impl Default for HashAlgorithm {
    fn default() -> Self {
        Self::Sha256
    }
}

impl HashAlgorithm {
    /// Starts a streaming hasher for this algorithm.
    pub(crate) fn hasher(self) -> Hasher {
        match self {
            Self::Sha256 => Hasher::Sha256(sha2::Sha256::new()),
            Self::Sha384 => Hasher::Sha384(sha2::Sha384::new()),
            Self::Sha512 => Hasher::Sha512(sha2::Sha512::new()),
        }
    }
}

/// Streaming hasher over the selected algorithm.
pub(crate) enum Hasher {
    Sha256(sha2::Sha256),
    Sha384(sha2::Sha384),
    Sha512(sha2::Sha512),
}

impl Hasher {
    pub(crate) fn update(&mut self, data: &[u8]) {
        match self {
            Self::Sha256(h) => h.update(data),
            Self::Sha384(h) => h.update(data),
            Self::Sha512(h) => h.update(data),
        }
    }

    pub(crate) fn finalize(self) -> Digest {
        let bytes = match self {
            Self::Sha256(h) => h.finalize().to_vec(),
            Self::Sha384(h) => h.finalize().to_vec(),
            Self::Sha512(h) => h.finalize().to_vec(),
        };
        Digest::new(bytes)
    }
}

/// Algorithm name recovered from a digest's byte length.
///
/// Digest bytes do not carry their algorithm; the length identifies it
/// uniquely across the supported family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlgorithmName {
    /// 16-byte digests.
    Md5,
    /// 20-byte digests.
    Sha1,
    /// 32-byte digests.
    Sha256,
    /// 48-byte digests.
    Sha384,
    /// 64-byte digests.
    Sha512,
}

impl AlgorithmName {
    /// Detects the algorithm from a digest length in bytes.
    pub fn from_len(len: usize) -> Option<Self> {
        match len {
            16 => Some(Self::Md5),
            20 => Some(Self::Sha1),
            32 => Some(Self::Sha256),
            48 => Some(Self::Sha384),
            64 => Some(Self::Sha512),
            _ => None,
        }
    }

    /// The name used in `ni:` integrity URIs.
    pub fn ni_name(self) -> &'static str {
        match self {
            Self::Md5 => "md5",
            Self::Sha1 => "sha-1",
            Self::Sha256 => "sha-256",
            Self::Sha384 => "sha-384",
            Self::Sha512 => "sha-512",
        }
    }
}

/// Raw digest bytes with derived encodings.
///
/// Two values with the same `Digest` are assumed to have identical content.
/// Helper encodings (hex, url-safe base64, `ni:` integrity URI) are derived
/// from the raw bytes and the length-detected algorithm name.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Digest(Vec<u8>);

impl Digest {
    /// Wraps raw digest bytes.
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// The raw digest bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// The algorithm that produced this digest, detected from its length.
    pub fn algorithm(&self) -> Option<AlgorithmName> {
        AlgorithmName::from_len(self.0.len())
    }

    /// Lowercase hex encoding.
    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }

    /// URL-safe base64 encoding without padding.
    pub fn to_base64url(&self) -> String {
        base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(&self.0)
    }

    /// Subresource-integrity URI per the named-information convention:
    /// `ni:///<algo>;<base64url>` with an optional `?ct=<content-type>`.
    ///
    /// Returns `None` when the digest length does not identify an algorithm.
    pub fn integrity_uri(&self, content_type: Option<&str>) -> Option<String> {
        let algo = self.algorithm()?;
        let mut uri = format!("ni:///{};{}", algo.ni_name(), self.to_base64url());
        if let Some(ct) = content_type {
            uri.push_str("?ct=");
            uri.push_str(ct);
        }
        Some(uri)
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.as_slice() {
            [a, b, ..] => write!(f, "Digest({a:02x}{b:02x}..)"),
            _ => write!(f, "Digest(empty)"),
        }
    }
}
