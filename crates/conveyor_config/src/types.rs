//! Configuration types deserialized from `conveyor.toml`.

use conveyor_digest::HashAlgorithm;
use serde::Deserialize;

/// The top-level pipeline configuration parsed from `conveyor.toml`.
#[derive(Debug, Deserialize)]
pub struct PipelineConfig {
    /// Core pipeline settings (load paths, version, digest algorithm).
    pub pipeline: PipelineSettings,
    /// Cache settings.
    #[serde(default)]
    pub cache: CacheConfig,
}

/// Core pipeline settings required in every `conveyor.toml`.
#[derive(Debug, Deserialize)]
pub struct PipelineSettings {
    /// Load paths searched during resolution, in priority order.
    pub paths: Vec<String>,
    /// Environment version string. Bumping it invalidates every cached
    /// asset without touching any source file.
    #[serde(default)]
    pub version: String,
    /// Digest algorithm for asset ids and cache keys.
    #[serde(default)]
    pub digest: DigestAlgorithm,
}

/// Digest algorithm selection.
#[derive(Debug, Default, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum DigestAlgorithm {
    /// SHA-256 (default).
    #[default]
    Sha256,
    /// SHA-384.
    Sha384,
    /// SHA-512.
    Sha512,
}

impl From<DigestAlgorithm> for HashAlgorithm {
    fn from(value: DigestAlgorithm) -> Self {
        match value {
            DigestAlgorithm::Sha256 => HashAlgorithm::Sha256,
            DigestAlgorithm::Sha384 => HashAlgorithm::Sha384,
            DigestAlgorithm::Sha512 => HashAlgorithm::Sha512,
        }
    }
}

/// Cache backend selection and location.
#[derive(Debug, Default, Deserialize)]
pub struct CacheConfig {
    /// Which backend to use.
    #[serde(default)]
    pub backend: CacheBackendKind,
    /// Directory for the filesystem backend. Required when
    /// `backend = "filesystem"`.
    #[serde(default)]
    pub directory: Option<String>,
}

/// The available cache backends.
#[derive(Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackendKind {
    /// In-process map, lost at exit (default).
    #[default]
    Memory,
    /// Validated binary files under [`CacheConfig::directory`].
    Filesystem,
    /// No caching: every read misses.
    Null,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::load_config_from_str;

    #[test]
    fn digest_algorithm_all_variants() {
        for (input, expected) in [
            ("sha256", DigestAlgorithm::Sha256),
            ("sha384", DigestAlgorithm::Sha384),
            ("sha512", DigestAlgorithm::Sha512),
        ] {
            let toml = format!(
                r#"
[pipeline]
paths = ["assets"]
digest = "{input}"
"#
            );
            let config = load_config_from_str(&toml).unwrap();
            assert_eq!(config.pipeline.digest, expected);
        }
    }

    #[test]
    fn cache_backend_all_variants() {
        for (input, expected) in [
            ("memory", CacheBackendKind::Memory),
            ("filesystem", CacheBackendKind::Filesystem),
            ("null", CacheBackendKind::Null),
        ] {
            let toml = format!(
                r#"
[pipeline]
paths = ["assets"]

[cache]
backend = "{input}"
directory = "tmp/cache"
"#
            );
            let config = load_config_from_str(&toml).unwrap();
            assert_eq!(config.cache.backend, expected);
        }
    }

    #[test]
    fn digest_algorithm_converts_to_hash_algorithm() {
        assert_eq!(
            HashAlgorithm::from(DigestAlgorithm::Sha384),
            HashAlgorithm::Sha384
        );
    }
}
