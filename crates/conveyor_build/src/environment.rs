//! The environment: a frozen configuration snapshot builds run against.
//!
//! All mutation happens on [`EnvironmentBuilder`]; calling `build` freezes
//! the accumulated load paths, registries, version, and cache into an
//! [`Environment`] that never changes. A build holding an environment can
//! therefore cache aggressively: nothing it observed can be different next
//! time unless the environment itself was rebuilt.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use conveyor_cache::{Backend, CacheStore, FsBackend, MemoryBackend, NullBackend};
use conveyor_config::{CacheBackendKind, PipelineConfig};
use conveyor_digest::{DigestEngine, HashAlgorithm};
use conveyor_pipeline::{Processor, ProcessorRegistry};
use conveyor_resolve::{EngineRegistry, MimeRegistry};

use crate::asset::Asset;
use crate::error::BuildError;
use crate::loader::AssetBuilder;

/// Accumulates configuration for an [`Environment`].
pub struct EnvironmentBuilder {
    load_paths: Vec<PathBuf>,
    mimes: MimeRegistry,
    engines: EngineRegistry,
    processors: ProcessorRegistry,
    version: String,
    algorithm: HashAlgorithm,
    cache: CacheStore,
}

impl Default for EnvironmentBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl EnvironmentBuilder {
    /// Creates a builder with no load paths, empty registries, and an
    /// in-memory cache.
    pub fn new() -> Self {
        Self {
            load_paths: Vec::new(),
            mimes: MimeRegistry::new(),
            engines: EngineRegistry::new(),
            processors: ProcessorRegistry::new(),
            version: String::new(),
            algorithm: HashAlgorithm::default(),
            cache: CacheStore::new(Arc::new(MemoryBackend::new())),
        }
    }

    /// Creates a builder from a parsed `conveyor.toml`, with paths taken
    /// relative to `base_dir`.
    pub fn from_config(config: &PipelineConfig, base_dir: &Path) -> Self {
        let mut builder = Self::new()
            .with_version(&config.pipeline.version)
            .with_digest_algorithm(config.pipeline.digest.into());
        for path in &config.pipeline.paths {
            builder = builder.append_path(base_dir.join(path));
        }
        let backend: Arc<dyn Backend> = match config.cache.backend {
            CacheBackendKind::Memory => Arc::new(MemoryBackend::new()),
            CacheBackendKind::Null => Arc::new(NullBackend::new()),
            CacheBackendKind::Filesystem => {
                // Validation guarantees a directory for the filesystem kind.
                let dir = config.cache.directory.as_deref().unwrap_or("cache");
                Arc::new(FsBackend::new(&base_dir.join(dir)))
            }
        };
        builder.with_cache(CacheStore::new(backend))
    }

    /// Appends a load path, searched after all previously appended paths.
    pub fn append_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.load_paths.push(path.into());
        self
    }

    /// Registers a format extension for a content type.
    pub fn register_mime(mut self, ext: &str, content_type: &str) -> Self {
        self.mimes = self.mimes.register(ext, content_type);
        self
    }

    /// Registers an engine extension, its target content type, and the
    /// processor implementing it.
    pub fn register_engine(
        mut self,
        ext: &str,
        target_type: &str,
        processor: Arc<dyn Processor>,
    ) -> Self {
        self.engines = self.engines.register(ext, target_type);
        self.processors = self.processors.register_engine(ext, processor);
        self
    }

    /// Registers a preprocessor for a content type.
    pub fn register_preprocessor(mut self, content_type: &str, p: Arc<dyn Processor>) -> Self {
        self.processors = self.processors.register_preprocessor(content_type, p);
        self
    }

    /// Registers a postprocessor for a content type.
    pub fn register_postprocessor(mut self, content_type: &str, p: Arc<dyn Processor>) -> Self {
        self.processors = self.processors.register_postprocessor(content_type, p);
        self
    }

    /// Registers a bundle processor for a content type.
    pub fn register_bundle_processor(mut self, content_type: &str, p: Arc<dyn Processor>) -> Self {
        self.processors = self.processors.register_bundle_processor(content_type, p);
        self
    }

    /// Registers a transformer between two content types.
    pub fn register_transformer(
        mut self,
        from: &str,
        to: &str,
        processor: Arc<dyn Processor>,
    ) -> Self {
        self.processors = self.processors.register_transformer(from, to, processor);
        self
    }

    /// Sets the environment version string. Bumping it invalidates every
    /// cached asset without touching any source file.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Selects the digest algorithm.
    pub fn with_digest_algorithm(mut self, algorithm: HashAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Replaces the cache store.
    pub fn with_cache(mut self, cache: CacheStore) -> Self {
        self.cache = cache;
        self
    }

    /// Freezes the configuration into an immutable [`Environment`].
    pub fn build(self) -> Environment {
        Environment {
            load_paths: self.load_paths,
            mimes: self.mimes,
            engines: self.engines,
            processors: self.processors,
            version: self.version,
            engine: DigestEngine::new(self.algorithm),
            cache: self.cache,
        }
    }
}

/// An immutable configuration snapshot.
///
/// Builds only ever see environments, never builders, so a running build
/// cannot observe configuration changes.
pub struct Environment {
    pub(crate) load_paths: Vec<PathBuf>,
    pub(crate) mimes: MimeRegistry,
    pub(crate) engines: EngineRegistry,
    pub(crate) processors: ProcessorRegistry,
    pub(crate) version: String,
    pub(crate) engine: DigestEngine,
    pub(crate) cache: CacheStore,
}

impl Environment {
    /// The load paths, in search order.
    pub fn load_paths(&self) -> &[PathBuf] {
        &self.load_paths
    }

    /// The environment version string.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// The digest engine used for ids and cache keys.
    pub fn digest_engine(&self) -> DigestEngine {
        self.engine
    }

    /// Starts a build session. Sessions memoize per-URI results, so
    /// repeated loads of the same asset inside one session build once.
    pub fn session(&self) -> AssetBuilder<'_> {
        AssetBuilder::new(self)
    }

    /// Resolves a logical path and builds the matching asset in a one-shot
    /// session.
    pub fn find_asset(&self, path: &str, accept: Option<&str>) -> Result<Asset, BuildError> {
        self.session().find(path, accept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_freezes_configuration() {
        let env = EnvironmentBuilder::new()
            .append_path("/srv/assets")
            .register_mime("js", "application/javascript")
            .with_version("v1")
            .build();
        assert_eq!(env.load_paths(), [PathBuf::from("/srv/assets")]);
        assert_eq!(env.version(), "v1");
    }

    #[test]
    fn from_config_applies_paths_and_version() {
        let config = conveyor_config::load_config_from_str(
            r#"
[pipeline]
paths = ["app/assets", "vendor/assets"]
version = "v7"
digest = "sha384"
"#,
        )
        .unwrap();
        let env = EnvironmentBuilder::from_config(&config, Path::new("/srv")).build();
        assert_eq!(
            env.load_paths(),
            [
                PathBuf::from("/srv/app/assets"),
                PathBuf::from("/srv/vendor/assets")
            ]
        );
        assert_eq!(env.version(), "v7");
        assert_eq!(env.digest_engine().algorithm(), HashAlgorithm::Sha384);
    }
}
