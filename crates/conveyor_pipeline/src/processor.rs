//! The processor contract: inputs, outputs, and metadata merge shapes.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use conveyor_common::{AssetUri, CacheDependency};

/// Error type processors return. The pipeline wraps it with the processor's
/// name before propagating.
pub type ProcessorError = Box<dyn std::error::Error + Send + Sync>;

/// Everything a processor may look at for one invocation.
pub struct ProcessorInput<'a> {
    /// Identity of the asset being built.
    pub uri: &'a AssetUri,

    /// Absolute path of the source file.
    pub filename: &'a Path,

    /// The load path the file was found under, when known.
    pub load_path: Option<&'a Path>,

    /// Logical name of the asset (no format or engine extensions).
    pub name: &'a str,

    /// Content type of the running data.
    pub content_type: Option<&'a str>,

    /// The running content.
    pub data: &'a str,

    /// Metadata accumulated by earlier stages.
    pub metadata: &'a Metadata,
}

/// Metadata threaded through the pipeline and attached to the finished
/// asset.
///
/// The dependency aggregates merge by ordered union; everything else lives
/// in `extra` and merges by overwrite.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Metadata {
    /// Files whose content the result depends on, in first-recorded order.
    pub dependency_paths: Vec<PathBuf>,

    /// Non-file cache dependencies, in first-recorded order.
    pub cache_dependencies: Vec<CacheDependency>,

    /// Arbitrary additional metadata keys.
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl Metadata {
    /// Records a file dependency, preserving first-occurrence order.
    pub fn add_dependency_path(&mut self, path: impl Into<PathBuf>) {
        let path = path.into();
        if !self.dependency_paths.contains(&path) {
            self.dependency_paths.push(path);
        }
    }

    /// Records a cache dependency, preserving first-occurrence order.
    pub fn add_cache_dependency(&mut self, dep: CacheDependency) {
        if !self.cache_dependencies.contains(&dep) {
            self.cache_dependencies.push(dep);
        }
    }

    /// Merges a processor's update into the running metadata.
    pub fn merge(&mut self, update: MetadataUpdate) -> Option<String> {
        for path in update.dependency_paths {
            self.add_dependency_path(path);
        }
        for dep in update.cache_dependencies {
            self.add_cache_dependency(dep);
        }
        for (key, value) in update.extra {
            self.extra.insert(key, value);
        }
        update.data
    }
}

/// A processor's metadata update: an optional content replacement plus keys
/// to merge.
#[derive(Debug, Clone, Default)]
pub struct MetadataUpdate {
    /// Replacement content, if the processor changed it.
    pub data: Option<String>,

    /// File dependencies to union in.
    pub dependency_paths: Vec<PathBuf>,

    /// Cache dependencies to union in.
    pub cache_dependencies: Vec<CacheDependency>,

    /// Other keys; each overwrites any existing entry.
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// What a processor returned.
#[derive(Debug)]
pub enum ProcessorOutput {
    /// No change to content or metadata.
    Unchanged,

    /// Replacement content only.
    Data(String),

    /// Content and/or metadata updates.
    Update(MetadataUpdate),
}

/// One content transform stage.
pub trait Processor: Send + Sync {
    /// Stable name used in error messages and cache keys.
    fn name(&self) -> &str;

    /// Runs the transform.
    fn call(&self, input: ProcessorInput<'_>) -> Result<ProcessorOutput, ProcessorError>;

    /// Opaque contribution to the pipeline cache key. Processors whose
    /// output depends on configuration should fold that configuration in
    /// here; `None` contributes a stable null.
    fn cache_key(&self) -> Option<serde_json::Value> {
        None
    }
}

/// Adapts a closure into a [`Processor`].
pub struct FnProcessor<F> {
    name: String,
    cache_key: Option<serde_json::Value>,
    func: F,
}

impl<F> FnProcessor<F>
where
    F: Fn(ProcessorInput<'_>) -> Result<ProcessorOutput, ProcessorError> + Send + Sync,
{
    /// Wraps a closure under the given processor name.
    pub fn new(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            cache_key: None,
            func,
        }
    }

    /// Sets the processor's cache-key contribution.
    pub fn with_cache_key(mut self, key: serde_json::Value) -> Self {
        self.cache_key = Some(key);
        self
    }
}

impl<F> Processor for FnProcessor<F>
where
    F: Fn(ProcessorInput<'_>) -> Result<ProcessorOutput, ProcessorError> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn call(&self, input: ProcessorInput<'_>) -> Result<ProcessorOutput, ProcessorError> {
        (self.func)(input)
    }

    fn cache_key(&self) -> Option<serde_json::Value> {
        self.cache_key.clone()
    }
}
