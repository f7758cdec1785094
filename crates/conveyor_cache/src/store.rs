//! The typed store wrapper: `fetch` or compute-and-store.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::backend::Backend;

/// A typed view over an arbitrary [`Backend`].
///
/// `fetch` is the sole recommended access pattern: it returns the cached
/// value or computes, stores, and returns the generator's result on a miss.
/// Values are serialized as JSON so heterogeneous metadata survives the
/// trip. Deserialization failures are treated as misses, never errors.
#[derive(Clone)]
pub struct CacheStore {
    backend: Arc<dyn Backend>,
}

impl CacheStore {
    /// Wraps a backend.
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self { backend }
    }

    /// Reads and deserializes a value, treating any failure as a miss.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = self.backend.get(key)?;
        match serde_json::from_slice(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(key, error = %e, "discarding undecodable cache entry");
                None
            }
        }
    }

    /// Serializes and stores a value. Storage failures are logged and
    /// swallowed: the cache is an accelerator, not a source of truth.
    pub fn set<T: Serialize>(&self, key: &str, value: &T) {
        let raw = match serde_json::to_vec(value) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(key, error = %e, "failed to serialize cache value");
                return;
            }
        };
        if let Err(e) = self.backend.set(key, &raw) {
            warn!(key, error = %e, "failed to store cache value");
        }
    }

    /// Returns the cached value for `key`, or runs the generator and stores
    /// its result.
    ///
    /// The generator for a given key must be referentially transparent:
    /// storing two different values under one key is undefined behavior.
    pub fn fetch<T, E>(
        &self,
        key: &str,
        generate: impl FnOnce() -> Result<T, E>,
    ) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
    {
        if let Some(value) = self.get(key) {
            debug!(key, "cache hit");
            return Ok(value);
        }
        debug!(key, "cache miss");
        let value = generate()?;
        self.set(key, &value);
        Ok(value)
    }
}
