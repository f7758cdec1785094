//! The dependency-graph cache relationship.
//!
//! For each asset URI the cache stores the ordered list of cache-dependency
//! URIs the build depended on, the combined digest of those dependencies,
//! and the fully-resolved URI of the built asset. A stored entry is reused
//! only when re-resolving every dependency to its *current* digest
//! reproduces the stored combined digest. Modification times never enter
//! the comparison, so retouched files stay cached and content changes that
//! preserve mtimes are still detected.

use conveyor_digest::{Digest, DigestEngine, DigestValue};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::store::CacheStore;

/// One stored dependency-graph entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepGraphEntry {
    /// Cache-dependency URIs in recorded order.
    pub dependencies: Vec<String>,

    /// Hex of the combined digest of every dependency at store time.
    pub combined_digest: String,

    /// String form of the fully-resolved asset URI (id pinned).
    pub asset_uri: String,
}

/// Dependency-graph lookups and stores over a [`CacheStore`].
pub struct DepGraphCache<'a> {
    store: &'a CacheStore,
    engine: DigestEngine,
}

impl<'a> DepGraphCache<'a> {
    /// Creates a view using the given store and digest engine.
    pub fn new(store: &'a CacheStore, engine: DigestEngine) -> Self {
        Self { store, engine }
    }

    fn entry_key(unresolved_uri: &str) -> String {
        format!("dep-graph:{unresolved_uri}")
    }

    /// Combines per-dependency digests in order. `None` if any dependency
    /// fails to resolve, which forces a rebuild.
    pub fn combine(
        &self,
        dependencies: &[String],
        resolve: &mut dyn FnMut(&str) -> Option<Digest>,
    ) -> Option<Digest> {
        let mut digests = Vec::with_capacity(dependencies.len());
        for dep in dependencies {
            digests.push(DigestValue::Bytes(resolve(dep)?.as_bytes().to_vec()));
        }
        Some(self.engine.digest(&DigestValue::Seq(digests)))
    }

    /// Validates the stored entry for an unresolved URI.
    ///
    /// Returns the stored fully-resolved asset URI when every recorded
    /// dependency still digests to what it did at store time; `None` means
    /// the caller must rebuild.
    pub fn lookup(
        &self,
        unresolved_uri: &str,
        resolve: &mut dyn FnMut(&str) -> Option<Digest>,
    ) -> Option<String> {
        let entry: DepGraphEntry = self.store.get(&Self::entry_key(unresolved_uri))?;
        let current = self.combine(&entry.dependencies, resolve)?;
        if current.to_hex() == entry.combined_digest {
            debug!(uri = unresolved_uri, "dependency-graph cache valid");
            Some(entry.asset_uri)
        } else {
            debug!(uri = unresolved_uri, "dependency-graph cache stale");
            None
        }
    }

    /// Records a freshly built asset's dependency set.
    pub fn record(
        &self,
        unresolved_uri: &str,
        dependencies: Vec<String>,
        combined: &Digest,
        asset_uri: String,
    ) {
        let entry = DepGraphEntry {
            dependencies,
            combined_digest: combined.to_hex(),
            asset_uri,
        };
        self.store.set(&Self::entry_key(unresolved_uri), &entry);
    }
}
