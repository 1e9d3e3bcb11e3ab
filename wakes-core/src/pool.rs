//! Path-specific candidate pools.

use crate::catalog::{ArtifactRecord, Catalog};
use crate::paths::PathId;

/// Every catalog record eligible as a target on `path`.
///
/// A usable image is mandatory; the path strategy decides the rest. An
/// unloaded or empty catalog yields an empty pool, which callers treat as
/// "nothing to find" rather than an error.
pub fn build_pool(path: PathId, catalog: &Catalog) -> Vec<&ArtifactRecord> {
    if !catalog.is_loaded() {
        tracing::debug!(path = %path, "catalog not loaded, pool is empty");
        return Vec::new();
    }
    let strategy = path.strategy();
    let pool: Vec<&ArtifactRecord> = catalog
        .objects()
        .iter()
        .filter(|a| a.has_image() && strategy.admits(a))
        .collect();
    tracing::debug!(path = %path, size = pool.len(), "built candidate pool");
    pool
}
