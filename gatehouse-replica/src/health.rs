use std::collections::HashSet;

use gatehouse_core::ResourceKey;
use parking_lot::RwLock;

/// A point-in-time view of the cache's health.
///
/// `supported_kinds` may be a strict subset of the declared watches when the
/// authority confirmed fewer kinds than requested. `generation` counts
/// coherent bulk-load episodes and only ever grows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HealthStatus {
    pub healthy: bool,
    pub supported_kinds: HashSet<ResourceKey>,
    pub generation: u64,
}

/// The shared health tuple. Mutated only by the watch engine's state
/// transitions; read by the reader router and external probes. A single lock
/// guards the whole tuple, so readers never observe a torn
/// `(healthy, supported_kinds, generation)` triple.
#[derive(Debug, Default)]
pub(crate) struct Health {
    inner: RwLock<HealthStatus>,
}

impl Health {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn status(&self) -> HealthStatus {
        self.inner.read().clone()
    }

    /// Whether a cached read for `key` may be served from the store.
    pub(crate) fn read_ok(&self, key: &ResourceKey) -> bool {
        let inner = self.inner.read();
        inner.healthy && inner.supported_kinds.contains(key)
    }

    /// Record the kinds the authority confirmed for the upcoming generation.
    pub(crate) fn confirm_kinds(&self, kinds: HashSet<ResourceKey>) {
        self.inner.write().supported_kinds = kinds;
    }

    /// The generation the next commit will publish. Not observable until
    /// [`Health::commit`] runs.
    pub(crate) fn next_generation(&self) -> u64 {
        self.inner.read().generation + 1
    }

    /// Publish a completed bulk load: generation and healthy flip together.
    pub(crate) fn commit(&self, generation: u64) {
        let mut inner = self.inner.write();
        inner.generation = generation;
        inner.healthy = true;
    }

    pub(crate) fn set_unhealthy(&self) {
        self.inner.write().healthy = false;
    }
}
