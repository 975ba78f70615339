//! Per-kind collections and their event-handling contract.
//!
//! A collection owns one `(kind, sub_kind)` family: its [`Store`], the watch
//! it was declared with, and the upstream list source used for bulk loads.
//! The watch engine talks to collections only through [`CollectionHandler`].

mod registry;
mod sources;

pub(crate) use registry::{setup_collections, Collections, INDEX_HOSTNAME, INDEX_USER};
pub(crate) use sources::collect_pages;

use std::sync::Arc;

use async_trait::async_trait;
use gatehouse_core::{Error, Resource, ResourceKey, ResourceObj, ResourceRef, Result, WatchKind};

use crate::store::{Index, Store};

/// A deferred commit produced by [`CollectionHandler::fetch`]. Runs against
/// the store with the generation being committed; local and infallible.
pub(crate) type Apply = Box<dyn FnOnce(u64) + Send>;

/// The uniform surface the watch engine drives collections through.
#[async_trait]
pub(crate) trait CollectionHandler: Send + Sync {
    /// The watch this collection was declared with.
    fn watch_kind(&self) -> &WatchKind;

    /// The normalised dispatch key.
    fn resource_key(&self) -> &ResourceKey;

    fn is_singleton(&self) -> bool;

    /// Perform the paginated bulk load and return the deferred apply.
    ///
    /// Must not mutate the store: the engine gathers every collection's read
    /// first and commits them all under one generation. With `cache_ok`
    /// false the remote read is skipped but the returned apply still clears
    /// the collection.
    async fn fetch(&self, cache_ok: bool) -> Result<Apply>;

    /// Apply a single put event. For singletons this overwrites the slot.
    fn on_put(&self, obj: ResourceObj) -> Result<()>;

    /// Apply a single delete event. For singletons this clears the slot;
    /// deleting an unknown name is a no-op.
    fn on_delete(&self, target: &ResourceRef) -> Result<()>;
}

/// Upstream bulk load for one family: every page of the authority's list
/// RPC, concatenated. Singleton sources map `NotFound` to an empty load.
#[async_trait]
pub(crate) trait ListSource<K>: Send + Sync {
    async fn list_all(&self) -> Result<Vec<K>>;
}

/// The one collection implementation, generic over the resource type. The
/// per-family differences live in the [`ListSource`] and the declared
/// indexes.
pub(crate) struct Collection<K> {
    store: Arc<Store<K>>,
    source: Arc<dyn ListSource<K>>,
    watch: WatchKind,
    key: ResourceKey,
    singleton: bool,
}

impl<K: Resource + Send + Sync> Collection<K> {
    pub(crate) fn new(
        watch: WatchKind,
        source: Arc<dyn ListSource<K>>,
        indexes: Vec<Index<K>>,
        singleton: bool,
    ) -> Self {
        let key = ResourceKey::from_watch(&watch);
        Self {
            store: Arc::new(Store::new(indexes)),
            source,
            watch,
            key,
            singleton,
        }
    }

    pub(crate) fn store(&self) -> Arc<Store<K>> {
        Arc::clone(&self.store)
    }
}

#[async_trait]
impl<K> CollectionHandler for Collection<K>
where
    K: Resource + Send + Sync + 'static + TryFrom<ResourceObj, Error = ResourceObj>,
{
    fn watch_kind(&self) -> &WatchKind {
        &self.watch
    }

    fn resource_key(&self) -> &ResourceKey {
        &self.key
    }

    fn is_singleton(&self) -> bool {
        self.singleton
    }

    async fn fetch(&self, cache_ok: bool) -> Result<Apply> {
        let store = Arc::clone(&self.store);
        if !cache_ok {
            return Ok(Box::new(move |generation| store.clear(generation)));
        }
        let items = self.source.list_all().await?;
        Ok(Box::new(move |generation| {
            store.replace_all(items, generation);
        }))
    }

    fn on_put(&self, obj: ResourceObj) -> Result<()> {
        let got = obj.resource_key();
        if got != self.key {
            return Err(Error::UnexpectedResource {
                expected: self.key.clone(),
                got,
            });
        }
        let value = K::try_from(obj).map_err(|other| Error::UnexpectedResource {
            expected: self.key.clone(),
            got: other.resource_key(),
        })?;
        if self.singleton {
            self.store.replace_contents(vec![value]);
        } else {
            self.store.put(value);
        }
        Ok(())
    }

    fn on_delete(&self, target: &ResourceRef) -> Result<()> {
        if self.singleton {
            self.store.replace_contents(Vec::new());
        } else {
            self.store.delete(&target.name);
        }
        Ok(())
    }
}
