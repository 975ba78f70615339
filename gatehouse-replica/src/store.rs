//! The per-collection resource store.
//!
//! One [`Store`] holds one collection: a read-optimised `name -> resource`
//! mapping plus any secondary indexes the collection declared. The watch
//! engine is the only writer; readers are everyone else. All operations run
//! under a single per-store lock, so a call that entered [`Store::get`] or
//! [`Store::page`] executes entirely against one consistent snapshot, and a
//! bulk [`Store::replace_all`] is observed in full or not at all.

use std::collections::{BTreeMap, BTreeSet};
use std::ops::Bound;
use std::sync::Arc;

use gatehouse_core::watch::{Page, PageRequest, DEFAULT_PAGE_SIZE};
use gatehouse_core::Resource;
use parking_lot::RwLock;

/// A named secondary index over a collection.
///
/// Index keys are strictly derived from the stored value; a value whose key
/// function returns `None` simply does not appear in that index.
pub struct Index<K> {
    pub name: &'static str,
    pub key: fn(&K) -> Option<String>,
}

struct Inner<K> {
    items: BTreeMap<String, Arc<K>>,
    /// Parallel to the declared indexes: index key -> names.
    indexes: Vec<BTreeMap<String, BTreeSet<String>>>,
    /// Generation of the last bulk load, `0` before the first.
    generation: u64,
}

/// A read-optimised mapping from resource name to resource, with secondary
/// indexes and atomic bulk replacement.
pub struct Store<K> {
    decls: Vec<Index<K>>,
    inner: RwLock<Inner<K>>,
}

impl<K> std::fmt::Debug for Store<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.read();
        f.debug_struct("Store")
            .field("len", &inner.items.len())
            .field("generation", &inner.generation)
            .finish()
    }
}

impl<K: Resource + Send + Sync> Store<K> {
    pub fn new(decls: Vec<Index<K>>) -> Self {
        let indexes = decls.iter().map(|_| BTreeMap::new()).collect();
        Self {
            decls,
            inner: RwLock::new(Inner {
                items: BTreeMap::new(),
                indexes,
                generation: 0,
            }),
        }
    }

    /// Retrieve the entry stored under `name`, if any.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<K>> {
        self.inner.read().items.get(name).cloned()
    }

    /// The sole entry of a singleton collection, if present.
    #[must_use]
    pub fn single(&self) -> Option<Arc<K>> {
        self.inner.read().items.values().next().cloned()
    }

    /// List one page in lexicographic name order.
    ///
    /// The page is assembled under a single read guard and is internally
    /// consistent. The continuation token is the last returned name; a later
    /// page re-enters whatever snapshot is current at that point, so cross
    /// page consistency is not guaranteed if the store was reloaded in
    /// between. This behavior is uniform across all collections.
    #[must_use]
    pub fn page(&self, req: &PageRequest) -> Page<Arc<K>> {
        let size = if req.page_size == 0 {
            DEFAULT_PAGE_SIZE
        } else {
            req.page_size
        };
        let inner = self.inner.read();
        let start = match &req.page_token {
            Some(token) => Bound::Excluded(token.as_str()),
            None => Bound::Unbounded,
        };
        let mut iter = inner.items.range::<str, _>((start, Bound::Unbounded));
        let mut items: Vec<Arc<K>> = Vec::new();
        let mut next_page_token = None;
        loop {
            if items.len() == size {
                if iter.next().is_some() {
                    if let Some(last) = items.last() {
                        next_page_token = Some(last.name().to_string());
                    }
                }
                break;
            }
            match iter.next() {
                Some((_, value)) => items.push(Arc::clone(value)),
                None => break,
            }
        }
        Page {
            items,
            next_page_token,
        }
    }

    /// All entries whose declared index `index` maps them to `key`, in name
    /// order. An undeclared index yields nothing.
    #[must_use]
    pub fn get_by_index(&self, index: &str, key: &str) -> Vec<Arc<K>> {
        let inner = self.inner.read();
        let Some(position) = self.decls.iter().position(|decl| decl.name == index) else {
            return Vec::new();
        };
        let Some(names) = inner.indexes[position].get(key) else {
            return Vec::new();
        };
        names
            .iter()
            .filter_map(|name| inner.items.get(name).cloned())
            .collect()
    }

    /// Insert or replace by name.
    pub fn put(&self, value: K) {
        let mut inner = self.inner.write();
        let name = value.name().to_string();
        if let Some(old) = inner.items.get(&name).cloned() {
            Self::unindex(&self.decls, &mut inner, &old, &name);
        }
        Self::index(&self.decls, &mut inner, &value, &name);
        inner.items.insert(name, Arc::new(value));
    }

    /// Remove by name. Removing an absent name is a no-op.
    pub fn delete(&self, name: &str) -> bool {
        let mut inner = self.inner.write();
        match inner.items.remove(name) {
            Some(old) => {
                Self::unindex(&self.decls, &mut inner, &old, name);
                true
            }
            None => false,
        }
    }

    /// Atomically replace the whole collection with the given generation's
    /// bulk load. Secondary indexes are rebuilt from scratch.
    pub fn replace_all(&self, items: Vec<K>, generation: u64) {
        let mut next = Inner {
            items: BTreeMap::new(),
            indexes: self.decls.iter().map(|_| BTreeMap::new()).collect(),
            generation,
        };
        for value in items {
            let name = value.name().to_string();
            Self::index(&self.decls, &mut next, &value, &name);
            next.items.insert(name, Arc::new(value));
        }
        *self.inner.write() = next;
    }

    /// Replace the contents without advancing the recorded generation.
    /// Singleton collections use this to overwrite or clear their slot.
    pub fn replace_contents(&self, items: Vec<K>) {
        let generation = self.inner.read().generation;
        self.replace_all(items, generation);
    }

    /// Drop everything and record `generation` as the load that emptied the
    /// collection (used when the authority does not carry this kind).
    pub fn clear(&self, generation: u64) {
        self.replace_all(Vec::new(), generation);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.read().items.is_empty()
    }

    /// Generation of the last bulk load.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.inner.read().generation
    }

    fn index(decls: &[Index<K>], inner: &mut Inner<K>, value: &K, name: &str) {
        for (decl, index) in decls.iter().zip(inner.indexes.iter_mut()) {
            if let Some(key) = (decl.key)(value) {
                index.entry(key).or_default().insert(name.to_string());
            }
        }
    }

    fn unindex(decls: &[Index<K>], inner: &mut Inner<K>, value: &K, name: &str) {
        for (decl, index) in decls.iter().zip(inner.indexes.iter_mut()) {
            if let Some(key) = (decl.key)(value) {
                if let Some(names) = index.get_mut(&key) {
                    names.remove(name);
                    if names.is_empty() {
                        index.remove(&key);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gatehouse_core::{Server, User};
    use rand::Rng;

    fn hostname_index() -> Vec<Index<Server>> {
        vec![Index {
            name: "hostname",
            key: |server| Some(server.hostname.clone()),
        }]
    }

    #[test]
    fn put_get_delete() {
        let store = Store::new(Vec::new());
        store.put(User::new("alice"));
        assert_eq!(store.get("alice").unwrap().name, "alice");
        assert!(store.delete("alice"));
        assert!(store.get("alice").is_none());
    }

    #[test]
    fn delete_of_absent_is_noop() {
        let store = Store::<User>::new(Vec::new());
        store.put(User::new("alice"));
        assert!(!store.delete("bob"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn put_is_idempotent() {
        let store = Store::new(hostname_index());
        let server = Server::new("uuid-1", "web-1");
        store.put(server.clone());
        store.put(server);
        assert_eq!(store.len(), 1);
        assert_eq!(store.get_by_index("hostname", "web-1").len(), 1);
    }

    #[test]
    fn replace_all_swaps_the_full_generation() {
        let store = Store::new(Vec::new());
        store.replace_all(vec![User::new("a"), User::new("b")], 1);
        assert_eq!(store.generation(), 1);

        store.replace_all(vec![User::new("b"), User::new("c")], 2);
        assert_eq!(store.generation(), 2);
        assert!(store.get("a").is_none());
        assert!(store.get("b").is_some());
        assert!(store.get("c").is_some());
    }

    #[test]
    fn pages_are_lexicographic_and_resumable() {
        let store = Store::new(Vec::new());
        store.replace_all(["d", "b", "a", "c", "e"].map(User::new).to_vec(), 1);

        let first = store.page(&PageRequest::first(2));
        assert_eq!(
            first.items.iter().map(|u| u.name.as_str()).collect::<Vec<_>>(),
            ["a", "b"]
        );
        let token = first.next_page_token.unwrap();
        assert_eq!(token, "b");

        let second = store.page(&PageRequest::first(2).after(token));
        assert_eq!(
            second.items.iter().map(|u| u.name.as_str()).collect::<Vec<_>>(),
            ["c", "d"]
        );

        let last = store.page(&PageRequest::first(2).after("d"));
        assert_eq!(last.items.len(), 1);
        assert!(last.next_page_token.is_none());
    }

    #[test]
    fn exact_final_page_has_no_token() {
        let store = Store::new(Vec::new());
        store.replace_all(vec![User::new("a"), User::new("b")], 1);
        let page = store.page(&PageRequest::first(2));
        assert_eq!(page.items.len(), 2);
        assert!(page.next_page_token.is_none());
    }

    #[test]
    fn secondary_index_tracks_mutations() {
        let store = Store::new(hostname_index());
        store.put(Server::new("uuid-1", "web"));
        store.put(Server::new("uuid-2", "web"));
        store.put(Server::new("uuid-3", "db"));
        assert_eq!(store.get_by_index("hostname", "web").len(), 2);

        // Rename moves the entry between index keys.
        store.put(Server::new("uuid-2", "db"));
        assert_eq!(store.get_by_index("hostname", "web").len(), 1);
        assert_eq!(store.get_by_index("hostname", "db").len(), 2);

        store.delete("uuid-1");
        assert!(store.get_by_index("hostname", "web").is_empty());
    }

    #[test]
    fn indexes_are_rebuilt_on_replace() {
        let store = Store::new(hostname_index());
        store.put(Server::new("uuid-1", "old"));
        store.replace_all(vec![Server::new("uuid-2", "new")], 1);
        assert!(store.get_by_index("hostname", "old").is_empty());
        assert_eq!(store.get_by_index("hostname", "new").len(), 1);
    }

    #[test]
    fn unknown_index_yields_nothing() {
        let store = Store::new(hostname_index());
        store.put(Server::new("uuid-1", "web"));
        assert!(store.get_by_index("addr", "web").is_empty());
    }

    #[test]
    fn readers_never_observe_a_torn_generation() {
        let store = Store::new(Vec::new());
        let generation = |prefix: &str| -> Vec<User> {
            (0..10).map(|i| User::new(format!("{prefix}{i}"))).collect()
        };
        store.replace_all(generation("a"), 1);

        std::thread::scope(|scope| {
            scope.spawn(|| {
                for _ in 0..2000 {
                    let page = store.page(&PageRequest::first(100));
                    // Every enumeration is entirely one generation, never a
                    // splice of two.
                    assert_eq!(page.items.len(), 10);
                    let prefix = &page.items[0].name[..1];
                    assert!(page.items.iter().all(|u| u.name.starts_with(prefix)));
                }
            });
            for round in 0..1000_u64 {
                let prefix = if round % 2 == 0 { "b" } else { "a" };
                store.replace_all(generation(prefix), round + 2);
            }
        });
    }

    #[test]
    fn store_never_contains_duplicates() {
        let mut rng = rand::rng();
        let store = Store::new(Vec::new());
        for _ in 0..100_000 {
            let name = rng.random_range(0_u8..100).to_string();
            if rng.random_bool(0.4) {
                store.delete(&name);
            } else {
                store.put(User::new(name));
            }
        }
        let all = store.page(&PageRequest::first(1000));
        let mut seen = std::collections::HashSet::new();
        for user in &all.items {
            assert!(seen.insert(user.name.clone()));
        }
    }
}
