//! # Shared Trie Node Cache
//!
//! Read-through cache for encoded trie nodes, shared across every trie the
//! [`crate::storage::StateStorage`] manager opens.
//!
//! Nodes are content-addressed, so an entry can never be stale for a given
//! hash: the same hash always maps to the same bytes. That makes the cache
//! safe to share between tries opened at different roots and from
//! different threads.

use super::MAX_CACHED_NODES;
use chain_types::Hash;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::Mutex;

/// Thread-safe LRU cache of encoded trie nodes keyed by node hash.
pub struct NodeCache {
    inner: Mutex<LruCache<Hash, Vec<u8>>>,
}

impl NodeCache {
    /// Create a cache with the default capacity.
    pub fn new() -> Self {
        Self::with_capacity(MAX_CACHED_NODES)
    }

    /// Create with custom capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        let cap = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: Mutex::new(LruCache::new(cap)),
        }
    }

    /// Fetch the encoded node for a hash, if cached.
    pub fn get(&self, hash: &Hash) -> Option<Vec<u8>> {
        match self.inner.lock() {
            Ok(mut cache) => cache.get(hash).cloned(),
            // A poisoned cache only loses read-through hits.
            Err(_) => None,
        }
    }

    /// Insert an encoded node.
    pub fn put(&self, hash: Hash, data: Vec<u8>) {
        if let Ok(mut cache) = self.inner.lock() {
            cache.put(hash, data);
        }
    }

    /// Current number of cached nodes.
    pub fn len(&self) -> usize {
        self.inner.lock().map(|c| c.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for NodeCache {
    fn default() -> Self {
        Self::new()
    }
}
