//! # State Storage Manager
//!
//! Opens and caches tries over one shared on-disk store. Every trie handle
//! it produces shares the same node store and the same read-through node
//! cache, but keeps its own mutation overlay, so multiple historical or
//! speculative states can coexist on separate threads.

use crate::domain::{MerkleTrie, NodeCache, TrieError};
use crate::ports::TrieDatabase;
use chain_types::Hash;
use std::sync::Arc;

/// Owner of the disk-level database handle and the shared node cache.
pub struct StateStorage {
    db: Arc<dyn TrieDatabase>,
    cache: Arc<NodeCache>,
}

impl StateStorage {
    /// Create a manager over a backing store with the default cache size.
    pub fn new(db: Arc<dyn TrieDatabase>) -> Self {
        Self {
            db,
            cache: Arc::new(NodeCache::new()),
        }
    }

    /// Create with a custom node cache capacity.
    pub fn with_cache_capacity(db: Arc<dyn TrieDatabase>, capacity: usize) -> Self {
        Self {
            db,
            cache: Arc::new(NodeCache::with_capacity(capacity)),
        }
    }

    /// Open the account trie at `root`. A zero root opens an empty trie.
    pub fn open_trie(&self, root: Hash) -> Result<MerkleTrie, TrieError> {
        MerkleTrie::open(Arc::clone(&self.db), Arc::clone(&self.cache), root)
    }

    /// Open the contract storage trie of one account.
    ///
    /// `_account_path` is the hashed account path the storage trie hangs
    /// under; nodes are content-addressed so it does not participate in
    /// addressing, but callers pass it to keep account and storage handles
    /// distinguishable at the call site.
    pub fn open_storage_trie(
        &self,
        _account_path: Hash,
        storage_root: Hash,
    ) -> Result<MerkleTrie, TrieError> {
        MerkleTrie::open(Arc::clone(&self.db), Arc::clone(&self.cache), storage_root)
    }

    /// Produce a structurally independent, mutation-isolated copy of a trie.
    ///
    /// The copy shares all persisted nodes and the node cache with the
    /// original; only the uncommitted overlay is duplicated.
    pub fn copy_trie(&self, trie: &MerkleTrie) -> MerkleTrie {
        trie.clone()
    }

    /// Raw access to the underlying key/value store, for blobs the trie
    /// layer does not address (contract code and ABI, keyed by their hash).
    pub fn db(&self) -> &Arc<dyn TrieDatabase> {
        &self.db
    }

    /// The shared node cache injected into every opened trie.
    pub fn cache(&self) -> &Arc<NodeCache> {
        &self.cache
    }
}
