//! # Ordered-List Root Derivation
//!
//! Computes the deterministic root of an ordered sequence of encoded items
//! (receipts, transactions) by inserting them into a throwaway trie keyed
//! by their RLP-encoded position. Any change to any item, or any
//! reordering, changes the resulting root.

use super::{MerkleTrie, NodeCache, TrieError, EMPTY_TRIE_ROOT};
use crate::adapters::InMemoryTrieDb;
use crate::ports::TrieDatabase;
use chain_types::{rlp, Hash, ZERO_HASH};
use std::sync::Arc;

/// Derive the content-addressed root of an ordered list of encoded items.
pub fn derive_root(items: &[Vec<u8>]) -> Result<Hash, TrieError> {
    if items.is_empty() {
        return Ok(EMPTY_TRIE_ROOT);
    }

    let db = Arc::new(InMemoryTrieDb::new()) as Arc<dyn TrieDatabase>;
    let cache = Arc::new(NodeCache::with_capacity(64));
    let mut trie = MerkleTrie::open(db, cache, ZERO_HASH)?;

    for (index, item) in items.iter().enumerate() {
        trie.try_update(&rlp::encode_u64(index as u64), item.clone())?;
    }
    Ok(trie.hash())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_list_derives_empty_root() {
        assert_eq!(derive_root(&[]).unwrap(), EMPTY_TRIE_ROOT);
    }

    #[test]
    fn test_root_binds_content() {
        let items = vec![b"first".to_vec(), b"second".to_vec()];
        let root = derive_root(&items).unwrap();

        let mut tampered = items.clone();
        tampered[1][0] ^= 1;
        assert_ne!(derive_root(&tampered).unwrap(), root);
    }

    #[test]
    fn test_root_binds_order() {
        let items = vec![b"first".to_vec(), b"second".to_vec()];
        let swapped = vec![b"second".to_vec(), b"first".to_vec()];
        assert_ne!(derive_root(&items).unwrap(), derive_root(&swapped).unwrap());
    }

    #[test]
    fn test_root_deterministic() {
        let items = vec![vec![1, 2, 3], vec![4, 5], vec![6]];
        assert_eq!(derive_root(&items).unwrap(), derive_root(&items).unwrap());
    }
}
