use crate::domain::TrieError;
use crate::ports::TrieDatabase;
use chain_types::Hash;
use std::collections::HashMap;
use std::sync::RwLock;

/// In-memory implementation of TrieDatabase.
///
/// Used in tests and by [`crate::domain::derive_root`] for throwaway tries.
/// Production deployments plug a disk-backed adapter into the same port.
pub struct InMemoryTrieDb {
    nodes: RwLock<HashMap<Hash, Vec<u8>>>,
}

impl InMemoryTrieDb {
    pub fn new() -> Self {
        Self {
            nodes: RwLock::new(HashMap::new()),
        }
    }

    /// Number of stored entries (nodes plus raw blobs).
    pub fn len(&self) -> usize {
        self.nodes.read().map(|n| n.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemoryTrieDb {
    fn default() -> Self {
        Self::new()
    }
}

impl TrieDatabase for InMemoryTrieDb {
    fn get_node(&self, hash: &Hash) -> Result<Option<Vec<u8>>, TrieError> {
        let nodes = self.nodes.read().map_err(|_| TrieError::LockPoisoned)?;
        Ok(nodes.get(hash).cloned())
    }

    fn put_node(&self, hash: Hash, data: Vec<u8>) -> Result<(), TrieError> {
        let mut nodes = self.nodes.write().map_err(|_| TrieError::LockPoisoned)?;
        nodes.insert(hash, data);
        Ok(())
    }

    fn batch_put(&self, batch: Vec<(Hash, Vec<u8>)>) -> Result<(), TrieError> {
        let mut nodes = self.nodes.write().map_err(|_| TrieError::LockPoisoned)?;
        for (hash, data) in batch {
            nodes.insert(hash, data);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trie_db_operations() {
        let db = InMemoryTrieDb::new();
        let hash = [0xAB; 32];
        let data = vec![1, 2, 3, 4];

        db.put_node(hash, data.clone()).unwrap();
        assert_eq!(db.get_node(&hash).unwrap(), Some(data));
        assert_eq!(db.get_node(&[0xCD; 32]).unwrap(), None);
    }

    #[test]
    fn test_batch_put() {
        let db = InMemoryTrieDb::new();
        db.batch_put(vec![([0x01; 32], vec![1]), ([0x02; 32], vec![2])])
            .unwrap();
        assert_eq!(db.len(), 2);
        assert_eq!(db.get_node(&[0x02; 32]).unwrap(), Some(vec![2]));
    }
}
