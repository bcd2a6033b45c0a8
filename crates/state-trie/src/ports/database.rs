use crate::domain::TrieError;
use chain_types::Hash;

/// Persistent key/value store abstraction beneath the trie layer.
///
/// Keys are content hashes: trie nodes are stored under their Keccak256
/// hash, and raw blobs (contract code, ABI descriptions) under theirs.
/// Because keys are content-addressed the store never observes an
/// overwrite with different data, which is what makes a shared
/// read-through cache safe.
///
/// A failed read or write must surface as [`TrieError::Database`], never
/// as a silent "missing" result.
pub trait TrieDatabase: Send + Sync {
    fn get_node(&self, hash: &Hash) -> Result<Option<Vec<u8>>, TrieError>;
    fn put_node(&self, hash: Hash, data: Vec<u8>) -> Result<(), TrieError>;
    fn batch_put(&self, nodes: Vec<(Hash, Vec<u8>)>) -> Result<(), TrieError>;
}
