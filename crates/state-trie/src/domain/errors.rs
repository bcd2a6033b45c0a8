use chain_types::{short_hash, Hash, RlpError};
use thiserror::Error;

/// Errors surfaced by the trie storage layer.
///
/// The taxonomy is deliberate: a key that is simply absent is `Ok(None)`
/// from `try_get`, never an error. `MissingNode` means a node referenced
/// by hash does not exist in the store: a dangling reference, which is
/// corruption or an unopenable root. `Decode` means the stored bytes do
/// not parse. `Database` is an I/O failure from the store itself.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TrieError {
    #[error("missing trie node {}", short_hash(hash))]
    MissingNode { hash: Hash },

    #[error("undecodable trie node {}: {reason}", short_hash(hash))]
    Decode { hash: Hash, reason: RlpError },

    #[error("database error: {0}")]
    Database(String),

    #[error("storage lock poisoned")]
    LockPoisoned,
}
