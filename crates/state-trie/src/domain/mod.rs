pub mod cache;
pub mod derive;
pub mod errors;
pub mod nibbles;
pub mod node;
pub mod trie;

pub use cache::*;
pub use derive::*;
pub use errors::*;
pub use nibbles::*;
pub use node::*;
pub use trie::*;

use chain_types::Hash;

/// Keccak256 hash of an empty RLP-encoded trie.
/// This is the canonical empty trie root; [`crate::domain::TrieNode::Empty`]
/// hashes to it by definition.
pub const EMPTY_TRIE_ROOT: Hash = [
    0x56, 0xe8, 0x1f, 0x17, 0x1b, 0xcc, 0x55, 0xa6, 0xff, 0x83, 0x45, 0xe6, 0x92, 0xc0, 0xf8, 0x6e,
    0x5b, 0x48, 0xe0, 0x1b, 0x99, 0x6c, 0xad, 0xc0, 0x01, 0x62, 0x2f, 0xb5, 0xe3, 0x63, 0xb4, 0x21,
];

/// Default capacity of the shared node cache.
pub const MAX_CACHED_NODES: usize = 16_384;
