//! # Chain Reader Port
//!
//! Read-only view of the committed chain consumed by validation stages.
//! The canonical chain store implements this; tests supply an in-memory
//! fake.

use chain_types::{Block, Hash};

/// Lookup surface over already-committed blocks.
pub trait ChainReader: Send + Sync {
    /// The current tip of the canonical chain, if any block is committed.
    fn current_block(&self) -> Option<Block>;

    /// Fetch a committed block by its header hash.
    fn block_by_hash(&self, hash: &Hash) -> Option<Block>;
}
