//! Shared context threaded through one pipeline pass.

use crate::ports::ChainReader;
use chain_types::{Block, Receipt};

/// Per-candidate-block pipeline state.
///
/// Holds the candidate, a read handle on the committed chain, and the
/// artifacts stages derive for their successors. Scoped to a single
/// validation pass; never persisted.
pub struct BlockContext<'a> {
    /// The block under validation.
    pub block: &'a Block,
    /// Read-only view of the committed chain, for parent lookups.
    pub chain: &'a dyn ChainReader,
    /// Receipts re-derived by the receipts stage, for downstream stages
    /// (e.g. the one that persists them alongside the block).
    pub receipts: Vec<Receipt>,
}

impl<'a> BlockContext<'a> {
    pub fn new(block: &'a Block, chain: &'a dyn ChainReader) -> Self {
        Self {
            block,
            chain,
            receipts: Vec::new(),
        }
    }
}
