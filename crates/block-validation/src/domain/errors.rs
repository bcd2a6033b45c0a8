//! Block rejection errors.
//!
//! A closed set of tagged kinds compared by identity, never by message
//! text. Every pipeline abort carries exactly one of these, so callers can
//! distinguish a malformed header from bad gas accounting without parsing
//! strings.

use chain_types::{short_hash, Hash};
use state_trie::TrieError;
use thiserror::Error;

/// Why a candidate block was rejected.
///
/// All variants are fatal to that block's insertion; nothing is partially
/// applied.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A transaction carries no receipt. Execution was skipped or run out
    /// of order upstream.
    #[error("transaction {tx_index} has no receipt")]
    EmptyReceipt { tx_index: usize },

    /// The re-derived receipts root does not match the header claim.
    #[error("receipt root mismatch: header claims {}, derived {}", short_hash(declared), short_hash(derived))]
    ReceiptRootMismatch { declared: Hash, derived: Hash },

    /// The re-derived total gas does not match the header's gas-used claim.
    #[error("gas used invalid: header claims {declared}, derived {derived}")]
    GasUsedInvalid { declared: u64, derived: u64 },

    /// Total gas exceeds the header's own gas limit.
    #[error("gas over limit: used {used}, limit {limit}")]
    GasOverLimit { used: u64, limit: u64 },

    /// Cumulative gas counters must be non-decreasing across the block's
    /// transaction order.
    #[error("receipt out of order: cumulative gas fell from {prev} to {next} at transaction {tx_index}")]
    ReceiptOutOfOrder {
        tx_index: usize,
        prev: u64,
        next: u64,
    },

    /// The header's parent hash does not name a committed block.
    #[error("unknown parent block {}", short_hash(parent_hash))]
    UnknownParent { parent_hash: Hash },

    /// The header's height does not follow its parent.
    #[error("non-sequential height: expected {expected}, got {got}")]
    NonSequentialHeight { expected: u64, got: u64 },

    /// A block must declare a positive gas budget.
    #[error("header declares zero gas limit")]
    ZeroGasLimit,

    /// Trie failure while deriving the receipts root.
    #[error(transparent)]
    Trie(#[from] TrieError),
}
