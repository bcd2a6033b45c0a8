use chain_types::{Address, RlpError, U256};
use state_trie::TrieError;
use thiserror::Error;

/// Errors surfaced by the Account State Database.
///
/// `AccountNotFound` is the expected, recoverable kind: reading an address
/// that was never created is an explicit condition, not a silent zero.
/// `InsufficientBalance` and `SnapshotNotFound` indicate caller bugs;
/// execution must validate sufficiency and snapshot ids upstream.
/// `AccountDecode` and `Trie` are fatal to the current operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
    #[error("account does not exist: 0x{}", hex::encode(address))]
    AccountNotFound { address: Address },

    #[error("insufficient balance: required {required}, available {available}")]
    InsufficientBalance { required: U256, available: U256 },

    #[error("snapshot {id} does not exist")]
    SnapshotNotFound { id: usize },

    #[error("undecodable account record for 0x{}: {reason}", hex::encode(address))]
    AccountDecode { address: Address, reason: RlpError },

    #[error(transparent)]
    Trie(#[from] TrieError),
}
