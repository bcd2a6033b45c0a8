use super::Account;
use chain_types::Hash;
use state_trie::MerkleTrie;
use std::collections::HashMap;

/// In-memory view of one account during a state session.
///
/// Holds the decoded [`Account`] record plus the uncommitted overlays:
/// dirty storage cells, and code/abi bytes pending persistence. Created
/// lazily on first access and kept as a read cache across commits.
#[derive(Clone)]
pub struct StateObject {
    pub account: Account,
    /// Contract code bytes, once loaded or set.
    pub code: Option<Vec<u8>>,
    /// ABI description bytes, once loaded or set.
    pub abi: Option<Vec<u8>>,
    /// Dirty storage cells keyed by hashed storage key.
    /// An empty value marks a deletion.
    pub dirty_storage: HashMap<Hash, Vec<u8>>,
    /// Lazily opened handle over this account's storage trie.
    pub storage_trie: Option<MerkleTrie>,
    /// Code bytes changed since the last commit.
    pub code_dirty: bool,
    /// ABI bytes changed since the last commit.
    pub abi_dirty: bool,
}

impl StateObject {
    /// Fresh zero-value account.
    pub fn new() -> Self {
        Self::from_account(Account::default())
    }

    /// Wrap an account decoded from the trie.
    pub fn from_account(account: Account) -> Self {
        Self {
            account,
            code: None,
            abi: None,
            dirty_storage: HashMap::new(),
            storage_trie: None,
            code_dirty: false,
            abi_dirty: false,
        }
    }
}

impl Default for StateObject {
    fn default() -> Self {
        Self::new()
    }
}
