//! # Account State Database
//!
//! A session over one account-trie root. Reads decode account records out
//! of the trie lazily; writes go to an in-memory dirty overlay guarded by
//! the mutation journal; `commit` folds the overlay back into the trie and
//! returns the new root hash.

use crate::domain::{Account, Journal, JournalEntry, StateError, StateObject, EMPTY_CODE_HASH};
use chain_types::{keccak256, Address, Hash, Log, U256};
use state_trie::{MerkleTrie, StateStorage};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tracing::{debug, info};

/// The stateful transaction-execution surface over one trie root.
///
/// Not safe for concurrent mutation; serialize all writers on one
/// instance. Open independent instances for independent roots.
pub struct AccountStateDb {
    storage: Arc<StateStorage>,
    trie: MerkleTrie,
    objects: HashMap<Address, StateObject>,
    /// Addresses touched since the last commit, in deterministic order.
    dirty: BTreeSet<Address>,
    journal: Journal,
    logs: Vec<Log>,
}

impl AccountStateDb {
    /// Open a session at `root` (zero hash opens the empty state).
    ///
    /// Fails with a trie error if the root is not present in the store.
    pub fn new(root: Hash, storage: Arc<StateStorage>) -> Result<Self, StateError> {
        let trie = storage.open_trie(root)?;
        Ok(Self {
            storage,
            trie,
            objects: HashMap::new(),
            dirty: BTreeSet::new(),
            journal: Journal::new(),
            logs: Vec::new(),
        })
    }

    /// The root this session currently hashes to, without persisting.
    pub fn intermediate_root(&self) -> Hash {
        self.trie.hash()
    }

    // =========================================================================
    // ACCOUNT LIFECYCLE
    // =========================================================================

    /// Create a zero-value account if absent. Idempotent.
    pub fn new_account_state(&mut self, address: &Address) -> Result<(), StateError> {
        if self.exist(address)? {
            return Ok(());
        }
        self.objects.insert(*address, StateObject::new());
        self.dirty.insert(*address);
        self.journal
            .record(JournalEntry::AccountCreated { address: *address });
        Ok(())
    }

    /// Whether the address has state, in the cache or in the trie.
    pub fn exist(&mut self, address: &Address) -> Result<bool, StateError> {
        self.ensure_loaded(address)
    }

    // =========================================================================
    // READS
    // =========================================================================

    pub fn get_balance(&mut self, address: &Address) -> Result<U256, StateError> {
        Ok(self.object(address)?.account.balance)
    }

    pub fn get_nonce(&mut self, address: &Address) -> Result<u64, StateError> {
        Ok(self.object(address)?.account.nonce)
    }

    pub fn get_stake(&mut self, address: &Address) -> Result<U256, StateError> {
        Ok(self.object(address)?.account.stake)
    }

    pub fn get_last_elect(&mut self, address: &Address) -> Result<u64, StateError> {
        Ok(self.object(address)?.account.last_elect)
    }

    pub fn get_performance(&mut self, address: &Address) -> Result<u64, StateError> {
        Ok(self.object(address)?.account.performance)
    }

    pub fn get_code_hash(&mut self, address: &Address) -> Result<Hash, StateError> {
        Ok(self.object(address)?.account.code_hash)
    }

    pub fn get_abi_hash(&mut self, address: &Address) -> Result<Hash, StateError> {
        Ok(self.object(address)?.account.abi_hash)
    }

    /// Contract code bytes; empty for a non-contract account.
    pub fn get_code(&mut self, address: &Address) -> Result<Vec<u8>, StateError> {
        let (cached, hash) = {
            let obj = self.object(address)?;
            (obj.code.clone(), obj.account.code_hash)
        };
        self.load_blob(address, cached, hash, |obj, bytes| obj.code = Some(bytes))
    }

    /// ABI description bytes; empty if none was set.
    pub fn get_abi(&mut self, address: &Address) -> Result<Vec<u8>, StateError> {
        let (cached, hash) = {
            let obj = self.object(address)?;
            (obj.abi.clone(), obj.account.abi_hash)
        };
        self.load_blob(address, cached, hash, |obj, bytes| obj.abi = Some(bytes))
    }

    /// Read a storage cell of the account. Missing cells read as empty.
    pub fn get_state(&mut self, address: &Address, key: &[u8]) -> Result<Vec<u8>, StateError> {
        let hashed = keccak256(key);
        self.ensure_storage_trie(address)?;

        let obj = self
            .objects
            .get(address)
            .ok_or(StateError::AccountNotFound { address: *address })?;
        if let Some(value) = obj.dirty_storage.get(&hashed) {
            return Ok(value.clone());
        }
        match &obj.storage_trie {
            Some(trie) => Ok(trie.try_get(&hashed)?.unwrap_or_default()),
            None => Ok(Vec::new()),
        }
    }

    /// Logs emitted during the current uncommitted session.
    pub fn logs(&self) -> &[Log] {
        &self.logs
    }

    // =========================================================================
    // WRITES
    // =========================================================================

    pub fn add_balance(&mut self, address: &Address, amount: U256) -> Result<(), StateError> {
        let obj = self.object_mut(address)?;
        let prev = obj.account.balance;
        obj.account.balance = prev + amount;
        self.touch(address, JournalEntry::BalanceChanged {
            address: *address,
            prev,
        });
        Ok(())
    }

    /// Debit the balance. The caller must have validated sufficiency;
    /// going below zero is an upstream correctness bug and reports
    /// [`StateError::InsufficientBalance`].
    pub fn sub_balance(&mut self, address: &Address, amount: U256) -> Result<(), StateError> {
        let obj = self.object_mut(address)?;
        let prev = obj.account.balance;
        if prev < amount {
            return Err(StateError::InsufficientBalance {
                required: amount,
                available: prev,
            });
        }
        obj.account.balance = prev - amount;
        self.touch(address, JournalEntry::BalanceChanged {
            address: *address,
            prev,
        });
        Ok(())
    }

    pub fn set_nonce(&mut self, address: &Address, nonce: u64) -> Result<(), StateError> {
        let obj = self.object_mut(address)?;
        let prev = obj.account.nonce;
        obj.account.nonce = nonce;
        self.touch(address, JournalEntry::NonceChanged {
            address: *address,
            prev,
        });
        Ok(())
    }

    /// Increment the nonce by one.
    pub fn add_nonce(&mut self, address: &Address) -> Result<(), StateError> {
        let current = self.get_nonce(address)?;
        self.set_nonce(address, current + 1)
    }

    pub fn add_stake(&mut self, address: &Address, amount: U256) -> Result<(), StateError> {
        let obj = self.object_mut(address)?;
        let prev = obj.account.stake;
        obj.account.stake = prev + amount;
        self.touch(address, JournalEntry::StakeChanged {
            address: *address,
            prev,
        });
        Ok(())
    }

    pub fn sub_stake(&mut self, address: &Address, amount: U256) -> Result<(), StateError> {
        let obj = self.object_mut(address)?;
        let prev = obj.account.stake;
        if prev < amount {
            return Err(StateError::InsufficientBalance {
                required: amount,
                available: prev,
            });
        }
        obj.account.stake = prev - amount;
        self.touch(address, JournalEntry::StakeChanged {
            address: *address,
            prev,
        });
        Ok(())
    }

    pub fn set_last_elect(&mut self, address: &Address, height: u64) -> Result<(), StateError> {
        let obj = self.object_mut(address)?;
        let prev = obj.account.last_elect;
        obj.account.last_elect = height;
        self.touch(address, JournalEntry::LastElectChanged {
            address: *address,
            prev,
        });
        Ok(())
    }

    pub fn set_performance(&mut self, address: &Address, value: u64) -> Result<(), StateError> {
        let obj = self.object_mut(address)?;
        let prev = obj.account.performance;
        obj.account.performance = value;
        self.touch(address, JournalEntry::PerformanceChanged {
            address: *address,
            prev,
        });
        Ok(())
    }

    /// Set the contract code. Empty bytes hash to [`EMPTY_CODE_HASH`].
    pub fn set_code(&mut self, address: &Address, code: Vec<u8>) -> Result<(), StateError> {
        let hash = blob_hash(&code);
        let obj = self.object_mut(address)?;
        let entry = JournalEntry::CodeChanged {
            address: *address,
            prev_code: obj.code.take(),
            prev_hash: obj.account.code_hash,
        };
        obj.account.code_hash = hash;
        obj.code = Some(code);
        obj.code_dirty = true;
        self.touch(address, entry);
        Ok(())
    }

    /// Set the contract ABI description. Empty bytes hash to
    /// [`EMPTY_CODE_HASH`].
    pub fn set_abi(&mut self, address: &Address, abi: Vec<u8>) -> Result<(), StateError> {
        let hash = blob_hash(&abi);
        let obj = self.object_mut(address)?;
        let entry = JournalEntry::AbiChanged {
            address: *address,
            prev_abi: obj.abi.take(),
            prev_hash: obj.account.abi_hash,
        };
        obj.account.abi_hash = hash;
        obj.abi = Some(abi);
        obj.abi_dirty = true;
        self.touch(address, entry);
        Ok(())
    }

    /// Write a storage cell. An empty value deletes the cell.
    pub fn set_state(
        &mut self,
        address: &Address,
        key: &[u8],
        value: Vec<u8>,
    ) -> Result<(), StateError> {
        let prev = self.get_state(address, key)?;
        let hashed = keccak256(key);
        let obj = self
            .objects
            .get_mut(address)
            .ok_or(StateError::AccountNotFound { address: *address })?;
        obj.dirty_storage.insert(hashed, value);
        self.touch(address, JournalEntry::StorageChanged {
            address: *address,
            key: hashed,
            prev,
        });
        Ok(())
    }

    /// Record an emitted event in the session log list.
    pub fn add_log(&mut self, log: Log) {
        self.journal.record(JournalEntry::LogEmitted);
        self.logs.push(log);
    }

    // =========================================================================
    // SNAPSHOT / REVERT
    // =========================================================================

    /// Take a checkpoint of the current dirty/log state.
    pub fn snapshot(&mut self) -> usize {
        self.journal.snapshot()
    }

    /// Undo every mutation recorded after snapshot `id`.
    ///
    /// Restores balances, nonces, stake bookkeeping, code, storage, and
    /// logs to exactly their state when the snapshot was taken. Newer
    /// snapshots become invalid.
    pub fn revert_to_snapshot(&mut self, id: usize) -> Result<(), StateError> {
        let undone = self.journal.revert_to(id)?;
        debug!(snapshot = id, entries = undone.len(), "reverting state");

        for entry in undone.into_iter().rev() {
            match entry {
                JournalEntry::AccountCreated { address } => {
                    self.objects.remove(&address);
                    self.dirty.remove(&address);
                }
                JournalEntry::BalanceChanged { address, prev } => {
                    if let Some(obj) = self.objects.get_mut(&address) {
                        obj.account.balance = prev;
                    }
                }
                JournalEntry::NonceChanged { address, prev } => {
                    if let Some(obj) = self.objects.get_mut(&address) {
                        obj.account.nonce = prev;
                    }
                }
                JournalEntry::StakeChanged { address, prev } => {
                    if let Some(obj) = self.objects.get_mut(&address) {
                        obj.account.stake = prev;
                    }
                }
                JournalEntry::LastElectChanged { address, prev } => {
                    if let Some(obj) = self.objects.get_mut(&address) {
                        obj.account.last_elect = prev;
                    }
                }
                JournalEntry::PerformanceChanged { address, prev } => {
                    if let Some(obj) = self.objects.get_mut(&address) {
                        obj.account.performance = prev;
                    }
                }
                JournalEntry::CodeChanged {
                    address,
                    prev_code,
                    prev_hash,
                } => {
                    if let Some(obj) = self.objects.get_mut(&address) {
                        obj.code = prev_code;
                        obj.account.code_hash = prev_hash;
                    }
                }
                JournalEntry::AbiChanged {
                    address,
                    prev_abi,
                    prev_hash,
                } => {
                    if let Some(obj) = self.objects.get_mut(&address) {
                        obj.abi = prev_abi;
                        obj.account.abi_hash = prev_hash;
                    }
                }
                JournalEntry::StorageChanged { address, key, prev } => {
                    if let Some(obj) = self.objects.get_mut(&address) {
                        obj.dirty_storage.insert(key, prev);
                    }
                }
                JournalEntry::LogEmitted => {
                    self.logs.pop();
                }
            }
        }
        Ok(())
    }

    // =========================================================================
    // COMMIT
    // =========================================================================

    /// Persist every dirty account into the trie and return the new root.
    ///
    /// Storage overlays are folded into each account's storage trie first,
    /// code/abi blobs are written under their hash, then the re-encoded
    /// account records go into the account trie.
    ///
    /// Any trie or storage failure aborts the whole commit; nothing
    /// partial is durable and the instance must be discarded in favor of
    /// a fresh session at the last known-good root.
    pub fn commit(&mut self) -> Result<Hash, StateError> {
        let addresses: Vec<Address> = self.dirty.iter().copied().collect();

        for address in &addresses {
            self.flush_storage(address)?;
            self.flush_blobs(address)?;

            if let Some(obj) = self.objects.get(address) {
                let encoded = obj.account.rlp_encode();
                self.trie.try_update(&keccak256(address), encoded)?;
            }
        }

        let root = self.trie.commit()?;
        self.dirty.clear();
        self.journal.clear();
        self.logs.clear();

        info!(
            accounts = addresses.len(),
            root = %hex::encode(&root[..4]),
            "committed account state"
        );
        Ok(root)
    }

    // =========================================================================
    // INTERNALS
    // =========================================================================

    /// Load the account record from the trie into the object cache.
    /// Returns whether the account exists.
    fn ensure_loaded(&mut self, address: &Address) -> Result<bool, StateError> {
        if self.objects.contains_key(address) {
            return Ok(true);
        }
        match self.trie.try_get(&keccak256(address))? {
            Some(bytes) => {
                let account =
                    Account::rlp_decode(&bytes).map_err(|reason| StateError::AccountDecode {
                        address: *address,
                        reason,
                    })?;
                self.objects
                    .insert(*address, StateObject::from_account(account));
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn object(&mut self, address: &Address) -> Result<&StateObject, StateError> {
        if !self.ensure_loaded(address)? {
            return Err(StateError::AccountNotFound { address: *address });
        }
        self.objects
            .get(address)
            .ok_or(StateError::AccountNotFound { address: *address })
    }

    fn object_mut(&mut self, address: &Address) -> Result<&mut StateObject, StateError> {
        if !self.ensure_loaded(address)? {
            return Err(StateError::AccountNotFound { address: *address });
        }
        self.objects
            .get_mut(address)
            .ok_or(StateError::AccountNotFound { address: *address })
    }

    /// Mark an address dirty and journal the mutation that touched it.
    fn touch(&mut self, address: &Address, entry: JournalEntry) {
        self.dirty.insert(*address);
        self.journal.record(entry);
    }

    /// Open the account's storage trie if it is not already open.
    fn ensure_storage_trie(&mut self, address: &Address) -> Result<(), StateError> {
        if !self.ensure_loaded(address)? {
            return Err(StateError::AccountNotFound { address: *address });
        }
        let needs_open = self
            .objects
            .get(address)
            .map(|o| o.storage_trie.is_none())
            .unwrap_or(false);
        if needs_open {
            let storage_root = self
                .objects
                .get(address)
                .map(|o| o.account.storage_root)
                .unwrap_or_default();
            let trie = self
                .storage
                .open_storage_trie(keccak256(address), storage_root)?;
            if let Some(obj) = self.objects.get_mut(address) {
                obj.storage_trie = Some(trie);
            }
        }
        Ok(())
    }

    /// Fold the dirty storage overlay into the account's storage trie and
    /// refresh the account's storage root.
    fn flush_storage(&mut self, address: &Address) -> Result<(), StateError> {
        let needs_flush = self
            .objects
            .get(address)
            .map(|o| !o.dirty_storage.is_empty())
            .unwrap_or(false);
        if !needs_flush {
            return Ok(());
        }

        self.ensure_storage_trie(address)?;
        if let Some(obj) = self.objects.get_mut(address) {
            if let Some(trie) = obj.storage_trie.as_mut() {
                for (key, value) in std::mem::take(&mut obj.dirty_storage) {
                    if value.is_empty() {
                        trie.try_delete(&key)?;
                    } else {
                        trie.try_update(&key, value)?;
                    }
                }
                obj.account.storage_root = trie.commit()?;
            }
        }
        Ok(())
    }

    /// Write changed code/abi blobs into the raw store under their hash.
    fn flush_blobs(&mut self, address: &Address) -> Result<(), StateError> {
        let mut blobs: Vec<(Hash, Vec<u8>)> = Vec::new();
        if let Some(obj) = self.objects.get(address) {
            if obj.code_dirty {
                if let Some(code) = &obj.code {
                    if !code.is_empty() {
                        blobs.push((obj.account.code_hash, code.clone()));
                    }
                }
            }
            if obj.abi_dirty {
                if let Some(abi) = &obj.abi {
                    if !abi.is_empty() {
                        blobs.push((obj.account.abi_hash, abi.clone()));
                    }
                }
            }
        }
        if !blobs.is_empty() {
            self.storage.db().batch_put(blobs)?;
        }
        if let Some(obj) = self.objects.get_mut(address) {
            obj.code_dirty = false;
            obj.abi_dirty = false;
        }
        Ok(())
    }

    /// Read a code/abi blob, preferring the object cache, falling back to
    /// the raw store by hash.
    fn load_blob(
        &mut self,
        address: &Address,
        cached: Option<Vec<u8>>,
        hash: Hash,
        install: impl FnOnce(&mut StateObject, Vec<u8>),
    ) -> Result<Vec<u8>, StateError> {
        if let Some(bytes) = cached {
            return Ok(bytes);
        }
        if hash == EMPTY_CODE_HASH {
            return Ok(Vec::new());
        }
        match self.storage.db().get_node(&hash)? {
            Some(bytes) => {
                if let Some(obj) = self.objects.get_mut(address) {
                    install(obj, bytes.clone());
                }
                Ok(bytes)
            }
            None => Err(StateError::Trie(state_trie::TrieError::MissingNode {
                hash,
            })),
        }
    }
}

/// Hash for code/abi blobs; empty bytes map to the zero sentinel.
fn blob_hash(bytes: &[u8]) -> Hash {
    if bytes.is_empty() {
        EMPTY_CODE_HASH
    } else {
        keccak256(bytes)
    }
}
