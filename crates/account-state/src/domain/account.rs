//! # Account Record
//!
//! The per-address record stored in the account state trie.
//!
//! ## Type Decisions
//!
//! - `balance`, `stake`: `U256` arbitrary-precision non-negative amounts.
//! - `nonce`, `last_elect`, `performance`: `u64` counters.
//! - A zero `code_hash` means "not a contract"; such an account has no
//!   storage trie content addressed from it.

use chain_types::rlp::{self, RlpError};
use chain_types::{Hash, U256, ZERO_HASH};
use serde::{Deserialize, Serialize};
use state_trie::EMPTY_TRIE_ROOT;

/// Code hash sentinel for accounts without contract code.
/// Empty code/abi bytes hash to this value by definition.
pub const EMPTY_CODE_HASH: Hash = ZERO_HASH;

/// Account state stored in the account trie, one record per address.
///
/// RLP-encoded as:
/// [nonce, balance, stake, last_elect, performance, code_hash, abi_hash,
/// storage_root]. The encoding is canonical; it is what gets hashed into
/// the state root.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Transaction counter. Only ever increases.
    pub nonce: u64,
    /// Balance in base units. Never negative by construction.
    pub balance: U256,
    /// Amount locked as verifier stake.
    pub stake: U256,
    /// Height of the last election this verifier participated in.
    pub last_elect: u64,
    /// Verifier performance bookkeeping counter.
    pub performance: u64,
    /// Keccak256 of contract bytecode; EMPTY_CODE_HASH for plain accounts.
    pub code_hash: Hash,
    /// Keccak256 of the contract's ABI description; EMPTY_CODE_HASH if none.
    pub abi_hash: Hash,
    /// Root of this account's own storage trie.
    pub storage_root: Hash,
}

impl Default for Account {
    fn default() -> Self {
        Self {
            nonce: 0,
            balance: U256::zero(),
            stake: U256::zero(),
            last_elect: 0,
            performance: 0,
            code_hash: EMPTY_CODE_HASH,
            abi_hash: EMPTY_CODE_HASH,
            storage_root: EMPTY_TRIE_ROOT,
        }
    }
}

impl Account {
    /// Whether this account carries contract code.
    pub fn is_contract(&self) -> bool {
        self.code_hash != EMPTY_CODE_HASH
    }

    /// Canonical RLP encoding for trie storage.
    pub fn rlp_encode(&self) -> Vec<u8> {
        let mut payload = Vec::with_capacity(160);
        payload.extend(rlp::encode_u64(self.nonce));
        payload.extend(rlp::encode_u256(&self.balance));
        payload.extend(rlp::encode_u256(&self.stake));
        payload.extend(rlp::encode_u64(self.last_elect));
        payload.extend(rlp::encode_u64(self.performance));
        payload.extend(rlp::encode_bytes(&self.code_hash));
        payload.extend(rlp::encode_bytes(&self.abi_hash));
        payload.extend(rlp::encode_bytes(&self.storage_root));
        rlp::wrap_list(payload)
    }

    /// Decode a trie value back into an account record.
    ///
    /// Failure here means the persisted bytes are corrupt. It is never
    /// treated as "account has default state".
    pub fn rlp_decode(data: &[u8]) -> Result<Self, RlpError> {
        let item = rlp::decode(data)?;
        let fields = item.as_list_of(8)?;
        Ok(Self {
            nonce: fields[0].as_u64()?,
            balance: fields[1].as_u256()?,
            stake: fields[2].as_u256()?,
            last_elect: fields[3].as_u64()?,
            performance: fields[4].as_u64()?,
            code_hash: fields[5].as_hash()?,
            abi_hash: fields[6].as_hash()?,
            storage_root: fields[7].as_hash()?,
        })
    }
}
