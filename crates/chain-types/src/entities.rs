//! # Core Domain Entities
//!
//! Blockchain entities shared by the state and validation crates.
//!
//! ## Clusters
//!
//! - **Chain**: `Block`, `BlockHeader`, `Transaction`
//! - **Execution Outcome**: `Receipt`, `Log`
//!
//! Balances use `U256`: account balances are arbitrary-precision
//! non-negative integers and must never wrap.

use serde::{Deserialize, Serialize};

use crate::rlp;

// Re-export U256 from primitive-types for use across all crates
pub use primitive_types::U256;

/// A 32-byte Keccak256 hash.
pub type Hash = [u8; 32];

/// A 20-byte account address.
pub type Address = [u8; 20];

/// The all-zero hash. Used as "no parent", "no code", and "empty root"
/// sentinel throughout the core.
pub const ZERO_HASH: Hash = [0u8; 32];

/// Format a hash as an abbreviated hex string for logging.
pub fn short_hash(hash: &Hash) -> String {
    format!("{}..", hex::encode(&hash[..4]))
}

// =============================================================================
// CLUSTER A: THE CHAIN
// =============================================================================

/// The header of a block containing metadata and root hashes.
///
/// The three root fields (`state_root`, `tx_root`, `receipts_root`) are the
/// producer's *claims*. The validation pipeline recomputes receipts and gas
/// from the transaction list and rejects the block if the claims do not
/// match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct BlockHeader {
    /// Protocol version for this block.
    pub version: u16,
    /// Block height in the chain.
    pub height: u64,
    /// Hash of the parent block (creates the chain linkage).
    pub parent_hash: Hash,
    /// Root of the transactions trie for this block.
    pub tx_root: Hash,
    /// Root hash of the account state trie after applying this block.
    pub state_root: Hash,
    /// Root of the receipts trie claimed by the block producer.
    pub receipts_root: Hash,
    /// Maximum gas the block's transactions may consume in total.
    pub gas_limit: u64,
    /// Total gas claimed to be consumed by the block's transactions.
    pub gas_used: u64,
    /// Unix timestamp when the block was proposed.
    pub timestamp: u64,
    /// The verifier who proposed this block.
    pub proposer: Address,
}

impl BlockHeader {
    /// Deterministic RLP encoding of the header, used for hashing.
    pub fn rlp_encode(&self) -> Vec<u8> {
        let mut payload = Vec::with_capacity(256);
        payload.extend(rlp::encode_u64(self.version as u64));
        payload.extend(rlp::encode_u64(self.height));
        payload.extend(rlp::encode_bytes(&self.parent_hash));
        payload.extend(rlp::encode_bytes(&self.tx_root));
        payload.extend(rlp::encode_bytes(&self.state_root));
        payload.extend(rlp::encode_bytes(&self.receipts_root));
        payload.extend(rlp::encode_u64(self.gas_limit));
        payload.extend(rlp::encode_u64(self.gas_used));
        payload.extend(rlp::encode_u64(self.timestamp));
        payload.extend(rlp::encode_bytes(&self.proposer));
        rlp::wrap_list(payload)
    }

    /// Compute the block hash.
    pub fn hash(&self) -> Hash {
        rlp::keccak256(&self.rlp_encode())
    }
}

/// A candidate block as handed to the validation pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Block {
    /// The block header.
    pub header: BlockHeader,
    /// Transactions in their authoritative, header-declared order.
    ///
    /// Order is load-bearing: gas accumulation and the receipts root both
    /// depend on it, so the pipeline must never reorder.
    pub transactions: Vec<Transaction>,
}

impl Block {
    /// Build a block from a header and an ordered transaction list.
    pub fn new(header: BlockHeader, transactions: Vec<Transaction>) -> Self {
        Self {
            header,
            transactions,
        }
    }

    /// Compute the block hash (hash of the header).
    pub fn hash(&self) -> Hash {
        self.header.hash()
    }

    /// Block height shortcut.
    pub fn height(&self) -> u64 {
        self.header.height
    }

    /// Number of transactions in the block body.
    pub fn tx_count(&self) -> usize {
        self.transactions.len()
    }

    /// Whether this is a designated genesis/special block.
    ///
    /// Special blocks carry no user transactions and bypass the
    /// per-transaction receipt and gas checks.
    pub fn is_special(&self) -> bool {
        self.header.height == 0 || (self.transactions.is_empty() && self.header.gas_used == 0)
    }
}

/// A transaction inside a candidate block.
///
/// Signature recovery happens upstream (signing and wallet management are
/// outside this core), so the sender address is already resolved here.
/// Execution pads the computed [`Receipt`] onto the transaction before the
/// validation pipeline runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Sender address (recovered from the signature upstream).
    pub from: Address,
    /// Recipient address (None for contract creation).
    pub to: Option<Address>,
    /// Transferred value in base units.
    pub value: U256,
    /// Sender's nonce, preventing replay.
    pub nonce: u64,
    /// Gas price in base units.
    pub gas_price: U256,
    /// Gas limit for this transaction.
    pub gas_limit: u64,
    /// Transaction payload (contract call data, etc.).
    pub data: Vec<u8>,
    /// Execution outcome, padded by the executor. None means execution has
    /// not run for this transaction.
    pub receipt: Option<Receipt>,
}

impl Transaction {
    /// Create a plain value-transfer transaction.
    pub fn transfer(from: Address, to: Address, value: U256, nonce: u64) -> Self {
        Self {
            from,
            to: Some(to),
            value,
            nonce,
            gas_price: U256::zero(),
            gas_limit: 0,
            data: vec![],
            receipt: None,
        }
    }

    /// Deterministic RLP encoding of the signing fields (receipt excluded).
    pub fn rlp_encode(&self) -> Vec<u8> {
        let mut payload = Vec::with_capacity(128);
        payload.extend(rlp::encode_bytes(&self.from));
        match &self.to {
            Some(to) => payload.extend(rlp::encode_bytes(to)),
            None => payload.extend(rlp::encode_bytes(&[])),
        }
        payload.extend(rlp::encode_u256(&self.value));
        payload.extend(rlp::encode_u64(self.nonce));
        payload.extend(rlp::encode_u256(&self.gas_price));
        payload.extend(rlp::encode_u64(self.gas_limit));
        payload.extend(rlp::encode_bytes(&self.data));
        rlp::wrap_list(payload)
    }

    /// Compute the transaction hash.
    pub fn hash(&self) -> Hash {
        rlp::keccak256(&self.rlp_encode())
    }

    /// Attach the receipt computed by execution.
    pub fn set_receipt(&mut self, receipt: Receipt) {
        self.receipt = Some(receipt);
    }

    /// The receipt padded onto this transaction, if execution has run.
    pub fn receipt(&self) -> Option<&Receipt> {
        self.receipt.as_ref()
    }
}

// =============================================================================
// CLUSTER B: EXECUTION OUTCOME
// =============================================================================

/// Execution status recorded in a receipt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReceiptStatus {
    Failed,
    Successful,
}

impl ReceiptStatus {
    fn as_u64(self) -> u64 {
        match self {
            ReceiptStatus::Failed => 0,
            ReceiptStatus::Successful => 1,
        }
    }
}

/// Immutable record of one transaction's execution outcome.
///
/// `cumulative_gas_used` is the running total of gas consumed by the block
/// up to and including this transaction. It is non-decreasing across the
/// block's transaction order by construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    /// Whether execution succeeded.
    pub status: ReceiptStatus,
    /// Gas consumed by the block up to and including this transaction.
    pub cumulative_gas_used: u64,
    /// Events emitted during execution, in emission order.
    pub logs: Vec<Log>,
}

impl Receipt {
    pub fn new(status: ReceiptStatus, cumulative_gas_used: u64, logs: Vec<Log>) -> Self {
        Self {
            status,
            cumulative_gas_used,
            logs,
        }
    }

    /// Deterministic RLP encoding, used for the receipts trie.
    pub fn rlp_encode(&self) -> Vec<u8> {
        let mut logs_payload = Vec::new();
        for log in &self.logs {
            logs_payload.extend(log.rlp_encode());
        }

        let mut payload = Vec::with_capacity(64);
        payload.extend(rlp::encode_u64(self.status.as_u64()));
        payload.extend(rlp::encode_u64(self.cumulative_gas_used));
        payload.extend(rlp::wrap_list(logs_payload));
        rlp::wrap_list(payload)
    }
}

/// An event emitted during transaction execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Log {
    /// Address of the account that emitted the event.
    pub address: Address,
    /// Indexed event topics.
    pub topics: Vec<Hash>,
    /// Opaque event payload.
    pub data: Vec<u8>,
}

impl Log {
    /// Deterministic RLP encoding: [address, [topics...], data].
    pub fn rlp_encode(&self) -> Vec<u8> {
        let mut topics_payload = Vec::new();
        for topic in &self.topics {
            topics_payload.extend(rlp::encode_bytes(topic));
        }

        let mut payload = Vec::with_capacity(64);
        payload.extend(rlp::encode_bytes(&self.address));
        payload.extend(rlp::wrap_list(topics_payload));
        payload.extend(rlp::encode_bytes(&self.data));
        rlp::wrap_list(payload)
    }
}
