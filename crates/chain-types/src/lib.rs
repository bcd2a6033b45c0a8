//! # Chain Types Crate
//!
//! Shared domain entities for the Meridian account-state core.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: All cross-crate types (blocks, transactions,
//!   receipts, hashes) are defined here.
//! - **Deterministic Encoding**: Anything that is hashed or stored in the
//!   state trie goes through the RLP codec in [`rlp`], never through a
//!   serde format. Identical content must always produce identical bytes.

pub mod entities;
pub mod rlp;

pub use entities::*;
pub use rlp::{keccak256, RlpError};
