//! # account-state
//!
//! The Account State Database: the stateful transaction-execution surface
//! of the Meridian node.
//!
//! ## Role in System
//!
//! - **VM State Interface**: implements the balance/nonce/code/storage
//!   read-write surface consumed by transaction execution.
//! - **Session over one trie root**: opened at a parent block's committed
//!   root, mutated by execution, then committed to a new root.
//! - **Snapshot/Revert**: nested checkpoints backed by a journal of inverse
//!   operations, so speculative execution can be rolled back exactly.
//!
//! Not safe for concurrent mutation: one instance per in-flight block
//! candidate. Independent instances opened at different roots may run on
//! separate threads; they share only the read-through node cache.

pub mod domain;
pub mod state_db;

pub use domain::*;
pub use state_db::*;
