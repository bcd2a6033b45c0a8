//! # block-validation
//!
//! The Block Insertion Validation Pipeline: the gate every candidate block
//! must pass before it is committed to the canonical chain.
//!
//! ## Role in System
//!
//! - **Independent Verification**: the header's gas-used and receipts-root
//!   fields are producer *claims*; this crate re-derives both from the
//!   block's transaction list and rejects any mismatch.
//! - **Explicit Stage Chain**: validation is an ordered list of stage
//!   objects run by a driver loop that stops at the first typed error;
//!   no stage is ever skipped silently.
//! - **Synchronous per candidate**: one pipeline pass per block, stages
//!   strictly in order; later stages read artifacts (receipts) stored into
//!   the shared context by earlier ones.

pub mod domain;
pub mod ports;

pub use domain::*;
pub use ports::*;
