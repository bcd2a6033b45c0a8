//! # Meridian Test Suite
//!
//! Unified test crate for cross-crate flows:
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── state_flows.rs     # trie + account-state choreography
//!     └── block_insertion.rs # full pipeline over executed blocks
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p meridian-tests
//! cargo test -p meridian-tests integration::
//! ```

#![allow(dead_code)]

pub mod integration;
