//! # state-trie
//!
//! Trie storage layer for the Meridian state core.
//!
//! ## Role in System
//!
//! - **Content-Addressed Persistence**: every distinct key/value set has
//!   exactly one root hash; mutation never destroys nodes reachable from
//!   older roots, so any historical root stays openable.
//! - **Copy-on-Write Isolation**: tries opened from the same store share
//!   persisted nodes but keep independent in-memory overlays, allowing
//!   speculative execution against one root while another is being read.
//! - **Shared Node Cache**: the [`StateStorage`] manager injects one
//!   thread-safe read-through cache into every trie it opens, never a
//!   hidden process-wide singleton.

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod storage;

pub use adapters::*;
pub use domain::*;
pub use ports::*;
pub use storage::*;
