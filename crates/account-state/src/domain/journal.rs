//! # Mutation Journal
//!
//! Arena of logged mutations backing snapshot/revert.
//!
//! Every state mutation appends the information needed to undo it. A
//! snapshot is a monotonically increasing id marking a position in the
//! arena; revert truncates the arena back to that position and hands the
//! removed entries to the database for inverse replay, newest first.
//! Reverting to an older snapshot invalidates all newer ones.

use super::StateError;
use chain_types::{Address, Hash, U256};

/// One undoable mutation, recording the pre-mutation value.
#[derive(Clone, Debug)]
pub enum JournalEntry {
    /// Account was created; undo removes it entirely.
    AccountCreated { address: Address },
    BalanceChanged { address: Address, prev: U256 },
    NonceChanged { address: Address, prev: u64 },
    StakeChanged { address: Address, prev: U256 },
    LastElectChanged { address: Address, prev: u64 },
    PerformanceChanged { address: Address, prev: u64 },
    CodeChanged {
        address: Address,
        prev_code: Option<Vec<u8>>,
        prev_hash: Hash,
    },
    AbiChanged {
        address: Address,
        prev_abi: Option<Vec<u8>>,
        prev_hash: Hash,
    },
    /// A storage cell changed; `prev` is the prior cell value, empty for
    /// a cell that did not exist.
    StorageChanged {
        address: Address,
        key: Hash,
        prev: Vec<u8>,
    },
    /// A log was emitted; undo pops it from the session log list.
    LogEmitted,
}

/// The journal: mutation arena plus the snapshot index.
#[derive(Default)]
pub struct Journal {
    entries: Vec<JournalEntry>,
    /// (snapshot id, arena length at snapshot time), ids strictly increasing.
    snapshots: Vec<(usize, usize)>,
    next_id: usize,
}

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a mutation.
    pub fn record(&mut self, entry: JournalEntry) {
        self.entries.push(entry);
    }

    /// Take a checkpoint; returns its strictly increasing id.
    pub fn snapshot(&mut self) -> usize {
        let id = self.next_id;
        self.next_id += 1;
        self.snapshots.push((id, self.entries.len()));
        id
    }

    /// Truncate the arena back to snapshot `id`.
    ///
    /// Returns the removed entries in application order; the caller must
    /// replay their inverses newest-first. All snapshots newer than `id`
    /// are invalidated; an unknown (already-passed or future) id is a
    /// caller bug and reports [`StateError::SnapshotNotFound`].
    pub fn revert_to(&mut self, id: usize) -> Result<Vec<JournalEntry>, StateError> {
        let position = self
            .snapshots
            .iter()
            .position(|(snapshot_id, _)| *snapshot_id == id)
            .ok_or(StateError::SnapshotNotFound { id })?;

        let (_, arena_len) = self.snapshots[position];
        self.snapshots.truncate(position);
        Ok(self.entries.split_off(arena_len))
    }

    /// Number of recorded mutations.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop all entries and snapshots (after a successful commit).
    pub fn clear(&mut self) {
        self.entries.clear();
        self.snapshots.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_ids_strictly_increase() {
        let mut journal = Journal::new();
        let a = journal.snapshot();
        let b = journal.snapshot();
        let c = journal.snapshot();
        assert!(a < b && b < c);
    }

    #[test]
    fn test_revert_returns_entries_after_mark() {
        let mut journal = Journal::new();
        journal.record(JournalEntry::LogEmitted);
        let id = journal.snapshot();
        journal.record(JournalEntry::LogEmitted);
        journal.record(JournalEntry::LogEmitted);

        let undone = journal.revert_to(id).unwrap();
        assert_eq!(undone.len(), 2);
        assert_eq!(journal.len(), 1);
    }

    #[test]
    fn test_revert_invalidates_newer_snapshots() {
        let mut journal = Journal::new();
        let old = journal.snapshot();
        let newer = journal.snapshot();

        journal.revert_to(old).unwrap();
        assert!(matches!(
            journal.revert_to(newer),
            Err(StateError::SnapshotNotFound { .. })
        ));
    }

    #[test]
    fn test_revert_to_unknown_id_fails() {
        let mut journal = Journal::new();
        journal.snapshot();
        assert!(matches!(
            journal.revert_to(99),
            Err(StateError::SnapshotNotFound { id: 99 })
        ));
    }
}
