//! # State Flow Integration
//!
//! Cross-crate choreography between state-trie and account-state: commits
//! producing verifiable roots, historical roots staying readable, and
//! snapshot/revert isolating speculative execution.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use account_state::{AccountStateDb, StateError, EMPTY_CODE_HASH};
    use chain_types::{keccak256, Address, Log, ZERO_HASH, U256};
    use state_trie::{InMemoryTrieDb, StateStorage};

    const ALICE: Address = [0xA1; 20];
    const BOB: Address = [0xB2; 20];

    fn fresh_storage() -> Arc<StateStorage> {
        Arc::new(StateStorage::new(Arc::new(InMemoryTrieDb::new())))
    }

    fn open_empty(storage: &Arc<StateStorage>) -> AccountStateDb {
        AccountStateDb::new(ZERO_HASH, Arc::clone(storage)).unwrap()
    }

    /// Seed the canonical test fixture: alice funded with 9e6 base units.
    fn seed_alice(db: &mut AccountStateDb) {
        db.new_account_state(&ALICE).unwrap();
        db.add_balance(&ALICE, U256::from(9_000_000u64)).unwrap();
    }

    // =========================================================================
    // DETERMINISM
    // =========================================================================

    #[test]
    fn test_identical_mutation_sequences_commit_to_identical_roots() {
        let run = || {
            let storage = fresh_storage();
            let mut db = open_empty(&storage);
            seed_alice(&mut db);
            db.new_account_state(&BOB).unwrap();
            db.sub_balance(&ALICE, U256::from(200)).unwrap();
            db.add_balance(&BOB, U256::from(200)).unwrap();
            db.add_nonce(&ALICE).unwrap();
            db.set_state(&ALICE, b"position", b"long".to_vec()).unwrap();
            db.commit().unwrap()
        };

        // Two fully independent stores must agree on the root
        assert_eq!(run(), run());
    }

    #[test]
    fn test_mutation_order_within_commit_does_not_change_root() {
        let storage_a = fresh_storage();
        let mut a = open_empty(&storage_a);
        a.new_account_state(&ALICE).unwrap();
        a.new_account_state(&BOB).unwrap();
        a.add_balance(&ALICE, U256::from(1)).unwrap();
        a.add_balance(&BOB, U256::from(2)).unwrap();

        let storage_b = fresh_storage();
        let mut b = open_empty(&storage_b);
        b.new_account_state(&BOB).unwrap();
        b.add_balance(&BOB, U256::from(2)).unwrap();
        b.new_account_state(&ALICE).unwrap();
        b.add_balance(&ALICE, U256::from(1)).unwrap();

        assert_eq!(a.commit().unwrap(), b.commit().unwrap());
    }

    // =========================================================================
    // HISTORICAL ROOTS
    // =========================================================================

    #[test]
    fn test_historical_root_remains_readable_after_later_commits() {
        let storage = fresh_storage();
        let mut db = open_empty(&storage);
        seed_alice(&mut db);
        let root_v1 = db.commit().unwrap();

        db.sub_balance(&ALICE, U256::from(5_000_000u64)).unwrap();
        let root_v2 = db.commit().unwrap();
        assert_ne!(root_v1, root_v2);

        // The old root still opens and shows the old balance
        let mut historical = AccountStateDb::new(root_v1, Arc::clone(&storage)).unwrap();
        assert_eq!(
            historical.get_balance(&ALICE).unwrap(),
            U256::from(9_000_000u64)
        );

        let mut current = AccountStateDb::new(root_v2, storage).unwrap();
        assert_eq!(
            current.get_balance(&ALICE).unwrap(),
            U256::from(4_000_000u64)
        );
    }

    #[test]
    fn test_parallel_sessions_at_same_root_are_isolated() {
        let storage = fresh_storage();
        let mut db = open_empty(&storage);
        seed_alice(&mut db);
        let root = db.commit().unwrap();

        let mut left = AccountStateDb::new(root, Arc::clone(&storage)).unwrap();
        let mut right = AccountStateDb::new(root, Arc::clone(&storage)).unwrap();

        left.sub_balance(&ALICE, U256::from(100)).unwrap();
        right.add_balance(&ALICE, U256::from(100)).unwrap();

        let left_root = left.commit().unwrap();
        let right_root = right.commit().unwrap();
        assert_ne!(left_root, right_root);

        let mut left_view = AccountStateDb::new(left_root, Arc::clone(&storage)).unwrap();
        let mut right_view = AccountStateDb::new(right_root, storage).unwrap();
        assert_eq!(
            left_view.get_balance(&ALICE).unwrap(),
            U256::from(8_999_900u64)
        );
        assert_eq!(
            right_view.get_balance(&ALICE).unwrap(),
            U256::from(9_000_100u64)
        );
    }

    // =========================================================================
    // SNAPSHOT / REVERT
    // =========================================================================

    #[test]
    fn test_reverted_execution_leaves_committed_root_unchanged() {
        let storage = fresh_storage();
        let mut db = open_empty(&storage);
        seed_alice(&mut db);
        let clean_root = db.commit().unwrap();

        // Speculative execution that gets rolled back entirely
        let checkpoint = db.snapshot();
        db.sub_balance(&ALICE, U256::from(1_000)).unwrap();
        db.new_account_state(&BOB).unwrap();
        db.add_balance(&BOB, U256::from(1_000)).unwrap();
        db.set_code(&BOB, vec![0x60, 0x60]).unwrap();
        db.add_log(Log {
            address: BOB,
            topics: vec![keccak256(b"Transfer")],
            data: vec![],
        });
        db.revert_to_snapshot(checkpoint).unwrap();

        assert_eq!(db.commit().unwrap(), clean_root);
        assert!(db.logs().is_empty());
    }

    #[test]
    fn test_partial_revert_keeps_earlier_mutations() {
        let storage = fresh_storage();
        let mut db = open_empty(&storage);
        seed_alice(&mut db);

        db.sub_balance(&ALICE, U256::from(200)).unwrap();
        let checkpoint = db.snapshot();
        db.sub_balance(&ALICE, U256::from(999)).unwrap();
        db.revert_to_snapshot(checkpoint).unwrap();

        // First debit survives, second is undone
        assert_eq!(
            db.get_balance(&ALICE).unwrap(),
            U256::from(8_999_800u64)
        );
    }

    #[test]
    fn test_revert_restores_contract_storage_and_code() {
        let storage = fresh_storage();
        let mut db = open_empty(&storage);
        db.new_account_state(&BOB).unwrap();
        db.set_code(&BOB, vec![1, 2, 3]).unwrap();
        db.set_state(&BOB, b"owner", ALICE.to_vec()).unwrap();
        let root = db.commit().unwrap();

        let mut session = AccountStateDb::new(root, storage).unwrap();
        let checkpoint = session.snapshot();
        session.set_code(&BOB, vec![9, 9, 9]).unwrap();
        session.set_state(&BOB, b"owner", BOB.to_vec()).unwrap();
        session.revert_to_snapshot(checkpoint).unwrap();

        assert_eq!(session.get_code(&BOB).unwrap(), vec![1, 2, 3]);
        assert_eq!(session.get_state(&BOB, b"owner").unwrap(), ALICE.to_vec());
        // Re-committing the reverted session lands on the same root
        assert_eq!(session.commit().unwrap(), root);
    }

    // =========================================================================
    // ERROR SURFACE
    // =========================================================================

    #[test]
    fn test_missing_account_and_overdraft_are_distinguishable() {
        let storage = fresh_storage();
        let mut db = open_empty(&storage);

        assert!(matches!(
            db.get_balance(&BOB),
            Err(StateError::AccountNotFound { .. })
        ));

        seed_alice(&mut db);
        assert!(matches!(
            db.sub_balance(&ALICE, U256::from(9_000_001u64)),
            Err(StateError::InsufficientBalance { .. })
        ));
    }

    #[test]
    fn test_plain_account_has_empty_code_surface() {
        let storage = fresh_storage();
        let mut db = open_empty(&storage);
        seed_alice(&mut db);
        let root = db.commit().unwrap();

        let mut reopened = AccountStateDb::new(root, storage).unwrap();
        assert_eq!(reopened.get_code_hash(&ALICE).unwrap(), EMPTY_CODE_HASH);
        assert_eq!(reopened.get_code(&ALICE).unwrap(), Vec::<u8>::new());
        assert_eq!(reopened.get_abi(&ALICE).unwrap(), Vec::<u8>::new());
    }
}
