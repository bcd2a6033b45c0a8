//! # Block Insertion Integration
//!
//! Drives the full validation pipeline over executed candidate blocks and
//! commits the resulting account state, mirroring what the insertion
//! orchestrator does: execute, attach receipts, validate claims, commit.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use account_state::AccountStateDb;
    use block_validation::{
        BlockContext, ChainReader, ValidationError, ValidationPipeline,
    };
    use chain_types::{
        Address, Block, BlockHeader, Hash, Receipt, ReceiptStatus, Transaction, ZERO_HASH, U256,
    };
    use state_trie::{derive_root, InMemoryTrieDb, StateStorage};

    const ALICE: Address = [0xA1; 20];
    const BOB: Address = [0xB2; 20];
    const GAS_PER_TRANSFER: u64 = 21_000;
    const GAS_PRICE: u64 = 2;
    const BLOCK_GAS_LIMIT: u64 = 2_100_000;

    // =========================================================================
    // FIXTURES
    // =========================================================================

    /// Route pipeline logs into the test harness when RUST_LOG is set.
    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    }

    struct FakeChain {
        blocks: Vec<Block>,
    }

    impl ChainReader for FakeChain {
        fn current_block(&self) -> Option<Block> {
            self.blocks.last().cloned()
        }
        fn block_by_hash(&self, hash: &Hash) -> Option<Block> {
            self.blocks.iter().find(|b| b.hash() == *hash).cloned()
        }
    }

    fn genesis() -> Block {
        Block::new(
            BlockHeader {
                gas_limit: BLOCK_GAS_LIMIT,
                ..Default::default()
            },
            vec![],
        )
    }

    /// Open a state session seeded with alice's genesis allocation.
    fn genesis_state() -> (Arc<StateStorage>, AccountStateDb, Hash) {
        let storage = Arc::new(StateStorage::new(Arc::new(InMemoryTrieDb::new())));
        let mut db = AccountStateDb::new(ZERO_HASH, Arc::clone(&storage)).unwrap();
        db.new_account_state(&ALICE).unwrap();
        db.add_balance(&ALICE, U256::from(9_000_000u64)).unwrap();
        let root = db.commit().unwrap();
        (storage, db, root)
    }

    /// Execute a simple value transfer against the state session and hand
    /// back the transaction with its receipt attached.
    fn execute_transfer(
        db: &mut AccountStateDb,
        nonce: u64,
        value: u64,
        cumulative_gas: u64,
    ) -> Transaction {
        let fee = U256::from(GAS_PER_TRANSFER * GAS_PRICE);
        db.sub_balance(&ALICE, U256::from(value) + fee).unwrap();
        if !db.exist(&BOB).unwrap() {
            db.new_account_state(&BOB).unwrap();
        }
        db.add_balance(&BOB, U256::from(value)).unwrap();
        db.add_nonce(&ALICE).unwrap();

        let mut tx = Transaction::transfer(ALICE, BOB, U256::from(value), nonce);
        tx.set_receipt(Receipt::new(
            ReceiptStatus::Successful,
            cumulative_gas,
            vec![],
        ));
        tx
    }

    /// Assemble a candidate block whose header claims match its contents.
    fn seal_block(parent: &Block, state_root: Hash, transactions: Vec<Transaction>) -> Block {
        let receipts: Vec<Vec<u8>> = transactions
            .iter()
            .map(|tx| tx.receipt().unwrap().rlp_encode())
            .collect();
        let gas_used = transactions
            .last()
            .and_then(|tx| tx.receipt())
            .map(|r| r.cumulative_gas_used)
            .unwrap_or(0);
        let header = BlockHeader {
            version: 1,
            height: parent.height() + 1,
            parent_hash: parent.hash(),
            state_root,
            receipts_root: derive_root(&receipts).unwrap(),
            gas_limit: BLOCK_GAS_LIMIT,
            gas_used,
            timestamp: 1_700_000_000,
            proposer: [0xCC; 20],
            ..Default::default()
        };
        Block::new(header, transactions)
    }

    // =========================================================================
    // FULL FLOW
    // =========================================================================

    #[test]
    fn test_executed_block_passes_pipeline_and_commits() {
        init_tracing();
        let (_, mut db, _) = genesis_state();
        let parent = genesis();
        let chain = FakeChain {
            blocks: vec![parent.clone()],
        };

        // Execute: alice pays 200 to bob at gas price 2
        let tx = execute_transfer(&mut db, 0, 200, GAS_PER_TRANSFER);
        let state_root = db.commit().unwrap();
        let block = seal_block(&parent, state_root, vec![tx]);

        let mut context = BlockContext::new(&block, &chain);
        ValidationPipeline::standard().run(&mut context).unwrap();

        // Receipts land in the context for the persistence stage
        assert_eq!(context.receipts.len(), 1);
        assert_eq!(context.receipts[0].cumulative_gas_used, GAS_PER_TRANSFER);

        // Post-state matches the executed transfer
        assert_eq!(
            db.get_balance(&ALICE).unwrap(),
            U256::from(9_000_000u64 - 200 - GAS_PER_TRANSFER * GAS_PRICE)
        );
        assert_eq!(db.get_balance(&BOB).unwrap(), U256::from(200));
        assert_eq!(db.get_nonce(&ALICE).unwrap(), 1);
    }

    #[test]
    fn test_multi_transaction_block_accumulates_gas() {
        let (_, mut db, _) = genesis_state();
        let parent = genesis();
        let chain = FakeChain {
            blocks: vec![parent.clone()],
        };

        let txs = vec![
            execute_transfer(&mut db, 0, 100, GAS_PER_TRANSFER),
            execute_transfer(&mut db, 1, 100, 2 * GAS_PER_TRANSFER),
            execute_transfer(&mut db, 2, 100, 3 * GAS_PER_TRANSFER),
        ];
        let state_root = db.commit().unwrap();
        let block = seal_block(&parent, state_root, txs);
        assert_eq!(block.header.gas_used, 3 * GAS_PER_TRANSFER);

        let mut context = BlockContext::new(&block, &chain);
        ValidationPipeline::standard().run(&mut context).unwrap();
        assert_eq!(context.receipts.len(), 3);
    }

    #[test]
    fn test_genesis_block_passes_whole_pipeline() {
        let block = genesis();
        let chain = FakeChain { blocks: vec![] };
        let mut context = BlockContext::new(&block, &chain);
        ValidationPipeline::standard().run(&mut context).unwrap();
        assert!(context.receipts.is_empty());
    }

    // =========================================================================
    // REJECTIONS
    // =========================================================================

    #[test]
    fn test_overstated_gas_claim_rejected() {
        let (_, mut db, _) = genesis_state();
        let parent = genesis();
        let chain = FakeChain {
            blocks: vec![parent.clone()],
        };

        let mut tx = execute_transfer(&mut db, 0, 200, 0);
        tx.set_receipt(Receipt::new(ReceiptStatus::Successful, 600, vec![]));
        let state_root = db.commit().unwrap();
        let mut block = seal_block(&parent, state_root, vec![tx]);
        // Producer claims less gas than the receipts add up to
        block.header.gas_used = 500;

        let mut context = BlockContext::new(&block, &chain);
        let result = ValidationPipeline::standard().run(&mut context);
        assert_eq!(
            result,
            Err(ValidationError::GasUsedInvalid {
                declared: 500,
                derived: 600
            })
        );
        // Nothing was handed forward
        assert!(context.receipts.is_empty());
    }

    #[test]
    fn test_unexecuted_transaction_rejected() {
        let (_, mut db, _) = genesis_state();
        let parent = genesis();
        let chain = FakeChain {
            blocks: vec![parent.clone()],
        };

        let executed = execute_transfer(&mut db, 0, 200, GAS_PER_TRANSFER);
        let state_root = db.commit().unwrap();
        let mut block = seal_block(&parent, state_root, vec![executed]);
        // Sneak in a transaction that skipped execution
        block
            .transactions
            .push(Transaction::transfer(ALICE, BOB, U256::from(1), 1));

        let mut context = BlockContext::new(&block, &chain);
        let result = ValidationPipeline::standard().run(&mut context);
        assert_eq!(result, Err(ValidationError::EmptyReceipt { tx_index: 1 }));
    }

    #[test]
    fn test_tampered_receipt_rejected() {
        let (_, mut db, _) = genesis_state();
        let parent = genesis();
        let chain = FakeChain {
            blocks: vec![parent.clone()],
        };

        let tx = execute_transfer(&mut db, 0, 200, GAS_PER_TRANSFER);
        let state_root = db.commit().unwrap();
        let mut block = seal_block(&parent, state_root, vec![tx]);
        // Flip the receipt status after sealing; the header root is stale
        block.transactions[0].set_receipt(Receipt::new(
            ReceiptStatus::Failed,
            GAS_PER_TRANSFER,
            vec![],
        ));

        let mut context = BlockContext::new(&block, &chain);
        let result = ValidationPipeline::standard().run(&mut context);
        assert!(matches!(
            result,
            Err(ValidationError::ReceiptRootMismatch { .. })
        ));
    }

    #[test]
    fn test_orphan_block_rejected_by_header_stage() {
        let chain = FakeChain {
            blocks: vec![genesis()],
        };
        let mut header = BlockHeader {
            height: 1,
            parent_hash: [0xDD; 32],
            gas_limit: BLOCK_GAS_LIMIT,
            ..Default::default()
        };
        header.timestamp = 1_700_000_000;
        let block = Block::new(header, vec![]);

        let mut context = BlockContext::new(&block, &chain);
        let result = ValidationPipeline::standard().run(&mut context);
        assert!(matches!(
            result,
            Err(ValidationError::UnknownParent { .. })
        ));
    }

    #[test]
    fn test_rejected_block_state_is_discardable() {
        let (storage, mut db, clean_root) = genesis_state();
        let parent = genesis();
        let chain = FakeChain {
            blocks: vec![parent.clone()],
        };

        // Execute a block that will fail validation
        let mut tx = execute_transfer(&mut db, 0, 200, GAS_PER_TRANSFER);
        tx.set_receipt(Receipt::new(ReceiptStatus::Successful, 600, vec![]));
        let state_root = db.commit().unwrap();
        let mut block = seal_block(&parent, state_root, vec![tx]);
        block.header.gas_used = 500;

        let mut context = BlockContext::new(&block, &chain);
        assert!(ValidationPipeline::standard().run(&mut context).is_err());

        // The orchestrator discards the dirty session and reopens at the
        // last committed root; the old state is fully intact.
        let mut reopened = AccountStateDb::new(clean_root, storage).unwrap();
        assert_eq!(
            reopened.get_balance(&ALICE).unwrap(),
            U256::from(9_000_000u64)
        );
        assert!(!reopened.exist(&BOB).unwrap());
    }
}
