//! # Receipts / Gas Stage
//!
//! Re-derives the block's receipt list and gas totals from its transaction
//! list and compares them against the header's claims. This is the node's
//! independent verification of a producer's declared effects; header
//! fields are never trusted.
//!
//! Transaction order is authoritative: cumulative gas counters and the
//! receipts root are both order-dependent, so any reordering changes the
//! derived root and rejects the block.

use super::{BlockContext, ValidationError};
use crate::ValidationStage;
use chain_types::Receipt;
use state_trie::derive_root;
use tracing::debug;

pub struct ReceiptsStage;

impl ValidationStage for ReceiptsStage {
    fn name(&self) -> &'static str {
        "receipts"
    }

    fn run(&self, context: &mut BlockContext<'_>) -> Result<(), ValidationError> {
        let block = context.block;

        // Genesis and empty special blocks carry no execution effects.
        if block.is_special() {
            debug!(height = block.height(), "special block, skipping receipt checks");
            return Ok(());
        }

        let header = &block.header;
        let mut receipts: Vec<Receipt> = Vec::with_capacity(block.tx_count());
        let mut accumulated_gas = 0u64;

        for (tx_index, transaction) in block.transactions.iter().enumerate() {
            let receipt = transaction
                .receipt()
                .ok_or(ValidationError::EmptyReceipt { tx_index })?;

            // Counters are cumulative by construction; a drop means the
            // producer reordered or fabricated receipts.
            if receipt.cumulative_gas_used < accumulated_gas {
                return Err(ValidationError::ReceiptOutOfOrder {
                    tx_index,
                    prev: accumulated_gas,
                    next: receipt.cumulative_gas_used,
                });
            }

            accumulated_gas = receipt.cumulative_gas_used;
            receipts.push(receipt.clone());
        }

        let encoded: Vec<Vec<u8>> = receipts.iter().map(Receipt::rlp_encode).collect();
        let derived = derive_root(&encoded)?;
        if derived != header.receipts_root {
            return Err(ValidationError::ReceiptRootMismatch {
                declared: header.receipts_root,
                derived,
            });
        }

        if accumulated_gas != header.gas_used {
            return Err(ValidationError::GasUsedInvalid {
                declared: header.gas_used,
                derived: accumulated_gas,
            });
        }

        // Upstream execution enforces the limit; this is defense in depth.
        if accumulated_gas > header.gas_limit {
            return Err(ValidationError::GasOverLimit {
                used: accumulated_gas,
                limit: header.gas_limit,
            });
        }

        debug!(
            height = block.height(),
            receipts = receipts.len(),
            gas = accumulated_gas,
            "receipts verified"
        );
        context.receipts = receipts;
        Ok(())
    }
}
