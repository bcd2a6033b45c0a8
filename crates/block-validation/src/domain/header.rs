//! # Header Sanity Stage
//!
//! Structural checks on the header before any state-dependent work:
//! chain linkage, height sequence, and a sane gas budget. Cheap checks
//! first so malformed blocks never reach receipt derivation.

use super::{BlockContext, ValidationError};
use crate::ValidationStage;

pub struct HeaderStage;

impl ValidationStage for HeaderStage {
    fn name(&self) -> &'static str {
        "header"
    }

    fn run(&self, context: &mut BlockContext<'_>) -> Result<(), ValidationError> {
        let header = &context.block.header;

        // Genesis anchors the chain; it has no parent to link against.
        if header.height == 0 {
            return Ok(());
        }

        if header.gas_limit == 0 {
            return Err(ValidationError::ZeroGasLimit);
        }
        if header.gas_used > header.gas_limit {
            return Err(ValidationError::GasOverLimit {
                used: header.gas_used,
                limit: header.gas_limit,
            });
        }

        let parent = context
            .chain
            .block_by_hash(&header.parent_hash)
            .ok_or(ValidationError::UnknownParent {
                parent_hash: header.parent_hash,
            })?;

        let expected = parent.height() + 1;
        if header.height != expected {
            return Err(ValidationError::NonSequentialHeight {
                expected,
                got: header.height,
            });
        }

        Ok(())
    }
}
