//! # Pipeline Driver
//!
//! An explicit ordered list of stage objects executed by a driver loop.
//! The first stage error aborts the remaining chain; a completed loop
//! means every stage passed.

use super::{BlockContext, ValidationError};
use chain_types::short_hash;
use tracing::{debug, warn};

/// One validation capability over the shared block context.
///
/// A stage either performs its checks (and may store derived artifacts in
/// the context for later stages) or returns the typed error that rejects
/// the block.
pub trait ValidationStage {
    /// Stable stage name, for logs.
    fn name(&self) -> &'static str;

    fn run(&self, context: &mut BlockContext<'_>) -> Result<(), ValidationError>;
}

/// Ordered stage chain with first-error-aborts semantics.
#[derive(Default)]
pub struct ValidationPipeline {
    stages: Vec<Box<dyn ValidationStage>>,
}

impl ValidationPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a stage; stages run in insertion order.
    pub fn push(mut self, stage: Box<dyn ValidationStage>) -> Self {
        self.stages.push(stage);
        self
    }

    /// The standard insertion chain: header sanity, then receipts/gas.
    pub fn standard() -> Self {
        Self::new()
            .push(Box::new(super::HeaderStage))
            .push(Box::new(super::ReceiptsStage))
    }

    /// Run every stage in order against the context.
    ///
    /// Stops at the first failing stage and returns its error; stages
    /// after a failure never run.
    pub fn run(&self, context: &mut BlockContext<'_>) -> Result<(), ValidationError> {
        let block_hash = context.block.hash();
        for stage in &self.stages {
            debug!(
                stage = stage.name(),
                block = %short_hash(&block_hash),
                height = context.block.height(),
                "running validation stage"
            );
            if let Err(error) = stage.run(context) {
                warn!(
                    stage = stage.name(),
                    block = %short_hash(&block_hash),
                    %error,
                    "block rejected"
                );
                return Err(error);
            }
        }
        debug!(
            block = %short_hash(&block_hash),
            stages = self.stages.len(),
            "block passed validation"
        );
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}
