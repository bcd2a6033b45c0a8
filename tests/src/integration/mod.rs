pub mod block_insertion;
pub mod state_flows;
