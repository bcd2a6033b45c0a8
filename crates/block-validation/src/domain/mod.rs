pub mod context;
pub mod errors;
pub mod header;
pub mod pipeline;
pub mod receipts;

pub use context::*;
pub use errors::*;
pub use header::*;
pub use pipeline::*;
pub use receipts::*;
