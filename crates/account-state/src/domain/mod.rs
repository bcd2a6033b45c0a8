pub mod account;
pub mod errors;
pub mod journal;
pub mod object;

pub use account::*;
pub use errors::*;
pub use journal::*;
pub use object::*;
