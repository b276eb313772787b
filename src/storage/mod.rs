//! Storage module - chain state and ledger file persistence

mod state;
pub mod codec;
mod file;

pub use state::*;
pub use file::*;
