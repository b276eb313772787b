//! Node module - genesis block and the ledger holder

mod genesis;
mod ledger;

pub use genesis::*;
pub use ledger::*;
