//! Consensus module - Block structure, validation, and difficulty rotation

mod block;
mod validation;
mod difficulty;

pub use block::*;
pub use validation::*;
pub use difficulty::*;
