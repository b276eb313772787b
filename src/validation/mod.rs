//! Validation module - event payload model and input field checks

mod payload;
mod input;

pub use payload::*;
pub use input::*;
