//! Difficulty rotation
//!
//! The ledger's difficulty is part of its state and advances by one,
//! modulo the cycle length, after every append.

use crate::constants::DIFFICULTY_CYCLE;

/// Difficulty to use for the block after one mined at `current`
pub fn next_difficulty(current: u32) -> u32 {
    (current % DIFFICULTY_CYCLE + 1) % DIFFICULTY_CYCLE
}

/// Difficulty a block was mined at, recovered from chain state.
///
/// Block `index` (>= 1) of a chain holding `length` blocks with current
/// difficulty `current` was mined `length - index` rotations ago. Genesis
/// is mined at the initial difficulty, the same value block 1 uses.
pub fn difficulty_at(current: u32, length: u32, index: u32) -> u32 {
    let index = index.max(1);
    let steps_back = length.saturating_sub(index) % DIFFICULTY_CYCLE;
    (current % DIFFICULTY_CYCLE + DIFFICULTY_CYCLE - steps_back) % DIFFICULTY_CYCLE
}
