//! Claimchain Core Library
//!
//! An append-only, hash-linked ledger of health insurance events.
//! Every block is sealed with SHA-256 proof of work and chained to its
//! predecessor by digest.

pub mod consensus;
pub mod crypto;
pub mod validation;
pub mod storage;
pub mod mining;
pub mod node;
pub mod display;
pub mod cli;
pub mod config;
pub mod logging;

/// Ledger constants - part of the hashing and persistence contract
pub mod constants {
    /// Difficulty rotates through 0..DIFFICULTY_CYCLE after every append
    pub const DIFFICULTY_CYCLE: u32 = 6;

    /// Highest difficulty accepted from configuration
    pub const MAX_CONFIGURED_DIFFICULTY: u32 = DIFFICULTY_CYCLE - 1;

    /// Length of a hex-encoded SHA-256 digest
    pub const DIGEST_HEX_LEN: usize = 64;

    /// Persisted width of a digest field (hex + terminator)
    pub const DIGEST_FIELD_LEN: usize = DIGEST_HEX_LEN + 1;

    /// Capacity of identifier fields, terminator included
    pub const ID_CAPACITY: usize = 32;

    /// Capacity of the diagnosis code field, terminator included
    pub const DIAGNOSIS_CAPACITY: usize = 16;

    /// Capacity of the notes field, terminator included
    pub const NOTES_CAPACITY: usize = 256;

    /// Largest amount the input validator accepts
    pub const MAX_AMOUNT: f64 = 1_000_000.0;

    /// Previous digest stored in the genesis block
    pub const GENESIS_PREV_DIGEST: &str = "0";

    /// Difficulty the interactive node starts with
    pub const DEFAULT_DIFFICULTY: u32 = 4;

    /// Default ledger file
    pub const DEFAULT_DATA_FILE: &str = "blockchain.dat";
}
