//! Cryptography module - SHA-256 hash engine and digest text

mod hash;

pub use hash::*;
