//! SHA-256 hashing implementation
//!
//! Block digests are SHA-256 over the canonical block preimage, carried
//! around as lowercase hex text because that is what gets hashed into the
//! successor and written to disk.

use serde::{Deserialize, Serialize};
use sha2::{Digest as _, Sha256};
use std::fmt;

use crate::constants::{DIGEST_HEX_LEN, GENESIS_PREV_DIGEST};

/// 32-byte hash output
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Digest(pub [u8; 32]);

impl Digest {
    /// Convert to hex string
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({})", self.to_hex())
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// Hash arbitrary bytes using SHA-256
pub fn sha256(data: &[u8]) -> Digest {
    let out = Sha256::digest(data);
    let mut arr = [0u8; 32];
    arr.copy_from_slice(&out);
    Digest(arr)
}

/// Digest as stored in a block: hex text, or the genesis sentinel `"0"`
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HexDigest(String);

impl HexDigest {
    /// Previous digest of the genesis block
    pub fn genesis_sentinel() -> Self {
        HexDigest(GENESIS_PREV_DIGEST.to_string())
    }

    /// Wrap raw text read from a block record.
    ///
    /// Returns `None` when the text cannot fit the persisted field.
    pub fn from_text(text: &str) -> Option<Self> {
        if text.len() > DIGEST_HEX_LEN || text.contains('\0') {
            return None;
        }
        Some(HexDigest(text.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Number of leading `'0'` characters
    pub fn leading_zeros(&self) -> usize {
        self.0.bytes().take_while(|b| *b == b'0').count()
    }

    /// Difficulty predicate: the first `difficulty` hex digits are all `'0'`
    pub fn meets_difficulty(&self, difficulty: u32) -> bool {
        let required = difficulty as usize;
        required <= self.0.len() && self.leading_zeros() >= required
    }
}

impl From<Digest> for HexDigest {
    fn from(digest: Digest) -> Self {
        HexDigest(digest.to_hex())
    }
}

impl Default for HexDigest {
    fn default() -> Self {
        Self::genesis_sentinel()
    }
}

impl fmt::Debug for HexDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HexDigest({})", self.0)
    }
}

impl fmt::Display for HexDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_deterministic() {
        let data = b"hello world";
        assert_eq!(sha256(data), sha256(data));
    }

    #[test]
    fn test_hash_different_inputs() {
        assert_ne!(sha256(b"hello"), sha256(b"world"));
    }

    #[test]
    fn test_known_vector() {
        assert_eq!(
            sha256(b"abc").to_hex(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_hex_digest_is_64_chars() {
        let hex: HexDigest = sha256(b"block").into();
        assert_eq!(hex.as_str().len(), DIGEST_HEX_LEN);
    }

    #[test]
    fn test_meets_difficulty() {
        let hex = HexDigest::from_text("000af3").unwrap();
        assert_eq!(hex.leading_zeros(), 3);
        assert!(hex.meets_difficulty(0));
        assert!(hex.meets_difficulty(3));
        assert!(!hex.meets_difficulty(4));
    }

    #[test]
    fn test_genesis_sentinel() {
        let sentinel = HexDigest::genesis_sentinel();
        assert_eq!(sentinel.as_str(), "0");
        assert!(sentinel.meets_difficulty(1));
        assert!(!sentinel.meets_difficulty(2));
    }

    #[test]
    fn test_from_text_rejects_oversized() {
        assert!(HexDigest::from_text(&"a".repeat(65)).is_none());
        assert!(HexDigest::from_text("ab\0cd").is_none());
    }
}
