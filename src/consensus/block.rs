//! Block structure for the claim ledger
//!
//! A block wraps one insurance event together with its position, creation
//! time, the digest of its predecessor and the proof of work sealing it.

use serde::Serialize;

use crate::crypto::{sha256, HexDigest};
use crate::validation::Payload;

/// One ledger entry
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Block {
    /// Position in the chain, 0 for genesis
    pub sequence_id: u32,
    /// Creation time (seconds since Unix epoch)
    pub timestamp: i64,
    /// Event data, owned by the block
    pub payload: Payload,
    /// Digest of the previous block
    pub prev_digest: HexDigest,
    /// Digest of this block, found while mining
    pub digest: HexDigest,
    /// Nonce used for PoW
    pub nonce: u32,
    /// Difficulty the block was mined at. Not hashed and not persisted.
    #[serde(skip)]
    pub difficulty: u32,
}

impl Block {
    /// Create an unmined block
    pub fn new(sequence_id: u32, timestamp: i64, payload: Payload, prev_digest: HexDigest) -> Self {
        Self {
            sequence_id,
            timestamp,
            payload,
            prev_digest,
            digest: HexDigest::default(),
            nonce: 0,
            difficulty: 0,
        }
    }

    /// Canonical preimage: every field except `digest`, concatenated in
    /// declaration order without separators. Numbers are in decimal, the
    /// amount with two decimals, text fields as their stored bytes.
    pub fn preimage(&self) -> Vec<u8> {
        let p = &self.payload;
        let mut out = Vec::with_capacity(160 + p.notes.len());
        out.extend_from_slice(self.sequence_id.to_string().as_bytes());
        out.extend_from_slice(self.timestamp.to_string().as_bytes());
        out.extend_from_slice(p.policy_id.as_bytes());
        out.extend_from_slice(p.member_id.as_bytes());
        out.extend_from_slice(p.event_kind.code().to_string().as_bytes());
        out.extend_from_slice(p.provider_id.as_bytes());
        out.extend_from_slice(p.amount_text().as_bytes());
        out.extend_from_slice(p.diagnosis_code.as_bytes());
        out.extend_from_slice(p.notes.as_bytes());
        out.extend_from_slice(self.prev_digest.as_str().as_bytes());
        out.extend_from_slice(self.nonce.to_string().as_bytes());
        out
    }

    /// Recompute the digest from the block's current fields
    pub fn compute_digest(&self) -> HexDigest {
        sha256(&self.preimage()).into()
    }

    /// Check if this is the genesis block
    pub fn is_genesis(&self) -> bool {
        self.sequence_id == 0
    }
}
