//! Genesis block generation
//!
//! The genesis block carries a fixed sentinel payload. Its timestamp is
//! the moment the ledger is initialized, so genesis digests differ between
//! ledgers.

use crate::consensus::Block;
use crate::crypto::HexDigest;
use crate::validation::{not_applicable, EventKind, FixedText, Payload};

/// Policy id of the genesis payload
pub const GENESIS_POLICY_ID: &str = "GENESIS";

/// Member and provider id of the genesis payload
pub const GENESIS_PARTY_ID: &str = "SYSTEM";

/// Notes of the genesis payload
pub const GENESIS_NOTES: &str = "Genesis Block - Health Insurance Blockchain";

/// The sentinel payload
pub fn genesis_payload() -> Payload {
    Payload {
        policy_id: FixedText::new(GENESIS_POLICY_ID).unwrap_or_default(),
        member_id: FixedText::new(GENESIS_PARTY_ID).unwrap_or_default(),
        event_kind: EventKind::Enrollment,
        provider_id: FixedText::new(GENESIS_PARTY_ID).unwrap_or_default(),
        amount: 0.0,
        diagnosis_code: not_applicable(),
        notes: FixedText::new(GENESIS_NOTES).unwrap_or_default(),
    }
}

/// Create the unmined genesis block
pub fn create_genesis_block(timestamp: i64) -> Block {
    Block::new(0, timestamp, genesis_payload(), HexDigest::genesis_sentinel())
}

/// Check whether a block carries the genesis sentinel
pub fn is_genesis_shape(block: &Block) -> bool {
    block.sequence_id == 0
        && block.prev_digest == HexDigest::genesis_sentinel()
        && block.payload == genesis_payload()
}
