//! Chain views with sensitive fields masked
//!
//! Member ids keep 3 leading and 2 trailing characters, diagnosis codes
//! keep 1 and 1, amounts keep their last two integer digits.

use chrono::DateTime;
use serde::Serialize;
use std::fmt::Write as _;

use super::mask::{mask_amount, mask_string};
use crate::consensus::Block;
use crate::storage::Chain;

/// Display form of one block
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlockView {
    pub sequence_id: u32,
    pub timestamp: String,
    pub policy_id: String,
    pub member_id: String,
    pub event_kind: String,
    pub provider_id: String,
    pub amount: String,
    pub diagnosis_code: String,
    pub notes: String,
    pub prev_digest: String,
    pub digest: String,
    pub nonce: u32,
}

impl BlockView {
    pub fn from_block(block: &Block) -> Self {
        let p = &block.payload;
        Self {
            sequence_id: block.sequence_id,
            timestamp: format_timestamp(block.timestamp),
            policy_id: p.policy_id.to_string(),
            member_id: mask_string(&p.member_id.to_text(), 3, 2),
            event_kind: p.event_kind.to_string(),
            provider_id: p.provider_id.to_string(),
            amount: mask_amount(p.amount),
            diagnosis_code: mask_string(&p.diagnosis_code.to_text(), 1, 1),
            notes: p.notes.to_string(),
            prev_digest: block.prev_digest.to_string(),
            digest: block.digest.to_string(),
            nonce: block.nonce,
        }
    }
}

/// Summary plus every block, as serialized for `view json`
#[derive(Debug, Serialize)]
pub struct ChainView {
    pub length: u32,
    pub difficulty: u32,
    pub blocks: Vec<BlockView>,
}

impl ChainView {
    pub fn from_chain(chain: &Chain) -> Self {
        Self {
            length: chain.len(),
            difficulty: chain.difficulty(),
            blocks: chain.blocks().iter().map(BlockView::from_block).collect(),
        }
    }
}

/// UTC, ctime-like
pub fn format_timestamp(timestamp: i64) -> String {
    match DateTime::from_timestamp(timestamp, 0) {
        Some(dt) => dt.format("%a %b %e %H:%M:%S %Y UTC").to_string(),
        None => format!("{timestamp} (out of range)"),
    }
}

/// Text rendering of the whole chain
pub fn render_text(chain: &Chain) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "\n=== HEALTH INSURANCE BLOCKCHAIN ===");
    let _ = writeln!(out, "Total Blocks: {} | Difficulty: {}", chain.len(), chain.difficulty());
    let _ = writeln!(out, "Security: Sensitive data masked in display\n");

    for block in chain.blocks() {
        let v = BlockView::from_block(block);
        let _ = writeln!(out, "--- Block {} ---", v.sequence_id);
        let _ = writeln!(out, "Timestamp: {}", v.timestamp);
        let _ = writeln!(out, "Policy ID: {}", v.policy_id);
        let _ = writeln!(out, "Member ID: {} (masked)", v.member_id);
        let _ = writeln!(out, "Event Type: {}", v.event_kind);
        let _ = writeln!(out, "Provider ID: {}", v.provider_id);
        let _ = writeln!(out, "Amount: ${} (masked)", v.amount);
        let _ = writeln!(out, "Diagnosis Code: {} (masked)", v.diagnosis_code);
        let _ = writeln!(out, "Notes: {}", v.notes);
        let _ = writeln!(out, "Previous Hash: {}", v.prev_digest);
        let _ = writeln!(out, "Hash: {}", v.digest);
        let _ = writeln!(out, "Nonce: {}\n", v.nonce);
    }
    out
}

/// Pretty JSON rendering of the whole chain
pub fn render_json(chain: &Chain) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&ChainView::from_chain(chain))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mining::Miner;
    use crate::validation::{DiagnosisCode, EventKind, Identifier, Payload};

    fn chain() -> Chain {
        let miner = Miner::new();
        let mut chain = Chain::initialize_at(0, 0, &miner).unwrap();
        let payload = Payload::new(
            EventKind::ClaimSubmission,
            Identifier::new("POL1").unwrap(),
            Identifier::new("ABC123456").unwrap(),
            Identifier::new("HOSP1").unwrap(),
        )
        .with_amount(1234.56)
        .with_diagnosis(DiagnosisCode::new("E11.9").unwrap());
        chain.append_at(payload, 86_400, &miner).unwrap();
        chain
    }

    #[test]
    fn test_text_view_masks_sensitive_fields() {
        let text = render_text(&chain());
        assert!(text.contains("Total Blocks: 2 | Difficulty: 1"));
        assert!(text.contains("Member ID: ABC****56 (masked)"));
        assert!(text.contains("Amount: $**34.56 (masked)"));
        assert!(text.contains("Diagnosis Code: E***9 (masked)"));
        assert!(text.contains("Event Type: CLAIM_SUBMISSION"));
        assert!(!text.contains("ABC123456"));
    }

    #[test]
    fn test_timestamp_format() {
        assert_eq!(format_timestamp(0), "Thu Jan  1 00:00:00 1970 UTC");
        assert_eq!(format_timestamp(86_400), "Fri Jan  2 00:00:00 1970 UTC");
    }

    #[test]
    fn test_json_view() {
        let json = render_json(&chain()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["length"], 2);
        assert_eq!(value["blocks"][1]["member_id"], "ABC****56");
        assert_eq!(value["blocks"][1]["event_kind"], "CLAIM_SUBMISSION");
        assert_eq!(value["blocks"][0]["prev_digest"], "0");
    }
}
