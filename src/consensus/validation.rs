//! Chain integrity validation
//!
//! Pure functions that walk a chain of blocks and report the first block
//! that breaks linkage, digest reproduction, or proof of work.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::consensus::Block;

/// Validation errors, each naming the first offending block
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Integrity check failed at block {index}: Hash mismatch (stored digest does not match block contents)")]
    HashMismatch { index: u32 },
    #[error("Integrity check failed at block {index}: Chain linkage broken (previous digest does not match block {})", .index.saturating_sub(1))]
    LinkageBroken { index: u32 },
    #[error("Integrity check failed at block {index}: Invalid PoW (digest needs {required} leading zeros)")]
    InvalidProofOfWork { index: u32, required: u32 },
    #[error("Integrity check failed: chain is empty")]
    EmptyChain,
}

impl ValidationError {
    /// Index of the failing block, if any
    pub fn block_index(&self) -> Option<u32> {
        match self {
            ValidationError::HashMismatch { index }
            | ValidationError::LinkageBroken { index }
            | ValidationError::InvalidProofOfWork { index, .. } => Some(*index),
            ValidationError::EmptyChain => None,
        }
    }
}

/// Which difficulty the proof-of-work check compares against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VerifyMode {
    /// Each block against the difficulty it was mined at
    PerBlock,
    /// Every block against the chain's current difficulty. Rejects valid
    /// older blocks whenever the rotated difficulty exceeds their work.
    #[default]
    Legacy,
}

impl fmt::Display for VerifyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VerifyMode::PerBlock => f.write_str("per-block"),
            VerifyMode::Legacy => f.write_str("legacy"),
        }
    }
}

impl FromStr for VerifyMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "per-block" => Ok(VerifyMode::PerBlock),
            "legacy" => Ok(VerifyMode::Legacy),
            other => Err(format!("unknown verify mode '{other}' (expected per-block or legacy)")),
        }
    }
}

/// Check that `block` links to `prev`
pub fn validate_linkage(block: &Block, prev: &Block) -> Result<(), ValidationError> {
    if block.prev_digest != prev.digest {
        return Err(ValidationError::LinkageBroken {
            index: block.sequence_id,
        });
    }
    Ok(())
}

/// Check that the stored digest reproduces from the block's fields
pub fn validate_digest(block: &Block) -> Result<(), ValidationError> {
    if block.compute_digest() != block.digest {
        return Err(ValidationError::HashMismatch {
            index: block.sequence_id,
        });
    }
    Ok(())
}

/// Validate proof of work against `required` leading zeros
pub fn validate_pow(block: &Block, required: u32) -> Result<(), ValidationError> {
    if !block.digest.meets_difficulty(required) {
        return Err(ValidationError::InvalidProofOfWork {
            index: block.sequence_id,
            required,
        });
    }
    Ok(())
}

/// Validate a chain of blocks.
///
/// Genesis is taken as given. Every later block is checked for linkage,
/// then digest reproduction, then proof of work; the walk stops at the
/// first failure. Reported indices are chain positions.
pub fn validate_chain(
    blocks: &[Block],
    current_difficulty: u32,
    mode: VerifyMode,
) -> Result<(), ValidationError> {
    if blocks.is_empty() {
        return Err(ValidationError::EmptyChain);
    }

    for (position, pair) in blocks.windows(2).enumerate() {
        let (prev, block) = (&pair[0], &pair[1]);
        let index = position as u32 + 1;

        validate_linkage(block, prev).map_err(|_| ValidationError::LinkageBroken { index })?;
        validate_digest(block).map_err(|_| ValidationError::HashMismatch { index })?;

        let required = match mode {
            VerifyMode::PerBlock => block.difficulty,
            VerifyMode::Legacy => current_difficulty,
        };
        validate_pow(block, required)
            .map_err(|_| ValidationError::InvalidProofOfWork { index, required })?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::HexDigest;
    use crate::validation::{EventKind, Identifier, Payload};

    fn payload(member: &str) -> Payload {
        Payload::new(
            EventKind::Enrollment,
            Identifier::new("POL1").unwrap(),
            Identifier::new(member).unwrap(),
            Identifier::new("PRV1").unwrap(),
        )
    }

    /// Seal a block at `difficulty` without going through the miner
    fn seal(mut block: Block, difficulty: u32) -> Block {
        block.difficulty = difficulty;
        loop {
            block.nonce += 1;
            let digest = block.compute_digest();
            if digest.meets_difficulty(difficulty) {
                block.digest = digest;
                return block;
            }
        }
    }

    fn chain_of(len: u32, difficulty: u32) -> Vec<Block> {
        let mut blocks = vec![seal(
            Block::new(0, 100, payload("GENESIS"), HexDigest::genesis_sentinel()),
            difficulty,
        )];
        for i in 1..len {
            let prev = blocks[i as usize - 1].digest.clone();
            blocks.push(seal(Block::new(i, 100 + i as i64, payload("MEMBER"), prev), difficulty));
        }
        blocks
    }

    #[test]
    fn test_valid_chain() {
        let blocks = chain_of(4, 1);
        assert_eq!(validate_chain(&blocks, 1, VerifyMode::PerBlock), Ok(()));
        assert_eq!(validate_chain(&blocks, 1, VerifyMode::Legacy), Ok(()));
    }

    #[test]
    fn test_empty_chain_rejected() {
        assert_eq!(
            validate_chain(&[], 0, VerifyMode::PerBlock),
            Err(ValidationError::EmptyChain)
        );
    }

    #[test]
    fn test_tampered_payload_is_hash_mismatch() {
        let mut blocks = chain_of(4, 1);
        blocks[2].payload.amount = 99.0;
        assert_eq!(
            validate_chain(&blocks, 1, VerifyMode::PerBlock),
            Err(ValidationError::HashMismatch { index: 2 })
        );
    }

    #[test]
    fn test_replaced_prev_digest_is_linkage() {
        let mut blocks = chain_of(4, 0);
        blocks[3].prev_digest = HexDigest::from(crate::crypto::sha256(b"elsewhere"));
        assert_eq!(
            validate_chain(&blocks, 0, VerifyMode::PerBlock),
            Err(ValidationError::LinkageBroken { index: 3 })
        );
    }

    #[test]
    fn test_weak_pow_detected() {
        let blocks = chain_of(3, 0);
        let weak = blocks
            .iter()
            .skip(1)
            .find(|b| !b.digest.meets_difficulty(1))
            .map(|b| b.sequence_id);
        let result = validate_chain(&blocks, 1, VerifyMode::Legacy);
        match weak {
            Some(index) => assert_eq!(
                result,
                Err(ValidationError::InvalidProofOfWork { index, required: 1 })
            ),
            None => assert_eq!(result, Ok(())),
        }
    }

    #[test]
    fn test_legacy_mode_rejects_older_block() {
        // block 1 mined at 0, chain difficulty since rotated to 5
        let mut blocks = chain_of(2, 0);
        while blocks[1].digest.meets_difficulty(5) {
            blocks[1].nonce += 1;
            blocks[1] = seal(blocks[1].clone(), 0);
        }
        assert_eq!(validate_chain(&blocks, 5, VerifyMode::PerBlock), Ok(()));
        assert_eq!(
            validate_chain(&blocks, 5, VerifyMode::Legacy),
            Err(ValidationError::InvalidProofOfWork { index: 1, required: 5 })
        );
    }

    #[test]
    fn test_verify_mode_parse() {
        assert_eq!("legacy".parse::<VerifyMode>(), Ok(VerifyMode::Legacy));
        assert_eq!("per-block".parse::<VerifyMode>(), Ok(VerifyMode::PerBlock));
        assert!("strict".parse::<VerifyMode>().is_err());
    }

    #[test]
    fn test_error_messages_name_block() {
        let err = ValidationError::LinkageBroken { index: 4 };
        assert!(err.to_string().contains("block 4"));
        assert!(err.to_string().contains("block 3"));
        assert_eq!(err.block_index(), Some(4));
    }
}
