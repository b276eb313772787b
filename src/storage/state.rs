//! Chain state management
//!
//! The chain owns its blocks in sequence order together with the rotating
//! difficulty that the next append will be mined at.

use thiserror::Error;
use tracing::info;

use crate::consensus::{difficulty_at, next_difficulty, validate_chain, Block, ValidationError, VerifyMode};
use crate::mining::{Miner, MiningResult};
use crate::node::create_genesis_block;
use crate::validation::Payload;

/// Chain mutation errors. A failed append leaves the chain unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainError {
    #[error("Blockchain not initialized")]
    NotInitialized,
    #[error("mining block {sequence_id} was interrupted")]
    MiningInterrupted { sequence_id: u32 },
    #[error("mining block {sequence_id} timed out at difficulty {difficulty}")]
    MiningTimedOut { sequence_id: u32, difficulty: u32 },
    #[error("mining block {sequence_id} exhausted the nonce space at difficulty {difficulty}")]
    NonceSpaceExhausted { sequence_id: u32, difficulty: u32 },
    #[error("difficulty {difficulty} can never be met by a 64-digit digest")]
    UnreachableDifficulty { difficulty: u32 },
    #[error("chain is full at {0} blocks")]
    Full(u32),
}

/// Current time in seconds since the Unix epoch
pub fn now_timestamp() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Complete chain state
#[derive(Debug, Clone, PartialEq)]
pub struct Chain {
    /// Blocks in sequence order; `blocks[i].sequence_id == i`
    blocks: Vec<Block>,
    /// Difficulty the next append is mined at
    difficulty: u32,
}

impl Chain {
    /// Create a chain holding a freshly mined genesis block
    pub fn initialize(difficulty: u32, miner: &Miner) -> Result<Self, ChainError> {
        Self::initialize_at(difficulty, now_timestamp(), miner)
    }

    /// Create a chain whose genesis block carries `timestamp`
    pub fn initialize_at(difficulty: u32, timestamp: i64, miner: &Miner) -> Result<Self, ChainError> {
        let genesis = seal(create_genesis_block(timestamp), difficulty, miner)?;
        info!(difficulty, digest = %genesis.digest, "genesis block mined");
        Ok(Self {
            blocks: vec![genesis],
            difficulty,
        })
    }

    /// Mine `payload` into a new tail block at the current difficulty,
    /// then rotate the difficulty.
    pub fn append(&mut self, payload: Payload, miner: &Miner) -> Result<&Block, ChainError> {
        self.append_at(payload, now_timestamp(), miner)
    }

    /// `append` with an explicit creation time
    pub fn append_at(
        &mut self,
        payload: Payload,
        timestamp: i64,
        miner: &Miner,
    ) -> Result<&Block, ChainError> {
        let sequence_id = self.len();
        if sequence_id == u32::MAX {
            return Err(ChainError::Full(sequence_id));
        }
        let candidate = Block::new(sequence_id, timestamp, payload, self.tip().digest.clone());

        info!(sequence_id, difficulty = self.difficulty, "mining block");
        let block = seal(candidate, self.difficulty, miner)?;
        info!(sequence_id, nonce = block.nonce, digest = %block.digest, "block mined");

        self.blocks.push(block);
        self.difficulty = next_difficulty(self.difficulty);
        Ok(self.tip())
    }

    /// Walk the chain and report the first integrity failure
    pub fn verify(&self, mode: VerifyMode) -> Result<(), ValidationError> {
        validate_chain(&self.blocks, self.difficulty, mode)
    }

    /// Rebuild a chain from decoded parts.
    ///
    /// Mining difficulty is not persisted, so each block's is recovered
    /// from the rotation rule. Structure is not checked here.
    pub fn from_parts(mut blocks: Vec<Block>, difficulty: u32) -> Option<Self> {
        if blocks.is_empty() {
            return None;
        }
        let length = blocks.len() as u32;
        for (index, block) in blocks.iter_mut().enumerate() {
            block.difficulty = difficulty_at(difficulty, length, index as u32);
        }
        Some(Self { blocks, difficulty })
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn genesis(&self) -> &Block {
        &self.blocks[0]
    }

    pub fn tip(&self) -> &Block {
        &self.blocks[self.blocks.len() - 1]
    }

    /// Number of blocks, genesis included
    pub fn len(&self) -> u32 {
        self.blocks.len() as u32
    }

    /// Always false: a chain holds at least its genesis block
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Difficulty the next append will be mined at
    pub fn difficulty(&self) -> u32 {
        self.difficulty
    }

    #[cfg(test)]
    pub(crate) fn blocks_mut(&mut self) -> &mut Vec<Block> {
        &mut self.blocks
    }
}

fn seal(candidate: Block, difficulty: u32, miner: &Miner) -> Result<Block, ChainError> {
    let sequence_id = candidate.sequence_id;
    match miner.mine_block(candidate, difficulty) {
        MiningResult::Success(block) => Ok(block),
        MiningResult::Interrupted => Err(ChainError::MiningInterrupted { sequence_id }),
        MiningResult::TimedOut => Err(ChainError::MiningTimedOut { sequence_id, difficulty }),
        MiningResult::Exhausted => Err(ChainError::NonceSpaceExhausted { sequence_id, difficulty }),
        MiningResult::Unreachable => Err(ChainError::UnreachableDifficulty { difficulty }),
    }
}
