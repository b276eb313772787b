//! Block miner implementation
//!
//! Brute-force nonce search until the block digest carries the required
//! number of leading zero hex digits.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, trace};

use crate::consensus::Block;
use crate::constants::DIGEST_HEX_LEN;

/// How often the deadline is polled and progress is traced
const CHECK_INTERVAL: u32 = 4096;

/// Mining result
#[derive(Debug)]
pub enum MiningResult {
    /// Block sealed: `nonce`, `digest` and `difficulty` are populated
    Success(Block),
    /// Stop signal raised
    Interrupted,
    /// Deadline passed before a nonce was found
    TimedOut,
    /// Every 32-bit nonce tried without success
    Exhausted,
    /// Difficulty exceeds the digest width and can never be met
    Unreachable,
}

/// Block miner
#[derive(Debug, Clone, Default)]
pub struct Miner {
    /// Stop signal
    stop_signal: Arc<AtomicBool>,
    /// Per-block search deadline, none by default
    timeout: Option<Duration>,
}

impl Miner {
    /// Create a new miner with no deadline
    pub fn new() -> Self {
        Self::default()
    }

    /// Abort any search that runs longer than `timeout`
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Get a stop signal handle
    pub fn stop_signal(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop_signal)
    }

    /// Stop mining
    pub fn stop(&self) {
        self.stop_signal.store(true, Ordering::SeqCst);
    }

    /// Reset stop signal
    pub fn reset(&self) {
        self.stop_signal.store(false, Ordering::SeqCst);
    }

    /// Mine a block (find valid nonce)
    ///
    /// Starts from nonce 1 and increments, so a successful result carries
    /// the smallest satisfying nonce.
    pub fn mine_block(&self, mut block: Block, difficulty: u32) -> MiningResult {
        if difficulty as usize > DIGEST_HEX_LEN {
            return MiningResult::Unreachable;
        }

        let deadline = self.timeout.map(|t| Instant::now() + t);
        let started = Instant::now();
        block.nonce = 0;

        loop {
            block.nonce = match block.nonce.checked_add(1) {
                Some(nonce) => nonce,
                None => return MiningResult::Exhausted,
            };

            if block.nonce % CHECK_INTERVAL == 0 {
                if self.stop_signal.load(Ordering::SeqCst) {
                    return MiningResult::Interrupted;
                }
                if deadline.is_some_and(|d| Instant::now() >= d) {
                    return MiningResult::TimedOut;
                }
                trace!(sequence_id = block.sequence_id, nonce = block.nonce, "mining");
            }

            let digest = block.compute_digest();
            if digest.meets_difficulty(difficulty) {
                debug!(
                    sequence_id = block.sequence_id,
                    nonce = block.nonce,
                    difficulty,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "nonce found"
                );
                block.digest = digest;
                block.difficulty = difficulty;
                return MiningResult::Success(block);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::HexDigest;
    use crate::validation::{EventKind, Identifier, Payload};

    fn candidate() -> Block {
        let payload = Payload::new(
            EventKind::PremiumPayment,
            Identifier::new("POL1").unwrap(),
            Identifier::new("MEM1").unwrap(),
            Identifier::new("INSURER").unwrap(),
        )
        .with_amount(150.0);
        Block::new(1, 1_700_000_000, payload, HexDigest::genesis_sentinel())
    }

    #[test]
    fn test_difficulty_zero_takes_first_nonce() {
        match Miner::new().mine_block(candidate(), 0) {
            MiningResult::Success(block) => {
                assert_eq!(block.nonce, 1);
                assert_eq!(block.digest, block.compute_digest());
                assert_eq!(block.difficulty, 0);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_mined_digest_meets_difficulty() {
        match Miner::new().mine_block(candidate(), 2) {
            MiningResult::Success(block) => {
                assert!(block.digest.as_str().starts_with("00"));
                assert_eq!(block.digest, block.compute_digest());
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_unreachable_difficulty() {
        assert!(matches!(
            Miner::new().mine_block(candidate(), 65),
            MiningResult::Unreachable
        ));
    }

    #[test]
    fn test_stop_signal_interrupts() {
        let miner = Miner::new();
        miner.stop();
        assert!(matches!(
            miner.mine_block(candidate(), 64),
            MiningResult::Interrupted
        ));
    }

    #[test]
    fn test_timeout() {
        let miner = Miner::new().with_timeout(Duration::ZERO);
        assert!(matches!(
            miner.mine_block(candidate(), 64),
            MiningResult::TimedOut
        ));
    }

    #[test]
    fn test_miner_stop_signal() {
        let miner = Miner::new();
        let signal = miner.stop_signal();

        assert!(!signal.load(Ordering::SeqCst));

        miner.stop();
        assert!(signal.load(Ordering::SeqCst));

        miner.reset();
        assert!(!signal.load(Ordering::SeqCst));
    }
}
