//! Ledger holder
//!
//! Owns the (possibly not yet initialized) chain together with the miner
//! and verification mode, and exposes the operations the shell drives.
//! Mutating operations take `&mut self`; callers sharing a ledger across
//! threads wrap it in a single mutex.

use std::path::Path;
use thiserror::Error;
use tracing::{info, warn};

use crate::consensus::{Block, ValidationError, VerifyMode};
use crate::constants::MAX_CONFIGURED_DIFFICULTY;
use crate::mining::Miner;
use crate::node::is_genesis_shape;
use crate::storage::{load_chain, save_chain, Chain, ChainError, StorageError};
use crate::validation::Payload;

/// Ledger operation errors
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error(transparent)]
    Chain(#[from] ChainError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Outcome of a successful load
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadReport {
    pub blocks: u32,
    /// Integrity of the loaded chain. A failure here does not undo the load.
    pub integrity: Result<(), ValidationError>,
}

/// The single authoritative ledger of a process
#[derive(Debug, Default)]
pub struct Ledger {
    chain: Option<Chain>,
    miner: Miner,
    verify_mode: VerifyMode,
}

impl Ledger {
    /// An uninitialized ledger
    pub fn new(miner: Miner, verify_mode: VerifyMode) -> Self {
        Self {
            chain: None,
            miner,
            verify_mode,
        }
    }

    /// Replace any current chain with a fresh one
    pub fn initialize(&mut self, difficulty: u32) -> Result<&Chain, ChainError> {
        let chain = Chain::initialize(difficulty, &self.miner)?;
        info!(difficulty, "ledger initialized");
        Ok(&*self.chain.insert(chain))
    }

    /// Mine `payload` onto the chain
    pub fn append(&mut self, payload: Payload) -> Result<&Block, ChainError> {
        let chain = self.chain.as_mut().ok_or(ChainError::NotInitialized)?;
        chain.append(payload, &self.miner)
    }

    /// Verify the chain in the configured mode
    pub fn verify(&self) -> Result<u32, ValidationError> {
        let chain = self.chain.as_ref().ok_or(ValidationError::EmptyChain)?;
        match chain.verify(self.verify_mode) {
            Ok(()) => {
                info!(blocks = chain.len(), mode = %self.verify_mode, "chain verified");
                Ok(chain.len())
            }
            Err(err) => {
                warn!(mode = %self.verify_mode, "{err}");
                if self.verify_mode == VerifyMode::Legacy
                    && matches!(err, ValidationError::InvalidProofOfWork { .. })
                {
                    warn!("legacy verification checks every block against the current difficulty");
                }
                Err(err)
            }
        }
    }

    /// Persist the chain to `path`
    pub fn save(&self, path: &Path) -> Result<u32, LedgerError> {
        let chain = self.chain.as_ref().ok_or(ChainError::NotInitialized)?;
        save_chain(chain, path)?;
        Ok(chain.len())
    }

    /// Replace the chain with the one stored at `path`.
    ///
    /// On error the current chain is kept.
    pub fn load(&mut self, path: &Path) -> Result<LoadReport, StorageError> {
        let chain = match load_chain(path) {
            Ok(chain) => chain,
            Err(err) => {
                warn!("{err}");
                return Err(err);
            }
        };

        if chain.difficulty() > MAX_CONFIGURED_DIFFICULTY {
            warn!(
                path = %path.display(),
                difficulty = chain.difficulty(),
                "stored difficulty is above the configurable range"
            );
        }
        if !is_genesis_shape(chain.genesis()) {
            warn!(path = %path.display(), "first block does not carry the genesis payload");
        }
        let integrity = chain.verify(self.verify_mode);
        if let Err(err) = &integrity {
            warn!(path = %path.display(), "loaded ledger failed verification: {err}");
        }

        let report = LoadReport {
            blocks: chain.len(),
            integrity,
        };
        self.chain = Some(chain);
        Ok(report)
    }

    pub fn chain(&self) -> Option<&Chain> {
        self.chain.as_ref()
    }

    pub fn is_initialized(&self) -> bool {
        self.chain.is_some()
    }

    pub fn verify_mode(&self) -> VerifyMode {
        self.verify_mode
    }

    pub fn miner(&self) -> &Miner {
        &self.miner
    }
}
