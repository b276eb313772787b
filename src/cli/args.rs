//! # Command-line arguments
//!
//! Flags given on the command line override the configuration file.

use clap::Parser;
use std::path::PathBuf;

use crate::config::Config;
use crate::consensus::VerifyMode;
use crate::logging::LogFormat;

/// Health insurance event ledger.
///
/// Starts an interactive shell over an append-only, proof-of-work sealed
/// chain of enrollment, payment, pre-authorization and claim events.
#[derive(Parser, Debug)]
#[command(name = "claimchain", version, about = "Health insurance event ledger")]
pub struct Args {
    /// Path to the configuration file (TOML). Missing file means defaults.
    #[arg(long, short = 'c', env = "CLAIMCHAIN_CONFIG", default_value = "claimchain.toml")]
    pub config: PathBuf,

    /// Ledger file used by save, load and exit.
    #[arg(long, short = 'f')]
    pub data_file: Option<PathBuf>,

    /// Difficulty of the genesis block and first append (0-5).
    #[arg(long, short = 'd', value_parser = clap::value_parser!(u32).range(0..=5))]
    pub difficulty: Option<u32>,

    /// Proof-of-work check used by verify: legacy (default) or per-block.
    #[arg(long)]
    pub verify_mode: Option<VerifyMode>,

    /// Load the ledger file on startup instead of mining a new genesis block.
    #[arg(long)]
    pub load: bool,

    /// Per-block mining deadline in milliseconds (0 for none).
    #[arg(long)]
    pub mining_timeout_ms: Option<u64>,

    /// Default log level when RUST_LOG is not set.
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log output format: pretty or json.
    #[arg(long)]
    pub log_format: Option<LogFormat>,
}

impl Args {
    /// Fold command-line overrides into `config`
    pub fn apply(&self, config: &mut Config) {
        if let Some(path) = &self.data_file {
            config.ledger.data_file = path.clone();
        }
        if let Some(difficulty) = self.difficulty {
            config.ledger.initial_difficulty = difficulty;
        }
        if let Some(mode) = self.verify_mode {
            config.ledger.verify_mode = mode;
        }
        if self.load {
            config.ledger.autoload = true;
        }
        if let Some(ms) = self.mining_timeout_ms {
            config.mining.timeout_ms = ms;
        }
        if let Some(level) = &self.log_level {
            config.logging.level = level.clone();
        }
        if let Some(format) = self.log_format {
            config.logging.format = format;
        }
    }
}
