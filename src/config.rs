//! Node configuration
//!
//! Every section and key is optional; a missing file yields the defaults.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use std::{fs, io};
use thiserror::Error;

use crate::consensus::VerifyMode;
use crate::constants::{DEFAULT_DATA_FILE, DEFAULT_DIFFICULTY, MAX_CONFIGURED_DIFFICULTY};
use crate::logging::LogFormat;
use crate::mining::Miner;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("couldn't read config file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("initial_difficulty {value} is out of range (0..={max})")]
    Difficulty { value: u32, max: u32 },
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub ledger: LedgerConfig,
    pub mining: MiningConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    pub data_file: PathBuf,
    pub initial_difficulty: u32,
    pub verify_mode: VerifyMode,
    /// Load `data_file` at startup instead of mining a new genesis block
    pub autoload: bool,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            data_file: PathBuf::from(DEFAULT_DATA_FILE),
            initial_difficulty: DEFAULT_DIFFICULTY,
            verify_mode: VerifyMode::default(),
            autoload: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct MiningConfig {
    /// Per-block search deadline in milliseconds, 0 for none
    pub timeout_ms: u64,
}

impl MiningConfig {
    pub fn miner(&self) -> Miner {
        match self.timeout_ms {
            0 => Miner::new(),
            ms => Miner::new().with_timeout(Duration::from_millis(ms)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ledger.initial_difficulty > MAX_CONFIGURED_DIFFICULTY {
            return Err(ConfigError::Difficulty {
                value: self.ledger.initial_difficulty,
                max: MAX_CONFIGURED_DIFFICULTY,
            });
        }
        Ok(())
    }
}

/// Parse and validate configuration text
pub fn load_from_str(text: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(text)?;
    config.validate()?;
    Ok(config)
}

/// Read the TOML file at `p`. A missing file gives the defaults.
pub fn load<P: AsRef<Path>>(p: P) -> Result<Config, ConfigError> {
    let path = p.as_ref();
    match fs::read_to_string(path) {
        Ok(text) => load_from_str(&text),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Config::default()),
        Err(source) => Err(ConfigError::Read {
            path: path.to_path_buf(),
            source,
        }),
    }
}
