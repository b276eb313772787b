//! Claimchain interactive node
//!
//! Loads configuration, installs logging, and runs the ledger shell on
//! stdin/stdout.

use anyhow::Context;
use clap::Parser;
use std::io;

use claimchain::cli::{Args, Shell, Startup};
use claimchain::config;
use claimchain::logging::init_logging;
use claimchain::node::Ledger;

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut cfg = config::load(&args.config)
        .with_context(|| format!("failed to load configuration from {}", args.config.display()))?;
    args.apply(&mut cfg);
    cfg.validate().context("invalid configuration")?;

    init_logging(&cfg.logging.level, cfg.logging.format);
    tracing::info!(
        data_file = %cfg.ledger.data_file.display(),
        difficulty = cfg.ledger.initial_difficulty,
        verify_mode = %cfg.ledger.verify_mode,
        "starting claimchain"
    );

    let ledger = Ledger::new(cfg.mining.miner(), cfg.ledger.verify_mode);
    let startup = if cfg.ledger.autoload {
        Startup::Load(cfg.ledger.initial_difficulty)
    } else {
        Startup::Fresh(cfg.ledger.initial_difficulty)
    };

    let stdin = io::stdin();
    let mut shell = Shell::new(ledger, cfg.ledger.data_file.clone(), stdin.lock(), io::stdout());
    shell.boot(startup).context("failed to start shell")?;
    shell.run().context("shell terminated with an I/O error")?;

    tracing::info!("shutdown complete");
    Ok(())
}
