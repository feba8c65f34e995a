//! CLI commands module.

use anyhow::{Context, Result};
use clap::Subcommand;
use powchain_chain::NodeConfig;
use powchain_core::Keypair;
use std::fs;
use std::path::Path;

mod demo;
mod keygen;
mod seal;
mod sign;

#[derive(Subcommand)]
pub enum Commands {
    /// Generate a new keypair as PEM files
    Keygen(keygen::KeygenArgs),
    /// Create a signed transaction
    Sign(sign::SignArgs),
    /// Assemble and mine a block from a transaction file
    Seal(seal::SealArgs),
    /// Run a local node end to end with generated wallets
    Demo(demo::DemoArgs),
}

pub fn run(cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Keygen(args) => keygen::run(args),
        Commands::Sign(args) => sign::run(args),
        Commands::Seal(args) => seal::run(args),
        Commands::Demo(args) => demo::run(args),
    }
}

/// Load a PKCS#8 PEM private key.
pub(crate) fn load_keypair(path: &Path) -> Result<Keypair> {
    let pem = fs::read_to_string(path)
        .with_context(|| format!("Failed to read private key: {}", path.display()))?;
    Keypair::from_pkcs8_pem(&pem)
        .with_context(|| format!("Invalid private key: {}", path.display()))
}

/// Load node configuration, falling back to defaults when no file is given.
pub(crate) fn load_config(path: Option<&Path>) -> Result<NodeConfig> {
    let Some(path) = path else {
        return Ok(NodeConfig::default());
    };
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config: {}", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("Invalid config: {}", path.display()))
}
