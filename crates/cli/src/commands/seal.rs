//! Block sealing command.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use powchain_chain::BlockAssembler;
use powchain_consensus::{Miner, TransactionValidator};
use powchain_core::{Block, Hash, Transaction};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Args)]
pub struct SealArgs {
    /// JSON file holding an array of transactions
    #[arg(short, long)]
    txs: PathBuf,

    /// Previous block hash (hex); defaults to the zero hash
    #[arg(short, long)]
    prev: Option<String>,

    /// Node configuration file (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print a colored summary instead of JSON
    #[arg(long)]
    summary: bool,
}

pub fn run(args: SealArgs) -> Result<()> {
    let config = super::load_config(args.config.as_deref())?;
    let prev_hash = match &args.prev {
        Some(hex) => {
            Hash::from_hex(hex).with_context(|| format!("Invalid previous hash: {}", hex))?
        }
        None => Hash::ZERO,
    };
    let candidates = read_transactions(&args.txs)?;
    let submitted = candidates.len();

    let assembler = BlockAssembler::new(TransactionValidator::default(), Miner::new(config.pow));
    let block = assembler
        .assemble(candidates, prev_hash)
        .context("Failed to mine block")?;

    if args.summary {
        print_block(&block, submitted);
    } else {
        println!("{}", serde_json::to_string_pretty(&block)?);
    }
    Ok(())
}

fn read_transactions(path: &Path) -> Result<Vec<Transaction>> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read transactions: {}", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("Invalid transactions file: {}", path.display()))
}

pub(crate) fn print_block(block: &Block, submitted: usize) {
    println!();
    println!("{}", "Block Information:".bold().cyan());
    println!();
    println!("  Hash:         {}", block.hash.to_hex().bright_yellow());
    println!("  Hash (b64):   {}", block.hash.to_base64_url().bright_yellow());
    println!("  Parent Hash:  {}", block.prev_hash.to_hex().bright_black());
    println!("  Nonce:        {}", block.nonce.to_string().bright_cyan());
    println!(
        "  Transactions: {} of {} submitted",
        block.tx_count().to_string().bright_cyan(),
        submitted
    );

    for (i, tx) in block.transactions.iter().enumerate() {
        println!(
            "    {} {} {} {}",
            format!("{}.", i + 1).bright_black(),
            tx.timestamp.to_string().bright_black(),
            tx.amount.to_string().bright_cyan(),
            if tx.is_self_transfer() { "(self)" } else { "" }
        );
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use powchain_core::{Keypair, Signer};

    #[test]
    fn test_read_transactions_file() {
        let dir = tempfile::tempdir().unwrap();
        let kp = Keypair::generate();
        let txs = vec![
            Transaction::transfer(&kp, kp.public_key_pem(), 1.0),
            Transaction::transfer(&kp, kp.public_key_pem(), 2.0),
        ];
        let path = dir.path().join("txs.json");
        fs::write(&path, serde_json::to_string(&txs).unwrap()).unwrap();

        assert_eq!(read_transactions(&path).unwrap(), txs);
    }

    #[test]
    fn test_read_transactions_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("txs.json");
        fs::write(&path, "{not json").unwrap();

        assert!(read_transactions(&path).is_err());
    }
}
