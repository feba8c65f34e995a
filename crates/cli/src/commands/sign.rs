//! Transaction signing command.

use anyhow::{Context, Result};
use clap::Args;
use powchain_core::{current_timestamp, Signer, Transaction};
use std::fs;
use std::path::PathBuf;

#[derive(Args)]
pub struct SignArgs {
    /// Sender's private key (PKCS#8 PEM)
    #[arg(short, long)]
    key: PathBuf,

    /// Receiver's public key (PEM); defaults to the sender
    #[arg(short, long)]
    to: Option<PathBuf>,

    /// Amount to transfer
    #[arg(short, long)]
    amount: f64,

    /// Unix timestamp (defaults to now)
    #[arg(long)]
    timestamp: Option<u64>,
}

pub fn run(args: SignArgs) -> Result<()> {
    let tx = build_transaction(&args)?;
    println!("{}", serde_json::to_string_pretty(&tx)?);
    Ok(())
}

fn build_transaction(args: &SignArgs) -> Result<Transaction> {
    anyhow::ensure!(
        args.amount.is_finite() && args.amount >= 0.0,
        "Amount must be a non-negative number, got {}",
        args.amount
    );

    let keypair = super::load_keypair(&args.key)?;
    let receiver = match &args.to {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("Failed to read receiver key: {}", path.display()))?,
        None => keypair.public_key_pem().to_owned(),
    };
    powchain_core::crypto::parse_public_key_pem(&receiver).context("Invalid receiver key")?;

    let timestamp = args.timestamp.unwrap_or_else(current_timestamp);
    Ok(Transaction::new(
        args.amount,
        keypair.public_key_pem().to_owned(),
        receiver,
        timestamp,
    )
    .signed(&keypair))
}

#[cfg(test)]
mod tests {
    use super::*;
    use powchain_core::{Ed25519Verifier, Keypair};

    fn write_key(dir: &std::path::Path, keypair: &Keypair) -> PathBuf {
        let path = dir.join("sender.pem");
        fs::write(&path, keypair.to_pkcs8_pem().unwrap()).unwrap();
        path
    }

    #[test]
    fn test_build_transaction_self_transfer() {
        let dir = tempfile::tempdir().unwrap();
        let keypair = Keypair::generate();
        let args = SignArgs {
            key: write_key(dir.path(), &keypair),
            to: None,
            amount: 12.5,
            timestamp: Some(42),
        };

        let tx = build_transaction(&args).unwrap();
        assert!(tx.is_self_transfer());
        assert_eq!(tx.timestamp, 42);
        assert!(tx.verify_with(&Ed25519Verifier).is_ok());
    }

    #[test]
    fn test_build_transaction_rejects_negative_amount() {
        let dir = tempfile::tempdir().unwrap();
        let args = SignArgs {
            key: write_key(dir.path(), &Keypair::generate()),
            to: None,
            amount: -1.0,
            timestamp: None,
        };

        assert!(build_transaction(&args).is_err());
    }
}
