//! End-to-end demo: one producing node, one follower fed over a channel.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use powchain_chain::{ChannelTransport, Node, NullTransport};
use powchain_core::{current_timestamp, Block, Hash, Keypair, Signer, Transaction};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};

#[derive(Args)]
pub struct DemoArgs {
    /// Number of blocks to seal
    #[arg(short, long, default_value = "2")]
    blocks: usize,

    /// Node configuration file (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

pub fn run(args: DemoArgs) -> Result<()> {
    let config = super::load_config(args.config.as_deref())?;
    let runtime = tokio::runtime::Runtime::new().context("Failed to start runtime")?;

    runtime.block_on(async move {
        let (outbound, mut inbound) = mpsc::unbounded_channel::<Vec<u8>>();
        let producer = Arc::new(Node::new(
            config.clone(),
            Arc::new(ChannelTransport::new(outbound)),
        ));
        let follower = Arc::new(Node::new(config, Arc::new(NullTransport)));

        let relay = {
            let follower = Arc::clone(&follower);
            tokio::spawn(async move {
                while let Some(bytes) = inbound.recv().await {
                    match Block::decode(&bytes) {
                        Ok(block) => {
                            if let Err(e) = follower.on_block_received(block) {
                                warn!("follower rejected block: {}", e);
                            }
                        }
                        Err(e) => warn!("undecodable block on the wire: {}", e),
                    }
                }
            })
        };

        let alice = Keypair::generate();
        let bob = Keypair::generate();

        for round in 0..args.blocks {
            for tx in round_transactions(&alice, &bob, round) {
                producer.on_transaction_received(tx);
            }
            let block = producer.seal_block_async().await?;
            info!(hash = %block.hash, txs = block.tx_count(), "sealed block {}", round + 1);
            super::seal::print_block(&block, block.tx_count());
        }

        // Dropping the producer closes the outbound channel and ends the relay.
        let mut chain = producer.ledger().chain();
        chain.reverse();
        drop(producer);
        relay.await.context("Relay task failed")?;

        println!("{}", "Chain:".bold().cyan());
        for (height, block) in chain.iter().enumerate() {
            println!(
                "  #{} {} <- {}",
                height,
                block.hash.to_hex().bright_yellow(),
                block.prev_hash.to_hex().bright_black()
            );
        }

        let synced = follower.ledger().current_head() == producer_head(&chain);
        let status = if synced {
            "in sync".green()
        } else {
            "out of sync".red()
        };
        println!();
        println!(
            "  Follower head: {} ({})",
            follower.ledger().current_head().to_hex(),
            status
        );
        Ok::<(), anyhow::Error>(())
    })
}

fn producer_head(chain: &[Block]) -> Hash {
    chain.last().map(|b| b.hash).unwrap_or(Hash::ZERO)
}

/// Four transfers per round covering both directions and self transfers.
fn round_transactions(alice: &Keypair, bob: &Keypair, round: usize) -> Vec<Transaction> {
    let base = current_timestamp() + (round as u64) * 10;
    let a = alice.public_key_pem();
    let b = bob.public_key_pem();
    vec![
        Transaction::new(1.5, a.to_owned(), b.to_owned(), base).signed(alice),
        Transaction::new(0.25, a.to_owned(), a.to_owned(), base + 1).signed(alice),
        Transaction::new(3.0, b.to_owned(), b.to_owned(), base + 2).signed(bob),
        Transaction::new(2.0, b.to_owned(), a.to_owned(), base + 3).signed(bob),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use powchain_core::Ed25519Verifier;

    #[test]
    fn test_round_transactions_are_signed_and_ordered() {
        let alice = Keypair::generate();
        let bob = Keypair::generate();
        let txs = round_transactions(&alice, &bob, 1);

        assert_eq!(txs.len(), 4);
        assert!(txs.iter().all(|tx| tx.verify_with(&Ed25519Verifier).is_ok()));
        assert!(txs.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
        assert_eq!(txs.iter().filter(|tx| tx.is_self_transfer()).count(), 2);
    }

    #[test]
    fn test_demo_runs_and_syncs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"pow":{"difficulty":"0"}}"#).unwrap();

        run(DemoArgs {
            blocks: 2,
            config: Some(path),
        })
        .unwrap();
    }
}
